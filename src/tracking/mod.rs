pub mod custom_variable;
pub mod ecommerce;
pub mod plugins;
pub mod query;
pub mod response;
pub mod tracker;
pub mod tracker_config;

#[cfg(test)]
mod test;
