pub mod analytics_client;
pub mod analytics_query;
pub mod goals;
