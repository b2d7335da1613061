pub mod utils;
pub mod http;
pub mod tracking;
pub mod analytics;
