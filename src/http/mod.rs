pub mod crypto;
pub mod executor;
pub mod http_client;
pub mod http_client_config;
pub mod http_request;
pub mod http_response;
