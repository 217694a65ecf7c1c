pub mod http_client;
pub mod token_store;

pub use http_client::{HttpClient, RequestOptions};
pub use token_store::TokenStore;
