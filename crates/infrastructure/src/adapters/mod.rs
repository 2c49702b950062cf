//! Adapters for the application's outbound ports.

mod reqwest_client;

pub use reqwest_client::ReqwestHttpClient;
