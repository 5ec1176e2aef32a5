//! HTTP adapter for the school records API.

mod reqwest_client;

pub use reqwest_client::HttpApiClient;
