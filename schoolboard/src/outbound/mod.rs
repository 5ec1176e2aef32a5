//! Outbound adapters implementing domain ports.
//!
//! - **http**: reqwest-backed [`ApiClient`](crate::domain::ports::ApiClient)
//! - **storage**: file-backed
//!   [`KeyValueStorage`](crate::domain::ports::KeyValueStorage) for the CLI
//!
//! Adapters translate between domain types and transport representations.
//! They hold no session or dashboard policy.

pub mod http;
pub mod storage;
