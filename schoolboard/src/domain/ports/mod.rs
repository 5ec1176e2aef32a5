//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod api_client;
mod key_value_storage;

#[cfg(test)]
pub use api_client::MockApiClient;
pub use api_client::{ApiClient, ApiClientError, ApiRequest, ApiResponse, HttpMethod};
#[cfg(test)]
pub use key_value_storage::MockKeyValueStorage;
pub use key_value_storage::{InMemoryKeyValueStorage, KeyValueStorage, KeyValueStorageError};
