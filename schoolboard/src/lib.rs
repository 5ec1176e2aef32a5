//! Client core for the school records admin console.
//!
//! The crate keeps the session store, login flow and dashboard aggregation
//! independent of any browser or terminal: storage and HTTP are injected
//! through the ports in [`domain::ports`], and [`outbound`] provides the
//! concrete adapters used by the `schoolboard` binary.

pub mod domain;
pub mod outbound;
pub mod settings;

pub use settings::ClientSettings;
