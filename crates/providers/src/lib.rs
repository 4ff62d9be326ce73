//! Streaming-source registry and player URL resolution.
//!
//! Providers are external embed hosts reachable only by building an iframe
//! URL. The registry is fixed at startup; selecting a provider and resolving
//! a URL are pure functions over explicit state.

pub mod catalog;
pub mod csp;
pub mod provider;
pub mod registry;
pub mod resolve;
pub mod selection;

pub use provider::Provider;
pub use registry::Registry;
pub use resolve::{resolve, resolve_ref};
pub use selection::PlayerSelection;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    Unknown(String),
    #[error("provider is disabled: {0}")]
    Disabled(String),
    #[error("no enabled providers configured")]
    NoneEnabled,
}
