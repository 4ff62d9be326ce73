//! Search-as-you-type coordination.
//!
//! [`machine`] holds the state machine with no clocks or I/O: every input
//! returns the effects (timers, requests, cancellations) the caller must
//! perform. [`driver`] runs it on tokio.

pub mod driver;
pub mod machine;

pub use driver::{CoordinatorConfig, SuggestionCoordinator, SuggestionFetcher};
pub use machine::{Effect, Input, Machine, Phase, Snapshot};
