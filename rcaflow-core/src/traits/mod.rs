//! Collaborator facades consumed by the scheduler.
//!
//! The scheduler core does not read metrics, persist results, or talk to
//! peers itself; it drives these capabilities through the traits defined
//! here. Production wiring injects real implementations, tests inject the
//! doubles from [`crate::testing`].

mod eval;
mod net;
mod source;
mod store;

pub use eval::{
    EvalContext, EvalFuture, Evaluate, InputOrigin, MetricPassthrough, UpstreamInput,
};
pub use net::{IntentMsg, NetworkFacade};
pub use source::{MetricSource, SourceFuture};
pub use store::{FlowStore, StoreFuture};
