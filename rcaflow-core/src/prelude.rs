//! Prelude for convenient imports.
//!
//! # Example
//!
//! ```ignore
//! use rcaflow_core::prelude::*;
//! ```

// Core types
pub use crate::flow_unit::{now_millis, FlowUnit, Record, RecordBatch};
pub use crate::value::Value;

// Error handling
pub use crate::error::{RcaError, Result};

// Graph model
pub use crate::graph::{tags, ConnectedComponent, GraphBuilder, RcaGraph, Vertex, VertexKind};

// Configuration and host identity
pub use crate::config::HostConfig;
pub use crate::context::HostContext;

// Collaborator facades
pub use crate::traits::{
    EvalContext, EvalFuture, Evaluate, FlowStore, InputOrigin, IntentMsg, MetricPassthrough,
    MetricSource, NetworkFacade, SourceFuture, StoreFuture, UpstreamInput,
};
