//! rcaflow Core Library
//!
//! This crate provides the foundational types and traits for the rcaflow
//! scheduler: the RCA computation graph model, flow units, host
//! configuration, the collaborator facades (metric source, persistence
//! store, network hopper), and test doubles for all of them.
//!
//! # Overview
//!
//! rcaflow periodically evaluates a root-cause-analysis computation graph:
//! a DAG whose vertices turn metric readings and upstream outputs into
//! diagnostic flow units. Vertices are pinned to deployment loci; each host
//! evaluates only its own subset and exchanges the rest with peers.
//!
//! # Example
//!
//! ```ignore
//! use rcaflow_core::prelude::*;
//!
//! let graph = GraphBuilder::new()
//!     .vertex(Vertex::metric("cpu", ["avg", "max"]).with_locus("data-node"))
//!     .vertex(
//!         Vertex::computed("hot-node", my_evaluator)
//!             .with_locus("cluster-manager")
//!             .with_upstreams(["cpu"]),
//!     )
//!     .build()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;
pub mod flow_unit;
pub mod graph;
pub mod prelude;
pub mod testing;
pub mod traits;
pub mod value;

// Re-export key types at crate root for convenience
pub use config::HostConfig;
pub use context::HostContext;
pub use error::{RcaError, Result};
pub use flow_unit::{FlowUnit, Record, RecordBatch};
pub use graph::{ConnectedComponent, GraphBuilder, RcaGraph, Vertex, VertexKind};
pub use traits::{Evaluate, FlowStore, IntentMsg, MetricSource, NetworkFacade};
pub use value::Value;
