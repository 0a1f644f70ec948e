//! rcaflow Scheduler - Per-host partitioning and tick execution.
//!
//! This crate turns a static RCA graph plus a host identity into a running
//! per-host scheduler:
//! - Partitioning into local tasklets and remote-proxy placeholders
//! - Subscription intents for remote upstream data
//! - Outbound routing of locally produced data to subscribed peers
//! - Bounded-parallel per-tick execution with dependency futures
//! - Tick-modulo cadence per vertex, with counter wrap at `max_ticks`
//! - Prometheus metrics and a mutable muted-vertex set
//!
//! # Example
//!
//! ```ignore
//! use rcaflow_scheduler::prelude::*;
//!
//! let pool = WorkerPool::new(8);
//! let mut task = SchedulerTask::new(
//!     60, pool, &graph, source, store, &config, network, config.host_context(),
//! )?;
//! let (mut scheduler, handle) = Scheduler::new(task, Duration::from_secs(5));
//! scheduler.start().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod metrics;
pub mod partition;
pub mod pool;
pub mod router;
pub mod scheduler;
pub mod stats;
pub mod task;
pub mod tasklet;

pub use metrics::SchedulerMetrics;
pub use partition::TaskletGraph;
pub use pool::WorkerPool;
pub use router::OutboundRouter;
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerState};
pub use stats::GraphStats;
pub use task::SchedulerTask;
pub use tasklet::{Tasklet, TaskletId, TickFuture};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::metrics::SchedulerMetrics;
    pub use crate::partition::TaskletGraph;
    pub use crate::pool::WorkerPool;
    pub use crate::router::OutboundRouter;
    pub use crate::scheduler::{Scheduler, SchedulerHandle, SchedulerState};
    pub use crate::stats::GraphStats;
    pub use crate::task::{PreWaitHook, SchedulerTask};
    pub use crate::tasklet::{Tasklet, TaskletId, TickFuture};
}
