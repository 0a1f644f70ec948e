//! Tasklets: the per-tick runtime binding of a graph vertex.
//!
//! A tasklet owns a vertex's tick counter and last output, knows its
//! predecessor tasklets, and carries one of two evaluation modes decided at
//! partition time: local computation, or reading a peer's data off the wire.
//!
//! Per tick, every tasklet contributes one spawned task. The task first
//! awaits the shared futures of its predecessors, then takes a worker-pool
//! permit and runs. The future a tasklet hands back always resolves, even
//! when evaluation fails, so downstream tasklets are never starved.

use crate::metrics::SchedulerMetrics;
use crate::pool::WorkerPool;
use crate::router::OutboundRouter;
use crate::stats::GraphStats;
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::RwLock;
use rcaflow_core::context::HostContext;
use rcaflow_core::flow_unit::FlowUnit;
use rcaflow_core::graph::{Vertex, VertexKind};
use rcaflow_core::traits::{
    EvalContext, Evaluate, FlowStore, InputOrigin, MetricSource, NetworkFacade, UpstreamInput,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Identifier of a tasklet within one scheduled graph.
///
/// Distinct from the vertex name: a vertex can be bound to two tasklets at
/// once (a local one and a remote proxy for aggregated peer copies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskletId(u32);

impl TaskletId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tasklet_{}", self.0)
    }
}

/// How a tasklet produces its flow unit; fixed at partition time.
pub enum Evaluator {
    /// Compute from upstream units and metric readings on this host.
    Local {
        /// The vertex's evaluation function.
        eval: Arc<dyn Evaluate>,
        /// Parameter block from the host configuration, if present.
        params: Option<serde_yaml::Value>,
    },
    /// Poll the network facade for the most recent peer-produced unit.
    RemoteProxy,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { params, .. } => f
                .debug_struct("Local")
                .field("has_params", &params.is_some())
                .finish(),
            Self::RemoteProxy => write!(f, "RemoteProxy"),
        }
    }
}

/// The shared future type of one tasklet's per-tick task.
pub type TickFuture = Shared<BoxFuture<'static, ()>>;

/// Collaborator handles shared by every tasklet of one scheduled graph.
#[derive(Clone)]
pub(crate) struct SharedHandles {
    pub host: Arc<HostContext>,
    pub source: Arc<dyn MetricSource>,
    pub store: Arc<dyn FlowStore>,
    pub network: Arc<dyn NetworkFacade>,
    pub router: Arc<OutboundRouter>,
    pub stats: Arc<GraphStats>,
    pub metrics: Arc<SchedulerMetrics>,
}

/// Runtime unit bound to one scheduled vertex.
pub struct Tasklet {
    id: TaskletId,
    vertex: Arc<Vertex>,
    evaluator: Evaluator,
    host: Arc<HostContext>,
    source: RwLock<Arc<dyn MetricSource>>,
    store: Arc<dyn FlowStore>,
    network: Arc<dyn NetworkFacade>,
    router: Arc<OutboundRouter>,
    stats: Arc<GraphStats>,
    metrics: Arc<SchedulerMetrics>,
    predecessors: RwLock<Vec<Arc<Tasklet>>>,
    ticks: AtomicU32,
    output: RwLock<FlowUnit>,
}

impl Tasklet {
    pub(crate) fn new(
        id: TaskletId,
        vertex: Arc<Vertex>,
        evaluator: Evaluator,
        handles: &SharedHandles,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            vertex,
            evaluator,
            host: Arc::clone(&handles.host),
            source: RwLock::new(Arc::clone(&handles.source)),
            store: Arc::clone(&handles.store),
            network: Arc::clone(&handles.network),
            router: Arc::clone(&handles.router),
            stats: Arc::clone(&handles.stats),
            metrics: Arc::clone(&handles.metrics),
            predecessors: RwLock::new(Vec::new()),
            ticks: AtomicU32::new(0),
            output: RwLock::new(FlowUnit::empty()),
        })
    }

    /// The tasklet's id within its scheduled graph.
    pub fn id(&self) -> TaskletId {
        self.id
    }

    /// The bound vertex.
    pub fn vertex(&self) -> &Arc<Vertex> {
        &self.vertex
    }

    /// Whether this tasklet evaluates locally.
    pub fn is_local(&self) -> bool {
        matches!(self.evaluator, Evaluator::Local { .. })
    }

    /// Whether this tasklet reads a peer's data off the wire.
    pub fn is_remote_proxy(&self) -> bool {
        matches!(self.evaluator, Evaluator::RemoteProxy)
    }

    /// The predecessor tasklets, in declared upstream order.
    pub fn predecessors(&self) -> Vec<Arc<Tasklet>> {
        self.predecessors.read().clone()
    }

    /// The last produced flow unit (empty before the first evaluation).
    pub fn output(&self) -> FlowUnit {
        self.output.read().clone()
    }

    /// The tick cadence counter, `0 <= counter < period` after wrap resets.
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub(crate) fn add_predecessor(&self, predecessor: Arc<Tasklet>) {
        self.predecessors.write().push(predecessor);
    }

    pub(crate) fn reset_ticks(&self) {
        self.ticks.store(0, Ordering::SeqCst);
    }

    pub(crate) fn set_metric_source(&self, source: Arc<dyn MetricSource>) {
        *self.source.write() = source;
    }

    /// Submit this tasklet's work for the current tick.
    ///
    /// The returned future resolves once the tasklet has produced its unit
    /// for the tick (possibly empty). Predecessor futures are looked up in
    /// `submitted`; a predecessor missing from the map counts as already
    /// complete. The future resolves even if the underlying task panics or
    /// the pool is closed, so sibling and downstream tasklets keep running.
    pub fn execute(
        self: &Arc<Self>,
        pool: &WorkerPool,
        submitted: &HashMap<TaskletId, TickFuture>,
    ) -> TickFuture {
        let waits: Vec<TickFuture> = self
            .predecessors
            .read()
            .iter()
            .map(|p| submitted.get(&p.id()).cloned().unwrap_or_else(completed))
            .collect();

        let this = Arc::clone(self);
        let permits = pool.permits();
        let handle = tokio::spawn(async move {
            future::join_all(waits).await;
            match permits.acquire_owned().await {
                Ok(_permit) => this.run_tick().await,
                Err(_) => {
                    tracing::warn!(
                        vertex = %this.vertex.name(),
                        "worker pool closed; emitting empty unit"
                    );
                    this.store_output(FlowUnit::empty());
                }
            }
        });

        async move {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "tasklet task did not complete");
            }
        }
        .boxed()
        .shared()
    }

    /// One cadence-gated evaluation.
    async fn run_tick(&self) {
        let count = self.ticks.fetch_add(1, Ordering::SeqCst);
        if count % self.vertex.period() != 0 {
            self.store_output(FlowUnit::empty());
            return;
        }

        let unit = match &self.evaluator {
            Evaluator::Local { eval, params } => {
                self.evaluate_local(eval.as_ref(), params.as_ref()).await
            }
            Evaluator::RemoteProxy => self.read_from_wire(),
        };

        if !unit.is_empty() {
            self.router.forward(self.vertex.name(), &unit);
        }
        self.store_output(unit);
    }

    async fn evaluate_local(
        &self,
        eval: &dyn Evaluate,
        params: Option<&serde_yaml::Value>,
    ) -> FlowUnit {
        let name = self.vertex.name();
        if self.stats.is_muted(name) {
            tracing::debug!(vertex = name, "vertex muted; emitting empty unit");
            return FlowUnit::empty();
        }

        let upstreams = self.gather_upstreams();
        let source = Arc::clone(&*self.source.read());

        let metric_batch = if self.vertex.kind() == VertexKind::Metric {
            match source.read_metric(name, self.vertex.fields()).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!(vertex = name, error = %e, "metric read failed");
                    None
                }
            }
        } else {
            None
        };

        let ctx = EvalContext {
            vertex: &self.vertex,
            host: &self.host,
            params,
            upstreams: &upstreams,
            metric_batch: metric_batch.as_ref(),
            source: source.as_ref(),
        };

        let unit = match eval.evaluate(ctx).await {
            Ok(unit) => unit,
            Err(e) => {
                self.metrics.evaluation_failures.inc();
                tracing::warn!(vertex = name, error = %e, "evaluation failed; emitting empty unit");
                FlowUnit::empty()
            }
        };

        if !unit.is_empty() {
            if let Err(e) = self.store.write(&unit).await {
                tracing::warn!(vertex = name, error = %e, "failed to persist flow unit");
            }
        }
        unit
    }

    fn read_from_wire(&self) -> FlowUnit {
        let name = self.vertex.name();
        match self.network.fetch_remote(name) {
            Some(unit) => unit,
            None => {
                tracing::debug!(vertex = name, "no remote data cached; emitting empty unit");
                FlowUnit::empty()
            }
        }
    }

    fn gather_upstreams(&self) -> Vec<UpstreamInput> {
        self.predecessors
            .read()
            .iter()
            .map(|p| UpstreamInput {
                vertex: p.vertex.name().to_string(),
                origin: if p.is_local() {
                    InputOrigin::Local
                } else {
                    InputOrigin::Remote
                },
                unit: p.output(),
            })
            .collect()
    }

    fn store_output(&self, unit: FlowUnit) {
        *self.output.write() = unit;
    }
}

impl fmt::Debug for Tasklet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tasklet")
            .field("id", &self.id)
            .field("vertex", &self.vertex.name())
            .field("evaluator", &self.evaluator)
            .field("ticks", &self.ticks())
            .finish()
    }
}

fn completed() -> TickFuture {
    future::ready(()).boxed().shared()
}
