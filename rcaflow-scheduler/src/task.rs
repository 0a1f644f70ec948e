//! The tick executor.
//!
//! One [`SchedulerTask`] owns the scheduled graph for its host and drives a
//! full evaluation pass per invocation of [`SchedulerTask::run`]. The
//! driver only submits tasklet tasks and awaits the last level; because
//! every later tasklet transitively depends on earlier ones through the
//! per-tick future map, last-level completion implies full-tick completion.
//!
//! `run` never fails: everything that can go wrong inside a tick is logged
//! and contained, and the next tick starts fresh.

use crate::metrics::SchedulerMetrics;
use crate::partition::{partition, TaskletGraph};
use crate::pool::WorkerPool;
use crate::router::OutboundRouter;
use crate::stats::GraphStats;
use crate::tasklet::{SharedHandles, Tasklet, TaskletId, TickFuture};
use futures::future;
use parking_lot::Mutex;
use rcaflow_core::config::HostConfig;
use rcaflow_core::context::HostContext;
use rcaflow_core::error::{RcaError, Result};
use rcaflow_core::graph::RcaGraph;
use rcaflow_core::traits::{FlowStore, MetricSource, NetworkFacade};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Extension hook invoked after task submission, before the final join.
pub type PreWaitHook = Box<dyn Fn() + Send + Sync>;

/// Per-host tick executor for the RCA graph.
pub struct SchedulerTask {
    max_ticks: u32,
    curr_tick: u32,
    pool: WorkerPool,
    tasklets: TaskletGraph,
    router: Arc<OutboundRouter>,
    stats: Arc<GraphStats>,
    metrics: Arc<SchedulerMetrics>,
    /// Single-slot staging field for the test-only metric source swap,
    /// drained by the driver at tick entry.
    pending_source: Mutex<Option<Arc<dyn MetricSource>>>,
    pre_wait: Option<PreWaitHook>,
}

impl SchedulerTask {
    /// Partition `graph` for this host and build the executor.
    ///
    /// Partitioning sends one subscription intent per remote upstream of a
    /// local vertex; intent failures are logged and tolerated. The only
    /// fatal construction errors are graph and configuration problems.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        max_ticks: u32,
        pool: WorkerPool,
        graph: &RcaGraph,
        source: Arc<dyn MetricSource>,
        store: Arc<dyn FlowStore>,
        config: &HostConfig,
        network: Arc<dyn NetworkFacade>,
        host: HostContext,
    ) -> Result<Self> {
        if max_ticks == 0 {
            return Err(RcaError::ConfigValue {
                field: "max_ticks".to_string(),
                cause: "must be positive".to_string(),
            });
        }

        let stats = Arc::new(GraphStats::new());
        stats.set_node_count(graph.vertex_count());
        for vertex in &config.muted {
            stats.mute(vertex.clone());
        }

        let metrics = Arc::new(SchedulerMetrics::new());
        let router = Arc::new(OutboundRouter::new(Arc::clone(&network)));

        let handles = SharedHandles {
            host: Arc::new(host),
            source,
            store,
            network,
            router: Arc::clone(&router),
            stats: Arc::clone(&stats),
            metrics: Arc::clone(&metrics),
        };
        let tasklets = partition(graph, config, &handles)?;

        tracing::info!(
            levels = tasklets.levels().len(),
            tasklets = tasklets.tasklet_count(),
            routes = router.route_count(),
            "scheduler task constructed"
        );

        Ok(Self {
            max_ticks,
            curr_tick: 0,
            pool,
            tasklets,
            router,
            stats,
            metrics,
            pending_source: Mutex::new(None),
            pre_wait: None,
        })
    }

    /// Drive one full evaluation pass.
    pub async fn run(&mut self) {
        self.curr_tick += 1;
        let started = Instant::now();
        tracing::debug!(tick = self.curr_tick, "tick started");

        self.metrics.graph_nodes.set(self.stats.node_count() as i64);
        self.apply_pending_source();

        let last_level = self.submit_tasklets();
        if let Some(hook) = &self.pre_wait {
            hook();
        }
        future::join_all(last_level).await;

        if self.curr_tick == self.max_ticks {
            self.curr_tick = 0;
            for tasklet in self.tasklets.iter() {
                tasklet.reset_ticks();
            }
            tracing::debug!("tick counter wrapped; cadence counters reset");
        }

        self.metrics.ticks_total.inc();
        self.metrics.muted_nodes.set(self.stats.muted_count() as i64);
        let elapsed = started.elapsed();
        self.metrics.tick_duration.observe(elapsed.as_secs_f64());
        tracing::debug!(
            tick = self.curr_tick,
            elapsed_ms = elapsed.as_millis() as u64,
            "tick finished"
        );
    }

    /// Submit every tasklet level by level; returns the futures of the last
    /// non-empty level.
    fn submit_tasklets(&self) -> Vec<TickFuture> {
        let mut submitted: HashMap<TaskletId, TickFuture> = HashMap::new();
        let mut last_level: Vec<TickFuture> = Vec::new();

        for level in self.tasklets.levels() {
            if level.is_empty() {
                continue;
            }
            last_level.clear();
            for tasklet in level {
                let fut = tasklet.execute(&self.pool, &submitted);
                submitted.insert(tasklet.id(), fut.clone());
                last_level.push(fut);
            }
        }
        last_level
    }

    fn apply_pending_source(&self) {
        if let Some(source) = self.pending_source.lock().take() {
            for tasklet in self.tasklets.iter() {
                tasklet.set_metric_source(Arc::clone(&source));
            }
            tracing::debug!("metric source swapped on all tasklets");
        }
    }

    /// Stage a replacement metric source, applied to every tasklet at the
    /// start of the next tick. Test hook.
    pub fn set_metric_source(&self, source: Arc<dyn MetricSource>) {
        *self.pending_source.lock() = Some(source);
    }

    /// Install a hook invoked after submission, before the final join.
    pub fn set_pre_wait(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.pre_wait = Some(Box::new(hook));
    }

    /// The global tick counter, `0 <= curr_tick <= max_ticks`.
    pub fn curr_tick(&self) -> u32 {
        self.curr_tick
    }

    /// The wrap point of the tick counter.
    pub fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    /// The scheduled tasklets, grouped by dependency level.
    pub fn levels(&self) -> &[Vec<Arc<Tasklet>>] {
        self.tasklets.levels()
    }

    /// The outbound routing map.
    pub fn router(&self) -> &Arc<OutboundRouter> {
        &self.router
    }

    /// Runtime graph statistics (node counts, muting).
    pub fn stats(&self) -> &Arc<GraphStats> {
        &self.stats
    }

    /// Prometheus metrics for this executor.
    pub fn metrics(&self) -> &Arc<SchedulerMetrics> {
        &self.metrics
    }

    /// The injected worker pool.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

impl std::fmt::Debug for SchedulerTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerTask")
            .field("max_ticks", &self.max_ticks)
            .field("curr_tick", &self.curr_tick)
            .field("levels", &self.tasklets.levels().len())
            .field("tasklets", &self.tasklets.tasklet_count())
            .finish()
    }
}
