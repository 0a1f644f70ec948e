//! Shared helpers for scheduler integration tests.

#![allow(dead_code)]

use rcaflow_core::config::HostConfig;
use rcaflow_core::flow_unit::{FlowUnit, Record};
use rcaflow_core::graph::RcaGraph;
use rcaflow_core::testing::{MockMetricSource, MockNetwork, RecordingStore};
use rcaflow_core::traits::{
    EvalContext, EvalFuture, Evaluate, FlowStore, MetricSource, NetworkFacade,
};
use rcaflow_scheduler::{SchedulerTask, WorkerPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The collaborator doubles one scheduler test wires together.
pub struct Collaborators {
    pub source: Arc<MockMetricSource>,
    pub store: Arc<RecordingStore>,
    pub network: Arc<MockNetwork>,
}

pub fn collaborators() -> Collaborators {
    Collaborators {
        source: Arc::new(MockMetricSource::new()),
        store: Arc::new(RecordingStore::new()),
        network: Arc::new(MockNetwork::new()),
    }
}

/// Host config serving the given loci.
pub fn host_config(host_id: &str, loci: &[&str]) -> HostConfig {
    let loci_yaml = loci.join(", ");
    HostConfig::from_yaml_str(&format!("host_id: {host_id}\nloci: [{loci_yaml}]\n")).unwrap()
}

/// Build a scheduler task over the collaborator doubles.
pub fn build_task(
    max_ticks: u32,
    pool_capacity: usize,
    graph: &RcaGraph,
    config: &HostConfig,
    c: &Collaborators,
) -> SchedulerTask {
    try_build_task(max_ticks, WorkerPool::new(pool_capacity), graph, config, c).unwrap()
}

/// Like [`build_task`], but surfacing construction errors and taking the
/// pool directly.
pub fn try_build_task(
    max_ticks: u32,
    pool: WorkerPool,
    graph: &RcaGraph,
    config: &HostConfig,
    c: &Collaborators,
) -> rcaflow_core::Result<SchedulerTask> {
    SchedulerTask::new(
        max_ticks,
        pool,
        graph,
        Arc::clone(&c.source) as Arc<dyn MetricSource>,
        Arc::clone(&c.store) as Arc<dyn FlowStore>,
        config,
        Arc::clone(&c.network) as Arc<dyn NetworkFacade>,
        config.host_context(),
    )
}

/// One-record unit for a vertex.
pub fn unit(vertex: &str, field: &str, value: f64) -> FlowUnit {
    FlowUnit::single(vertex, Record::new().with(field, value))
}

/// Evaluator tracking how many invocations overlap in time.
pub struct ConcurrencyProbe {
    current: Arc<AtomicUsize>,
    max_observed: Arc<AtomicUsize>,
    hold: Duration,
}

impl ConcurrencyProbe {
    pub fn new(
        current: Arc<AtomicUsize>,
        max_observed: Arc<AtomicUsize>,
        hold: Duration,
    ) -> Self {
        Self {
            current,
            max_observed,
            hold,
        }
    }
}

impl Evaluate for ConcurrencyProbe {
    fn evaluate<'a>(&'a self, ctx: EvalContext<'a>) -> EvalFuture<'a> {
        Box::pin(async move {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_observed.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.hold).await;

            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(FlowUnit::single(
                ctx.vertex.name(),
                Record::new().with("done", true),
            ))
        })
    }
}

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
