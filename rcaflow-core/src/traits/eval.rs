//! Vertex evaluation contract.
//!
//! Individual vertex logic lives outside the scheduler core: graph authors
//! bind an [`Evaluate`] implementation to each computed vertex, and the
//! scheduler invokes it with the inputs gathered for the current tick.

use crate::context::HostContext;
use crate::error::Result;
use crate::flow_unit::{FlowUnit, RecordBatch};
use crate::graph::Vertex;
use crate::traits::MetricSource;
use std::future::Future;
use std::pin::Pin;

/// A boxed future for async vertex evaluation.
pub type EvalFuture<'a> = Pin<Box<dyn Future<Output = Result<FlowUnit>> + Send + 'a>>;

/// Where an upstream input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    /// Produced by a tasklet on this host.
    Local,
    /// Read off the wire from a peer host.
    Remote,
}

/// One upstream flow unit, labelled with its origin.
///
/// A vertex with an `aggregate-upstream` tag sees the same upstream twice,
/// once per origin; how the two are merged is the evaluator's decision.
#[derive(Debug, Clone)]
pub struct UpstreamInput {
    /// Name of the upstream vertex.
    pub vertex: String,
    /// Whether the unit was computed locally or fetched from a peer.
    pub origin: InputOrigin,
    /// The upstream's output for this tick (possibly empty).
    pub unit: FlowUnit,
}

/// Everything an evaluator may look at for one tick.
pub struct EvalContext<'a> {
    /// The vertex being evaluated.
    pub vertex: &'a Vertex,
    /// Identity and loci of the executing host.
    pub host: &'a HostContext,
    /// The vertex's parameter block from the host configuration, if any.
    pub params: Option<&'a serde_yaml::Value>,
    /// Upstream outputs in declared upstream order.
    pub upstreams: &'a [UpstreamInput],
    /// Prefetched metric records (metric vertices only).
    pub metric_batch: Option<&'a RecordBatch>,
    /// The metric source, for evaluators that need ad-hoc reads.
    pub source: &'a dyn MetricSource,
}

impl<'a> EvalContext<'a> {
    /// First upstream unit produced by `vertex`, regardless of origin.
    pub fn upstream(&self, vertex: &str) -> Option<&FlowUnit> {
        self.upstreams
            .iter()
            .find(|u| u.vertex == vertex)
            .map(|u| &u.unit)
    }

    /// All upstream units produced by `vertex` (local and remote copies).
    pub fn upstream_all(&self, vertex: &str) -> Vec<&'a UpstreamInput> {
        self.upstreams.iter().filter(|u| u.vertex == vertex).collect()
    }

    /// Upstream units that carry data this tick.
    pub fn non_empty_upstreams(&self) -> impl Iterator<Item = &UpstreamInput> {
        self.upstreams.iter().filter(|u| !u.unit.is_empty())
    }
}

/// Evaluation function bound to a vertex.
pub trait Evaluate: Send + Sync {
    /// Produce this tick's flow unit from the gathered inputs.
    ///
    /// # Errors
    ///
    /// Errors are contained by the scheduler: they are logged and the vertex
    /// emits the empty unit for the tick.
    fn evaluate<'a>(&'a self, ctx: EvalContext<'a>) -> EvalFuture<'a>;
}

/// Default evaluator for metric vertices: wraps the prefetched record batch
/// into a flow unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricPassthrough;

impl Evaluate for MetricPassthrough {
    fn evaluate<'a>(&'a self, ctx: EvalContext<'a>) -> EvalFuture<'a> {
        Box::pin(async move {
            Ok(match ctx.metric_batch {
                Some(batch) if !batch.is_empty() => {
                    FlowUnit::from_batch(ctx.vertex.name(), batch.clone())
                }
                _ => FlowUnit::empty(),
            })
        })
    }
}
