//! Partitioning of the RCA graph into a leveled tasklet list.
//!
//! Construction walks every connected component level by level and decides,
//! per vertex, whether this host evaluates it. Local vertices become local
//! tasklets; their non-local upstreams become remote-proxy tasklets backed
//! by a subscription intent to the producing host. Non-local vertices with
//! local upstreams are recorded in the outbound router so their input data
//! gets forwarded out as soon as it is produced.

use crate::router::OutboundRouter;
use crate::tasklet::{Evaluator, SharedHandles, Tasklet, TaskletId};
use rcaflow_core::config::HostConfig;
use rcaflow_core::error::{RcaError, Result};
use rcaflow_core::graph::{ConnectedComponent, RcaGraph, Vertex, VertexKind};
use rcaflow_core::traits::{Evaluate, IntentMsg, MetricPassthrough};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The leveled list of tasklets this host will run each tick.
///
/// Tasklets at level `k` depend only on tasklets at levels `< k`; remote
/// proxies always sit at or before the level of their first consumer.
#[derive(Debug)]
pub struct TaskletGraph {
    levels: Vec<Vec<Arc<Tasklet>>>,
}

impl TaskletGraph {
    /// The tasklets, grouped by dependency level.
    pub fn levels(&self) -> &[Vec<Arc<Tasklet>>] {
        &self.levels
    }

    /// Total number of tasklets across all levels.
    pub fn tasklet_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Whether this host runs no tasklets at all.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterate over all tasklets in level order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tasklet>> {
        self.levels.iter().flatten()
    }
}

/// Partition `graph` for the host described by `config`.
///
/// Emits one subscription intent per (local consumer, remote producer) pair
/// while walking the graph; intent failures are logged and do not abort
/// construction. Missing evaluators or missing required parameter blocks
/// for a locally scheduled vertex do.
pub(crate) fn partition(
    graph: &RcaGraph,
    config: &HostConfig,
    handles: &SharedHandles,
) -> Result<TaskletGraph> {
    let mut partitioner = Partitioner {
        config,
        handles,
        vertices_by_name: graph
            .vertices()
            .map(|v| (v.name().to_string(), Arc::clone(v)))
            .collect(),
        tasklets_by_name: HashMap::new(),
        next_id: 0,
    };

    let mut merged: Vec<Vec<Arc<Tasklet>>> = Vec::new();
    for component in graph.components() {
        let leveled = partitioner.component_tasklets(component)?;
        merged = merge_levels(merged, leveled);
    }

    tracing::debug!(
        levels = merged.len(),
        routes = handles.router.route_count(),
        "graph partitioned"
    );
    Ok(TaskletGraph { levels: merged })
}

/// Merge two leveled lists index-wise; the longer list absorbs the
/// shorter one's entries at matching depths.
fn merge_levels<T>(mut a: Vec<Vec<T>>, mut b: Vec<Vec<T>>) -> Vec<Vec<T>> {
    if b.len() > a.len() {
        std::mem::swap(&mut a, &mut b);
    }
    for (slot, level) in a.iter_mut().zip(b) {
        slot.extend(level);
    }
    a
}

struct Partitioner<'a> {
    config: &'a HostConfig,
    handles: &'a SharedHandles,
    vertices_by_name: HashMap<String, Arc<Vertex>>,
    /// Local tasklets built so far, for predecessor lookup.
    tasklets_by_name: HashMap<String, Arc<Tasklet>>,
    next_id: u32,
}

impl Partitioner<'_> {
    fn next_id(&mut self) -> TaskletId {
        let id = TaskletId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Walk one component's levels and build its tasklet levels.
    fn component_tasklets(
        &mut self,
        component: &ConnectedComponent,
    ) -> Result<Vec<Vec<Arc<Tasklet>>>> {
        // Membership check for upstream classification: a vertex listed here
        // evaluates locally, anything else is read off the wire.
        let mut locally_executable: HashSet<String> = HashSet::new();
        let mut out: Vec<Vec<Arc<Tasklet>>> = Vec::new();

        for level in component.levels() {
            let mut local_in_level: Vec<Arc<Tasklet>> = Vec::new();
            for vertex in level {
                if self.config.executes_locally(vertex) {
                    locally_executable.insert(vertex.name().to_string());

                    let (tasklet, proxies) =
                        self.build_local_tasklet(vertex, &locally_executable)?;
                    self.tasklets_by_name
                        .insert(vertex.name().to_string(), Arc::clone(&tasklet));
                    local_in_level.push(tasklet);

                    // Proxies must evaluate before their consumer: append
                    // them to the previous output level, or open level 0
                    // when the consumer is the first local vertex.
                    if !proxies.is_empty() {
                        match out.last_mut() {
                            Some(previous) => previous.extend(proxies),
                            None => out.push(proxies),
                        }
                    }
                } else {
                    tracing::debug!(
                        vertex = vertex.name(),
                        "locus not served by this host"
                    );
                    for upstream in vertex.upstreams() {
                        if locally_executable.contains(upstream.as_str()) {
                            // A peer will evaluate this vertex; our part is
                            // delivering the local upstream's output to it.
                            self.handles.router.add_route(upstream, vertex.name());
                        }
                    }
                }
            }
            if !local_in_level.is_empty() {
                out.push(local_in_level);
            }
        }
        Ok(out)
    }

    /// Build the local tasklet for `vertex`, wiring predecessors and
    /// creating remote proxies (with their intents) for upstream data this
    /// host does not produce.
    fn build_local_tasklet(
        &mut self,
        vertex: &Arc<Vertex>,
        locally_executable: &HashSet<String>,
    ) -> Result<(Arc<Tasklet>, Vec<Arc<Tasklet>>)> {
        let params = self.config.params_for(vertex.name()).cloned();
        if vertex.requires_params() && params.is_none() {
            return Err(RcaError::MissingVertexParams {
                vertex: vertex.name().to_string(),
            });
        }

        let eval: Arc<dyn Evaluate> = match vertex.evaluator() {
            Some(eval) => Arc::clone(eval),
            None if vertex.kind() == VertexKind::Metric => Arc::new(MetricPassthrough),
            None => {
                return Err(RcaError::MissingEvaluator {
                    vertex: vertex.name().to_string(),
                })
            }
        };

        let tasklet = Tasklet::new(
            self.next_id(),
            Arc::clone(vertex),
            Evaluator::Local { eval, params },
            self.handles,
        );

        let aggregation_locus = vertex.aggregate_upstream().map(str::to_owned);
        let mut proxies = Vec::new();

        for upstream_name in vertex.upstreams() {
            let upstream = self
                .vertices_by_name
                .get(upstream_name)
                .cloned()
                .ok_or_else(|| RcaError::UnknownUpstream {
                    vertex: vertex.name().to_string(),
                    upstream: upstream_name.clone(),
                })?;

            if locally_executable.contains(upstream_name.as_str()) {
                if let Some(pred) = self.tasklets_by_name.get(upstream_name) {
                    tasklet.add_predecessor(Arc::clone(pred));
                }
                // The upstream also runs on peer hosts matching the
                // aggregation locus: subscribe to their copies too.
                let wants_peer_copies = aggregation_locus
                    .as_deref()
                    .is_some_and(|locus| upstream.loci().contains(&locus));
                if wants_peer_copies {
                    proxies.push(self.add_remote_proxy(&tasklet, vertex, &upstream));
                }
            } else {
                proxies.push(self.add_remote_proxy(&tasklet, vertex, &upstream));
            }
        }
        Ok((tasklet, proxies))
    }

    /// Send the subscription intent for (consumer, producer) and create the
    /// proxy tasklet that will read the producer's data off the wire.
    fn add_remote_proxy(
        &mut self,
        consumer: &Arc<Tasklet>,
        consumer_vertex: &Vertex,
        producer: &Arc<Vertex>,
    ) -> Arc<Tasklet> {
        tracing::debug!(
            consumer = consumer_vertex.name(),
            producer = producer.name(),
            "sending intent to consume remote data"
        );
        let intent = IntentMsg::new(
            consumer_vertex.name(),
            producer.name(),
            producer.tags().clone(),
        );
        if let Err(e) = self.handles.network.send_intent(intent) {
            tracing::warn!(
                consumer = consumer_vertex.name(),
                producer = producer.name(),
                error = %e,
                "intent send failed"
            );
        }

        let proxy = Tasklet::new(
            self.next_id(),
            Arc::clone(producer),
            Evaluator::RemoteProxy,
            self.handles,
        );
        consumer.add_predecessor(Arc::clone(&proxy));
        proxy
    }
}
