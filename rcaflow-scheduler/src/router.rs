//! Outbound routing of locally produced flow units to remote consumers.

use parking_lot::RwLock;
use rcaflow_core::flow_unit::FlowUnit;
use rcaflow_core::traits::NetworkFacade;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Index from a local producer vertex to the remote consumer vertices that
/// subscribed to its output.
///
/// Populated while the graph is partitioned; read-only afterwards. At tick
/// time, tasklets hand produced units here and the router passes them to the
/// network facade without waiting for delivery.
pub struct OutboundRouter {
    network: Arc<dyn NetworkFacade>,
    routes: RwLock<HashMap<String, Vec<String>>>,
}

impl OutboundRouter {
    /// Create an empty router on top of the given facade.
    pub fn new(network: Arc<dyn NetworkFacade>) -> Self {
        Self {
            network,
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Record that `consumer` (remote) wants `producer`'s (local) output.
    pub(crate) fn add_route(&self, producer: &str, consumer: &str) {
        let mut routes = self.routes.write();
        let consumers = routes.entry(producer.to_string()).or_default();
        if !consumers.iter().any(|c| c == consumer) {
            consumers.push(consumer.to_string());
        }
    }

    /// The remote consumers recorded for a producer, if any.
    pub fn destinations(&self, producer: &str) -> Option<Vec<String>> {
        self.routes.read().get(producer).cloned()
    }

    /// Number of producers with at least one remote consumer.
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Whether no vertex has remote consumers.
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Hand a produced unit to the network facade if anyone subscribed.
    /// Fire-and-forget: the router does not block on delivery.
    pub fn forward(&self, producer: &str, unit: &FlowUnit) {
        let destinations = self.routes.read().get(producer).cloned();
        if let Some(destinations) = destinations {
            tracing::debug!(
                vertex = producer,
                consumers = destinations.len(),
                "forwarding flow unit to remote consumers"
            );
            self.network.publish(producer, unit.clone(), &destinations);
        }
    }
}

impl fmt::Debug for OutboundRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundRouter")
            .field("routes", &*self.routes.read())
            .finish()
    }
}
