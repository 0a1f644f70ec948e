//! Network facade ("hopper") for cross-host data routing.

use crate::error::Result;
use crate::flow_unit::FlowUnit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subscription request from a consumer host to a producer host.
///
/// Asks that the producer's flow units be delivered to this host whenever
/// new ones are generated. The producer's tags travel along so the far side
/// can resolve which hosts actually run the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMsg {
    /// The vertex that wants the data.
    pub consumer: String,
    /// The vertex whose data is wanted.
    pub producer: String,
    /// The producer's tags (notably its loci).
    pub producer_tags: HashMap<String, String>,
}

impl IntentMsg {
    /// Create an intent for the given consumer/producer pair.
    pub fn new(
        consumer: impl Into<String>,
        producer: impl Into<String>,
        producer_tags: HashMap<String, String>,
    ) -> Self {
        Self {
            consumer: consumer.into(),
            producer: producer.into(),
            producer_tags,
        }
    }
}

/// Peer communication capability.
///
/// The facade owns peer discovery, framing, and wire serialization; the
/// scheduler only hands it intents and flow units. Implementations must make
/// `send_intent` idempotent: the same consumer/producer pair may be
/// subscribed more than once across scheduler reconstructions.
pub trait NetworkFacade: Send + Sync {
    /// Subscribe to a remote producer's flow units. Dispatched synchronously
    /// during scheduler construction; failures are logged by the caller and
    /// do not abort construction.
    fn send_intent(&self, intent: IntentMsg) -> Result<()>;

    /// Non-blocking read of the most recent flow unit cached for `vertex`.
    fn fetch_remote(&self, vertex: &str) -> Option<FlowUnit>;

    /// Fire-and-forget delivery of a locally produced unit to the hosts
    /// running `destinations`.
    fn publish(&self, vertex: &str, unit: FlowUnit, destinations: &[String]);
}
