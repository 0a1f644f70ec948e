//! Vertex definitions for the RCA graph.

use crate::traits::Evaluate;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Well-known vertex tags.
pub mod tags {
    /// Tag naming the loci a vertex may run on, `|`-separated.
    pub const TAG_LOCUS: &str = "locus";
    /// Tag naming a locus whose peer copies of an upstream the vertex also
    /// wants delivered.
    pub const TAG_AGGREGATE_UPSTREAM: &str = "aggregate-upstream";
    /// Separator between locus names in the `locus` tag.
    pub const LOCUS_SEPARATOR: char = '|';

    /// Conventional locus for data nodes.
    pub const LOCUS_DATA_NODE: &str = "data-node";
    /// Conventional locus for the cluster manager.
    pub const LOCUS_CLUSTER_MANAGER: &str = "cluster-manager";
}

/// What a vertex computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// Reads raw metric records from the metric source.
    Metric,
    /// Derives a diagnosis from upstream flow units.
    Computed,
    /// Folds upstream diagnoses into a summary.
    Summarizer,
}

/// A static vertex of the RCA graph.
///
/// Vertices are immutable once the graph is built; the scheduler binds them
/// to runtime tasklets at construction time.
#[derive(Clone)]
pub struct Vertex {
    name: String,
    kind: VertexKind,
    tags: HashMap<String, String>,
    upstreams: Vec<String>,
    period: u32,
    fields: Vec<String>,
    evaluator: Option<Arc<dyn Evaluate>>,
    requires_params: bool,
}

impl Vertex {
    fn base(name: impl Into<String>, kind: VertexKind) -> Self {
        Self {
            name: name.into(),
            kind,
            tags: HashMap::new(),
            upstreams: Vec::new(),
            period: 1,
            fields: Vec::new(),
            evaluator: None,
            requires_params: false,
        }
    }

    /// Create a metric vertex reading the given fields from the metric
    /// source. Without an explicit evaluator the prefetched batch is passed
    /// through as the flow unit.
    pub fn metric(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut v = Self::base(name, VertexKind::Metric);
        v.fields = fields.into_iter().map(Into::into).collect();
        v
    }

    /// Create a computed vertex with its evaluation function.
    pub fn computed(name: impl Into<String>, evaluator: impl Evaluate + 'static) -> Self {
        let mut v = Self::base(name, VertexKind::Computed);
        v.evaluator = Some(Arc::new(evaluator));
        v
    }

    /// Create a summarizer vertex with its evaluation function.
    pub fn summarizer(name: impl Into<String>, evaluator: impl Evaluate + 'static) -> Self {
        let mut v = Self::base(name, VertexKind::Summarizer);
        v.evaluator = Some(Arc::new(evaluator));
        v
    }

    /// Set the loci this vertex may run on.
    pub fn with_loci(mut self, loci: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let joined = loci
            .into_iter()
            .map(Into::into)
            .collect::<Vec<_>>()
            .join(&tags::LOCUS_SEPARATOR.to_string());
        self.tags.insert(tags::TAG_LOCUS.to_string(), joined);
        self
    }

    /// Set a single locus.
    pub fn with_locus(self, locus: impl Into<String>) -> Self {
        self.with_loci([locus.into()])
    }

    /// Request peer copies of any upstream that also runs on `locus`.
    pub fn with_aggregate_upstream(mut self, locus: impl Into<String>) -> Self {
        self.tags
            .insert(tags::TAG_AGGREGATE_UPSTREAM.to_string(), locus.into());
        self
    }

    /// Set an arbitrary tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Declare upstream dependencies, in evaluation order.
    pub fn with_upstreams(mut self, upstreams: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.upstreams = upstreams.into_iter().map(Into::into).collect();
        self
    }

    /// Set the tick period (the vertex evaluates every `period` ticks).
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Replace the evaluation function.
    pub fn with_evaluator(mut self, evaluator: impl Evaluate + 'static) -> Self {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    /// Require a parameter block in the host configuration. Scheduling this
    /// vertex locally without one is a configuration error.
    pub fn require_params(mut self) -> Self {
        self.requires_params = true;
        self
    }

    /// The vertex name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The vertex kind.
    pub fn kind(&self) -> VertexKind {
        self.kind
    }

    /// All tags.
    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    /// The loci this vertex may run on, parsed from the `locus` tag.
    /// A missing or empty tag yields no loci.
    pub fn loci(&self) -> Vec<&str> {
        self.tags
            .get(tags::TAG_LOCUS)
            .map(|raw| {
                raw.split(tags::LOCUS_SEPARATOR)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The aggregation locus, if any.
    pub fn aggregate_upstream(&self) -> Option<&str> {
        self.tags.get(tags::TAG_AGGREGATE_UPSTREAM).map(String::as_str)
    }

    /// Upstream vertex names, in evaluation order.
    pub fn upstreams(&self) -> &[String] {
        &self.upstreams
    }

    /// The tick period.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Metric fields read by a [`VertexKind::Metric`] vertex.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The bound evaluation function, if any.
    pub fn evaluator(&self) -> Option<&Arc<dyn Evaluate>> {
        self.evaluator.as_ref()
    }

    /// Whether the vertex requires host-config parameters.
    pub fn requires_params(&self) -> bool {
        self.requires_params
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("tags", &self.tags)
            .field("upstreams", &self.upstreams)
            .field("period", &self.period)
            .field("has_evaluator", &self.evaluator.is_some())
            .finish()
    }
}
