//! Test doubles for the collaborator facades.
//!
//! These mocks let scheduler tests run without a metric reader, a database,
//! or a network stack: canned metric batches, a recording store, an
//! in-memory network facade, and a handful of scripted evaluators.

use crate::error::{RcaError, Result};
use crate::flow_unit::{FlowUnit, RecordBatch};
use crate::traits::{
    EvalContext, EvalFuture, Evaluate, FlowStore, IntentMsg, MetricSource, NetworkFacade,
    SourceFuture, StoreFuture, UpstreamInput,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

// =============================================================================
// Metric source
// =============================================================================

/// Metric source returning canned record batches.
#[derive(Default)]
pub struct MockMetricSource {
    batches: RwLock<HashMap<String, RecordBatch>>,
    reads: RwLock<Vec<String>>,
    fail: AtomicBool,
}

impl MockMetricSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a batch for a vertex, builder style.
    pub fn with_batch(self, vertex: impl Into<String>, batch: RecordBatch) -> Self {
        self.batches.write().insert(vertex.into(), batch);
        self
    }

    /// Stage or replace a batch for a vertex.
    pub fn set_batch(&self, vertex: impl Into<String>, batch: RecordBatch) {
        self.batches.write().insert(vertex.into(), batch);
    }

    /// Make subsequent reads fail.
    pub fn fail_reads(&self, on: bool) {
        self.fail.store(on, Ordering::SeqCst);
    }

    /// Vertices read so far, in order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.read().clone()
    }
}

impl MetricSource for MockMetricSource {
    fn read_metric<'a>(
        &'a self,
        vertex: &'a str,
        _fields: &'a [String],
    ) -> SourceFuture<'a, Result<Option<RecordBatch>>> {
        Box::pin(async move {
            self.reads.write().push(vertex.to_string());
            if self.fail.load(Ordering::SeqCst) {
                return Err(RcaError::MetricRead {
                    vertex: vertex.to_string(),
                    cause: "mock failure".to_string(),
                });
            }
            Ok(self.batches.read().get(vertex).cloned())
        })
    }
}

// =============================================================================
// Persistence store
// =============================================================================

/// Store that records every written flow unit.
#[derive(Default)]
pub struct RecordingStore {
    written: RwLock<Vec<FlowUnit>>,
    fail: AtomicBool,
}

impl RecordingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail.
    pub fn fail_writes(&self, on: bool) {
        self.fail.store(on, Ordering::SeqCst);
    }

    /// All units written so far.
    pub fn written(&self) -> Vec<FlowUnit> {
        self.written.read().clone()
    }

    /// Units written for a specific vertex.
    pub fn written_for(&self, vertex: &str) -> Vec<FlowUnit> {
        self.written
            .read()
            .iter()
            .filter(|u| u.vertex() == vertex)
            .cloned()
            .collect()
    }
}

impl FlowStore for RecordingStore {
    fn write<'a>(&'a self, unit: &'a FlowUnit) -> StoreFuture<'a, Result<()>> {
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RcaError::StoreWrite {
                    cause: "mock failure".to_string(),
                });
            }
            self.written.write().push(unit.clone());
            Ok(())
        })
    }
}

// =============================================================================
// Network facade
// =============================================================================

/// A unit handed to [`NetworkFacade::publish`].
#[derive(Debug, Clone)]
pub struct PublishedUnit {
    /// The producing vertex.
    pub vertex: String,
    /// The published unit.
    pub unit: FlowUnit,
    /// The remote consumers it was addressed to.
    pub destinations: Vec<String>,
}

/// In-memory network facade recording intents and publishes, and serving
/// staged "remote" flow units.
#[derive(Default)]
pub struct MockNetwork {
    intents: RwLock<Vec<IntentMsg>>,
    remote: RwLock<HashMap<String, FlowUnit>>,
    published: RwLock<Vec<PublishedUnit>>,
    fail_intents: AtomicBool,
}

impl MockNetwork {
    /// Create an empty facade.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the most recent remote unit for a vertex.
    pub fn stage_remote(&self, vertex: impl Into<String>, unit: FlowUnit) {
        self.remote.write().insert(vertex.into(), unit);
    }

    /// Drop the staged remote unit for a vertex.
    pub fn clear_remote(&self, vertex: &str) {
        self.remote.write().remove(vertex);
    }

    /// Make subsequent intent sends fail.
    pub fn fail_intents(&self, on: bool) {
        self.fail_intents.store(on, Ordering::SeqCst);
    }

    /// All intents sent so far, in order.
    pub fn intents(&self) -> Vec<IntentMsg> {
        self.intents.read().clone()
    }

    /// All publishes so far, in order.
    pub fn published(&self) -> Vec<PublishedUnit> {
        self.published.read().clone()
    }
}

impl NetworkFacade for MockNetwork {
    fn send_intent(&self, intent: IntentMsg) -> Result<()> {
        if self.fail_intents.load(Ordering::SeqCst) {
            return Err(RcaError::Network {
                cause: "mock intent failure".to_string(),
            });
        }
        self.intents.write().push(intent);
        Ok(())
    }

    fn fetch_remote(&self, vertex: &str) -> Option<FlowUnit> {
        self.remote.read().get(vertex).cloned()
    }

    fn publish(&self, vertex: &str, unit: FlowUnit, destinations: &[String]) {
        self.published.write().push(PublishedUnit {
            vertex: vertex.to_string(),
            unit,
            destinations: destinations.to_vec(),
        });
    }
}

// =============================================================================
// Scripted evaluators
// =============================================================================

/// Evaluator returning the same unit on every invocation.
#[derive(Debug, Clone)]
pub struct FixedEvaluator {
    unit: FlowUnit,
}

impl FixedEvaluator {
    /// Always produce `unit`.
    pub fn new(unit: FlowUnit) -> Self {
        Self { unit }
    }

    /// Always produce the empty unit.
    pub fn empty() -> Self {
        Self::new(FlowUnit::empty())
    }
}

impl Evaluate for FixedEvaluator {
    fn evaluate<'a>(&'a self, _ctx: EvalContext<'a>) -> EvalFuture<'a> {
        Box::pin(async move { Ok(self.unit.clone()) })
    }
}

/// Evaluator re-emitting the records of its first non-empty upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEvaluator;

impl Evaluate for PassthroughEvaluator {
    fn evaluate<'a>(&'a self, ctx: EvalContext<'a>) -> EvalFuture<'a> {
        Box::pin(async move {
            Ok(ctx
                .non_empty_upstreams()
                .next()
                .map(|input| FlowUnit::new(ctx.vertex.name(), input.unit.records().to_vec()))
                .unwrap_or_else(FlowUnit::empty))
        })
    }
}

/// Evaluator that always fails.
#[derive(Debug, Clone)]
pub struct FailingEvaluator {
    message: String,
}

impl FailingEvaluator {
    /// Fail with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Evaluate for FailingEvaluator {
    fn evaluate<'a>(&'a self, ctx: EvalContext<'a>) -> EvalFuture<'a> {
        Box::pin(async move {
            Err(RcaError::Evaluation {
                vertex: ctx.vertex.name().to_string(),
                cause: self.message.clone(),
            })
        })
    }
}

/// Evaluator recording the inputs of every invocation.
pub struct RecordingEvaluator {
    output: FlowUnit,
    calls: Arc<AtomicUsize>,
    observed: Arc<Mutex<Vec<Vec<UpstreamInput>>>>,
}

impl RecordingEvaluator {
    /// Record invocations and produce `output` each time.
    pub fn new(output: FlowUnit) -> Self {
        Self {
            output,
            calls: Arc::new(AtomicUsize::new(0)),
            observed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle counting invocations; grab before handing the evaluator to a
    /// vertex.
    pub fn calls_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Handle to the observed upstream snapshots, one entry per invocation.
    pub fn observed_handle(&self) -> Arc<Mutex<Vec<Vec<UpstreamInput>>>> {
        Arc::clone(&self.observed)
    }
}

impl Evaluate for RecordingEvaluator {
    fn evaluate<'a>(&'a self, ctx: EvalContext<'a>) -> EvalFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.observed.lock().push(ctx.upstreams.to_vec());
            Ok(self.output.clone())
        })
    }
}
