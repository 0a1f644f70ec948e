//! Flow units: the per-tick output records of graph vertices.
//!
//! A vertex produces one flow unit per evaluation. Vertices that are not due
//! on a tick, are muted, or fail to evaluate emit the *empty* unit, which
//! downstream evaluators must tolerate.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// A single row of named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, consuming and returning the record.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Set a field in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Get a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a field as f64.
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Iterate over fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A batch of records, as returned by the metric source.
pub type RecordBatch = Vec<Record>;

/// The output of one vertex evaluation.
///
/// The empty unit (no records) stands in for "nothing produced this tick".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowUnit {
    /// Vertex that produced the unit.
    vertex: String,
    /// Production time, milliseconds since the Unix epoch. Zero for the
    /// empty unit.
    timestamp_ms: u64,
    /// The produced rows.
    records: Vec<Record>,
}

impl FlowUnit {
    /// Create a flow unit with the given records, stamped now.
    pub fn new(vertex: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            vertex: vertex.into(),
            timestamp_ms: now_millis(),
            records,
        }
    }

    /// Create a flow unit with a single record.
    pub fn single(vertex: impl Into<String>, record: Record) -> Self {
        Self::new(vertex, vec![record])
    }

    /// Create a flow unit from a metric record batch.
    pub fn from_batch(vertex: impl Into<String>, batch: RecordBatch) -> Self {
        Self::new(vertex, batch)
    }

    /// The empty unit.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether this is the empty unit.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The producing vertex name. Empty string for the empty unit.
    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    /// Production timestamp in milliseconds since the Unix epoch.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// The produced records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// First record, if any.
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_unit_has_no_records() {
        let unit = FlowUnit::empty();
        assert!(unit.is_empty());
        assert_eq!(unit.timestamp_ms(), 0);
        assert_eq!(unit.records().len(), 0);
    }

    #[test]
    fn unit_with_records_is_not_empty() {
        let unit = FlowUnit::single("cpu", Record::new().with("avg", 0.4));
        assert!(!unit.is_empty());
        assert_eq!(unit.vertex(), "cpu");
        assert!(unit.timestamp_ms() > 0);
        assert_eq!(unit.first().unwrap().get_f64("avg"), Some(0.4));
    }

    #[test]
    fn record_field_access() {
        let record = Record::new().with("avg", 0.25).with("host", "node-1");
        assert_eq!(record.get_f64("avg"), Some(0.25));
        assert_eq!(record.get("host").and_then(Value::as_str), Some("node-1"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn unit_serde_roundtrip() {
        let unit = FlowUnit::single("cpu", Record::new().with("avg", 0.4));
        let json = serde_json::to_string(&unit).unwrap();
        let back: FlowUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, unit);
    }
}
