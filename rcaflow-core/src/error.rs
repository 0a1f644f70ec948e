//! Error types for rcaflow.
//!
//! This module provides strongly-typed errors with actionable context.
//! Construction-time errors (graph shape, host configuration) are the only
//! errors that surface to callers; everything that happens inside a tick is
//! logged and contained by the scheduler.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rcaflow operations.
#[derive(Error, Debug)]
pub enum RcaError {
    // =========================================================================
    // Graph Errors (E001-E099)
    // =========================================================================
    /// A vertex name was registered twice.
    #[error("E001: Duplicate vertex '{name}' in graph")]
    DuplicateVertex {
        /// The name that was registered twice.
        name: String,
    },

    /// A vertex references an upstream that does not exist.
    #[error("E002: Vertex '{vertex}' references unknown upstream '{upstream}'")]
    UnknownUpstream {
        /// The vertex declaring the dependency.
        vertex: String,
        /// The upstream name that could not be resolved.
        upstream: String,
    },

    /// The upstream relation contains a cycle.
    #[error("E003: Cycle detected involving vertices: {vertices:?}")]
    GraphCycle {
        /// The vertices involved in the cycle.
        vertices: Vec<String>,
    },

    /// A vertex declared a tick period of zero.
    #[error("E004: Vertex '{vertex}' has invalid tick period {period}")]
    InvalidPeriod {
        /// The offending vertex.
        vertex: String,
        /// The declared period.
        period: u32,
    },

    // =========================================================================
    // Configuration Errors (E100-E199)
    // =========================================================================
    /// YAML parsing failed.
    #[error("E101: Failed to parse host configuration{}: {cause}", path_suffix(.path))]
    YamlParse {
        /// The path to the YAML file, when loaded from disk.
        path: Option<PathBuf>,
        /// Reason for the parse failure.
        cause: String,
    },

    /// Invalid configuration value.
    #[error("E102: Invalid configuration '{field}': {cause}")]
    ConfigValue {
        /// The configuration field with the invalid value.
        field: String,
        /// Description of why the value is invalid.
        cause: String,
    },

    /// A locally scheduled vertex requires parameters the host config lacks.
    #[error("E103: No parameters configured for vertex '{vertex}'")]
    MissingVertexParams {
        /// The vertex whose parameters are missing.
        vertex: String,
    },

    /// A locally scheduled vertex has no evaluation function.
    #[error("E104: No evaluator bound to vertex '{vertex}'")]
    MissingEvaluator {
        /// The vertex without an evaluator.
        vertex: String,
    },

    // =========================================================================
    // Evaluation Errors (E200-E299)
    // =========================================================================
    /// A vertex evaluator failed.
    #[error("E201: Evaluation of vertex '{vertex}' failed: {cause}")]
    Evaluation {
        /// The vertex whose evaluator failed.
        vertex: String,
        /// Reason for the failure.
        cause: String,
    },

    // =========================================================================
    // I/O Errors (E300-E399)
    // =========================================================================
    /// Reading from the metric source failed.
    #[error("E301: Metric read for vertex '{vertex}' failed: {cause}")]
    MetricRead {
        /// The vertex whose metrics were requested.
        vertex: String,
        /// Reason for the failure.
        cause: String,
    },

    /// Persisting a flow unit failed.
    #[error("E302: Flow unit write failed: {cause}")]
    StoreWrite {
        /// Reason for the failure.
        cause: String,
    },

    /// A network facade operation failed.
    #[error("E303: Network error: {cause}")]
    Network {
        /// Description of the network error.
        cause: String,
    },

    // =========================================================================
    // Lifecycle Errors (E400-E499)
    // =========================================================================
    /// The worker pool refused a submission.
    #[error("E401: Worker pool is closed")]
    PoolClosed,
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" at {}", p.display()),
        None => String::new(),
    }
}

impl RcaError {
    /// Get the stable error code (e.g., "E001").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateVertex { .. } => "E001",
            Self::UnknownUpstream { .. } => "E002",
            Self::GraphCycle { .. } => "E003",
            Self::InvalidPeriod { .. } => "E004",
            Self::YamlParse { .. } => "E101",
            Self::ConfigValue { .. } => "E102",
            Self::MissingVertexParams { .. } => "E103",
            Self::MissingEvaluator { .. } => "E104",
            Self::Evaluation { .. } => "E201",
            Self::MetricRead { .. } => "E301",
            Self::StoreWrite { .. } => "E302",
            Self::Network { .. } => "E303",
            Self::PoolClosed => "E401",
        }
    }

    /// Check if this error is a graph or configuration error.
    ///
    /// These are the errors that abort scheduler construction; everything
    /// else is contained at tick time.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateVertex { .. }
                | Self::UnknownUpstream { .. }
                | Self::GraphCycle { .. }
                | Self::InvalidPeriod { .. }
                | Self::YamlParse { .. }
                | Self::ConfigValue { .. }
                | Self::MissingVertexParams { .. }
                | Self::MissingEvaluator { .. }
        )
    }

    /// Check if this error came from a collaborator I/O path.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::MetricRead { .. } | Self::StoreWrite { .. } | Self::Network { .. }
        )
    }
}

/// Result type alias using [`RcaError`].
pub type Result<T> = std::result::Result<T, RcaError>;
