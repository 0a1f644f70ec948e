//! Host configuration.
//!
//! A YAML document describing which loci the host serves, the scheduler
//! cadence, initially muted vertices, and per-vertex parameter blocks:
//!
//! ```yaml
//! host_id: node-1
//! loci: [data-node]
//! tick_period_ms: 5000
//! muted: [hot-shard]
//! vertices:
//!   hot-shard:
//!     threshold: 0.8
//! ```

use crate::context::HostContext;
use crate::error::{RcaError, Result};
use crate::graph::Vertex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

fn default_tick_period_ms() -> u64 {
    5_000
}

/// Parsed host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Unique identifier of this host.
    pub host_id: String,

    /// Loci this host serves; vertices whose `locus` tag intersects this
    /// set are scheduled locally.
    #[serde(default)]
    pub loci: Vec<String>,

    /// Cadence of the scheduler loop in milliseconds.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Vertices muted at startup.
    #[serde(default)]
    pub muted: Vec<String>,

    /// Per-vertex parameter blocks (thresholds, tuning knobs).
    #[serde(default)]
    pub vertices: HashMap<String, serde_yaml::Value>,
}

impl HostConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| RcaError::YamlParse {
            path: None,
            cause: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| RcaError::YamlParse {
            path: Some(path.to_path_buf()),
            cause: e.to_string(),
        })?;
        let config: Self = serde_yaml::from_str(&raw).map_err(|e| RcaError::YamlParse {
            path: Some(path.to_path_buf()),
            cause: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.host_id.is_empty() {
            return Err(RcaError::ConfigValue {
                field: "host_id".to_string(),
                cause: "must not be empty".to_string(),
            });
        }
        if self.tick_period_ms == 0 {
            return Err(RcaError::ConfigValue {
                field: "tick_period_ms".to_string(),
                cause: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Locality test: a vertex runs here iff its locus set intersects the
    /// host's loci. Vertices without a `locus` tag never run locally.
    pub fn executes_locally(&self, vertex: &Vertex) -> bool {
        vertex
            .loci()
            .iter()
            .any(|locus| self.loci.iter().any(|l| l == locus))
    }

    /// The parameter block configured for a vertex, if any.
    pub fn params_for(&self, vertex: &str) -> Option<&serde_yaml::Value> {
        self.vertices.get(vertex)
    }

    /// Derive the runtime host context.
    pub fn host_context(&self) -> HostContext {
        HostContext::new(&self.host_id, self.loci.iter().cloned())
    }
}
