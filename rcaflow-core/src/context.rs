//! Host identity attached to every evaluation.

/// Identity and deployment role of the executing host.
///
/// Attached to each tasklet at construction so that tick-time evaluations
/// see the loci the host was configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    host_id: String,
    loci: Vec<String>,
}

impl HostContext {
    /// Create a host context.
    pub fn new(host_id: impl Into<String>, loci: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            host_id: host_id.into(),
            loci: loci.into_iter().map(Into::into).collect(),
        }
    }

    /// The host's unique identifier.
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// The loci this host serves.
    pub fn loci(&self) -> &[String] {
        &self.loci
    }

    /// Whether the host serves the given locus.
    pub fn serves_locus(&self, locus: &str) -> bool {
        self.loci.iter().any(|l| l == locus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locus_membership() {
        let ctx = HostContext::new("node-1", ["data-node"]);
        assert_eq!(ctx.host_id(), "node-1");
        assert!(ctx.serves_locus("data-node"));
        assert!(!ctx.serves_locus("cluster-manager"));
    }
}
