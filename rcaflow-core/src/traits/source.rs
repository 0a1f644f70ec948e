//! Metric source facade.

use crate::error::Result;
use crate::flow_unit::RecordBatch;
use std::future::Future;
use std::pin::Pin;

/// Type alias for async metric source futures.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read access to the host's current metric samples.
///
/// Reads may block on I/O and may return no data without that being an
/// error; the scheduler treats `Ok(None)` as "nothing this tick".
pub trait MetricSource: Send + Sync {
    /// Read the latest records for `vertex`, restricted to `fields`.
    fn read_metric<'a>(
        &'a self,
        vertex: &'a str,
        fields: &'a [String],
    ) -> SourceFuture<'a, Result<Option<RecordBatch>>>;
}
