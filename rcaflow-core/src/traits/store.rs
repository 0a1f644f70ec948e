//! Persistence store facade.

use crate::error::Result;
use crate::flow_unit::FlowUnit;
use std::future::Future;
use std::pin::Pin;

/// Type alias for async store futures.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Write access to the on-disk result store.
///
/// Write failures are non-fatal to the scheduler: they are logged and the
/// tick continues.
pub trait FlowStore: Send + Sync {
    /// Persist one produced flow unit.
    fn write<'a>(&'a self, unit: &'a FlowUnit) -> StoreFuture<'a, Result<()>>;
}
