//! Optional observer hooks. Every method has a no-op default so the core
//! is fully usable without wiring up an event system.

use zbrowse_proto::{ServerEndpoint, ServerRecord};

pub trait BrowserEvents: Send + Sync {
    /// One server endpoint was read out of a reassembled master response.
    fn on_server_found(&self, _endpoint: ServerEndpoint) {}

    /// A master-list refresh finished (successfully or with a recoverable
    /// partial result); `count` is the number of endpoints collected.
    fn on_refresh_completed(&self, _count: usize) {}

    /// One server query finished; `success` mirrors `record.is_online`.
    fn on_server_queried(&self, _record: &ServerRecord, _success: bool) {}
}

/// Observer that does nothing; the default when a caller doesn't need one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl BrowserEvents for NoopEvents {}
