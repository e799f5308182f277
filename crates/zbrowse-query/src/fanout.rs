//! Bounded-concurrency fan-out over a list of server endpoints, driven by
//! a single [`crate::server_client::ServerClient`] and a shared
//! [`tokio::sync::Semaphore`] permit pool.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use zbrowse_proto::types::{ServerEndpoint, ServerRecord};

use crate::cancel::CancelToken;
use crate::server_client::ServerClient;

/// Query every endpoint in `endpoints`, at most `max_concurrent` at a
/// time, stopping early (without cancelling in-flight queries) when
/// `cancel` fires. Order of the returned records is unspecified; callers
/// that need a particular order should sort on `ServerRecord::endpoint`.
pub async fn query_servers(
    client: Arc<ServerClient>,
    endpoints: Vec<ServerEndpoint>,
    max_concurrent: u32,
    cancel: CancelToken,
) -> Vec<ServerRecord> {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1) as usize));
    let mut tasks = JoinSet::new();

    for endpoint in endpoints {
        if cancel.is_cancelled() {
            break;
        }
        let client = client.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return None, // semaphore closed, fan-out is shutting down
            };
            Some(client.query_server(endpoint, &cancel).await)
        });
    }

    let mut records = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => log::warn!("server query task panicked: {e}"),
        }
    }
    records
}
