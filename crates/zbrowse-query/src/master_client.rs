//! Master-server discovery exchange: challenge, then receive loop feeding
//! a [`MasterListState`] until the list is complete, a fatal response code
//! arrives, or the overall timeout elapses. Retried at the
//! [`MasterClient::get_server_list`] level; a single attempt lives in
//! [`MasterClient::attempt`].

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use zbrowse_proto::error::BrowserError;
use zbrowse_proto::master::{MasterListState, PacketOutcome};
use zbrowse_proto::types::ServerEndpoint;
use zbrowse_proto::{huffman, wire};

use crate::cancel::CancelToken;
use crate::config::BrowserConfig;
use crate::events::{BrowserEvents, NoopEvents};
use crate::transport::{TokioTransportFactory, TransportFactory};

pub struct MasterClient {
    config: BrowserConfig,
    events: Arc<dyn BrowserEvents>,
    transport_factory: Arc<dyn TransportFactory>,
}

impl MasterClient {
    pub fn new(config: BrowserConfig) -> Self {
        Self::with_transport_factory(config, Arc::new(TokioTransportFactory))
    }

    pub fn with_events(config: BrowserConfig, events: Arc<dyn BrowserEvents>) -> Self {
        Self {
            config,
            events,
            transport_factory: Arc::new(TokioTransportFactory),
        }
    }

    pub fn with_transport_factory(
        config: BrowserConfig,
        transport_factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            config,
            events: Arc::new(NoopEvents),
            transport_factory,
        }
    }

    pub fn with_events_and_transport_factory(
        config: BrowserConfig,
        events: Arc<dyn BrowserEvents>,
        transport_factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            config,
            events,
            transport_factory,
        }
    }

    /// Run the master exchange, retrying transport/timeout failures up to
    /// `master_retry_count` times. `Banned`, `WrongVersion`, and
    /// `Cancelled` are fatal and never retried.
    pub async fn get_server_list(
        &self,
        cancel: &CancelToken,
    ) -> Result<Vec<ServerEndpoint>, BrowserError> {
        let mut last_err: Option<BrowserError> = None;

        for attempt in 0..self.config.master_retry_count {
            if cancel.is_cancelled() {
                return Err(BrowserError::Cancelled);
            }

            match self.attempt(cancel).await {
                Ok(endpoints) => {
                    self.events.on_refresh_completed(endpoints.len());
                    return Ok(endpoints);
                }
                Err(e @ BrowserError::Banned(_))
                | Err(e @ BrowserError::WrongVersion)
                | Err(e @ BrowserError::Cancelled) => return Err(e),
                Err(e) => {
                    log::debug!("master exchange attempt {attempt} failed: {e}");
                    last_err = Some(e);
                    if attempt + 1 < self.config.master_retry_count {
                        let delay = Duration::from_millis(self.config.query_retry_delay_ms as u64);
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = cancel.cancelled() => return Err(BrowserError::Cancelled),
                        }
                    }
                }
            }
        }

        Err(last_err.unwrap_or(BrowserError::Timeout))
    }

    async fn attempt(&self, cancel: &CancelToken) -> Result<Vec<ServerEndpoint>, BrowserError> {
        let host = self.config.master_host.clone();
        let master_ip = resolve_ipv4(host).await?;
        let target = SocketAddr::new(master_ip.into(), self.config.master_port);

        let transport = self.transport_factory.bind().await?;

        let mut challenge = wire::MASTER_CHALLENGE.to_le_bytes().to_vec();
        challenge.extend_from_slice(&wire::MASTER_PROTOCOL_VERSION.to_le_bytes());
        let encoded = huffman::encode(&challenge)?;
        transport.send_to(&encoded, target).await?;

        let overall_deadline = Duration::from_millis(3 * self.config.default_timeout_ms as u64);
        let started = Instant::now();
        let mut state = MasterListState::new();

        loop {
            if cancel.is_cancelled() {
                return Err(BrowserError::Cancelled);
            }
            let elapsed = started.elapsed();
            if elapsed >= overall_deadline {
                break;
            }
            let remaining = overall_deadline - elapsed;

            let datagram = tokio::select! {
                res = transport.recv_from(remaining) => res?,
                _ = cancel.cancelled() => return Err(BrowserError::Cancelled),
            };
            let Some(raw) = datagram else {
                break; // receive deadline elapsed
            };

            let decoded = huffman::decode(&raw)?;
            let events = &self.events;
            let outcome = state.ingest_packet(&decoded, |ep| events.on_server_found(ep))?;
            if outcome == PacketOutcome::Bad {
                continue;
            }
            if state.is_complete() {
                break;
            }
        }

        if state.is_complete() {
            Ok(state.into_endpoints())
        } else if !state.endpoints().is_empty() {
            log::warn!(
                "master receive loop timed out with {} server(s) collected across {} packet(s); returning partial list",
                state.endpoints().len(),
                state.packets_seen(),
            );
            Ok(state.into_endpoints())
        } else {
            Err(BrowserError::Timeout)
        }
    }
}

async fn resolve_ipv4(host: String) -> Result<Ipv4Addr, BrowserError> {
    tokio::task::spawn_blocking(move || {
        (host.as_str(), 0u16)
            .to_socket_addrs()
            .map_err(|e| BrowserError::ResolveFailed(e.to_string()))?
            .find_map(|addr| match addr {
                SocketAddr::V4(v4) => Some(*v4.ip()),
                SocketAddr::V6(_) => None,
            })
            .ok_or_else(|| BrowserError::ResolveFailed(format!("no IPv4 address for {host}")))
    })
    .await
    .map_err(|e| BrowserError::ResolveFailed(e.to_string()))?
}
