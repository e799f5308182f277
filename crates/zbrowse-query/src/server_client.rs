//! Per-server query exchange: challenge, then dispatch on the response
//! code to either a single-packet server data block or a segmented one
//! that must be reassembled first. Never fails the caller — every outcome
//! is captured into the returned [`ServerRecord`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use zbrowse_proto::cursor::Cursor;
use zbrowse_proto::error::BrowserError;
use zbrowse_proto::parse::parse_server_data_block;
use zbrowse_proto::segment::{SegmentAssembly, SegmentHeader};
use zbrowse_proto::types::{ServerEndpoint, ServerRecord};
use zbrowse_proto::wire::{self, ExtendedQueryFlags, QueryFlags, ServerResponseCode};
use zbrowse_proto::huffman;

use crate::cancel::CancelToken;
use crate::clock::{Clock, SystemClock};
use crate::config::BrowserConfig;
use crate::events::{BrowserEvents, NoopEvents};
use crate::transport::{TokioTransportFactory, TransportFactory};

pub struct ServerClient {
    config: BrowserConfig,
    events: Arc<dyn BrowserEvents>,
    clock: Arc<dyn Clock>,
    transport_factory: Arc<dyn TransportFactory>,
}

impl ServerClient {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            events: Arc::new(NoopEvents),
            clock: Arc::new(SystemClock),
            transport_factory: Arc::new(TokioTransportFactory),
        }
    }

    pub fn with_parts(
        config: BrowserConfig,
        events: Arc<dyn BrowserEvents>,
        clock: Arc<dyn Clock>,
        transport_factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            config,
            events,
            clock,
            transport_factory,
        }
    }

    /// Always returns a populated record; network and parse failures are
    /// captured into it rather than propagated.
    pub async fn query_server(
        &self,
        endpoint: ServerEndpoint,
        cancel: &CancelToken,
    ) -> ServerRecord {
        let mut record = ServerRecord::new(endpoint);
        if let Err(e) = self.run(endpoint, cancel, &mut record).await {
            if !record.is_queried {
                record.error_message = Some(e.to_string());
            }
            if matches!(e, BrowserError::Cancelled) {
                record.error_message = Some(BrowserError::Cancelled.to_string());
            }
        }
        self.events.on_server_queried(&record, record.is_online);
        record
    }

    async fn run(
        &self,
        endpoint: ServerEndpoint,
        cancel: &CancelToken,
        record: &mut ServerRecord,
    ) -> Result<(), BrowserError> {
        let transport = self.transport_factory.bind().await?;
        let target = SocketAddr::new(endpoint.ip.into(), endpoint.port);

        let mut challenge = wire::SERVER_CHALLENGE.to_le_bytes().to_vec();
        challenge.extend_from_slice(&QueryFlags::standard().bits().to_le_bytes());
        challenge.extend_from_slice(&ms_of_day().to_le_bytes());
        challenge.extend_from_slice(&ExtendedQueryFlags::standard().bits().to_le_bytes());
        challenge.push(0x00); // segmentation preference: don't care

        let encoded = huffman::encode(&challenge)?;
        record.query_sent_at = Some(self.clock.now());
        transport.send_to(&encoded, target).await?;

        let deadline = Duration::from_millis(self.config.server_query_timeout_ms as u64);
        let started = Instant::now();
        let mut assembly: Option<SegmentAssembly> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(BrowserError::Cancelled);
            }
            let elapsed = started.elapsed();
            if elapsed >= deadline {
                return Err(BrowserError::Timeout);
            }
            let remaining = deadline - elapsed;

            let datagram = tokio::select! {
                res = transport.recv_from(remaining) => res?,
                _ = cancel.cancelled() => return Err(BrowserError::Cancelled),
            };
            let Some(raw) = datagram else {
                return Err(BrowserError::Timeout);
            };

            let decoded = huffman::decode(&raw)?;
            let mut cursor = Cursor::new(&decoded);
            let code = cursor.read_i32_le()?;

            match ServerResponseCode::from_i32(code) {
                Some(ServerResponseCode::Banned) => {
                    record.is_queried = true;
                    record.is_online = false;
                    record.error_message = Some("Banned from server".to_string());
                    record.response_received_at = Some(self.clock.now());
                    return Ok(());
                }
                Some(ServerResponseCode::Wait) => {
                    record.is_queried = true;
                    record.is_online = true;
                    record.error_message = Some("Server busy".to_string());
                    record.response_received_at = Some(self.clock.now());
                    return Ok(());
                }
                Some(ServerResponseCode::GoodSingle) => {
                    cursor.read_u32_le()?; // timestamp echo, unused locally
                    self.finish(record, cursor.remaining_slice());
                    return Ok(());
                }
                Some(ServerResponseCode::GoodSegmented) => {
                    let header = SegmentHeader::parse(&mut cursor)?;
                    let payload = cursor.read_bytes(header.segment_size as usize)?;
                    let total_segments = header.total_segments;
                    let total_size = header.total_size;
                    let slot = assembly
                        .get_or_insert_with(|| SegmentAssembly::new(total_size, total_segments));
                    slot.place(header, payload);
                    if slot.is_complete() {
                        let buffer = assembly.take().unwrap().into_buffer();
                        let body = if buffer.len() >= 4 { &buffer[4..] } else { &[][..] };
                        self.finish(record, body);
                        return Ok(());
                    }
                }
                None => {} // unrecognized code, keep listening until timeout
            }
        }
    }

    fn finish(&self, record: &mut ServerRecord, body: &[u8]) {
        let endpoint = record.endpoint;
        let query_sent_at = record.query_sent_at;
        let response_received_at = self.clock.now();

        let mut parsed = parse_server_data_block(body, endpoint);
        parsed.query_sent_at = query_sent_at;
        parsed.response_received_at = Some(response_received_at);
        parsed.ping_ms = query_sent_at
            .map(|sent| response_received_at.saturating_duration_since(sent).as_millis() as i32)
            .unwrap_or(-1);

        *record = parsed;
    }
}

fn ms_of_day() -> u32 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    (now.as_millis() % 86_400_000) as u32
}
