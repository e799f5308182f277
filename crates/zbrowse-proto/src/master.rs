//! Master-response reassembly: a packet-oriented state machine that
//! tolerates out-of-order and duplicate packets. Pure and network-free so
//! it can be fed captured or synthetic datagrams directly in tests; the
//! master client only owns the socket and retry loop around it.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::cursor::Cursor;
use crate::error::BrowserError;
use crate::types::ServerEndpoint;

const MASTER_RESPONSE_BANNED: i32 = 3;
const MASTER_RESPONSE_BAD: i32 = 4;
const MASTER_RESPONSE_WRONG_VERSION: i32 = 5;
const MASTER_RESPONSE_BEGIN_PART: i32 = 6;
const MASTER_RESPONSE_END: u8 = 2;
const MASTER_RESPONSE_END_PART: u8 = 7;

/// What happened when one decoded datagram was handed to [`MasterListState::ingest_packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    /// A new `BeginPart` packet was accepted and its blocks consumed.
    Accepted,
    /// A `BeginPart` packet with a `packet_num` already seen; ignored.
    Duplicate,
    /// A `Bad` response; the caller should keep listening.
    Bad,
    /// Any other response code outside this exchange; ignored.
    Pending,
}

/// Accumulates the server list across one or more reassembled packets.
#[derive(Debug, Default)]
pub struct MasterListState {
    endpoints: Vec<ServerEndpoint>,
    seen_packets: HashSet<u8>,
    expected_packets: u16,
    read_last_packet: bool,
}

impl MasterListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoints(&self) -> &[ServerEndpoint] {
        &self.endpoints
    }

    pub fn into_endpoints(self) -> Vec<ServerEndpoint> {
        self.endpoints
    }

    /// True once an `End` marker has been read and every packet it implied
    /// (by highest `packet_num + 1`) has been seen.
    pub fn is_complete(&self) -> bool {
        self.read_last_packet && self.seen_packets.len() as u16 >= self.expected_packets
    }

    pub fn packets_seen(&self) -> usize {
        self.seen_packets.len()
    }

    /// Feed one decoded datagram. `on_found` is invoked once per endpoint
    /// in wire order, before this call returns.
    pub fn ingest_packet(
        &mut self,
        payload: &[u8],
        mut on_found: impl FnMut(ServerEndpoint),
    ) -> Result<PacketOutcome, BrowserError> {
        let mut cursor = Cursor::new(payload);
        let code = cursor.read_i32_le()?;

        if code == MASTER_RESPONSE_BANNED {
            return Err(BrowserError::Banned(
                "master server refused this client".to_string(),
            ));
        }
        if code == MASTER_RESPONSE_BAD {
            return Ok(PacketOutcome::Bad);
        }
        if code == MASTER_RESPONSE_WRONG_VERSION {
            return Err(BrowserError::WrongVersion);
        }
        if code != MASTER_RESPONSE_BEGIN_PART {
            return Ok(PacketOutcome::Pending);
        }

        let packet_num = cursor.read_u8()?;
        if self.seen_packets.contains(&packet_num) {
            return Ok(PacketOutcome::Duplicate);
        }
        self.seen_packets.insert(packet_num);
        self.expected_packets = self.expected_packets.max(packet_num as u16 + 1);

        loop {
            let count = match cursor.read_u8() {
                Ok(b) => b,
                Err(_) => break, // truncated packet: stop at whatever was read
            };
            if count == MASTER_RESPONSE_END_PART {
                break;
            }
            if count == MASTER_RESPONSE_END {
                self.read_last_packet = true;
                break;
            }

            let ip_bytes = cursor.read_bytes(4)?;
            let ip = Ipv4Addr::new(ip_bytes[0], ip_bytes[1], ip_bytes[2], ip_bytes[3]);
            for _ in 0..count {
                let port = cursor.read_u16_le()?;
                let endpoint = ServerEndpoint::new(ip, port);
                self.endpoints.push(endpoint);
                on_found(endpoint);
            }
        }

        Ok(PacketOutcome::Accepted)
    }
}
