//! UDP transport abstraction. Generalizes this workspace's
//! `net_register_get_packet`/`net_register_send_packet` function-pointer
//! dispatch into a trait object, so the master and server clients stay
//! testable against an in-memory transport instead of a real socket.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use zbrowse_proto::BrowserError;

/// One UDP socket's worth of send/receive, with a deadline baked into the
/// receive call rather than left to the caller to enforce separately.
#[async_trait]
pub trait UdpTransport: Send + Sync {
    async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<(), BrowserError>;

    /// Waits up to `deadline` for one datagram. `Ok(None)` means the
    /// deadline elapsed with nothing received.
    async fn recv_from(&self, deadline: Duration) -> Result<Option<Vec<u8>>, BrowserError>;
}

/// Real-socket transport backed by `tokio::net::UdpSocket`, bound to an
/// ephemeral local port. A fresh instance is created per attempt so no
/// stray buffered packets from a prior attempt leak into the next one.
pub struct TokioUdpTransport {
    socket: tokio::net::UdpSocket,
}

impl TokioUdpTransport {
    pub async fn bind() -> Result<Self, BrowserError> {
        let socket = tokio::net::UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| BrowserError::TransportFailed(e.to_string()))?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl UdpTransport for TokioUdpTransport {
    async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<(), BrowserError> {
        self.socket
            .send_to(data, target)
            .await
            .map_err(|e| BrowserError::TransportFailed(e.to_string()))?;
        Ok(())
    }

    async fn recv_from(&self, deadline: Duration) -> Result<Option<Vec<u8>>, BrowserError> {
        let mut buf = vec![0u8; 65_527];
        match tokio::time::timeout(deadline, self.socket.recv_from(&mut buf)).await {
            Ok(Ok((n, _from))) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Ok(Err(e)) => Err(BrowserError::TransportFailed(e.to_string())),
            Err(_elapsed) => Ok(None),
        }
    }
}

/// Produces a fresh transport per call, so a master-client retry or a
/// fan-out query never inherits another attempt's stray buffered packets.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn bind(&self) -> Result<Box<dyn UdpTransport>, BrowserError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTransportFactory;

#[async_trait]
impl TransportFactory for TokioTransportFactory {
    async fn bind(&self) -> Result<Box<dyn UdpTransport>, BrowserError> {
        Ok(Box::new(TokioUdpTransport::bind().await?))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::VecDeque;
    use parking_lot::Mutex;

    /// In-memory transport for tests: queues of outgoing sends and
    /// scripted incoming datagrams, no real socket involved.
    #[derive(Default)]
    pub struct FakeTransport {
        pub sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
        pub incoming: Mutex<VecDeque<Vec<u8>>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_incoming(&self, datagram: Vec<u8>) {
            self.incoming.lock().push_back(datagram);
        }
    }

    #[async_trait]
    impl UdpTransport for FakeTransport {
        async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<(), BrowserError> {
            self.sent.lock().push((data.to_vec(), target));
            Ok(())
        }

        async fn recv_from(&self, _deadline: Duration) -> Result<Option<Vec<u8>>, BrowserError> {
            Ok(self.incoming.lock().pop_front())
        }
    }
}
