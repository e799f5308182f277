//! Network drivers for Zandronum-style server discovery: a master-list
//! client, a per-server query client, and a bounded-concurrency fan-out
//! helper built on top of both.

pub mod cancel;
pub mod clock;
pub mod config;
pub mod events;
pub mod fanout;
pub mod master_client;
pub mod server_client;
pub mod transport;

pub use cancel::CancelToken;
pub use clock::{Clock, SystemClock};
pub use config::BrowserConfig;
pub use events::{BrowserEvents, NoopEvents};
pub use fanout::query_servers;
pub use master_client::MasterClient;
pub use server_client::ServerClient;
pub use transport::{TokioTransportFactory, TokioUdpTransport, TransportFactory, UdpTransport};

pub use zbrowse_proto::{BrowserError, Result};
