pub mod country;
pub mod cursor;
pub mod error;
pub mod huffman;
pub mod master;
pub mod parse;
pub mod segment;
pub mod types;
pub mod wire;

pub use error::{BrowserError, Result};
pub use master::{MasterListState, PacketOutcome};
pub use parse::parse_server_data_block;
pub use segment::{SegmentAssembly, SegmentHeader};
pub use types::{game_mode_for_code, GameMode, PWad, Player, ServerEndpoint, ServerRecord, Team};
