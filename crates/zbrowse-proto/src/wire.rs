//! Constants and flag masks fixed by the wire protocol. Nothing here is
//! negotiable at runtime; change a value and you can no longer talk to a
//! real master or game server.

// ============================================================
// Master exchange
// ============================================================

pub const MASTER_DEFAULT_HOST: &str = "master.zandronum.com";
pub const MASTER_DEFAULT_PORT: u16 = 15300;

pub const MASTER_CHALLENGE: i32 = 5660028;
pub const MASTER_PROTOCOL_VERSION: i16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MasterResponseCode {
    Good = 0,
    Server = 1,
    End = 2,
    Banned = 3,
    Bad = 4,
    WrongVersion = 5,
    BeginPart = 6,
    EndPart = 7,
    ServerBlock = 8,
}

impl MasterResponseCode {
    pub fn from_i32(v: i32) -> Option<Self> {
        use MasterResponseCode::*;
        Some(match v {
            0 => Good,
            1 => Server,
            2 => End,
            3 => Banned,
            4 => Bad,
            5 => WrongVersion,
            6 => BeginPart,
            7 => EndPart,
            8 => ServerBlock,
            _ => return None,
        })
    }
}

// ============================================================
// Server exchange
// ============================================================

pub const SERVER_CHALLENGE: i32 = 199;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ServerResponseCode {
    GoodSingle = 5660023,
    Wait = 5660024,
    Banned = 5660025,
    GoodSegmented = 5660032,
}

impl ServerResponseCode {
    pub fn from_i32(v: i32) -> Option<Self> {
        use ServerResponseCode::*;
        Some(match v {
            5660023 => GoodSingle,
            5660024 => Wait,
            5660025 => Banned,
            5660032 => GoodSegmented,
            _ => return None,
        })
    }
}

bitflags::bitflags! {
    /// Fields requested from the server in the base challenge.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct QueryFlags: u32 {
        const NAME                 = 0x0000_0001;
        const URL                  = 0x0000_0002;
        const EMAIL                = 0x0000_0004;
        const MAPNAME              = 0x0000_0008;
        const MAXCLIENTS           = 0x0000_0010;
        const MAXPLAYERS           = 0x0000_0020;
        const PWADS                = 0x0000_0040;
        const GAMETYPE             = 0x0000_0080;
        const GAMENAME             = 0x0000_0100;
        const IWAD                 = 0x0000_0200;
        const FORCE_PASSWORD       = 0x0000_0400;
        const FORCE_JOIN_PASSWORD  = 0x0000_0800;
        const GAMESKILL            = 0x0000_1000;
        const BOTSKILL             = 0x0000_2000;
        const LIMITS               = 0x0001_0000;
        const TEAMDAMAGE           = 0x0002_0000;
        const TEAM_SCORES          = 0x0004_0000;
        const NUMPLAYERS           = 0x0008_0000;
        const PLAYERDATA           = 0x0010_0000;
        const TEAMINFO_NUMBER      = 0x0020_0000;
        const TEAMINFO_NAME        = 0x0040_0000;
        const TEAMINFO_COLOR       = 0x0080_0000;
        const TEAMINFO_SCORE       = 0x0100_0000;
        const TESTING_SERVER       = 0x0200_0000;
        const ALL_DMFLAGS          = 0x0800_0000;
        const SECURITY_SETTINGS    = 0x1000_0000;
        const OPTIONAL_WADS        = 0x2000_0000;
        const DEH                  = 0x4000_0000;
        const EXTENDED_INFO        = 0x8000_0000;
    }
}

impl QueryFlags {
    /// Every field this crate knows how to parse, requested in one shot.
    pub fn standard() -> Self {
        Self::NAME
            | Self::URL
            | Self::EMAIL
            | Self::MAPNAME
            | Self::MAXCLIENTS
            | Self::MAXPLAYERS
            | Self::PWADS
            | Self::GAMETYPE
            | Self::IWAD
            | Self::FORCE_PASSWORD
            | Self::FORCE_JOIN_PASSWORD
            | Self::LIMITS
            | Self::NUMPLAYERS
            | Self::PLAYERDATA
            | Self::TEAMINFO_NUMBER
            | Self::TEAMINFO_NAME
            | Self::TEAMINFO_SCORE
            | Self::GAMESKILL
            | Self::TESTING_SERVER
            | Self::ALL_DMFLAGS
            | Self::SECURITY_SETTINGS
            | Self::OPTIONAL_WADS
            | Self::DEH
            | Self::EXTENDED_INFO
    }
}

bitflags::bitflags! {
    /// `ExtendedInfo` sub-block field mask (the `flags2` word).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ExtendedQueryFlags: u32 {
        const PWAD_HASHES       = 0x01;
        const COUNTRY           = 0x02;
        const GAME_MODE_NAME    = 0x04;
        const GAME_MODE_SHORT   = 0x08;
        const VOICE_CHAT        = 0x10;
    }
}

impl ExtendedQueryFlags {
    pub fn standard() -> Self {
        Self::PWAD_HASHES | Self::COUNTRY | Self::GAME_MODE_NAME
    }
}

pub const SEGMENT_NUMBER_MASK: u8 = 0x7F;
