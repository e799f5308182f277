use std::net::Ipv4Addr;
use std::time::Instant;

/// A UDP endpoint for a game server as reported by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }
}

impl std::fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// A data file (PWAD) the server is running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PWad {
    pub name: String,
    /// Set only once an `OptionalWads` block back-references this index.
    pub optional: bool,
    /// Set only once a `PwadHashes` block back-references this index.
    pub hash: Option<String>,
}

impl PWad {
    pub fn new(name: String) -> Self {
        Self {
            name,
            optional: false,
            hash: None,
        }
    }
}

/// One connected client as reported by a `PlayerData` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub score: i16,
    pub ping: u16,
    /// Present only when the server also reported `TeamInfoNumber`.
    pub team: Option<u8>,
    pub is_spectator: bool,
    pub is_bot: bool,
}

/// One team slot as reported by `TeamInfo*` blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub color_rgb: u32,
    pub score: i16,
}

/// Catalogue entry for a wire game-mode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameMode {
    pub code: i8,
    pub name: &'static str,
    pub short_name: &'static str,
    pub is_team: bool,
}

const GAME_MODE_CATALOGUE: &[GameMode] = &[
    GameMode { code: -1, name: "Unknown", short_name: "???", is_team: false },
    GameMode { code: 0, name: "Cooperative", short_name: "COOP", is_team: false },
    GameMode { code: 1, name: "Survival Co-op", short_name: "SURV", is_team: false },
    GameMode { code: 2, name: "Invasion", short_name: "INV", is_team: false },
    GameMode { code: 3, name: "Deathmatch", short_name: "DM", is_team: false },
    GameMode { code: 4, name: "Team Deathmatch", short_name: "TDM", is_team: true },
    GameMode { code: 5, name: "Duel", short_name: "DUEL", is_team: false },
    GameMode { code: 6, name: "Terminator", short_name: "TERM", is_team: false },
    GameMode { code: 7, name: "Last Man Standing", short_name: "LMS", is_team: false },
    GameMode { code: 8, name: "Team LMS", short_name: "TLMS", is_team: true },
    GameMode { code: 9, name: "Possession", short_name: "POSS", is_team: false },
    GameMode { code: 10, name: "Team Possession", short_name: "TPOSS", is_team: true },
    GameMode { code: 11, name: "Capture the Flag", short_name: "CTF", is_team: true },
    GameMode { code: 12, name: "One Flag CTF", short_name: "1FCTF", is_team: true },
    GameMode { code: 13, name: "Skulltag", short_name: "ST", is_team: true },
    GameMode { code: 14, name: "Domination", short_name: "DOM", is_team: true },
    GameMode { code: 15, name: "Team Game", short_name: "TG", is_team: true },
];

/// Resolve a wire game-mode code, falling back to the `Unknown` entry.
pub fn game_mode_for_code(code: i8) -> GameMode {
    GAME_MODE_CATALOGUE
        .iter()
        .find(|m| m.code == code)
        .copied()
        .unwrap_or(GAME_MODE_CATALOGUE[0])
}

/// Full parse target for a single-server query.
#[derive(Debug, Clone)]
pub struct ServerRecord {
    pub endpoint: ServerEndpoint,
    pub is_online: bool,
    pub is_queried: bool,
    pub error_message: Option<String>,

    pub query_sent_at: Option<Instant>,
    pub response_received_at: Option<Instant>,
    pub ping_ms: i32,

    pub game_version: String,
    pub name: String,
    pub website: String,
    pub email: String,

    pub map: String,
    pub iwad: String,
    pub pwads: Vec<PWad>,

    pub max_clients: u8,
    pub max_players: u8,
    pub current_players: u8,

    pub game_mode: GameMode,
    pub instagib: bool,
    pub buckshot: bool,

    pub is_passworded: bool,
    pub requires_join_password: bool,
    pub is_secure: bool,

    pub skill: u8,
    pub bot_skill: u8,

    pub frag_limit: u16,
    pub time_limit: u16,
    pub time_left: u16,
    pub duel_limit: u16,
    pub point_limit: u16,
    pub win_limit: u16,

    pub team_damage: f32,
    pub num_teams: u8,
    pub teams: [Team; 4],

    pub is_testing: bool,
    pub testing_archive: String,

    pub country: String,

    pub players: Vec<Player>,
}

impl ServerRecord {
    /// A fresh, unqueried record for `endpoint`. Everything else defaults.
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self {
            endpoint,
            is_online: false,
            is_queried: false,
            error_message: None,
            query_sent_at: None,
            response_received_at: None,
            ping_ms: -1,
            game_version: String::new(),
            name: String::new(),
            website: String::new(),
            email: String::new(),
            map: String::new(),
            iwad: String::new(),
            pwads: Vec::new(),
            max_clients: 0,
            max_players: 0,
            current_players: 0,
            game_mode: game_mode_for_code(-1),
            instagib: false,
            buckshot: false,
            is_passworded: false,
            requires_join_password: false,
            is_secure: false,
            skill: 0,
            bot_skill: 0,
            frag_limit: 0,
            time_limit: 0,
            time_left: 0,
            duel_limit: 0,
            point_limit: 0,
            win_limit: 0,
            team_damage: 0.0,
            num_teams: 0,
            teams: Default::default(),
            is_testing: false,
            testing_archive: String::new(),
            country: "??".to_string(),
            players: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_players == 0
    }

    pub fn is_full(&self) -> bool {
        self.current_players >= self.max_clients
    }
}
