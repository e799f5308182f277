//! Flag-directed parse of a single server data block. The block's own
//! `flags`/`flags2` words are the only thing that decides which fields
//! are present, in which order, and how wide they are — this module is
//! the one place that mapping is allowed to live.

use crate::country::normalize_country_code;
use crate::cursor::Cursor;
use crate::error::BrowserError;
use crate::types::{game_mode_for_code, Player, PWad, ServerEndpoint, ServerRecord};
use crate::wire::{ExtendedQueryFlags, QueryFlags};

/// Parse a reassembled (or single-packet) server data block, including its
/// leading `flags` word, into a fresh [`ServerRecord`] for `endpoint`.
///
/// Never panics or propagates: a short read degrades to a partially
/// populated record with `error_message` set rather than failing the
/// caller.
pub fn parse_server_data_block(data: &[u8], endpoint: ServerEndpoint) -> ServerRecord {
    let mut record = ServerRecord::new(endpoint);
    record.is_queried = true;
    record.is_online = true;

    let mut cursor = Cursor::new(data);
    if let Err(e) = parse_fields(&mut cursor, &mut record) {
        record.error_message = Some(e.to_string());
    }
    record
}

fn parse_fields(cursor: &mut Cursor, record: &mut ServerRecord) -> Result<(), BrowserError> {
    let flags = QueryFlags::from_bits_truncate(cursor.read_u32_le()?);

    if flags.contains(QueryFlags::NAME) {
        record.name = cursor.read_cstr()?;
    }
    if flags.contains(QueryFlags::URL) {
        record.website = cursor.read_cstr()?;
    }
    if flags.contains(QueryFlags::EMAIL) {
        record.email = cursor.read_cstr()?;
    }
    if flags.contains(QueryFlags::MAPNAME) {
        record.map = cursor.read_cstr()?;
    }
    if flags.contains(QueryFlags::MAXCLIENTS) {
        record.max_clients = cursor.read_u8()?;
    }
    if flags.contains(QueryFlags::MAXPLAYERS) {
        record.max_players = cursor.read_u8()?;
    }
    if flags.contains(QueryFlags::PWADS) {
        let count = cursor.read_u8()?;
        for _ in 0..count {
            record.pwads.push(PWad::new(cursor.read_cstr()?));
        }
    }
    if flags.contains(QueryFlags::GAMETYPE) {
        let code = cursor.read_u8()? as i8;
        record.instagib = cursor.read_bool()?;
        record.buckshot = cursor.read_bool()?;
        record.game_mode = game_mode_for_code(code);
    }
    if flags.contains(QueryFlags::GAMENAME) {
        cursor.read_cstr()?; // game name, discarded
    }
    if flags.contains(QueryFlags::IWAD) {
        record.iwad = cursor.read_cstr()?;
    }
    if flags.contains(QueryFlags::FORCE_PASSWORD) {
        record.is_passworded = cursor.read_bool()?;
    }
    if flags.contains(QueryFlags::FORCE_JOIN_PASSWORD) {
        record.requires_join_password = cursor.read_bool()?;
    }
    if flags.contains(QueryFlags::GAMESKILL) {
        record.skill = cursor.read_u8()?;
    }
    if flags.contains(QueryFlags::BOTSKILL) {
        record.bot_skill = cursor.read_u8()?;
    }
    if flags.contains(QueryFlags::LIMITS) {
        record.frag_limit = cursor.read_u16_le()?;
        record.time_limit = cursor.read_u16_le()?;
        if record.time_limit != 0 {
            record.time_left = cursor.read_u16_le()?;
        }
        record.duel_limit = cursor.read_u16_le()?;
        record.point_limit = cursor.read_u16_le()?;
        record.win_limit = cursor.read_u16_le()?;
    }
    if flags.contains(QueryFlags::TEAMDAMAGE) {
        record.team_damage = cursor.read_f32_le()?;
    }
    if flags.contains(QueryFlags::TEAM_SCORES) {
        cursor.read_i16_le()?; // deprecated, discarded
        cursor.read_i16_le()?;
    }
    if flags.contains(QueryFlags::NUMPLAYERS) {
        record.current_players = cursor.read_u8()?;
    }
    if flags.contains(QueryFlags::PLAYERDATA) {
        for _ in 0..record.current_players {
            let mut player = Player {
                name: cursor.read_cstr()?,
                score: cursor.read_i16_le()?,
                ping: cursor.read_u16_le()?,
                is_spectator: cursor.read_bool()?,
                is_bot: cursor.read_bool()?,
                team: None,
            };
            if flags.contains(QueryFlags::TEAMINFO_NUMBER) {
                player.team = Some(cursor.read_u8()?);
            }
            cursor.read_u8()?; // time on server, discarded
            record.players.push(player);
        }
    }
    if flags.contains(QueryFlags::TEAMINFO_NUMBER) {
        record.num_teams = cursor.read_u8()?.min(4);
    }
    if flags.contains(QueryFlags::TEAMINFO_NAME) {
        for i in 0..record.num_teams as usize {
            let name = cursor.read_cstr()?;
            record.teams[i].name = name;
        }
    }
    if flags.contains(QueryFlags::TEAMINFO_COLOR) {
        for i in 0..record.num_teams as usize {
            record.teams[i].color_rgb = cursor.read_u32_le()?;
        }
    }
    if flags.contains(QueryFlags::TEAMINFO_SCORE) {
        for i in 0..record.num_teams as usize {
            record.teams[i].score = cursor.read_i16_le()?;
        }
    }
    if flags.contains(QueryFlags::TESTING_SERVER) {
        record.is_testing = cursor.read_bool()?;
        record.testing_archive = cursor.read_cstr()?;
    }
    if flags.contains(QueryFlags::ALL_DMFLAGS) {
        let count = cursor.read_u8()?;
        for _ in 0..count {
            cursor.read_u32_le()?; // dmflag bits, not in the record's data model
        }
    }
    if flags.contains(QueryFlags::SECURITY_SETTINGS) {
        record.is_secure = cursor.read_bool()?;
    }
    if flags.contains(QueryFlags::OPTIONAL_WADS) {
        let count = cursor.read_u8()?;
        for _ in 0..count {
            let index = cursor.read_u8()? as usize;
            if let Some(pwad) = record.pwads.get_mut(index) {
                pwad.optional = true;
            }
        }
    }
    if flags.contains(QueryFlags::DEH) {
        let count = cursor.read_u8()?;
        for _ in 0..count {
            record.pwads.push(PWad::new(cursor.read_cstr()?));
        }
    }
    if flags.contains(QueryFlags::EXTENDED_INFO) {
        parse_extended_info(cursor, record)?;
    }

    Ok(())
}

fn parse_extended_info(cursor: &mut Cursor, record: &mut ServerRecord) -> Result<(), BrowserError> {
    let flags2 = ExtendedQueryFlags::from_bits_truncate(cursor.read_u32_le()?);

    if flags2.contains(ExtendedQueryFlags::PWAD_HASHES) {
        let count = cursor.read_u8()?;
        for i in 0..count as usize {
            let hash = cursor.read_cstr()?;
            if let Some(pwad) = record.pwads.get_mut(i) {
                pwad.hash = Some(hash);
            }
        }
    }
    if flags2.contains(ExtendedQueryFlags::COUNTRY) {
        let raw = cursor.read_fixed_str(3)?;
        record.country = normalize_country_code(&raw);
    }
    if flags2.contains(ExtendedQueryFlags::GAME_MODE_NAME) {
        cursor.read_cstr()?; // extended game-mode name, ignored
    }
    if flags2.contains(ExtendedQueryFlags::GAME_MODE_SHORT) {
        cursor.read_cstr()?;
    }
    if flags2.contains(ExtendedQueryFlags::VOICE_CHAT) {
        cursor.read_u8()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn endpoint() -> ServerEndpoint {
        ServerEndpoint::new(Ipv4Addr::new(192, 168, 0, 1), 10666)
    }

    #[test]
    fn minimal_name_only_block() {
        let mut data = QueryFlags::NAME.bits().to_le_bytes().to_vec();
        data.extend_from_slice(b"Server\0");
        let record = parse_server_data_block(&data, endpoint());
        assert!(record.is_online);
        assert!(record.is_queried);
        assert_eq!(record.name, "Server");
        assert_eq!(record.map, "");
        assert_eq!(record.max_clients, 0);
        assert!(record.error_message.is_none());
    }

    #[test]
    fn field_order_covers_arbitrary_flag_subsets() {
        let flags = QueryFlags::NAME | QueryFlags::MAPNAME | QueryFlags::MAXCLIENTS;
        let mut data = flags.bits().to_le_bytes().to_vec();
        data.extend_from_slice(b"Arena\0");
        data.extend_from_slice(b"map01\0");
        data.push(16);
        let record = parse_server_data_block(&data, endpoint());
        assert_eq!(record.name, "Arena");
        assert_eq!(record.map, "map01");
        assert_eq!(record.max_clients, 16);
        assert!(record.error_message.is_none());
    }

    #[test]
    fn limits_time_left_only_present_when_time_nonzero() {
        let flags = QueryFlags::LIMITS;
        let mut data = flags.bits().to_le_bytes().to_vec();
        data.extend_from_slice(&20u16.to_le_bytes()); // frag
        data.extend_from_slice(&0u16.to_le_bytes()); // time = 0, time_left absent
        data.extend_from_slice(&0u16.to_le_bytes()); // duel
        data.extend_from_slice(&0u16.to_le_bytes()); // point
        data.extend_from_slice(&0u16.to_le_bytes()); // win
        let record = parse_server_data_block(&data, endpoint());
        assert_eq!(record.frag_limit, 20);
        assert_eq!(record.time_limit, 0);
        assert_eq!(record.time_left, 0);
        assert!(record.error_message.is_none());
    }

    #[test]
    fn player_team_present_only_when_teaminfo_number_requested() {
        let flags = QueryFlags::NUMPLAYERS | QueryFlags::PLAYERDATA | QueryFlags::TEAMINFO_NUMBER;
        let mut data = flags.bits().to_le_bytes().to_vec();
        data.push(1); // current_players
        data.extend_from_slice(b"Alice\0");
        data.extend_from_slice(&10i16.to_le_bytes());
        data.extend_from_slice(&42u16.to_le_bytes());
        data.push(0); // spectator
        data.push(0); // bot
        data.push(1); // team
        data.push(5); // time on server, discarded
        data.push(2); // num_teams
        let record = parse_server_data_block(&data, endpoint());
        assert_eq!(record.current_players, 1);
        assert_eq!(record.players.len(), 1);
        assert_eq!(record.players[0].team, Some(1));
        assert_eq!(record.num_teams, 2);
        assert!(record.error_message.is_none());
    }

    #[test]
    fn optional_wads_ignores_out_of_range_index() {
        let flags = QueryFlags::PWADS | QueryFlags::OPTIONAL_WADS;
        let mut data = flags.bits().to_le_bytes().to_vec();
        data.push(1); // pwad count
        data.extend_from_slice(b"extra.wad\0");
        data.push(2); // optional-wads count
        data.push(0); // valid index
        data.push(9); // out-of-range index, ignored
        let record = parse_server_data_block(&data, endpoint());
        assert_eq!(record.pwads.len(), 1);
        assert!(record.pwads[0].optional);
        assert!(record.error_message.is_none());
    }

    #[test]
    fn pwad_hashes_consume_full_count_but_ignore_out_of_range() {
        let flags = QueryFlags::PWADS | QueryFlags::EXTENDED_INFO;
        let mut data = flags.bits().to_le_bytes().to_vec();
        data.push(1);
        data.extend_from_slice(b"only.wad\0");
        let flags2 = ExtendedQueryFlags::PWAD_HASHES;
        data.extend_from_slice(&flags2.bits().to_le_bytes());
        data.push(2); // two hashes sent even though only one pwad exists
        data.extend_from_slice(b"aaaa\0");
        data.extend_from_slice(b"bbbb\0");
        let record = parse_server_data_block(&data, endpoint());
        assert_eq!(record.pwads.len(), 1);
        assert_eq!(record.pwads[0].hash.as_deref(), Some("aaaa"));
        assert!(record.error_message.is_none());
    }

    #[test]
    fn country_normalizes_to_uppercase_alpha2() {
        let flags = QueryFlags::EXTENDED_INFO;
        let mut data = flags.bits().to_le_bytes().to_vec();
        let flags2 = ExtendedQueryFlags::COUNTRY;
        data.extend_from_slice(&flags2.bits().to_le_bytes());
        data.extend_from_slice(b"us\0");
        let record = parse_server_data_block(&data, endpoint());
        assert_eq!(record.country, "US");
    }

    #[test]
    fn short_read_yields_partial_record_not_panic() {
        let flags = QueryFlags::NAME | QueryFlags::MAPNAME;
        let mut data = flags.bits().to_le_bytes().to_vec();
        data.extend_from_slice(b"Server\0");
        // MAPNAME's cstr is missing entirely: short read, not a panic.
        let record = parse_server_data_block(&data, endpoint());
        assert!(record.is_queried);
        assert!(record.is_online);
        assert_eq!(record.name, "Server");
        assert!(record.error_message.is_some());
    }
}
