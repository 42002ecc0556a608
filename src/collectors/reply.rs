//! # Reply Parser
//!
//! RCON replies are human-readable console output, not a structured protocol.
//! Every phrase this exporter depends on is matched here so that a server
//! printing things slightly differently only ever touches this module.
//!
//! None of these functions fail. Extractors return `Option`/empty values when
//! the expected shape is missing, and the `parse_*` helpers turn that into the
//! documented fallback (`"0"` coordinates, `"unknown"` dimension, `"0"` level).

use lazy_static::lazy_static;
use regex::Regex;

/// Prefix of every `data get entity` reply.
pub const ENTITY_DATA_PHRASE: &str = "has the following entity data:";
/// Prefix of the username list in a vanilla `list` reply.
pub const PLAYERS_ONLINE_PHRASE: &str = "players online:";
/// End of the Paper/Spigot `list` header. Usernames follow on the next lines,
/// optionally grouped as `group: name, name`.
pub const PAPER_PLAYERS_ONLINE_PHRASE: &str = "players online.";
pub const TIME_PHRASE: &str = "The time is";
pub const DIFFICULTY_PHRASE: &str = "The difficulty is";

pub const DEFAULT_COORDINATE: &str = "0";
pub const UNKNOWN_DIMENSION: &str = "unknown";
pub const DEFAULT_EXPERIENCE: &str = "0";

lazy_static! {
    static ref PLAYER_COUNTS: Regex =
        Regex::new(r"There are (\d+) (?:of a max of|out of maximum) (\d+) players online")
            .expect("player count pattern is valid");
}

/// Returns the payload between `[...]` or `"..."` directly after `phrase`.
///
/// `None` when the phrase is absent or not followed by a delimited payload. An
/// empty payload (`[]`) is `Some("")`.
pub fn extract_bracketed<'a>(raw: &'a str, phrase: &str) -> Option<&'a str> {
    let start = raw.find(phrase)? + phrase.len();
    let rest = raw[start..].trim_start();
    let close = match rest.chars().next()? {
        '[' => ']',
        '"' => '"',
        _ => return None,
    };
    let inner = &rest[1..];
    let end = inner.rfind(close)?;
    Some(&inner[..end])
}

/// Splits `payload` on `delimiter` and trims each field.
///
/// With fewer than `min_count` fields the result is `min_count` copies of
/// `fallback` instead.
pub fn extract_delimited_fields<'a>(
    payload: &'a str,
    delimiter: char,
    min_count: usize,
    fallback: &'a str,
) -> Vec<&'a str> {
    let fields: Vec<&str> = payload.split(delimiter).map(str::trim).collect();
    if fields.len() < min_count {
        return vec![fallback; min_count];
    }
    fields
}

/// `minecraft:overworld` -> `overworld`. Without a delimiter the whole string
/// is returned.
pub fn extract_namespaced_suffix(payload: &str, delimiter: char) -> &str {
    match payload.rfind(delimiter) {
        Some(index) => &payload[index + delimiter.len_utf8()..],
        None => payload,
    }
}

/// Trimmed, comma separated tokens on the line following `phrase`, in reply
/// order. Missing phrase or empty list yields an empty vector.
pub fn extract_comma_list(raw: &str, phrase: &str) -> Vec<String> {
    let Some(start) = raw.find(phrase) else {
        return Vec::new();
    };
    first_line(&raw[start + phrase.len()..])
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trimmed remainder of the line after `phrase`, e.g. `30` in
/// `Alice has the following entity data: 30`.
pub fn extract_trailing_value<'a>(raw: &'a str, phrase: &str) -> Option<&'a str> {
    let start = raw.find(phrase)? + phrase.len();
    let value = first_line(&raw[start..]).trim();
    (!value.is_empty()).then_some(value)
}

/// Drops a single SNBT number suffix (`12.5d` -> `12.5`, `3b` -> `3`).
///
/// Anything that does not look like a suffixed number is returned unchanged.
pub fn strip_unit_suffix(field: &str) -> &str {
    let Some(last) = field.chars().last() else {
        return field;
    };
    if !matches!(last.to_ascii_lowercase(), 'b' | 's' | 'l' | 'f' | 'd') {
        return field;
    }
    let number = &field[..field.len() - 1];
    if number.parse::<f64>().is_ok() {
        number
    } else {
        field
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-
// Reply specific helpers

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerCounts {
    pub online: u32,
    pub max: u32,
}

/// Parses the header of a `list` reply. Both the vanilla
/// (`There are 2 of a max of 20 players online`) and the Paper/Spigot
/// (`There are 2 out of maximum 20 players online`) phrasing are understood.
pub fn extract_player_counts(raw: &str) -> Option<PlayerCounts> {
    let captures = PLAYER_COUNTS.captures(raw)?;
    Some(PlayerCounts {
        online: captures.get(1)?.as_str().parse().ok()?,
        max: captures.get(2)?.as_str().parse().ok()?,
    })
}

/// Usernames from a vanilla or Paper `list` reply, in reply order.
pub fn parse_player_list(raw: &str) -> Vec<String> {
    if raw.contains(PLAYERS_ONLINE_PHRASE) {
        return extract_comma_list(raw, PLAYERS_ONLINE_PHRASE);
    }
    let Some(start) = raw.find(PAPER_PLAYERS_ONLINE_PHRASE) else {
        return Vec::new();
    };
    raw[start + PAPER_PLAYERS_ONLINE_PHRASE.len()..]
        .lines()
        .flat_map(|line| {
            let names = line.split_once(": ").map_or(line, |(_group, names)| names);
            names.split(',').map(str::trim).filter(|name| !name.is_empty())
        })
        .map(str::to_string)
        .collect()
}

/// `x`, `y`, `z` from a `data get entity ... Pos` reply, unit suffixes removed.
///
/// Falls back to `["0", "0", "0"]`, which cannot be told apart from a player
/// standing at the world origin.
pub fn parse_position(raw: &str) -> [String; 3] {
    let payload = extract_bracketed(raw, ENTITY_DATA_PHRASE).unwrap_or_else(|| {
        debug!(raw, "No position payload in reply");
        ""
    });
    let fields = extract_delimited_fields(payload, ',', 3, DEFAULT_COORDINATE);
    [0, 1, 2].map(|i| match strip_unit_suffix(fields[i]) {
        "" => DEFAULT_COORDINATE.to_string(),
        value => value.to_string(),
    })
}

/// Dimension name from a `data get entity ... Dimension` reply, without its
/// namespace. Falls back to `"unknown"`.
pub fn parse_dimension(raw: &str) -> String {
    match extract_bracketed(raw, ENTITY_DATA_PHRASE).map(|payload| extract_namespaced_suffix(payload, ':')) {
        Some(dimension) if !dimension.is_empty() => dimension.to_string(),
        _ => {
            debug!(raw, "No dimension in reply");
            UNKNOWN_DIMENSION.to_string()
        }
    }
}

/// Level from a `data get entity ... XpLevel` reply. Falls back to `"0"`
/// unless the value is an integer.
pub fn parse_experience(raw: &str) -> String {
    let level = extract_trailing_value(raw, ENTITY_DATA_PHRASE).map(strip_unit_suffix);
    match level {
        Some(level) if level.parse::<i64>().is_ok() => level.to_string(),
        _ => {
            debug!(raw, "No experience level in reply");
            DEFAULT_EXPERIENCE.to_string()
        }
    }
}

/// Tick count from a `time query <daytime|gametime|day>` reply.
pub fn parse_time(raw: &str) -> Option<u64> {
    extract_trailing_value(raw, TIME_PHRASE)?.parse().ok()
}

/// Lowercased difficulty from a `difficulty` reply.
pub fn parse_difficulty(raw: &str) -> Option<String> {
    let value = extract_trailing_value(raw, DIFFICULTY_PHRASE)?;
    Some(value.trim_end_matches('.').to_lowercase())
}
