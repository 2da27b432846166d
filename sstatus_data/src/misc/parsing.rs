use crate::error::{NumberError, ParseError};

/// Value of `key=` inside a line of `Key=Value` pairs, i.e. everything after the `=` up to the end
/// of the line.
///
/// The key only matches at the start of a whitespace-separated token, so `State` won't be found
/// inside `NextState=...`.
pub fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("{key}=");
    line.match_indices(&needle)
        .find(|&(idx, _)| line[..idx].chars().next_back().map_or(true, char::is_whitespace))
        .map(|(idx, _)| &line[idx + needle.len()..])
}

/// First whitespace-separated token, or `""`.
pub fn first_token(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("")
}

/// `cpu=16` -> `Some("16")`
pub fn token_value(token: &str) -> Option<&str> {
    token.split_once('=').map(|(_, value)| value)
}

/// Drops every character that isn't an ASCII digit (`4(S:0-1)` -> `401`, `4 ` -> `4`).
pub fn ascii_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

pub fn parse_count(field: &'static str, value: &str) -> Result<u64, ParseError> {
    value.parse::<u64>().map_err(|e| ParseError::numeric(field, value, e))
}

/// Count from a `key=value` token; a token without `=` is a parse error as well.
pub fn parse_count_token(field: &'static str, token: &str) -> Result<u64, ParseError> {
    match token_value(token) {
        Some(value) => parse_count(field, value),
        None => Err(ParseError::numeric(field, token, NumberError::NoValue)),
    }
}
