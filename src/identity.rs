//! Player identity and message normalization
//!
//! Turns raw client-supplied player identifiers and message text into
//! canonical forms, or rejects them. Pure functions with no I/O.

#[cfg(test)]
mod proptests;

use crate::error::{ChatError, ChatResult};
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Opaque player handle: already canonical when it matches this.
static HANDLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("handle pattern is valid"));

/// E.164-style number: non-zero leading digit, 8 to 15 digits total.
static E164_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]{7,14}$").expect("e164 pattern is valid"));

static DISALLOWED_HANDLE_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("sanitizer pattern is valid"));

const MAX_HANDLE_LEN: usize = 64;
const MIN_E164_DIGITS: usize = 8;
const MAX_E164_DIGITS: usize = 15;

pub const DEFAULT_COUNTRY_CODE: &str = "55";
/// Country code plus an 11-digit mobile number.
const GENERATED_ID_LEN: usize = 13;
const FALLBACK_PLAYER_ID: &str = "5511999999999";

const TERMINATOR: &str = "fim da intera\u{e7}\u{e3}o";
const TERMINATOR_ASCII: &str = "fim da interacao";

/// Inclusive bounds on accepted player message length, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            min_len: 1,
            max_len: 700,
        }
    }
}

/// Canonicalize a raw player identifier.
///
/// Returns `None` when the input cannot identify a player: blank input,
/// digit-only input that is not a valid E.164 number, or text that
/// sanitizes down to nothing.
pub fn normalize_player(raw: &str) -> Option<String> {
    let normalized: String = raw.nfkc().collect();
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return None;
    }

    if is_all_digits(trimmed) {
        return e164_or_none(trimmed);
    }
    if let Some(digits) = phone_digits(trimmed) {
        return Some(digits);
    }
    if HANDLE_PATTERN.is_match(trimmed) {
        return Some(trimmed.to_string());
    }

    let replaced = DISALLOWED_HANDLE_CHAR.replace_all(trimmed, "-");
    let sanitized: String = replaced
        .trim_matches('-')
        .chars()
        .take(MAX_HANDLE_LEN)
        .collect();

    if sanitized.is_empty() {
        None
    } else if is_all_digits(&sanitized) {
        // Keep the digit-only rule stable across repeated normalization
        e164_or_none(&sanitized)
    } else if let Some(digits) = phone_digits(&sanitized) {
        Some(digits)
    } else {
        Some(sanitized)
    }
}

/// Produce a synthetic E.164-like player id for callers that supplied none.
///
/// Not unique: uniqueness lives at the session-token layer.
pub fn generate_player_id(country_code: &str) -> String {
    let digits = digits_only(country_code);
    let mut candidate = digits.trim_start_matches('0').to_string();
    if candidate.is_empty() {
        candidate = DEFAULT_COUNTRY_CODE.to_string();
    }

    let target = GENERATED_ID_LEN
        .max(candidate.len() + 1)
        .clamp(MIN_E164_DIGITS, MAX_E164_DIGITS);

    let mut rng = rand::thread_rng();
    while candidate.len() < target {
        candidate.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    candidate.truncate(MAX_E164_DIGITS);

    if E164_PATTERN.is_match(&candidate) {
        candidate
    } else {
        FALLBACK_PLAYER_ID.to_string()
    }
}

/// Validate and canonicalize player message text.
pub fn validate_message(raw: Option<&str>, limits: &MessageLimits) -> ChatResult<String> {
    let Some(raw) = raw else {
        return Err(ChatError::invalid_input("Message is required"));
    };

    let normalized: String = raw.nfkc().collect();
    let clean = normalized.trim();
    let len = clean.chars().count();

    if len < limits.min_len {
        return Err(ChatError::invalid_input("Message is too short"));
    }
    if len > limits.max_len {
        return Err(ChatError::invalid_input("Message is too long"));
    }
    if clean
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err(ChatError::invalid_input(
            "Message contains invalid characters",
        ));
    }

    Ok(clean.to_string())
}

/// Exact-phrase test for the end-of-conversation marker.
///
/// Case-insensitive, and separately accent-insensitive. Anything other
/// than the phrase itself (surrounding whitespace aside) is not a match.
pub fn is_conversation_terminator(text: &str) -> bool {
    let normalized: String = text.nfkc().collect();
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return false;
    }

    if trimmed.to_lowercase() == TERMINATOR {
        return true;
    }

    let ascii_folded: String = trimmed.nfkd().filter(char::is_ascii).collect();
    ascii_folded.to_lowercase() == TERMINATOR_ASCII
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

fn e164_or_none(digits: &str) -> Option<String> {
    E164_PATTERN
        .is_match(digits)
        .then(|| digits.to_string())
}

/// Digits of a phone-formatted string, when they form a valid E.164 number
fn phone_digits(s: &str) -> Option<String> {
    if !looks_like_phone(s) {
        return None;
    }
    let digits = digits_only(s);
    E164_PATTERN.is_match(&digits).then_some(digits)
}

/// Digits mixed only with the punctuation people type into phone numbers
fn looks_like_phone(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | '.' | ' '))
}
