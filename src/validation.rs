//! Pure input predicates and parsers shared by every resource validator.
//!
//! Every function here is total: it never panics on user input and has no hidden state.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("name pattern compiles"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s]+$").expect("numeric pattern compiles"));

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(?:-[0-9]+)?$").expect("range pattern compiles"));

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern compiles"));

/// Symbols accepted by the password strength policy.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+{}[]:;<>,.?~\\-";

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_empty_object(object: &Map<String, Value>) -> bool {
    object.is_empty()
}

/// True iff a value was supplied and has at least one character.
pub fn is_non_empty_string(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// At least eight characters with one lowercase letter, one uppercase letter, one digit and
/// one symbol from [`PASSWORD_SYMBOLS`].
pub fn is_valid_password(password: &str) -> bool {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return false;
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
    has_lower && has_upper && has_digit && has_symbol
}

/// Digits and whitespace only.
pub fn is_numeric_string(input: &str) -> bool {
    NUMERIC_RE.is_match(input)
}

/// `digits` or `digits-digits`.
pub fn is_valid_range_string(input: &str) -> bool {
    RANGE_RE.is_match(input)
}

/// Store identifiers are UUIDs.
pub fn is_valid_identifier(raw: &str) -> bool {
    Uuid::parse_str(raw).is_ok()
}

/// Parses an identifier taken from a path segment.
pub fn parse_identifier(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// Strict `YYYY-MM-DD`: exact shape and a real calendar date.
pub fn parse_strict_date(raw: &str) -> Option<NaiveDate> {
    if !DATE_RE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRejection {
    InvalidDate,
    NotFuture,
    NotPast,
}

/// An application deadline is the start of its calendar day (UTC) and must lie strictly
/// after `now`. A deadline of today is therefore already closed.
pub fn parse_deadline(raw: &str, now: DateTime<Utc>) -> Result<NaiveDate, DateRejection> {
    let date = parse_strict_date(raw).ok_or(DateRejection::InvalidDate)?;
    if deadline_instant(date) > now {
        Ok(date)
    } else {
        Err(DateRejection::NotFuture)
    }
}

/// True while applications for a deadline are still accepted.
pub fn deadline_open(deadline: NaiveDate, now: DateTime<Utc>) -> bool {
    deadline_instant(deadline) > now
}

fn deadline_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// A date of birth must be a strict calendar date before today.
pub fn parse_date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate, DateRejection> {
    let date = parse_strict_date(raw).ok_or(DateRejection::InvalidDate)?;
    if date < today {
        Ok(date)
    } else {
        Err(DateRejection::NotPast)
    }
}

/// Parses a digits-and-whitespace string into a number. Whitespace is only tolerated around
/// the digits; `"1 0"` passes the character check but is not a number.
pub fn parse_numeric(raw: &str) -> Option<i64> {
    if !is_numeric_string(raw) {
        return None;
    }
    raw.trim().parse::<i64>().ok()
}

/// Trims entries, drops empty ones and removes duplicates while keeping first-seen order.
pub fn normalize_skills<I, S>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for skill in skills {
        let skill = skill.as_ref().trim();
        if !skill.is_empty() && !out.iter().any(|s| s == skill) {
            out.push(skill.to_string());
        }
    }
    out
}

/// Set union of an existing skill list with new entries. Re-applying the same entries is a
/// no-op.
pub fn union_skills(existing: &[String], incoming: &[String]) -> Vec<String> {
    normalize_skills(existing.iter().chain(incoming.iter()))
}
