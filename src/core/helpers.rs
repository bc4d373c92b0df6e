use chrono::{DateTime, Utc};
use regex::Regex;
use spin_sdk::http::Response;
use spin_sdk::key_value::Store;
use std::sync::OnceLock;

pub fn store() -> anyhow::Result<Store> {
    Store::open_default().map_err(|e| anyhow::anyhow!("Failed to open default store: {}", e))
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Timestamp-derived id that is unique among `taken`.
pub fn next_id<'a>(now: DateTime<Utc>, taken: impl Iterator<Item = &'a str>) -> String {
    let mut millis = now.timestamp_millis();
    let taken: Vec<i64> = taken.filter_map(|id| id.parse::<i64>().ok()).collect();
    while taken.contains(&millis) {
        millis += 1;
    }
    millis.to_string()
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("Regex should compile"))
}

pub fn validate_email(email: &str) -> bool {
    email_regex().is_match(email)
}

pub fn time_ago(created_at: &str, now: DateTime<Utc>) -> String {
    let created = match DateTime::parse_from_rfc3339(created_at) {
        Ok(t) => t.with_timezone(&Utc),
        Err(_) => return String::new(),
    };
    let seconds = (now - created).num_seconds().max(0);
    if seconds < 60 {
        return format!("{} sec ago", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} min ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} hour{} ago", hours, if hours > 1 { "s" } else { "" });
    }
    let days = hours / 24;
    format!("{} day{} ago", days, if days > 1 { "s" } else { "" })
}

pub fn html(status: u16, body: String) -> Response {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(body.into_bytes())
        .build()
}

pub fn redirect(location: &str) -> Response {
    Response::builder()
        .status(303)
        .header("Location", location)
        .body(Vec::new())
        .build()
}
