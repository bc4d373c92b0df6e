use std::collections::HashMap;

use crate::models::models::{FeedView, Filter};

/// Parse query parameters from a URI string
///
/// Handles URL decoding and returns a HashMap of parameter key-value pairs.
/// Multiple values for the same key are not supported (only the last is kept).
///
/// # Example
/// ```
/// use mini_social::core::query_params::parse_query_params;
/// let params = parse_query_params("/?filter=mine&q=hello%20world");
/// assert_eq!(params.get("filter"), Some(&"mine".to_string()));
/// assert_eq!(params.get("q"), Some(&"hello world".to_string()));
/// ```
pub fn parse_query_params(uri: &str) -> HashMap<String, String> {
    match uri.find('?') {
        Some(query_start) => parse_pairs(&uri[query_start + 1..]),
        None => HashMap::new(),
    }
}

/// Parse an `application/x-www-form-urlencoded` request body.
pub fn parse_form(body: &[u8]) -> HashMap<String, String> {
    parse_pairs(&String::from_utf8_lossy(body))
}

fn parse_pairs(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for param in query.split('&').filter(|p| !p.is_empty()) {
        match param.find('=') {
            Some(eq_idx) => {
                let key = decode(&param[..eq_idx]);
                params.insert(key, decode(&param[eq_idx + 1..]));
            }
            // Flag parameter without value
            None => {
                params.insert(decode(param), String::new());
            }
        }
    }
    params
}

fn decode(raw: &str) -> String {
    // Forms encode spaces as '+'
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced.clone(),
    }
}

/// Get a string parameter from parsed query params with optional default
pub fn get_string(params: &HashMap<String, String>, key: &str, default: Option<&str>) -> Option<String> {
    params.get(key)
        .cloned()
        .or_else(|| default.map(|d| d.to_string()))
}

/// Get a non-empty string parameter, treating `key=` the same as absent.
pub fn get_non_empty(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key).filter(|v| !v.is_empty()).cloned()
}

pub fn feed_view(params: &HashMap<String, String>) -> FeedView {
    FeedView {
        filter: Filter::parse(&get_string(params, "filter", Some("all")).unwrap_or_default()),
        search: get_string(params, "q", None).unwrap_or_default(),
        editing: get_non_empty(params, "edit"),
        editing_comment: get_non_empty(params, "comment"),
    }
}

/// Page URL that reproduces the filter and search of `view`.
pub fn view_location(view: &FeedView) -> String {
    let mut location = format!("/?filter={}", view.filter.as_str());
    if !view.search.is_empty() {
        location.push_str("&q=");
        location.push_str(&urlencoding::encode(&view.search));
    }
    location
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_bodies_decode_plus_and_percent() {
        let params = parse_form(b"text=hello+there%21&image=");
        assert_eq!(params.get("text").map(String::as_str), Some("hello there!"));
        assert_eq!(get_non_empty(&params, "image"), None);
    }

    #[test]
    fn view_round_trips_through_location() {
        let view = FeedView { filter: Filter::Mine, search: "a b".into(), ..FeedView::default() };
        let location = view_location(&view);
        assert_eq!(location, "/?filter=mine&q=a%20b");
        assert_eq!(feed_view(&parse_query_params(&location)), view);
    }

    #[test]
    fn unknown_filter_means_all() {
        let params = parse_query_params("/?filter=everything");
        assert_eq!(feed_view(&params).filter, Filter::All);
    }
}
