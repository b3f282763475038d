//! Request parameter map
//!
//! Query-string pairs merged with a form-encoded body. Later pairs replace
//! earlier ones with the same name, and body pairs are applied after query
//! pairs, so the body wins.

use std::collections::HashMap;
use url::form_urlencoded;

pub type Params = HashMap<String, String>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub fn parse_query(query: &str) -> Params {
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

/// Build the combined parameter map for one request
pub fn collect_params(query: Option<&str>, content_type: Option<&str>, body: &[u8]) -> Params {
    let mut params = query.map(parse_query).unwrap_or_default();
    if content_type.is_some_and(is_form_content_type) {
        params.extend(form_urlencoded::parse(body).into_owned());
    }
    params
}

fn is_form_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Look `name` up in `fallback` when it is a non-empty map, else in `params`
///
/// `default` is returned only when the key is absent; a present empty value
/// is returned as is.
pub fn lookup<'a>(
    params: &'a Params,
    name: &str,
    default: Option<&'a str>,
    fallback: Option<&'a Params>,
) -> Option<&'a str> {
    let source = match fallback {
        Some(map) if !map.is_empty() => map,
        _ => params,
    };
    source.get(name).map(String::as_str).or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_query_pairs_are_decoded() {
        let p = parse_query("name=J%C3%BCrgen+Ede&tag=a%26b");
        assert_eq!(p["name"], "Jürgen Ede");
        assert_eq!(p["tag"], "a&b");
    }

    #[test]
    fn test_last_duplicate_wins() {
        let p = parse_query("sort=asc&sort=desc");
        assert_eq!(p["sort"], "desc");
    }

    #[test]
    fn test_form_body_overrides_query() {
        let p = collect_params(
            Some("id=1&mode=preview"),
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            b"mode=publish&title=Hello+World",
        );
        assert_eq!(p["id"], "1");
        assert_eq!(p["mode"], "publish");
        assert_eq!(p["title"], "Hello World");
    }

    #[test]
    fn test_non_form_body_is_ignored() {
        let p = collect_params(Some("id=1"), Some("application/json"), br#"{"id":2}"#);
        assert_eq!(p.len(), 1);
        assert_eq!(p["id"], "1");
    }

    #[test]
    fn test_lookup_default_only_when_absent() {
        let p = params(&[("empty", "")]);
        assert_eq!(lookup(&p, "missing", Some("fallback"), None), Some("fallback"));
        assert_eq!(lookup(&p, "empty", Some("fallback"), None), Some(""));
        assert_eq!(lookup(&p, "missing", None, None), None);
    }

    #[test]
    fn test_lookup_prefers_non_empty_fallback_collection() {
        let p = params(&[("id", "from-request")]);
        let other = params(&[("id", "from-fallback")]);
        let empty = Params::new();

        assert_eq!(lookup(&p, "id", None, Some(&other)), Some("from-fallback"));
        assert_eq!(lookup(&p, "id", None, Some(&empty)), Some("from-request"));
        // a non-empty fallback is searched exclusively
        assert_eq!(lookup(&other, "zzz", Some("d"), Some(&p)), Some("d"));
    }
}
