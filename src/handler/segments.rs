//! Resource segment extraction
//!
//! Position-based prefix matching: whatever follows `base_uri + separator`
//! in the raw URI, up to the query string, is decoded and split. There is no
//! pattern syntax.

/// Split the part of `raw_uri` after `base_uri + separator` into segments
///
/// Returns an empty list when the prefix is absent or the URI is no longer
/// than the prefix. A single trailing empty segment (from a trailing
/// separator) is dropped.
pub fn extract_segments(raw_uri: &str, base_uri: &str, separator: &str) -> Vec<String> {
    let prefix = format!("{base_uri}{separator}");
    if separator.is_empty() || raw_uri.len() <= prefix.len() {
        return Vec::new();
    }
    let Some(pos) = raw_uri.find(&prefix) else {
        return Vec::new();
    };

    let rest = &raw_uri[pos + prefix.len()..];
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);

    let decoded = url_decode(path);
    let mut segments: Vec<String> = decoded.split(separator).map(str::to_string).collect();
    if segments.last().is_some_and(String::is_empty) {
        segments.pop();
    }
    segments
}

/// Form-style decoding: `+` is a space, `%XX` is a byte, bad UTF-8 is replaced
pub fn url_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    let bytes = urlencoding::decode_binary(plus_decoded.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_stop_at_query_string() {
        assert_eq!(
            extract_segments("/api/widgets/42?x=1", "/api", "/"),
            vec!["widgets", "42"]
        );
    }

    #[test]
    fn test_uri_equal_to_prefix_is_empty() {
        assert!(extract_segments("/api/", "/api", "/").is_empty());
        assert!(extract_segments("/api", "/api", "/").is_empty());
    }

    #[test]
    fn test_trailing_separator_dropped() {
        assert_eq!(extract_segments("/api/widgets/", "/api", "/"), vec!["widgets"]);
    }

    #[test]
    fn test_only_one_trailing_empty_segment_dropped() {
        assert_eq!(extract_segments("/api/widgets//", "/api", "/"), vec!["widgets", ""]);
    }

    #[test]
    fn test_query_right_after_prefix() {
        assert!(extract_segments("/api/?page=2", "/api", "/").is_empty());
    }

    #[test]
    fn test_missing_prefix_is_empty() {
        assert!(extract_segments("/other/widgets/42", "/api", "/").is_empty());
    }

    #[test]
    fn test_segments_are_url_decoded() {
        assert_eq!(
            extract_segments("/api/caf%C3%A9/big+red%20box", "/api", "/"),
            vec!["café", "big red box"]
        );
    }

    #[test]
    fn test_custom_separator() {
        assert_eq!(
            extract_segments("/rpc:users:9", "/rpc", ":"),
            vec!["users", "9"]
        );
    }

    #[test]
    fn test_prefix_found_after_mount_point() {
        assert_eq!(
            extract_segments("/tenant/api/widgets", "/api", "/"),
            vec!["widgets"]
        );
    }
}
