//! Query string decoding

use url::form_urlencoded;

/// Decoded query parameters, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Decode a raw query string (without the leading `?`)
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self(pairs)
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_get() {
        let query = QueryParams::parse(Some("skip=5&limit=20&q=red+apple%21"));
        assert_eq!(query.get("skip"), Some("5"));
        assert_eq!(query.get("limit"), Some("20"));
        assert_eq!(query.get("q"), Some("red apple!"));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let query = QueryParams::parse(Some("q=one&q=two"));
        assert_eq!(query.get("q"), Some("one"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(QueryParams::parse(None), QueryParams::default());
        assert_eq!(QueryParams::parse(Some("")).get("q"), None);
        assert_eq!(QueryParams::parse(Some("flag")).get("flag"), Some(""));
    }
}
