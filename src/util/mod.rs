//! Utility functions shared across the crate.

mod secret;

pub use secret::SecretString;

use std::fmt::Display;

/// Builder for URL query strings.
///
/// Values are URL encoded when added.
///
/// # Example
/// ```ignore
/// let query = QueryBuilder::new()
///     .param("username", "alice")
///     .build();
/// // Returns "?username=alice"
/// ```
#[derive(Default)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Create a new empty query builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter that is always sent.
    pub fn param(mut self, key: &str, value: impl Display) -> Self {
        self.params.push((
            key.to_string(),
            urlencoding::encode(&value.to_string()).into_owned(),
        ));
        self
    }

    /// Build the query string.
    ///
    /// Empty when nothing was added, otherwise `?key1=value1&key2=value2`.
    pub fn build(self) -> String {
        if self.params.is_empty() {
            return String::new();
        }

        let joined = self
            .params
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{joined}")
    }
}

/// Encode a single path segment (project path, environment name, ...).
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        assert_eq!(QueryBuilder::new().build(), "");
    }

    #[test]
    fn test_query_encoding_and_order() {
        let query = QueryBuilder::new()
            .param("username", "al ice")
            .param("skip_subresources", true)
            .build();
        assert_eq!(query, "?username=al%20ice&skip_subresources=true");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("group/project"), "group%2Fproject");
        assert_eq!(encode_segment("review/feature-1"), "review%2Ffeature-1");
        assert_eq!(encode_segment("42"), "42");
    }
}
