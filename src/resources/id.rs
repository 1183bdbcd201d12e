//! Composite resource identifiers
//!
//! The host tracks one string id per managed object. Objects addressed by
//! several natural keys pack them into `key1:key2[:key3]`.

use crate::error::{ResourceError, ResourceResult};
use tracing::warn;

/// Separator between id parts
pub const ID_SEPARATOR: char = ':';

/// Join two keys into one id
pub fn build_two_part_id(first: &str, second: &str) -> String {
    format!("{first}{ID_SEPARATOR}{second}")
}

/// Split an id built by [`build_two_part_id`]
///
/// Only the first separator splits, so the second key may contain `:`.
pub fn parse_two_part_id(id: &str) -> ResourceResult<(String, String)> {
    let [first, second] = split_id::<2>(id, "<first>:<second>")?;
    Ok((first, second))
}

/// Join three keys into one id
pub fn build_three_part_id(first: &str, second: &str, third: &str) -> String {
    format!("{first}{ID_SEPARATOR}{second}{ID_SEPARATOR}{third}")
}

/// Split an id built by [`build_three_part_id`]
pub fn parse_three_part_id(id: &str) -> ResourceResult<(String, String, String)> {
    let [first, second, third] = split_id::<3>(id, "<first>:<second>:<third>")?;
    Ok((first, second, third))
}

/// Parse a single-part numeric id
pub fn parse_numeric_id(id: &str, what: &str) -> ResourceResult<u64> {
    id.parse().map_err(|_| {
        warn!(id, "Cannot parse numeric id");
        ResourceError::invalid_id(id, format!("{what} must be an integer"))
    })
}

/// The id a state must carry before it can be read, updated or deleted
pub fn require_id(id: Option<&str>) -> ResourceResult<&str> {
    id.filter(|id| !id.is_empty()).ok_or_else(|| {
        ResourceError::InvalidArguments("state has no id; create or import it first".to_string())
    })
}

fn split_id<const N: usize>(id: &str, expected: &str) -> ResourceResult<[String; N]> {
    let parts: Vec<&str> = id.splitn(N, ID_SEPARATOR).collect();

    if parts.len() != N || parts.iter().any(|p| p.is_empty()) {
        warn!(id, "Malformed composite id");
        return Err(ResourceError::invalid_id(id, expected));
    }

    let parts: Vec<String> = parts.into_iter().map(str::to_string).collect();
    parts
        .try_into()
        .map_err(|_| ResourceError::invalid_id(id, expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_part_round_trip() {
        let id = build_two_part_id("42", "7");
        assert_eq!(id, "42:7");
        assert_eq!(
            parse_two_part_id(&id).unwrap(),
            ("42".to_string(), "7".to_string())
        );
    }

    #[test]
    fn test_second_part_may_contain_separator() {
        let (project, env) = parse_two_part_id("group/app:review:feature").unwrap();
        assert_eq!(project, "group/app");
        assert_eq!(env, "review:feature");
    }

    #[test]
    fn test_three_part_round_trip() {
        let id = build_three_part_id("a", "b", "c");
        assert_eq!(
            parse_three_part_id(&id).unwrap(),
            ("a".to_string(), "b".to_string(), "c".to_string())
        );
    }

    #[test]
    fn test_malformed_ids() {
        for id in ["", "42", "42:", ":7", "a:b"] {
            if id == "a:b" {
                assert!(parse_three_part_id(id).is_err());
                continue;
            }
            assert!(
                matches!(parse_two_part_id(id), Err(ResourceError::InvalidId { .. })),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(parse_numeric_id("123", "project ID").unwrap(), 123);
        let err = parse_numeric_id("abc", "project ID").unwrap_err();
        assert!(err.to_string().contains("project ID must be an integer"));
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(Some("1:2")).unwrap(), "1:2");
        assert!(require_id(Some("")).is_err());
        assert!(require_id(None).is_err());
    }
}
