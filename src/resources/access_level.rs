//! Access level names and their GitLab integer codes

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use std::str::FromStr;

/// Permission tier on the GitLab platform.
///
/// Local state carries the name, the API carries [`AccessLevel::value`].
/// Names are matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum AccessLevel {
    #[serde(rename = "no one")]
    NoOne,
    #[serde(rename = "minimal")]
    Minimal,
    #[serde(rename = "guest")]
    Guest,
    #[serde(rename = "reporter")]
    Reporter,
    #[serde(rename = "developer")]
    Developer,
    #[serde(rename = "maintainer", alias = "master")]
    Maintainer,
    #[serde(rename = "owner")]
    Owner,
}

/// Levels a group member may hold
pub const GROUP_ACCESS_LEVELS: &[AccessLevel] = &[
    AccessLevel::Guest,
    AccessLevel::Reporter,
    AccessLevel::Developer,
    AccessLevel::Maintainer,
    AccessLevel::Owner,
];

/// Levels allowed to deploy to a protected environment
pub const DEPLOY_ACCESS_LEVELS: &[AccessLevel] = &[AccessLevel::Developer, AccessLevel::Maintainer];

/// Names accepted in configuration for [`GROUP_ACCESS_LEVELS`]
pub const GROUP_ACCESS_LEVEL_NAMES: &[&str] =
    &["guest", "reporter", "developer", "maintainer", "owner"];

/// Names accepted in configuration for [`DEPLOY_ACCESS_LEVELS`]
pub const DEPLOY_ACCESS_LEVEL_NAMES: &[&str] = &["developer", "maintainer"];

const ALL: &[AccessLevel] = &[
    AccessLevel::NoOne,
    AccessLevel::Minimal,
    AccessLevel::Guest,
    AccessLevel::Reporter,
    AccessLevel::Developer,
    AccessLevel::Maintainer,
    AccessLevel::Owner,
];

impl AccessLevel {
    /// Integer code used by the API
    pub const fn value(self) -> u32 {
        match self {
            AccessLevel::NoOne => 0,
            AccessLevel::Minimal => 5,
            AccessLevel::Guest => 10,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        ALL.iter().copied().find(|level| level.value() == value)
    }

    /// Canonical configuration name
    pub const fn name(self) -> &'static str {
        match self {
            AccessLevel::NoOne => "no one",
            AccessLevel::Minimal => "minimal",
            AccessLevel::Guest => "guest",
            AccessLevel::Reporter => "reporter",
            AccessLevel::Developer => "developer",
            AccessLevel::Maintainer => "maintainer",
            AccessLevel::Owner => "owner",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised access level name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAccessLevel(pub String);

impl fmt::Display for UnknownAccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown access level {:?}", self.0)
    }
}

impl std::error::Error for UnknownAccessLevel {}

impl<'de> Deserialize<'de> for AccessLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

impl FromStr for AccessLevel {
    type Err = UnknownAccessLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        // Deprecated name kept for old configurations
        if lowered == "master" {
            return Ok(AccessLevel::Maintainer);
        }
        ALL.iter()
            .copied()
            .find(|level| level.name() == lowered)
            .ok_or_else(|| UnknownAccessLevel(s.to_string()))
    }
}
