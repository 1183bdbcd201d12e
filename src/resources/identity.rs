//! Identity of a user referenced by configuration

use crate::error::{ResourceError, ResourceResult};
use crate::gitlab::GitLabClient;
use tracing::debug;

/// A user named either by numeric id or by username
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentity {
    Id(u64),
    Username(String),
}

impl UserIdentity {
    /// Pick the identity out of a mutually exclusive `user_id`/`username` pair.
    ///
    /// Exactly one of the two must be set.
    pub fn from_pair(user_id: Option<u64>, username: Option<&str>) -> ResourceResult<Self> {
        let username = username.filter(|u| !u.is_empty());
        match (user_id, username) {
            (Some(id), None) => Ok(UserIdentity::Id(id)),
            (None, Some(name)) => Ok(UserIdentity::Username(name.to_lowercase())),
            _ => Err(ResourceError::ConflictingArguments {
                first: "user_id",
                second: "username",
            }),
        }
    }

    /// Resolve to a numeric user id, looking the username up if needed
    pub async fn resolve(&self, gitlab: &GitLabClient) -> ResourceResult<u64> {
        match self {
            UserIdentity::Id(id) => Ok(*id),
            UserIdentity::Username(username) => {
                let users = gitlab.users().find_by_username(username).await?;
                match users.as_slice() {
                    [] => Err(ResourceError::UserNotFound(username.clone())),
                    [user] => {
                        debug!(username = %username, user_id = user.id, "Resolved username");
                        Ok(user.id)
                    }
                    _ => Err(ResourceError::AmbiguousUser(username.clone())),
                }
            }
        }
    }
}
