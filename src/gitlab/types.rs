//! GitLab API request and response types
//!
//! Only the endpoints the resource handlers talk to are modelled here.
//! Access levels travel as integer codes on the wire.

use serde::{Deserialize, Serialize};

/// GitLab user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Direct member of a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub access_level: u32,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Body of `POST /groups/:id/members`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AddGroupMemberOptions {
    pub user_id: u64,
    pub access_level: u32,
    /// Empty string means no expiry
    pub expires_at: String,
}

/// Body of `PUT /groups/:id/members/:user_id`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EditGroupMemberOptions {
    pub access_level: u32,
    /// Empty string clears the expiry
    pub expires_at: String,
}

/// Query flags of `DELETE /groups/:id/members/:user_id`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveGroupMemberOptions {
    pub skip_subresources: bool,
    pub unassign_issuables: bool,
}

/// Project-level merge request approval configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApprovalConfiguration {
    pub approvals_before_merge: Option<u32>,
    pub reset_approvals_on_push: bool,
    pub disable_overriding_approvers_per_merge_request: bool,
    pub merge_requests_author_approval: bool,
    pub merge_requests_disable_committers_approval: bool,
    pub require_password_to_approve: bool,
}

/// Body of `POST /projects/:id/approvals`; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ChangeApprovalConfigurationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_approvals_on_push: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_overriding_approvers_per_merge_request: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_requests_author_approval: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_requests_disable_committers_approval: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_password_to_approve: Option<bool>,
}

impl ChangeApprovalConfigurationOptions {
    /// Whether the request would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Protected environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedEnvironment {
    pub name: String,
    #[serde(default)]
    pub deploy_access_levels: Vec<EnvironmentAccessDescription>,
    #[serde(default)]
    pub required_approval_count: Option<u32>,
}

/// One deploy access rule of a protected environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentAccessDescription {
    pub id: u64,
    pub access_level: u32,
    #[serde(default)]
    pub access_level_description: String,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub group_id: Option<u64>,
    #[serde(default)]
    pub group_inheritance_type: Option<u32>,
}

/// Deploy access rule sent when protecting an environment
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EnvironmentAccessOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_inheritance_type: Option<u32>,
}

/// Body of `POST /projects/:id/protected_environments`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProtectEnvironmentOptions {
    pub name: String,
    pub deploy_access_levels: Vec<EnvironmentAccessOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_approval_count: Option<u32>,
}

/// Deploy access rule change: a new rule (no `id`), an in-place edit or a removal
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateEnvironmentAccessOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub access: EnvironmentAccessOptions,
    #[serde(rename = "_destroy", skip_serializing_if = "Option::is_none")]
    pub destroy: Option<bool>,
}

/// Body of `PUT /projects/:id/protected_environments/:name`
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateProtectedEnvironmentOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_access_levels: Option<Vec<UpdateEnvironmentAccessOptions>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_approval_count: Option<u32>,
}

impl UpdateProtectedEnvironmentOptions {
    /// Whether the request would change nothing
    pub fn is_empty(&self) -> bool {
        self.deploy_access_levels.is_none() && self.required_approval_count.is_none()
    }
}
