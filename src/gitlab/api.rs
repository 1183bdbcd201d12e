//! Typed GitLab endpoints
//!
//! Thin services over [`GitLabClient`], grouped the way the REST API
//! documentation groups them.

use crate::error::GitLabResult;
use crate::gitlab::GitLabClient;
use crate::gitlab::types::*;
use crate::util::{QueryBuilder, encode_segment};
use serde_json::Value;

impl GitLabClient {
    /// `/users` and `/user`
    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    /// `/groups/:id/members`
    pub fn group_members(&self) -> GroupMembers<'_> {
        GroupMembers { client: self }
    }

    /// `/projects/:id/approvals`
    pub fn project_approvals(&self) -> ProjectApprovals<'_> {
        ProjectApprovals { client: self }
    }

    /// `/projects/:id/protected_environments`
    pub fn protected_environments(&self) -> ProtectedEnvironments<'_> {
        ProtectedEnvironments { client: self }
    }
}

pub struct Users<'a> {
    client: &'a GitLabClient,
}

impl Users<'_> {
    /// Users whose username matches exactly (case-insensitive on the server)
    pub async fn find_by_username(&self, username: &str) -> GitLabResult<Vec<User>> {
        let query = QueryBuilder::new().param("username", username).build();
        self.client.get(&format!("/users{}", query)).await
    }

    /// The user owning the token
    pub async fn current(&self) -> GitLabResult<User> {
        self.client.get("/user").await
    }
}

pub struct GroupMembers<'a> {
    client: &'a GitLabClient,
}

impl GroupMembers<'_> {
    pub async fn add(
        &self,
        group: &str,
        options: &AddGroupMemberOptions,
    ) -> GitLabResult<GroupMember> {
        let endpoint = format!("/groups/{}/members", encode_segment(group));
        self.client.post(&endpoint, options).await
    }

    pub async fn get(&self, group: &str, user_id: u64) -> GitLabResult<GroupMember> {
        let endpoint = format!("/groups/{}/members/{}", encode_segment(group), user_id);
        self.client.get(&endpoint).await
    }

    pub async fn edit(
        &self,
        group: &str,
        user_id: u64,
        options: &EditGroupMemberOptions,
    ) -> GitLabResult<GroupMember> {
        let endpoint = format!("/groups/{}/members/{}", encode_segment(group), user_id);
        self.client.put(&endpoint, options).await
    }

    pub async fn remove(
        &self,
        group: &str,
        user_id: u64,
        options: RemoveGroupMemberOptions,
    ) -> GitLabResult<()> {
        let query = QueryBuilder::new()
            .param("skip_subresources", options.skip_subresources)
            .param("unassign_issuables", options.unassign_issuables)
            .build();
        let endpoint = format!(
            "/groups/{}/members/{}{}",
            encode_segment(group),
            user_id,
            query
        );
        self.client.delete(&endpoint).await
    }
}

pub struct ProjectApprovals<'a> {
    client: &'a GitLabClient,
}

impl ProjectApprovals<'_> {
    pub async fn get(&self, project_id: u64) -> GitLabResult<ApprovalConfiguration> {
        self.client
            .get(&format!("/projects/{}/approvals", project_id))
            .await
    }

    /// GitLab answers with the full configuration; callers re-read anyway
    pub async fn change(
        &self,
        project_id: u64,
        options: &ChangeApprovalConfigurationOptions,
    ) -> GitLabResult<()> {
        let _: Value = self
            .client
            .post(&format!("/projects/{}/approvals", project_id), options)
            .await?;
        Ok(())
    }
}

pub struct ProtectedEnvironments<'a> {
    client: &'a GitLabClient,
}

impl ProtectedEnvironments<'_> {
    pub async fn protect(
        &self,
        project: &str,
        options: &ProtectEnvironmentOptions,
    ) -> GitLabResult<ProtectedEnvironment> {
        let endpoint = format!("/projects/{}/protected_environments", encode_segment(project));
        self.client.post(&endpoint, options).await
    }

    pub async fn get(&self, project: &str, environment: &str) -> GitLabResult<ProtectedEnvironment> {
        self.client.get(&Self::endpoint(project, environment)).await
    }

    pub async fn update(
        &self,
        project: &str,
        environment: &str,
        options: &UpdateProtectedEnvironmentOptions,
    ) -> GitLabResult<ProtectedEnvironment> {
        self.client
            .put(&Self::endpoint(project, environment), options)
            .await
    }

    pub async fn unprotect(&self, project: &str, environment: &str) -> GitLabResult<()> {
        self.client.delete(&Self::endpoint(project, environment)).await
    }

    fn endpoint(project: &str, environment: &str) -> String {
        format!(
            "/projects/{}/protected_environments/{}",
            encode_segment(project),
            encode_segment(environment)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_environment_endpoint_encoding() {
        assert_eq!(
            ProtectedEnvironments::endpoint("group/app", "review/app-1"),
            "/projects/group%2Fapp/protected_environments/review%2Fapp-1"
        );
    }
}
