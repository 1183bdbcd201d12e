//! `gitlab_project_level_mr_approvals`
//!
//! Project-wide merge request approval settings. The settings always exist on
//! the project, so "deleting" the resource restores GitLab's defaults.

use crate::error::{ResourceError, ResourceResult};
use crate::gitlab::{ApprovalConfiguration, ChangeApprovalConfigurationOptions};
use crate::resources::id::{parse_numeric_id, require_id};
use crate::resources::{
    Attribute, Block, Resource, ResourceContext, ResourceSchema, read_after_write,
};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// MR approval settings handler
pub struct ProjectLevelMrApprovals;

/// State of a project's approval settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectLevelMrApprovalsState {
    /// The project ID
    #[serde(default)]
    pub id: Option<String>,
    pub project_id: u64,
    #[serde(default)]
    pub reset_approvals_on_push: bool,
    #[serde(default)]
    pub disable_overriding_approvers_per_merge_request: bool,
    #[serde(default)]
    pub merge_requests_author_approval: bool,
    #[serde(default)]
    pub merge_requests_disable_committers_approval: bool,
    #[serde(default)]
    pub require_password_to_approve: bool,
}

impl ProjectLevelMrApprovalsState {
    fn project_id_from_id(&self) -> ResourceResult<u64> {
        parse_numeric_id(require_id(self.id.as_deref())?, "project ID")
    }

    /// Request setting every flag to this state's value
    fn full_options(&self) -> ChangeApprovalConfigurationOptions {
        ChangeApprovalConfigurationOptions {
            reset_approvals_on_push: Some(self.reset_approvals_on_push),
            disable_overriding_approvers_per_merge_request: Some(
                self.disable_overriding_approvers_per_merge_request,
            ),
            merge_requests_author_approval: Some(self.merge_requests_author_approval),
            merge_requests_disable_committers_approval: Some(
                self.merge_requests_disable_committers_approval,
            ),
            require_password_to_approve: Some(self.require_password_to_approve),
        }
    }

    /// Request carrying only the flags that differ from `prior`
    fn changed_options(&self, prior: &Self) -> ChangeApprovalConfigurationOptions {
        fn changed(old: bool, new: bool) -> Option<bool> {
            (old != new).then_some(new)
        }

        ChangeApprovalConfigurationOptions {
            reset_approvals_on_push: changed(
                prior.reset_approvals_on_push,
                self.reset_approvals_on_push,
            ),
            disable_overriding_approvers_per_merge_request: changed(
                prior.disable_overriding_approvers_per_merge_request,
                self.disable_overriding_approvers_per_merge_request,
            ),
            merge_requests_author_approval: changed(
                prior.merge_requests_author_approval,
                self.merge_requests_author_approval,
            ),
            merge_requests_disable_committers_approval: changed(
                prior.merge_requests_disable_committers_approval,
                self.merge_requests_disable_committers_approval,
            ),
            require_password_to_approve: changed(
                prior.require_password_to_approve,
                self.require_password_to_approve,
            ),
        }
    }

    fn from_remote(project_id: u64, config: ApprovalConfiguration) -> Self {
        Self {
            id: Some(project_id.to_string()),
            project_id,
            reset_approvals_on_push: config.reset_approvals_on_push,
            disable_overriding_approvers_per_merge_request: config
                .disable_overriding_approvers_per_merge_request,
            merge_requests_author_approval: config.merge_requests_author_approval,
            merge_requests_disable_committers_approval: config
                .merge_requests_disable_committers_approval,
            require_password_to_approve: config.require_password_to_approve,
        }
    }
}

/// GitLab's settings for a project that never changed them
fn default_options() -> ChangeApprovalConfigurationOptions {
    ChangeApprovalConfigurationOptions {
        reset_approvals_on_push: Some(true),
        disable_overriding_approvers_per_merge_request: Some(false),
        merge_requests_author_approval: Some(false),
        merge_requests_disable_committers_approval: Some(false),
        require_password_to_approve: Some(false),
    }
}

#[async_trait]
impl Resource for ProjectLevelMrApprovals {
    type State = ProjectLevelMrApprovalsState;

    const TYPE_NAME: &'static str = "gitlab_project_level_mr_approvals";

    fn schema() -> ResourceSchema {
        ResourceSchema::new(
            Self::TYPE_NAME,
            "Configures project-level merge request approval settings.",
            Block::new(vec![
                Attribute::string("id").computed(),
                Attribute::int("project_id")
                    .required()
                    .force_new()
                    .describe("The ID of the project to change MR approval configuration."),
                Attribute::bool("reset_approvals_on_push")
                    .describe("Set to `true` to remove all approvals in a merge request when new commits are pushed to its source branch."),
                Attribute::bool("disable_overriding_approvers_per_merge_request")
                    .describe("By default, users are able to edit the approval rules in merge requests. If set to true, the approval rules for all new merge requests will be determined by the default approval rules."),
                Attribute::bool("merge_requests_author_approval")
                    .describe("Set to `true` to allow merge requests authors to approve their own merge requests."),
                Attribute::bool("merge_requests_disable_committers_approval")
                    .describe("Set to `true` to disable merge request committers from approving their own merge requests."),
                Attribute::bool("require_password_to_approve")
                    .describe("Set to `true` to require authentication to approve merge requests."),
            ]),
        )
    }

    fn state_from_id(id: &str) -> ResourceResult<Self::State> {
        let project_id = parse_numeric_id(id, "project ID")?;
        Ok(ProjectLevelMrApprovalsState {
            id: Some(id.to_string()),
            project_id,
            ..Default::default()
        })
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: Self::State,
    ) -> ResourceResult<Self::State> {
        let project_id = planned.project_id;
        let options = planned.full_options();

        debug!(project_id, ?options, "Creating approval configuration");
        ctx.gitlab
            .project_approvals()
            .change(project_id, &options)
            .await
            .map_err(|e| ResourceError::remote("couldn't create approval configuration", e))?;

        let id = project_id.to_string();
        let state = ProjectLevelMrApprovalsState {
            id: Some(id.clone()),
            ..planned
        };
        read_after_write(self, ctx, state, id).await
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: Self::State,
    ) -> ResourceResult<Option<Self::State>> {
        let project_id = current.project_id_from_id()?;
        debug!(project_id, "Reading approval configuration");

        match ctx.gitlab.project_approvals().get(project_id).await {
            Ok(config) => Ok(Some(ProjectLevelMrApprovalsState::from_remote(
                project_id, config,
            ))),
            Err(e) if e.is_not_found() => {
                warn!(project_id, "Project not found, removing approval configuration from state");
                Ok(None)
            }
            Err(e) => Err(ResourceError::remote(
                "couldn't read approval configuration",
                e,
            )),
        }
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Self::State,
        planned: Self::State,
    ) -> ResourceResult<Self::State> {
        let project_id = prior.project_id_from_id()?;
        let options = planned.changed_options(&prior);

        if options.is_empty() {
            debug!(project_id, "Approval configuration unchanged");
        } else {
            debug!(project_id, ?options, "Updating approval configuration");
            ctx.gitlab
                .project_approvals()
                .change(project_id, &options)
                .await
                .map_err(|e| ResourceError::remote("couldn't update approval configuration", e))?;
        }

        let id = project_id.to_string();
        let state = ProjectLevelMrApprovalsState {
            id: Some(id.clone()),
            ..planned
        };
        read_after_write(self, ctx, state, id).await
    }

    async fn delete(&self, ctx: &ResourceContext, current: Self::State) -> ResourceResult<()> {
        let project_id = current.project_id_from_id()?;

        debug!(project_id, "Resetting approval configuration to defaults");
        ctx.gitlab
            .project_approvals()
            .change(project_id, &default_options())
            .await
            .map_err(|e| ResourceError::remote("couldn't reset approval configuration", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ProjectLevelMrApprovalsState {
        ProjectLevelMrApprovalsState {
            id: Some("5".to_string()),
            project_id: 5,
            reset_approvals_on_push: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_options_send_unset_as_false() {
        let options = serde_json::to_value(state().full_options()).unwrap();
        assert_eq!(
            options,
            serde_json::json!({
                "reset_approvals_on_push": true,
                "disable_overriding_approvers_per_merge_request": false,
                "merge_requests_author_approval": false,
                "merge_requests_disable_committers_approval": false,
                "require_password_to_approve": false
            })
        );
    }

    #[test]
    fn test_changed_options_only_differences() {
        let prior = state();
        let planned = ProjectLevelMrApprovalsState {
            reset_approvals_on_push: false,
            require_password_to_approve: true,
            ..prior.clone()
        };

        let options = planned.changed_options(&prior);
        assert_eq!(options.reset_approvals_on_push, Some(false));
        assert_eq!(options.require_password_to_approve, Some(true));
        assert_eq!(options.merge_requests_author_approval, None);

        assert!(prior.changed_options(&prior).is_empty());
    }

    #[test]
    fn test_non_numeric_id() {
        let err = ProjectLevelMrApprovals::state_from_id("group/project").unwrap_err();
        assert!(matches!(err, ResourceError::InvalidId { .. }));
        assert!(err.to_string().contains("project ID must be an integer"));
    }
}
