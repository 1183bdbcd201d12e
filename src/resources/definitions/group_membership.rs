//! `gitlab_group_membership`
//!
//! Direct membership of a user in a group, with an access level and an
//! optional expiry date.

use crate::error::{GitLabError, ResourceError, ResourceResult};
use crate::gitlab::{AddGroupMemberOptions, EditGroupMemberOptions, RemoveGroupMemberOptions};
use crate::resources::access_level::{GROUP_ACCESS_LEVEL_NAMES, GROUP_ACCESS_LEVELS};
use crate::resources::id::{build_two_part_id, parse_numeric_id, parse_two_part_id, require_id};
use crate::resources::schema::ValueFormat;
use crate::resources::{
    AccessLevel, Attribute, Block, Resource, ResourceContext, ResourceSchema, UserIdentity,
    read_after_write,
};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Group membership handler
pub struct GroupMembership;

/// State of one group membership
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupMembershipState {
    /// `<group_id>:<user_id>`
    #[serde(default)]
    pub id: Option<String>,
    /// Group ID or full path
    pub group_id: String,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub access_level: Option<AccessLevel>,
    /// `YYYY-MM-DD`, empty for no expiry
    #[serde(default)]
    pub expires_at: String,
    #[serde(default)]
    pub skip_subresources_on_destroy: bool,
    #[serde(default)]
    pub unassign_issuables_on_destroy: bool,
}

impl GroupMembershipState {
    fn access_level(&self) -> ResourceResult<AccessLevel> {
        match self.access_level {
            Some(level) if GROUP_ACCESS_LEVELS.contains(&level) => Ok(level),
            Some(level) => Err(ResourceError::InvalidArguments(format!(
                "access_level {level} is not valid for a group member, expected one of {}",
                GROUP_ACCESS_LEVEL_NAMES.join(", ")
            ))),
            None => Err(ResourceError::InvalidArguments(
                "access_level must be set".to_string(),
            )),
        }
    }

    /// Group and user encoded in the id
    fn keys(&self) -> ResourceResult<(String, u64)> {
        let id = require_id(self.id.as_deref())?;
        let (group_id, user_id) = parse_two_part_id(id)?;
        let user_id = parse_numeric_id(&user_id, "user ID")?;
        Ok((group_id, user_id))
    }
}

impl GroupMembership {
    /// Resolve a 409 on add: the token owner may already be a member of a
    /// group they just created, in which case the membership is edited.
    async fn adopt_own_membership(
        &self,
        ctx: &ResourceContext,
        group_id: &str,
        user_id: u64,
        options: EditGroupMemberOptions,
        conflict: GitLabError,
    ) -> ResourceResult<()> {
        let current = match ctx.gitlab.users().current().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Cannot look up the current user after a membership conflict");
                return Err(conflict.into());
            }
        };

        if current.id != user_id {
            return Err(conflict.into());
        }

        debug!(
            group_id,
            user_id, "Current user is already a member, updating the membership instead"
        );
        ctx.gitlab
            .group_members()
            .edit(group_id, user_id, &options)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Resource for GroupMembership {
    type State = GroupMembershipState;

    const TYPE_NAME: &'static str = "gitlab_group_membership";

    fn schema() -> ResourceSchema {
        ResourceSchema::new(
            Self::TYPE_NAME,
            "Manages the membership of a user in a group.",
            Block::new(vec![
                Attribute::string("id").computed(),
                Attribute::string("group_id")
                    .required()
                    .force_new()
                    .describe("The ID or full path of the group."),
                Attribute::int("user_id")
                    .optional_computed()
                    .force_new()
                    .conflicts_with(&["username"])
                    .describe("The id of the user."),
                Attribute::string("username")
                    .optional_computed()
                    .force_new()
                    .conflicts_with(&["user_id"])
                    .describe("The username of the user."),
                Attribute::string("access_level")
                    .required()
                    .one_of(GROUP_ACCESS_LEVEL_NAMES)
                    .describe("Access level for the member."),
                Attribute::string("expires_at")
                    .format(ValueFormat::Date)
                    .describe("Expiration date for the group membership. Format: `YYYY-MM-DD`"),
                Attribute::bool("skip_subresources_on_destroy")
                    .destroy_only()
                    .default_value(false)
                    .describe("Whether the deletion of direct memberships of the removed member in subgroups and projects should be skipped."),
                Attribute::bool("unassign_issuables_on_destroy")
                    .destroy_only()
                    .default_value(false)
                    .describe("Whether the removed member should be unassigned from any issues or merge requests inside a given group or project."),
            ]),
        )
    }

    fn state_from_id(id: &str) -> ResourceResult<Self::State> {
        let (group_id, user_id) = parse_two_part_id(id)?;
        parse_numeric_id(&user_id, "user ID")?;
        Ok(GroupMembershipState {
            id: Some(id.to_string()),
            group_id,
            ..Default::default()
        })
    }

    fn validate(config: &Self::State) -> ResourceResult<()> {
        UserIdentity::from_pair(config.user_id, config.username.as_deref())?;
        config.access_level()?;
        Ok(())
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: Self::State,
    ) -> ResourceResult<Self::State> {
        let identity = UserIdentity::from_pair(planned.user_id, planned.username.as_deref())?;
        let access_level = planned.access_level()?;
        let user_id = identity.resolve(&ctx.gitlab).await?;
        let group_id = planned.group_id.clone();

        debug!(
            group_id = %group_id,
            user_id,
            access_level = %access_level,
            "Creating group membership"
        );

        let options = AddGroupMemberOptions {
            user_id,
            access_level: access_level.value(),
            expires_at: planned.expires_at.clone(),
        };
        match ctx.gitlab.group_members().add(&group_id, &options).await {
            Ok(_) => {}
            Err(e) if e.is_conflict() => {
                let edit = EditGroupMemberOptions {
                    access_level: options.access_level,
                    expires_at: options.expires_at,
                };
                self.adopt_own_membership(ctx, &group_id, user_id, edit, e)
                    .await?;
            }
            Err(e) => return Err(e.into()),
        }

        let id = build_two_part_id(&group_id, &user_id.to_string());
        let state = GroupMembershipState {
            id: Some(id.clone()),
            user_id: Some(user_id),
            ..planned
        };
        read_after_write(self, ctx, state, id).await
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: Self::State,
    ) -> ResourceResult<Option<Self::State>> {
        let (group_id, user_id) = current.keys()?;
        debug!(group_id = %group_id, user_id, "Reading group membership");

        let member = match ctx.gitlab.group_members().get(&group_id, user_id).await {
            Ok(member) => member,
            Err(e) if e.is_not_found() => {
                warn!(group_id = %group_id, user_id, "Group membership not found, removing from state");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let access_level = AccessLevel::from_value(member.access_level).ok_or_else(|| {
            GitLabError::InvalidResponse(format!(
                "unknown access level {} for member {}",
                member.access_level, member.id
            ))
        })?;

        Ok(Some(GroupMembershipState {
            id: Some(build_two_part_id(&group_id, &user_id.to_string())),
            group_id,
            user_id: Some(member.id),
            username: Some(member.username),
            access_level: Some(access_level),
            expires_at: member.expires_at.unwrap_or_default(),
            skip_subresources_on_destroy: current.skip_subresources_on_destroy,
            unassign_issuables_on_destroy: current.unassign_issuables_on_destroy,
        }))
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Self::State,
        planned: Self::State,
    ) -> ResourceResult<Self::State> {
        let (group_id, user_id) = prior.keys()?;
        let access_level = planned.access_level()?;

        debug!(
            group_id = %group_id,
            user_id,
            access_level = %access_level,
            "Updating group membership"
        );

        let options = EditGroupMemberOptions {
            access_level: access_level.value(),
            expires_at: planned.expires_at.clone(),
        };
        ctx.gitlab
            .group_members()
            .edit(&group_id, user_id, &options)
            .await?;

        let id = build_two_part_id(&group_id, &user_id.to_string());
        let state = GroupMembershipState {
            id: Some(id.clone()),
            ..planned
        };
        read_after_write(self, ctx, state, id).await
    }

    async fn delete(&self, ctx: &ResourceContext, current: Self::State) -> ResourceResult<()> {
        let (group_id, user_id) = current.keys()?;
        let options = RemoveGroupMemberOptions {
            skip_subresources: current.skip_subresources_on_destroy,
            unassign_issuables: current.unassign_issuables_on_destroy,
        };

        debug!(group_id = %group_id, user_id, ?options, "Removing group membership");
        ctx.gitlab
            .group_members()
            .remove(&group_id, user_id, options)
            .await?;
        Ok(())
    }
}
