//! `gitlab_project_protected_environment`
//!
//! Restricts who may deploy to a project environment. Each deploy access
//! level grants deployment to exactly one of: a role, a user or a group.

use crate::error::{ResourceError, ResourceResult};
use crate::gitlab::{
    EnvironmentAccessDescription, EnvironmentAccessOptions, ProtectEnvironmentOptions,
    ProtectedEnvironment, UpdateEnvironmentAccessOptions, UpdateProtectedEnvironmentOptions,
};
use crate::resources::access_level::{DEPLOY_ACCESS_LEVEL_NAMES, DEPLOY_ACCESS_LEVELS};
use crate::resources::id::{build_two_part_id, parse_two_part_id, require_id};
use crate::resources::{
    AccessLevel, Attribute, Block, Resource, ResourceContext, ResourceSchema, read_after_write,
};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Protected environment handler
pub struct ProjectProtectedEnvironment;

/// State of one protected environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectProtectedEnvironmentState {
    /// `<project>:<environment>`
    #[serde(default)]
    pub id: Option<String>,
    /// Project ID or full path
    pub project: String,
    pub environment: String,
    #[serde(default)]
    pub required_approval_count: Option<u32>,
    #[serde(default)]
    pub deploy_access_levels: Vec<DeployAccessLevel>,
}

/// One grant of deploy permission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeployAccessLevel {
    /// Assigned by GitLab
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub access_level: Option<AccessLevel>,
    #[serde(default)]
    pub access_level_description: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub group_id: Option<u64>,
    /// 0: direct group members only, 1: inherited members too
    #[serde(default)]
    pub group_inheritance_type: Option<u32>,
}

/// Who a deploy access level grants permission to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeployTarget {
    User(u64),
    Group(u64),
    Role(AccessLevel),
}

impl DeployAccessLevel {
    /// GitLab reports an access level on user and group grants too, so the
    /// more specific target wins.
    fn target(&self) -> Option<DeployTarget> {
        self.user_id
            .map(DeployTarget::User)
            .or(self.group_id.map(DeployTarget::Group))
            .or(self.access_level.map(DeployTarget::Role))
    }

    fn to_options(&self) -> EnvironmentAccessOptions {
        EnvironmentAccessOptions {
            access_level: self.access_level.map(AccessLevel::value),
            user_id: self.user_id,
            group_id: self.group_id,
            group_inheritance_type: self.group_inheritance_type,
        }
    }

    /// Inheritance setting, where GitLab treats a missing value as 0
    fn inheritance(&self) -> u32 {
        self.group_inheritance_type.unwrap_or(0)
    }

    fn check(&self, path: &str, errors: &mut Vec<String>) {
        // Grants read back from GitLab carry an access level next to their
        // user or group, so only the resolved target counts for them.
        let from_remote = self.id.is_some();
        let targets = [
            self.access_level.is_some(),
            self.user_id.is_some(),
            self.group_id.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if (from_remote && self.target().is_none()) || (!from_remote && targets != 1) {
            errors.push(format!(
                "{path}: exactly one of `access_level`, `user_id`, `group_id` must be set"
            ));
        }

        if let Some(level) = self.access_level
            && (!from_remote || matches!(self.target(), Some(DeployTarget::Role(_))))
            && !DEPLOY_ACCESS_LEVELS.contains(&level)
        {
            errors.push(format!(
                "{path}.access_level: expected one of [{}], got {:?}",
                DEPLOY_ACCESS_LEVEL_NAMES.join(", "),
                level.name()
            ));
        }

        if let Some(inheritance) = self.group_inheritance_type {
            if self.group_id.is_none() {
                errors.push(format!(
                    "{path}.group_inheritance_type: only valid together with `group_id`"
                ));
            }
            if inheritance > 1 {
                errors.push(format!(
                    "{path}.group_inheritance_type: expected 0 or 1, got {inheritance}"
                ));
            }
        }
    }
}

impl From<EnvironmentAccessDescription> for DeployAccessLevel {
    fn from(remote: EnvironmentAccessDescription) -> Self {
        let access_level = AccessLevel::from_value(remote.access_level);
        if access_level.is_none() {
            debug!(
                id = remote.id,
                access_level = remote.access_level,
                "Unrecognised deploy access level"
            );
        }

        Self {
            id: Some(remote.id),
            access_level,
            access_level_description: Some(remote.access_level_description),
            user_id: remote.user_id,
            group_id: remote.group_id,
            group_inheritance_type: remote.group_inheritance_type,
        }
    }
}

impl ProjectProtectedEnvironmentState {
    /// Project and environment encoded in the id
    fn keys(&self) -> ResourceResult<(String, String)> {
        parse_two_part_id(require_id(self.id.as_deref())?)
    }
}

/// Put remote grants in the order the configuration lists them; grants the
/// configuration does not know about follow in remote order.
fn order_like_config(
    configured: &[DeployAccessLevel],
    remote: Vec<DeployAccessLevel>,
) -> Vec<DeployAccessLevel> {
    let mut remaining = remote;
    let mut ordered = Vec::with_capacity(remaining.len());

    for entry in configured {
        let Some(target) = entry.target() else {
            continue;
        };
        if let Some(pos) = remaining.iter().position(|r| r.target() == Some(target)) {
            ordered.push(remaining.remove(pos));
        }
    }

    ordered.extend(remaining);
    ordered
}

/// Changes turning `prior` grants into `planned` ones: removals and edits
/// carry the remote id, additions carry none. Unchanged grants are left out.
fn diff_access_levels(
    prior: &[DeployAccessLevel],
    planned: &[DeployAccessLevel],
) -> Vec<UpdateEnvironmentAccessOptions> {
    let mut changes = Vec::new();

    for old in prior {
        let target = old.target();
        if let Some(new) = planned.iter().find(|new| new.target() == target) {
            let inheritance_changed = matches!(target, Some(DeployTarget::Group(_)))
                && new.group_inheritance_type.is_some()
                && new.inheritance() != old.inheritance();
            if inheritance_changed {
                match old.id {
                    Some(id) => changes.push(UpdateEnvironmentAccessOptions {
                        id: Some(id),
                        access: EnvironmentAccessOptions {
                            group_inheritance_type: new.group_inheritance_type,
                            ..Default::default()
                        },
                        ..Default::default()
                    }),
                    None => warn!(?target, "Changed deploy access level has no id, skipping"),
                }
            }
            continue;
        }
        match old.id {
            Some(id) => changes.push(UpdateEnvironmentAccessOptions {
                id: Some(id),
                destroy: Some(true),
                ..Default::default()
            }),
            None => warn!(?target, "Removed deploy access level has no id, skipping"),
        }
    }

    for new in planned {
        let target = new.target();
        if prior.iter().any(|old| old.target() == target) {
            continue;
        }
        changes.push(UpdateEnvironmentAccessOptions {
            access: new.to_options(),
            ..Default::default()
        });
    }

    changes
}

fn to_state(
    project: String,
    configured: &[DeployAccessLevel],
    remote: ProtectedEnvironment,
) -> ProjectProtectedEnvironmentState {
    let deploy_access_levels = remote
        .deploy_access_levels
        .into_iter()
        .map(DeployAccessLevel::from)
        .collect();

    ProjectProtectedEnvironmentState {
        id: Some(build_two_part_id(&project, &remote.name)),
        project,
        environment: remote.name,
        required_approval_count: remote.required_approval_count,
        deploy_access_levels: order_like_config(configured, deploy_access_levels),
    }
}

#[async_trait]
impl Resource for ProjectProtectedEnvironment {
    type State = ProjectProtectedEnvironmentState;

    const TYPE_NAME: &'static str = "gitlab_project_protected_environment";

    fn schema() -> ResourceSchema {
        let deploy_access_level = Block::new(vec![
            Attribute::int("id")
                .computed()
                .describe("The unique ID of the Deploy Access Level object."),
            Attribute::string("access_level")
                .optional_computed()
                .one_of(DEPLOY_ACCESS_LEVEL_NAMES)
                .describe("Levels of access required to deploy to this protected environment."),
            Attribute::string("access_level_description")
                .computed()
                .describe("Readable description of level of access."),
            Attribute::int("user_id")
                .describe("The ID of the user allowed to deploy to this protected environment."),
            Attribute::int("group_id")
                .describe("The ID of the group allowed to deploy to this protected environment."),
            Attribute::int("group_inheritance_type").describe(
                "Group inheritance allows deploy access levels to take inherited group membership into account. Valid values are `0`, `1`.",
            ),
        ])
        .exactly_one_of(&["access_level", "user_id", "group_id"]);

        ResourceSchema::new(
            Self::TYPE_NAME,
            "Manages protected environments of a project.",
            Block::new(vec![
                Attribute::string("id").computed(),
                Attribute::string("project")
                    .required()
                    .force_new()
                    .describe("The ID or full path of the project which the protected environment is created against."),
                Attribute::string("environment")
                    .required()
                    .force_new()
                    .describe("The name of the environment."),
                Attribute::int("required_approval_count")
                    .optional_computed()
                    .describe("The number of approvals required to deploy to this environment."),
                Attribute::list("deploy_access_levels", deploy_access_level)
                    .required()
                    .min_items(1)
                    .describe("Array of access levels allowed to deploy, with each described by a hash."),
            ]),
        )
    }

    fn state_from_id(id: &str) -> ResourceResult<Self::State> {
        let (project, environment) = parse_two_part_id(id)?;
        Ok(ProjectProtectedEnvironmentState {
            id: Some(id.to_string()),
            project,
            environment,
            ..Default::default()
        })
    }

    fn validate(config: &Self::State) -> ResourceResult<()> {
        let mut errors = Vec::new();

        if config.deploy_access_levels.is_empty() {
            errors.push("deploy_access_levels: at least 1 element(s) required".to_string());
        }
        for (index, entry) in config.deploy_access_levels.iter().enumerate() {
            entry.check(&format!("deploy_access_levels.{index}"), &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResourceError::Validation(errors))
        }
    }

    async fn create(
        &self,
        ctx: &ResourceContext,
        planned: Self::State,
    ) -> ResourceResult<Self::State> {
        Self::validate(&planned)?;

        let options = ProtectEnvironmentOptions {
            name: planned.environment.clone(),
            deploy_access_levels: planned
                .deploy_access_levels
                .iter()
                .map(DeployAccessLevel::to_options)
                .collect(),
            required_approval_count: planned.required_approval_count,
        };

        debug!(
            project = %planned.project,
            environment = %planned.environment,
            ?options,
            "Protecting environment"
        );
        let created = ctx
            .gitlab
            .protected_environments()
            .protect(&planned.project, &options)
            .await?;

        let id = build_two_part_id(&planned.project, &created.name);
        let state = ProjectProtectedEnvironmentState {
            id: Some(id.clone()),
            environment: created.name,
            ..planned
        };
        read_after_write(self, ctx, state, id).await
    }

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: Self::State,
    ) -> ResourceResult<Option<Self::State>> {
        let (project, environment) = current.keys()?;
        debug!(project = %project, environment = %environment, "Reading protected environment");

        match ctx
            .gitlab
            .protected_environments()
            .get(&project, &environment)
            .await
        {
            Ok(remote) => Ok(Some(to_state(
                project,
                &current.deploy_access_levels,
                remote,
            ))),
            Err(e) if e.is_not_found() => {
                warn!(
                    project = %project,
                    environment = %environment,
                    "Protected environment not found, removing from state"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Self::State,
        planned: Self::State,
    ) -> ResourceResult<Self::State> {
        Self::validate(&planned)?;
        let (project, environment) = prior.keys()?;

        let changes = diff_access_levels(&prior.deploy_access_levels, &planned.deploy_access_levels);
        let options = UpdateProtectedEnvironmentOptions {
            deploy_access_levels: (!changes.is_empty()).then_some(changes),
            required_approval_count: planned
                .required_approval_count
                .filter(|count| prior.required_approval_count != Some(*count)),
        };

        if options.is_empty() {
            debug!(project = %project, environment = %environment, "Protected environment unchanged");
        } else {
            debug!(
                project = %project,
                environment = %environment,
                ?options,
                "Updating protected environment"
            );
            ctx.gitlab
                .protected_environments()
                .update(&project, &environment, &options)
                .await?;
        }

        let id = build_two_part_id(&project, &environment);
        let state = ProjectProtectedEnvironmentState {
            id: Some(id.clone()),
            project,
            environment,
            ..planned
        };
        read_after_write(self, ctx, state, id).await
    }

    async fn delete(&self, ctx: &ResourceContext, current: Self::State) -> ResourceResult<()> {
        let (project, environment) = current.keys()?;

        debug!(project = %project, environment = %environment, "Unprotecting environment");
        ctx.gitlab
            .protected_environments()
            .unprotect(&project, &environment)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn role(level: AccessLevel) -> DeployAccessLevel {
        DeployAccessLevel {
            access_level: Some(level),
            ..Default::default()
        }
    }

    fn user(id: u64) -> DeployAccessLevel {
        DeployAccessLevel {
            user_id: Some(id),
            ..Default::default()
        }
    }

    fn group(id: u64) -> DeployAccessLevel {
        DeployAccessLevel {
            group_id: Some(id),
            ..Default::default()
        }
    }

    fn remote(id: u64, entry: DeployAccessLevel, level: AccessLevel) -> DeployAccessLevel {
        DeployAccessLevel {
            id: Some(id),
            access_level: Some(level),
            access_level_description: Some("desc".to_string()),
            ..entry
        }
    }

    #[test]
    fn test_target_prefers_user_and_group_over_role() {
        let entry = remote(1, group(7), AccessLevel::Developer);
        assert_eq!(entry.target(), Some(DeployTarget::Group(7)));
        assert_eq!(
            role(AccessLevel::Maintainer).target(),
            Some(DeployTarget::Role(AccessLevel::Maintainer))
        );
        assert_eq!(DeployAccessLevel::default().target(), None);
    }

    #[test]
    fn test_order_follows_configuration() {
        let configured = vec![group(7), role(AccessLevel::Maintainer), user(3)];
        let from_remote = vec![
            remote(10, user(3), AccessLevel::Developer),
            remote(11, role(AccessLevel::Developer), AccessLevel::Developer),
            remote(12, role(AccessLevel::Maintainer), AccessLevel::Maintainer),
            remote(13, group(7), AccessLevel::Developer),
        ];

        let ids: Vec<_> = order_like_config(&configured, from_remote)
            .into_iter()
            .map(|e| e.id.unwrap())
            .collect();
        assert_eq!(ids, vec![13, 12, 10, 11]);
    }

    #[test]
    fn test_diff_destroys_removed_and_adds_new() {
        let prior = vec![
            remote(10, role(AccessLevel::Developer), AccessLevel::Developer),
            remote(11, user(3), AccessLevel::Developer),
        ];
        let planned = vec![user(3), group(8)];

        let changes = diff_access_levels(&prior, &planned);
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            serde_json::json!([
                {"id": 10, "_destroy": true},
                {"group_id": 8}
            ])
        );

        assert!(diff_access_levels(&prior, &prior).is_empty());
    }

    #[test]
    fn test_diff_edits_group_inheritance_in_place() {
        let prior = vec![DeployAccessLevel {
            group_inheritance_type: Some(0),
            ..remote(12, group(9), AccessLevel::Developer)
        }];

        let planned = vec![DeployAccessLevel {
            group_inheritance_type: Some(1),
            ..group(9)
        }];
        assert_eq!(
            serde_json::to_value(diff_access_levels(&prior, &planned)).unwrap(),
            serde_json::json!([{"id": 12, "group_inheritance_type": 1}])
        );

        // unset in configuration means "keep whatever GitLab has"
        assert!(diff_access_levels(&prior, &[group(9)]).is_empty());
        let explicit_default = vec![DeployAccessLevel {
            group_inheritance_type: Some(0),
            ..group(9)
        }];
        assert!(diff_access_levels(&prior, &explicit_default).is_empty());
    }

    #[test]
    fn test_read_back_grants_pass_checks() {
        let mut errors = Vec::new();
        remote(2, group(9), AccessLevel::Developer).check("deploy_access_levels.0", &mut errors);
        remote(3, user(4), AccessLevel::Reporter).check("deploy_access_levels.1", &mut errors);
        assert!(errors.is_empty(), "{errors:?}");

        remote(4, role(AccessLevel::Owner), AccessLevel::Owner)
            .check("deploy_access_levels.2", &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[rstest]
    #[case(role(AccessLevel::Developer), 0)]
    #[case(DeployAccessLevel { group_inheritance_type: Some(1), ..group(2) }, 0)]
    #[case(DeployAccessLevel::default(), 1)]
    #[case(DeployAccessLevel { user_id: Some(1), ..role(AccessLevel::Maintainer) }, 1)]
    #[case(role(AccessLevel::Owner), 1)]
    #[case(DeployAccessLevel { group_inheritance_type: Some(1), ..user(2) }, 1)]
    #[case(DeployAccessLevel { group_inheritance_type: Some(2), ..group(2) }, 1)]
    fn test_access_level_checks(#[case] entry: DeployAccessLevel, #[case] problems: usize) {
        let mut errors = Vec::new();
        entry.check("deploy_access_levels.0", &mut errors);
        assert_eq!(errors.len(), problems, "{errors:?}");
    }

    #[test]
    fn test_validate_requires_an_entry() {
        let state = ProjectProtectedEnvironment::state_from_id("1:production").unwrap();
        assert!(matches!(
            ProjectProtectedEnvironment::validate(&state),
            Err(ResourceError::Validation(_))
        ));
    }

    #[test]
    fn test_state_from_id() {
        let state = ProjectProtectedEnvironment::state_from_id("group/app:review/app").unwrap();
        assert_eq!(state.project, "group/app");
        assert_eq!(state.environment, "review/app");
        assert!(ProjectProtectedEnvironment::state_from_id("production").is_err());
    }
}
