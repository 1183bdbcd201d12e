//! Resource definitions
//!
//! One module per managed GitLab object type.

pub mod group_membership;
pub mod project_level_mr_approvals;
pub mod project_protected_environment;

pub use group_membership::{GroupMembership, GroupMembershipState};
pub use project_level_mr_approvals::{ProjectLevelMrApprovals, ProjectLevelMrApprovalsState};
pub use project_protected_environment::{
    DeployAccessLevel, ProjectProtectedEnvironment, ProjectProtectedEnvironmentState,
};

use crate::resources::ResourceRegistry;

/// Register all built-in resources with the registry
pub fn register_all_resources(registry: &mut ResourceRegistry) {
    registry.register(GroupMembership);
    registry.register(ProjectLevelMrApprovals);
    registry.register(ProjectProtectedEnvironment);
}
