//! GitLab resource provider
//!
//! Declarative create/read/update/delete handlers for GitLab objects, driven
//! by an infrastructure-as-code host that owns plans and state.
//!
//! ## Resources
//!
//! - `gitlab_group_membership`: a user's direct membership in a group
//! - `gitlab_project_level_mr_approvals`: project-wide MR approval settings
//! - `gitlab_project_protected_environment`: who may deploy to an environment
//!
//! ## Handler contract
//!
//! ```text
//! create(planned)        -> state      (read back after writing)
//! read(state)            -> state | gone
//! update(prior, planned) -> state
//! delete(state)
//! import(id)             -> state | gone
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [gitlab]
//! url = "https://gitlab.com"
//! # token from GITLAB_TOKEN env var
//! early_auth_check = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gitlab;
pub mod provider;
pub mod resources;
pub mod util;

// Re-export main types
pub use config::{ProviderConfig, load_config};
pub use error::{AppError, ResourceError, Result};
pub use provider::Provider;
pub use resources::{Resource, ResourceContext, ResourceRegistry};
