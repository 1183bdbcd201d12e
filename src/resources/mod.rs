//! Resources module
//!
//! The handler contract every managed GitLab object implements, plus the
//! shared pieces handlers are built from: composite ids, access level tables,
//! user identities and attribute schemas.

pub mod access_level;
pub mod definitions;
pub mod id;
pub mod identity;
pub mod registry;
pub mod schema;

pub use access_level::AccessLevel;
pub use identity::UserIdentity;
pub use registry::{RegisteredResource, ResourceRegistry};
pub use schema::{Attribute, Block, ResourceSchema};

use crate::error::{ResourceError, ResourceResult};
use crate::gitlab::GitLabClient;
// async_trait required for dyn-compatibility in the registry
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Everything a handler needs to talk to GitLab during one operation
#[derive(Clone)]
pub struct ResourceContext {
    pub gitlab: Arc<GitLabClient>,
}

impl ResourceContext {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

/// Create/read/update/delete handler for one remote object type.
///
/// `read` returning `Ok(None)` means the remote object is gone and the host
/// should drop it from state. Only a 404 is treated that way; every other
/// failure is an error.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Typed local state, also used as configuration input
    type State: Serialize + DeserializeOwned + JsonSchema + Send + Sync;

    /// Registered type name, e.g. `gitlab_group_membership`
    const TYPE_NAME: &'static str;

    fn schema() -> ResourceSchema;

    /// Skeleton state carrying only the keys encoded in `id`
    fn state_from_id(id: &str) -> ResourceResult<Self::State>;

    /// Resource specific checks the attribute schema cannot express
    fn validate(_config: &Self::State) -> ResourceResult<()> {
        Ok(())
    }

    async fn create(&self, ctx: &ResourceContext, planned: Self::State)
    -> ResourceResult<Self::State>;

    async fn read(
        &self,
        ctx: &ResourceContext,
        current: Self::State,
    ) -> ResourceResult<Option<Self::State>>;

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Self::State,
        planned: Self::State,
    ) -> ResourceResult<Self::State>;

    async fn delete(&self, ctx: &ResourceContext, current: Self::State) -> ResourceResult<()>;

    /// Populate a full state from the id alone
    async fn import(&self, ctx: &ResourceContext, id: &str) -> ResourceResult<Option<Self::State>> {
        let state = Self::state_from_id(id)?;
        self.read(ctx, state).await
    }
}

/// Read back after a write; the object must still exist
pub(crate) async fn read_after_write<R: Resource>(
    resource: &R,
    ctx: &ResourceContext,
    state: R::State,
    id: String,
) -> ResourceResult<R::State> {
    resource
        .read(ctx, state)
        .await?
        .ok_or(ResourceError::Vanished {
            resource: R::TYPE_NAME,
            id,
        })
}
