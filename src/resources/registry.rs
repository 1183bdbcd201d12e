//! Resource registry
//!
//! Maps resource type names to their handlers and dispatches JSON state to
//! the typed implementations.

use crate::error::{ResourceError, ResourceResult};
use crate::resources::definitions;
use crate::resources::schema::ResourceSchema;
use crate::resources::{Resource, ResourceContext};
// async_trait required for dyn-compatibility with Box<dyn ResourceHandler>
use async_trait::async_trait;
use schemars::Schema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// A registered resource with its metadata
pub struct RegisteredResource {
    /// Attribute schema
    pub schema: ResourceSchema,
    /// JSON Schema of the typed state
    pub state_schema: Schema,
    handler: Box<dyn ResourceHandler>,
}

impl RegisteredResource {
    pub fn type_name(&self) -> &'static str {
        self.schema.type_name
    }
}

/// Internal trait for type-erased resource handling
#[async_trait]
trait ResourceHandler: Send + Sync {
    fn validate(&self, schema: &ResourceSchema, config: &Value) -> ResourceResult<()>;

    async fn create(&self, ctx: &ResourceContext, planned: Value) -> ResourceResult<Value>;

    async fn read(&self, ctx: &ResourceContext, current: Value) -> ResourceResult<Option<Value>>;

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Value,
        planned: Value,
    ) -> ResourceResult<Value>;

    async fn delete(&self, ctx: &ResourceContext, current: Value) -> ResourceResult<()>;

    async fn import(&self, ctx: &ResourceContext, id: &str) -> ResourceResult<Option<Value>>;
}

/// Adapter from JSON state to a typed [`Resource`]
struct TypedResourceHandler<R: Resource> {
    resource: R,
}

fn decode<T: DeserializeOwned>(what: &str, value: Value) -> ResourceResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ResourceError::InvalidArguments(format!("Failed to parse {}: {}", what, e)))
}

#[async_trait]
impl<R: Resource> ResourceHandler for TypedResourceHandler<R> {
    fn validate(&self, schema: &ResourceSchema, config: &Value) -> ResourceResult<()> {
        schema.validate(config).map_err(ResourceError::Validation)?;
        let typed: R::State = decode("configuration", config.clone())?;
        R::validate(&typed)
    }

    async fn create(&self, ctx: &ResourceContext, planned: Value) -> ResourceResult<Value> {
        let planned: R::State = decode("planned state", planned)?;
        let state = self.resource.create(ctx, planned).await?;
        Ok(serde_json::to_value(state)?)
    }

    async fn read(&self, ctx: &ResourceContext, current: Value) -> ResourceResult<Option<Value>> {
        let current: R::State = decode("current state", current)?;
        match self.resource.read(ctx, current).await? {
            Some(state) => Ok(Some(serde_json::to_value(state)?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        ctx: &ResourceContext,
        prior: Value,
        planned: Value,
    ) -> ResourceResult<Value> {
        let prior: R::State = decode("prior state", prior)?;
        let planned: R::State = decode("planned state", planned)?;
        let state = self.resource.update(ctx, prior, planned).await?;
        Ok(serde_json::to_value(state)?)
    }

    async fn delete(&self, ctx: &ResourceContext, current: Value) -> ResourceResult<()> {
        let current: R::State = decode("current state", current)?;
        self.resource.delete(ctx, current).await
    }

    async fn import(&self, ctx: &ResourceContext, id: &str) -> ResourceResult<Option<Value>> {
        match self.resource.import(ctx, id).await? {
            Some(state) => Ok(Some(serde_json::to_value(state)?)),
            None => Ok(None),
        }
    }
}

/// Resource registry
///
/// Built explicitly at startup and handed to whoever dispatches operations.
pub struct ResourceRegistry {
    resources: BTreeMap<&'static str, RegisteredResource>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in resource
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        definitions::register_all_resources(&mut registry);
        registry
    }

    /// Register a resource handler under its type name
    pub fn register<R: Resource>(&mut self, resource: R) {
        let schema = R::schema();
        let state_schema = schemars::schema_for!(R::State);

        let entry = RegisteredResource {
            schema,
            state_schema,
            handler: Box::new(TypedResourceHandler { resource }),
        };

        self.resources.insert(R::TYPE_NAME, entry);
        debug!(resource = R::TYPE_NAME, "Registered resource");
    }

    /// Get a resource by type name
    pub fn get(&self, type_name: &str) -> Option<&RegisteredResource> {
        self.resources.get(type_name)
    }

    /// All registered type names, sorted
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Get the number of registered resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn lookup(&self, type_name: &str) -> ResourceResult<&RegisteredResource> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ResourceError::UnknownResource(type_name.to_string()))
    }

    /// Attribute schema of a resource type
    pub fn schema(&self, type_name: &str) -> ResourceResult<&ResourceSchema> {
        Ok(&self.lookup(type_name)?.schema)
    }

    /// JSON Schema of a resource type's state
    pub fn state_schema(&self, type_name: &str) -> ResourceResult<&Schema> {
        Ok(&self.lookup(type_name)?.state_schema)
    }

    /// Validate a configuration object without touching GitLab
    #[instrument(skip(self, config), fields(resource = %type_name))]
    pub fn validate(&self, type_name: &str, config: &Value) -> ResourceResult<()> {
        let entry = self.lookup(type_name)?;
        entry.handler.validate(&entry.schema, config)
    }

    #[instrument(skip(self, ctx, planned), fields(resource = %type_name))]
    pub async fn create(
        &self,
        type_name: &str,
        ctx: &ResourceContext,
        planned: Value,
    ) -> ResourceResult<Value> {
        let start = Instant::now();
        let result = self.lookup(type_name)?.handler.create(ctx, planned).await;
        log_outcome("create", start, result.is_ok());
        result
    }

    /// Refresh state; `Ok(None)` means the object no longer exists
    #[instrument(skip(self, ctx, current), fields(resource = %type_name))]
    pub async fn read(
        &self,
        type_name: &str,
        ctx: &ResourceContext,
        current: Value,
    ) -> ResourceResult<Option<Value>> {
        let start = Instant::now();
        let result = self.lookup(type_name)?.handler.read(ctx, current).await;
        log_outcome("read", start, result.is_ok());
        result
    }

    #[instrument(skip(self, ctx, prior, planned), fields(resource = %type_name))]
    pub async fn update(
        &self,
        type_name: &str,
        ctx: &ResourceContext,
        prior: Value,
        planned: Value,
    ) -> ResourceResult<Value> {
        let entry = self.lookup(type_name)?;
        let replaced = entry.schema.replaced_attributes(&prior, &planned);
        if !replaced.is_empty() {
            return Err(ResourceError::InvalidArguments(format!(
                "changing {} requires replacing the resource",
                replaced.join(", ")
            )));
        }

        let start = Instant::now();
        let result = entry.handler.update(ctx, prior, planned).await;
        log_outcome("update", start, result.is_ok());
        result
    }

    #[instrument(skip(self, ctx, current), fields(resource = %type_name))]
    pub async fn delete(
        &self,
        type_name: &str,
        ctx: &ResourceContext,
        current: Value,
    ) -> ResourceResult<()> {
        let start = Instant::now();
        let result = self.lookup(type_name)?.handler.delete(ctx, current).await;
        log_outcome("delete", start, result.is_ok());
        result
    }

    #[instrument(skip(self, ctx), fields(resource = %type_name))]
    pub async fn import(
        &self,
        type_name: &str,
        ctx: &ResourceContext,
        id: &str,
    ) -> ResourceResult<Option<Value>> {
        let entry = self.lookup(type_name)?;
        if !entry.schema.importable {
            return Err(ResourceError::InvalidArguments(format!(
                "{} does not support import",
                type_name
            )));
        }

        let start = Instant::now();
        let result = entry.handler.import(ctx, id).await;
        log_outcome("import", start, result.is_ok());
        result
    }
}

fn log_outcome(operation: &'static str, start: Instant, success: bool) {
    info!(
        operation,
        success,
        duration_ms = start.elapsed().as_millis() as u64,
        "Resource operation finished"
    );
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
