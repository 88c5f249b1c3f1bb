//! Resolver registration.
//!
//! Composition attaches resolvers to schema fields but never invokes
//! them; execution belongs to whatever runtime consumes the composed
//! schema. A field without a registered resolver is valid. A resolver
//! whose target field does not exist is not, and is rejected during
//! validation.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Arguments passed to a resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    args: HashMap<String, Value>,
}

impl ResolverArgs {
    /// Creates new resolver args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from a list of (name, value) pairs.
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self {
            args: pairs.into_iter().collect(),
        }
    }

    /// Gets an argument by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument as a specific type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets a required argument, returning an error if not found.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        self.args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))
            .and_then(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| ResolverError::ArgumentParse(name.to_string(), e.to_string()))
            })
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Result type for resolvers.
pub type ResolverResult = Result<Value, ResolverError>;

/// Future type for async resolvers.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Error from a resolver.
#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Argument parse error.
    #[error("failed to parse argument `{0}`: {1}")]
    ArgumentParse(String, String),

    /// Custom error.
    #[error("{0}")]
    Custom(String),
}

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value.
    fn resolve<'a>(&'a self, parent: &'a Value, args: &'a ResolverArgs) -> ResolverFuture<'a>;
}

/// A boxed resolver.
pub type BoxedResolver = Box<dyn Resolver>;

/// A sync resolver function.
pub type SyncResolverFn = Arc<dyn Fn(&Value, &ResolverArgs) -> ResolverResult + Send + Sync>;

/// A wrapper for sync resolver functions.
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    /// Creates a new function resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs) -> ResolverResult + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(&'a self, parent: &'a Value, args: &'a ResolverArgs) -> ResolverFuture<'a> {
        let result = (self.func)(parent, args);
        Box::pin(async move { result })
    }
}

/// An async resolver function type.
pub type AsyncResolverFn =
    Arc<dyn Fn(Value, ResolverArgs) -> ResolverFuture<'static> + Send + Sync>;

/// A wrapper for async resolver functions.
pub struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    /// Creates a new async function resolver.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ResolverArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |parent, args| Box::pin(f(parent, args))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(&'a self, parent: &'a Value, args: &'a ResolverArgs) -> ResolverFuture<'a> {
        let parent = parent.clone();
        let args = args.clone();
        let func = Arc::clone(&self.func);
        Box::pin(async move { func(parent, args).await })
    }
}

/// Storage for resolvers organized by type and field.
#[derive(Default)]
pub struct ResolverMap {
    /// Resolvers indexed by "TypeName.fieldName".
    resolvers: HashMap<String, BoxedResolver>,
}

impl ResolverMap {
    /// Creates a new resolver map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolver for a specific type and field.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        let key = format!("{}.{}", type_name.into(), field_name.into());
        self.resolvers.insert(key, Box::new(resolver));
    }

    /// Registers a sync function as a resolver.
    pub fn register_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Value, &ResolverArgs) -> ResolverResult + Send + Sync + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Registers an async function as a resolver.
    pub fn register_async<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, ResolverArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    /// Gets a resolver for a type and field.
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        let key = format!("{}.{}", type_name, field_name);
        self.resolvers.get(&key).map(|r| r.as_ref())
    }

    /// Iterates registered targets as (type name, field name) pairs.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolvers.keys().filter_map(|key| key.split_once('.'))
    }

    /// Number of registered resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns true if no resolvers are registered.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolver_count", &self.resolvers.len())
            .finish()
    }
}
