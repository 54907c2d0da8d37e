//! Node-kind behavior handlers and the registry that maps kind tags to them.

use crate::error::HandlerError;
use crate::workflow::{Config, Value};
use ahash::AHashMap;
use futures::future::{self, BoxFuture};
use std::fmt;
use std::sync::Arc;

mod builtin;
pub mod completion;
pub mod predicate;

pub use builtin::*;
pub use completion::{CompletionRequest, CompletionService, EchoService, InvokeModelHandler};
pub use predicate::Predicate;

/// How many inbound connections a node kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Defines the contract for executing one node kind.
///
/// A handler receives the outputs of its producers, in connection creation
/// order, together with the node's config. Source nodes receive the matching
/// initial input (if any) as their single inbound value.
pub trait NodeHandler: Send + Sync {
    /// Inbound connection count this kind supports. Checked at compile time.
    fn arity(&self) -> Arity;

    /// Checks the node config before any handler runs.
    fn validate(&self, _config: &Config) -> Result<(), String> {
        Ok(())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>>;
}

/// Adapts a plain function into a [`NodeHandler`].
pub struct FnHandler<F> {
    arity: Arity,
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(Vec<Value>, &Config) -> Result<Value, HandlerError> + Send + Sync,
{
    pub fn new(arity: Arity, func: F) -> Self {
        Self { arity, func }
    }
}

impl<F> NodeHandler for FnHandler<F>
where
    F: Fn(Vec<Value>, &Config) -> Result<Value, HandlerError> + Send + Sync,
{
    fn arity(&self) -> Arity {
        self.arity
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(future::ready((self.func)(inbound, config)))
    }
}

/// Kind tag to handler mapping, with optional aliases for host-specific names.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: AHashMap<String, Arc<dyn NodeHandler>>,
    aliases: AHashMap<String, String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with every built-in kind except `invoke-model`,
    /// which needs a completion service.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_default_handlers(&mut registry);
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, handler: Arc<dyn NodeHandler>) {
        self.handlers.insert(kind.into(), handler);
    }

    /// Makes `alias` resolve to the handler registered as `kind`.
    pub fn alias(&mut self, alias: impl Into<String>, kind: impl Into<String>) {
        self.aliases.insert(alias.into(), kind.into());
    }

    /// Resolves a kind (or alias) to its canonical kind and handler.
    /// A directly registered kind wins over an alias of the same name.
    pub fn resolve<'a>(&'a self, kind: &'a str) -> Option<(&'a str, &'a Arc<dyn NodeHandler>)> {
        if let Some((name, handler)) = self.handlers.get_key_value(kind) {
            return Some((name.as_str(), handler));
        }
        let target = self.aliases.get(kind)?;
        self.handlers
            .get_key_value(target)
            .map(|(name, handler)| (name.as_str(), handler))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.resolve(kind).is_some()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// Registers every built-in handler and the aliases used by the editor's
/// saved workflows.
pub fn register_default_handlers(registry: &mut HandlerRegistry) {
    registry.register(kinds::CONSTANT_INPUT, Arc::new(ConstantInputHandler));
    registry.register(kinds::PREDICATE_BRANCH, Arc::new(PredicateBranchHandler));
    registry.register(kinds::MERGE, Arc::new(MergeHandler));
    registry.register(kinds::MAP, Arc::new(MapHandler));
    registry.register(kinds::TRANSFORM, Arc::new(TransformHandler));
    registry.register(kinds::FILTER, Arc::new(FilterHandler));
    registry.register(kinds::SORT, Arc::new(SortHandler));
    registry.register(kinds::AGGREGATE, Arc::new(AggregateHandler));
    registry.register(kinds::SPLIT, Arc::new(SplitHandler));
    registry.register(kinds::COLLECT_OUTPUT, Arc::new(CollectOutputHandler));
    register_text_handlers(registry);

    registry.alias("constant", kinds::CONSTANT_INPUT);
    registry.alias("input", kinds::CONSTANT_INPUT);
    registry.alias("branch", kinds::PREDICATE_BRANCH);
    registry.alias("collect", kinds::COLLECT_OUTPUT);
    registry.alias("output", kinds::COLLECT_OUTPUT);
    registry.alias("llm", kinds::INVOKE_MODEL);
}

/// Canonical names of the built-in kinds.
pub mod kinds {
    pub const CONSTANT_INPUT: &str = "constant-input";
    pub const INVOKE_MODEL: &str = "invoke-model";
    pub const PREDICATE_BRANCH: &str = "predicate-branch";
    pub const MERGE: &str = "merge";
    pub const MAP: &str = "map";
    pub const TRANSFORM: &str = "transform";
    pub const FILTER: &str = "filter";
    pub const SORT: &str = "sort";
    pub const AGGREGATE: &str = "aggregate";
    pub const SPLIT: &str = "split";
    pub const COLLECT_OUTPUT: &str = "collect-output";
}
