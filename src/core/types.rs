use super::{Result, Value};
use crate::interface::SharedSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Capability tag for the interchangeable source variants, plus the marker
/// for a relation query that has not been executed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// An unexecuted query builder.
    Query,
    /// A single record.
    Record,
    /// A collection of records.
    Collection,
    /// A paged result.
    Page,
    /// A deferred relation query.
    Relation,
}

/// Tagged result of invoking an operation on a source.
///
/// The tag decides result classification up front, so the dispatch engine
/// never inspects runtime types beyond [`SourceKind`].
pub enum Outcome {
    /// The chain advances to a new source.
    Advance(SharedSource),
    /// A deferred relation was spawned; traversal continues against it.
    Relation(SharedSource),
    /// A scalar side result (update count, flag); the chain keeps its
    /// previous value.
    Scalar(Value),
    /// The operation resolved to nothing; the chain advances to null.
    Null,
}

/// An operation argument. A `Proxy` argument is unwrapped to the proxy's
/// current entity before invocation.
pub enum Arg {
    Value(Value),
    Source(SharedSource),
    Proxy(Box<crate::facade::Repository>),
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Self::Value(Value::Integer(i))
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Value(Value::Text(s.to_string()))
    }
}

impl From<SharedSource> for Arg {
    fn from(source: SharedSource) -> Self {
        Self::Source(source)
    }
}

impl From<crate::facade::Repository> for Arg {
    fn from(repository: crate::facade::Repository) -> Self {
        Self::Proxy(Box::new(repository))
    }
}

/// What currently backs the proxy.
///
/// Dispatch never installs a `Scalar` entity (scalar results pass through
/// without touching the chain), but a proxy may be constructed over one and
/// the existence predicates classify all three shapes.
#[derive(Clone)]
pub enum Entity {
    Null,
    Scalar(Value),
    Source(SharedSource),
}

impl Entity {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn source(&self) -> Option<&SharedSource> {
        match self {
            Self::Source(source) => Some(source),
            _ => None,
        }
    }

    /// Capability tag of the backing source, if any.
    pub fn kind(&self) -> Result<Option<SourceKind>> {
        match self {
            Self::Source(source) => Ok(Some(source.read()?.kind())),
            _ => Ok(None),
        }
    }

    /// Pointer identity on the backing source; `Null`/`Scalar` entities are
    /// never identical to anything.
    pub fn same_source(&self, other: &Entity) -> bool {
        match (self, other) {
            (Self::Source(a), Self::Source(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<SharedSource> for Entity {
    fn from(source: SharedSource) -> Self {
        Self::Source(source)
    }
}

impl From<Value> for Entity {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            other => Self::Scalar(other),
        }
    }
}

/// What a dispatch hands back to the caller.
#[derive(Clone)]
pub enum Dispatched {
    /// The proxy advanced (or stood still); keep chaining on it.
    Chained,
    /// The chain terminated with a raw scalar.
    Value(Value),
    /// The chain terminated with a raw source (force-listed operation that
    /// produced an object-like result).
    Source(SharedSource),
}

impl Dispatched {
    pub fn is_chained(&self) -> bool {
        matches!(self, Self::Chained)
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_source(self) -> Option<SharedSource> {
        match self {
            Self::Source(source) => Some(source),
            _ => None,
        }
    }
}
