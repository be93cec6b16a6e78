use crate::core::{Arg, Outcome, Result, SourceKind, Value};
use crate::diagnostics::QueryLogEntry;
use std::sync::{Arc, RwLock};

/// Shared handle to a capability source.
///
/// Sources are held behind `Arc<RwLock<..>>` so the same underlying value can
/// sit in the resolver history, the relation history and the current-entity
/// slot at once, and field writes through the proxy are visible everywhere.
pub type SharedSource = Arc<RwLock<dyn Source>>;

/// A capability source: the opaque object currently backing the proxy.
///
/// This trait is the seam between the dispatch engine and whatever storage or
/// query engine sits underneath. The crate never implements it; callers wrap
/// their engine's query builders, records, collections and paged results.
/// The engine only ever needs the capability tag and the narrow `invoke`
/// entry point; it performs no further runtime inspection.
pub trait Source: Send + Sync {
    /// Which of the interchangeable variants this source is.
    fn kind(&self) -> SourceKind;

    /// Invoke a named operation with positional arguments.
    ///
    /// An operation name the source does not support must surface as
    /// [`RepositoryError::UnsupportedOperation`](crate::RepositoryError::UnsupportedOperation),
    /// never be ignored.
    fn invoke(&mut self, operation: &str, args: &[Arg]) -> Result<Outcome>;

    /// Field-style read. A missing field is `None`, not an error.
    fn get_field(&self, key: &str) -> Option<Value>;

    /// Field-style write. Returns whether the source took the write.
    fn set_field(&mut self, key: &str, value: Value) -> bool;

    fn has_field(&self, key: &str) -> bool;

    fn unset_field(&mut self, _key: &str) {}

    /// Members of a collection-kind source; empty for everything else.
    fn elements(&self) -> Vec<SharedSource> {
        Vec::new()
    }

    /// Companion slot for a relation spawned off this source.
    fn attach_relation(&mut self, _name: &str, _relation: SharedSource) {}

    /// Emptiness of a collection-kind source.
    fn is_empty(&self) -> bool {
        false
    }
}

/// Wrap a source implementation into a [`SharedSource`] handle.
pub fn shared<S: Source + 'static>(source: S) -> SharedSource {
    Arc::new(RwLock::new(source))
}

/// Transaction control collaborator. Pure passthrough; the proxy adds no
/// logic of its own on top of it.
pub trait TransactionControl: Send + Sync {
    fn begin(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;
    fn current_depth(&self) -> Result<u64>;
}

/// Query diagnostics collaborator: toggles statement logging on the
/// underlying engine and exposes the log for formatting.
pub trait QueryDiagnostics: Send + Sync {
    fn enable_logging(&self);
    fn fetch_log(&self) -> Vec<QueryLogEntry>;
}
