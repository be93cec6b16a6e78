use crate::core::{Entity, RepositoryError, Result, SourceKind, Value};
use crate::diagnostics::{self, QueryLogEntry};
use crate::history::{BASE_KEY, History};
use crate::interface::{QueryDiagnostics, SharedSource, TransactionControl};
use std::sync::Arc;

/// Operations that terminate the fluent chain out of the box. Callers can
/// extend the list at runtime through [`Repository::set_force_methods`].
pub const DEFAULT_FORCE_METHODS: [&str; 18] = [
    "to_array",
    "to_json",
    "all",
    "avg",
    "contains",
    "contains_strict",
    "count",
    "duplicates",
    "duplicates_strict",
    "has",
    "is_empty",
    "is_not_empty",
    "trashed",
    "max",
    "median",
    "min",
    "sum",
    "insert_get_id",
];

/// How an [`assert_exists`](Repository::assert_exists) failure should be
/// raised.
pub enum ErrorSpec {
    /// Raise a record-not-found error carrying this message.
    Message(String),
    /// Raise this error as-is.
    Error(RepositoryError),
    /// Ask the callback for the error. A callback that produces nothing
    /// violates the contract and raises
    /// [`RepositoryError::InvalidCallback`].
    With(Box<dyn FnOnce(&Repository) -> Option<RepositoryError> + Send>),
}

impl From<&str> for ErrorSpec {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for ErrorSpec {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<RepositoryError> for ErrorSpec {
    fn from(error: RepositoryError) -> Self {
        Self::Error(error)
    }
}

/// The fluent repository proxy.
///
/// Fronts an evolving chain of data-access operations against an opaque
/// capability source, presenting the same interface whether the chain
/// currently holds an unexecuted query, a single record, a record
/// collection or a paged result. Unrecognized operations go through
/// [`dispatch`](Repository::dispatch); everything here is the plain
/// delegation around it.
///
/// Histories are owned by the instance, so two proxies never interfere.
#[derive(Clone)]
pub struct Repository {
    pub(crate) current: Entity,
    pub(crate) resolved: History,
    pub(crate) relations: History,
    /// The source the most recent relation was spawned from.
    pub(crate) relation_owner: Option<SharedSource>,
    force_methods: Vec<String>,
    per_page: u64,
    current_page: u64,
    page_name: String,
    transactions: Option<Arc<dyn TransactionControl>>,
    diagnostics: Option<Arc<dyn QueryDiagnostics>>,
}

impl Repository {
    /// Wrap a capability source. The source is registered in the resolver
    /// history under the `"base"` key.
    pub fn new(source: SharedSource) -> Self {
        Self::from_entity(Entity::Source(source))
    }

    /// Wrap an arbitrary entity (including null, for proxies built before
    /// their first query runs).
    pub fn from_entity(entity: Entity) -> Self {
        let mut resolved = History::new();
        resolved.push(BASE_KEY, entity.clone());

        Self {
            current: entity,
            resolved,
            relations: History::new(),
            relation_owner: None,
            force_methods: DEFAULT_FORCE_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            per_page: 10,
            current_page: 1,
            page_name: "page".to_string(),
            transactions: None,
            diagnostics: None,
        }
    }

    /// Attach the transaction-control collaborator.
    pub fn with_transactions(mut self, transactions: Arc<dyn TransactionControl>) -> Self {
        self.transactions = Some(transactions);
        self
    }

    /// Attach the query-diagnostics collaborator.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn QueryDiagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    // ========================================================================
    // Current entity
    // ========================================================================

    pub fn entity(&self) -> &Entity {
        &self.current
    }

    /// Replace the current backing directly, without recording a resolver
    /// entry.
    pub fn set_entity(&mut self, entity: Entity) -> &mut Self {
        self.current = entity;
        self
    }

    /// The resolver history: every chain-advancing operation result, in
    /// insertion order, seeded with the `"base"` entry.
    pub fn resolver_history(&self) -> &History {
        &self.resolved
    }

    /// The relation history: relation-traversal results only.
    pub fn relation_history(&self) -> &History {
        &self.relations
    }

    // ========================================================================
    // Pagination settings
    // ========================================================================

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn set_per_page(&mut self, per_page: u64) -> &mut Self {
        self.per_page = per_page;
        self
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn set_current_page(&mut self, current_page: u64) -> &mut Self {
        self.current_page = current_page;
        self
    }

    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    pub fn set_page_name(&mut self, page_name: impl Into<String>) -> &mut Self {
        self.page_name = page_name.into();
        self
    }

    // ========================================================================
    // Force-list
    // ========================================================================

    pub fn force_methods(&self) -> &[String] {
        &self.force_methods
    }

    /// Register additional chain-terminating operations. Accepts text values
    /// and arbitrarily nested arrays of text values; anything else is an
    /// invalid argument. Duplicates are allowed; membership checks use set
    /// semantics.
    pub fn set_force_methods(&mut self, specs: &[Value]) -> Result<&mut Self> {
        for spec in specs {
            match spec {
                Value::Text(name) => self.force_methods.push(name.clone()),
                Value::Array(nested) => {
                    self.set_force_methods(nested)?;
                }
                other => {
                    return Err(RepositoryError::InvalidForceMethod(format!(
                        "expected TEXT or ARRAY, got {}",
                        other.type_name()
                    )));
                }
            }
        }

        Ok(self)
    }

    pub(crate) fn is_forced(&self, operation: &str) -> bool {
        self.force_methods.iter().any(|m| m == operation)
    }

    // ========================================================================
    // Existence predicates
    // ========================================================================

    pub fn is_null(&self) -> bool {
        self.current.is_null()
    }

    pub fn is_not_null(&self) -> bool {
        !self.is_null()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(&self.current, Entity::Scalar(value) if value.is_numeric())
    }

    pub fn is_not_numeric(&self) -> bool {
        !self.is_numeric()
    }

    pub fn is_bool(&self) -> bool {
        matches!(&self.current, Entity::Scalar(value) if value.is_bool())
    }

    pub fn is_not_bool(&self) -> bool {
        !self.is_bool()
    }

    pub fn is_object(&self) -> bool {
        matches!(&self.current, Entity::Source(_))
    }

    pub fn is_not_object(&self) -> bool {
        !self.is_object()
    }

    // ========================================================================
    // Assertions
    // ========================================================================

    /// Assertion predicate: a non-empty collection passes, and so does any
    /// other non-null entity (an empty collection is still non-null).
    pub fn exists(&self) -> bool {
        !self.current.is_null()
    }

    /// Pass the proxy through unchanged when the current entity exists;
    /// otherwise raise per the error spec.
    pub fn assert_exists(&mut self, spec: impl Into<ErrorSpec>) -> Result<&mut Self> {
        if self.exists() {
            return Ok(self);
        }

        Err(self.assertion_error(spec.into()))
    }

    /// Same predicate as [`assert_exists`](Repository::assert_exists), but a
    /// failure rolls the open transaction back before raising. A rollback
    /// error propagates in place of the assertion error.
    pub fn assert_exists_or_rollback(&mut self, spec: impl Into<ErrorSpec>) -> Result<&mut Self> {
        if self.exists() {
            return Ok(self);
        }

        self.transactions()?.rollback()?;

        Err(self.assertion_error(spec.into()))
    }

    fn assertion_error(&self, spec: ErrorSpec) -> RepositoryError {
        match spec {
            ErrorSpec::Message(message) => RepositoryError::NotFound(message),
            ErrorSpec::Error(error) => error,
            ErrorSpec::With(callback) => {
                callback(self).unwrap_or(RepositoryError::InvalidCallback)
            }
        }
    }

    // ========================================================================
    // Transaction passthrough
    // ========================================================================

    fn transactions(&self) -> Result<&Arc<dyn TransactionControl>> {
        self.transactions.as_ref().ok_or_else(|| {
            RepositoryError::Configuration("no transaction collaborator configured".into())
        })
    }

    pub fn begin_transaction(&mut self) -> Result<&mut Self> {
        self.transactions()?.begin()?;
        Ok(self)
    }

    pub fn commit(&mut self) -> Result<&mut Self> {
        self.transactions()?.commit()?;
        Ok(self)
    }

    pub fn rollback(&mut self) -> Result<&mut Self> {
        self.transactions()?.rollback()?;
        Ok(self)
    }

    pub fn transaction_depth(&self) -> Result<u64> {
        self.transactions()?.current_depth()
    }

    // ========================================================================
    // Query diagnostics
    // ========================================================================

    fn diagnostics(&self) -> Result<&Arc<dyn QueryDiagnostics>> {
        self.diagnostics.as_ref().ok_or_else(|| {
            RepositoryError::Configuration("no diagnostics collaborator configured".into())
        })
    }

    pub fn enable_query_log(&mut self) -> Result<&mut Self> {
        self.diagnostics()?.enable_logging();
        Ok(self)
    }

    pub fn query_log(&self) -> Result<Vec<QueryLogEntry>> {
        Ok(self.diagnostics()?.fetch_log())
    }

    /// Logged statements with bindings substituted into their positional
    /// placeholders, in execution order.
    pub fn queries(&self) -> Result<Vec<String>> {
        Ok(diagnostics::format_queries(&self.query_log()?))
    }

    pub fn last_query(&self) -> Result<Option<String>> {
        Ok(self.queries()?.pop())
    }

    // ========================================================================
    // Field access across the chain
    // ========================================================================

    /// Read a field. Known proxy attributes come straight off the proxy;
    /// anything else scans the resolver history in insertion order and
    /// returns the first entry that exposes the key. A miss is `None`, not
    /// an error.
    pub fn field(&self, key: &str) -> Result<Option<Value>> {
        match key {
            "per_page" => return Ok(Some(Value::from(self.per_page))),
            "current_page" => return Ok(Some(Value::from(self.current_page))),
            "page_name" => return Ok(Some(Value::from(self.page_name.as_str()))),
            _ => {}
        }

        for (_, entity) in self.resolved.iter() {
            if let Entity::Source(source) = entity {
                if let Some(value) = source.read()?.get_field(key) {
                    return Ok(Some(value));
                }
            }
        }

        Ok(None)
    }

    /// Write a field. Known proxy attributes are set directly. Otherwise the
    /// write walks every resolver history entry: collections broadcast it to
    /// each element exposing the key, records and other sources exposing the
    /// key take it directly. Entries that do not match are skipped silently.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<&mut Self> {
        match key {
            "per_page" => {
                if let Some(i) = value.as_i64() {
                    self.per_page = i as u64;
                }
                return Ok(self);
            }
            "current_page" => {
                if let Some(i) = value.as_i64() {
                    self.current_page = i as u64;
                }
                return Ok(self);
            }
            "page_name" => {
                if let Some(s) = value.as_str() {
                    self.page_name = s.to_string();
                }
                return Ok(self);
            }
            _ => {}
        }

        for (_, entity) in self.resolved.iter() {
            let Entity::Source(source) = entity else {
                continue;
            };

            if source.read()?.kind() == SourceKind::Collection {
                for element in source.read()?.elements() {
                    let mut guard = element.write()?;
                    if guard.has_field(key) {
                        guard.set_field(key, value.clone());
                    }
                }
            } else {
                let mut guard = source.write()?;
                if guard.has_field(key) || guard.kind() == SourceKind::Record {
                    guard.set_field(key, value.clone());
                }
            }
        }

        Ok(self)
    }

    pub fn has_field(&self, key: &str) -> Result<bool> {
        Ok(self.field(key)?.is_some())
    }

    /// Remove a field from the current entity, if it carries one.
    pub fn unset_field(&mut self, key: &str) -> Result<&mut Self> {
        if let Entity::Source(source) = &self.current {
            source.write()?.unset_field(key);
        }

        Ok(self)
    }
}
