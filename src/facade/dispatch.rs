//! The dispatch engine.
//!
//! Resolves the effective target for an arbitrary operation, invokes it,
//! classifies the tagged outcome and decides what the caller gets back: the
//! proxy itself for chaining, or a raw value when the operation terminates
//! the chain.

use super::repository::Repository;
use crate::core::{Arg, Dispatched, Entity, Outcome, RepositoryError, Result, SourceKind, Value};
use crate::history::BASE_KEY;
use crate::interface::SharedSource;
use tracing::{debug, trace};

/// Bare attribute names accepted in place of their setter form.
fn normalize_name(name: &str) -> &str {
    match name {
        "current_page" => "set_current_page",
        "per_page" => "set_per_page",
        "page_name" => "set_page_name",
        other => other,
    }
}

impl Repository {
    /// Dispatch an operation against the chain.
    ///
    /// The engine picks the invocation target (facade, pending relation, or
    /// the abstractly resolved history entry), invokes, and classifies the
    /// result: force-listed operations return their raw value untouched,
    /// deferred relations open a sub-chain, scalars pass through without
    /// advancing the chain, and everything else becomes the new current
    /// entity.
    pub fn dispatch(&mut self, operation: &str, args: Vec<Arg>) -> Result<Dispatched> {
        let operation = normalize_name(operation);
        debug!(operation, "dispatch");

        if let Some(result) = self.dispatch_local(operation, &args)? {
            trace!(operation, "handled locally");
            return Ok(result);
        }

        let args = normalize_args(args);
        let target = self.invocation_target(operation)?;
        let outcome = target.write()?.invoke(operation, &args)?;

        self.classify(operation, outcome)
    }

    /// Dispatch with no arguments.
    pub fn call(&mut self, operation: &str) -> Result<Dispatched> {
        self.dispatch(operation, Vec::new())
    }

    /// Paginate the chain with the stored defaults, overriding any of them
    /// for this call only.
    pub fn paginations(
        &mut self,
        current_page: Option<u64>,
        per_page: Option<u64>,
        page_name: Option<&str>,
    ) -> Result<Dispatched> {
        let per_page = per_page.unwrap_or(self.per_page());
        let page_name = page_name.unwrap_or(self.page_name()).to_string();
        let current_page = current_page.unwrap_or(self.current_page());

        self.dispatch(
            "paginate",
            vec![
                Arg::from(Value::from(per_page)),
                Arg::from(Value::from(page_name)),
                Arg::from(Value::from(current_page)),
            ],
        )
    }

    // ========================================================================
    // Local short-circuit
    // ========================================================================

    /// Operations implemented directly by the facade never reach the
    /// capability source.
    fn dispatch_local(&mut self, operation: &str, args: &[Arg]) -> Result<Option<Dispatched>> {
        let result = match operation {
            "set_current_page" => {
                if let Some(page) = arg_u64(args, 0) {
                    self.set_current_page(page);
                }
                Dispatched::Chained
            }
            "set_per_page" => {
                if let Some(per_page) = arg_u64(args, 0) {
                    self.set_per_page(per_page);
                }
                Dispatched::Chained
            }
            "set_page_name" => {
                if let Some(name) = arg_text(args, 0) {
                    self.set_page_name(name);
                }
                Dispatched::Chained
            }
            "paginations" => {
                return self
                    .paginations(
                        arg_u64(args, 0),
                        arg_u64(args, 1),
                        arg_text(args, 2).as_deref(),
                    )
                    .map(Some);
            }
            "begin_transaction" => {
                self.begin_transaction()?;
                Dispatched::Chained
            }
            "commit" => {
                self.commit()?;
                Dispatched::Chained
            }
            "rollback" => {
                self.rollback()?;
                Dispatched::Chained
            }
            "transaction_depth" => Dispatched::Value(Value::from(self.transaction_depth()?)),
            "enable_query_log" => {
                self.enable_query_log()?;
                Dispatched::Chained
            }
            "query_log" => {
                let log = self
                    .query_log()?
                    .into_iter()
                    .map(|entry| {
                        Value::Array(vec![
                            Value::Text(entry.statement),
                            Value::Array(entry.bindings),
                        ])
                    })
                    .collect();
                Dispatched::Value(Value::Array(log))
            }
            "queries" => {
                let queries = self.queries()?.into_iter().map(Value::Text).collect();
                Dispatched::Value(Value::Array(queries))
            }
            "last_query" => Dispatched::Value(
                self.last_query()?.map(Value::Text).unwrap_or(Value::Null),
            ),
            "is_null" => Dispatched::Value(Value::from(self.is_null())),
            "is_not_null" => Dispatched::Value(Value::from(self.is_not_null())),
            "is_numeric" => Dispatched::Value(Value::from(self.is_numeric())),
            "is_not_numeric" => Dispatched::Value(Value::from(self.is_not_numeric())),
            "is_bool" => Dispatched::Value(Value::from(self.is_bool())),
            "is_not_bool" => Dispatched::Value(Value::from(self.is_not_bool())),
            "is_object" => Dispatched::Value(Value::from(self.is_object())),
            "is_not_object" => Dispatched::Value(Value::from(self.is_not_object())),
            "assert_exists" => {
                self.assert_exists(assertion_spec(args)?)?;
                Dispatched::Chained
            }
            "assert_exists_or_rollback" => {
                self.assert_exists_or_rollback(assertion_spec(args)?)?;
                Dispatched::Chained
            }
            "force_methods" => {
                let values = force_values(args)?;
                self.set_force_methods(&values)?;
                Dispatched::Chained
            }
            _ => return Ok(None),
        };

        Ok(Some(result))
    }

    // ========================================================================
    // Target resolution
    // ========================================================================

    /// Pick the source the operation must be applied to.
    ///
    /// A pending relation chain wins while the current entity is a record
    /// distinct from the `"base"` entry; otherwise abstract resolution over
    /// the resolver history decides, with the operation name as hint.
    fn invocation_target(&self, operation: &str) -> Result<SharedSource> {
        if !self.relations.is_empty()
            && self.current.kind()? == Some(SourceKind::Record)
            && (!self.is_base_entity() || self.owns_pending_relation())
        {
            if let Some(Entity::Source(relation)) = self.relations.last() {
                trace!(operation, "targeting pending relation");
                return Ok(relation.clone());
            }
        }

        let resolved = self
            .resolved
            .resolve(Some(operation))
            .unwrap_or(&self.current);

        match resolved {
            Entity::Source(source) => Ok(source.clone()),
            _ => Err(RepositoryError::UnsupportedOperation(operation.to_string())),
        }
    }

    fn is_base_entity(&self) -> bool {
        self.resolved
            .get(BASE_KEY)
            .map(|base| self.current.same_source(base))
            .unwrap_or(false)
    }

    /// Whether the current entity is the source the pending relation chain
    /// was spawned from. A proxy constructed directly over a record is its
    /// own `"base"` entry, and relations spawned off it must still be
    /// traversed.
    fn owns_pending_relation(&self) -> bool {
        match (&self.relation_owner, &self.current) {
            (Some(owner), Entity::Source(current)) => std::sync::Arc::ptr_eq(owner, current),
            _ => false,
        }
    }

    // ========================================================================
    // Result classification
    // ========================================================================

    fn classify(&mut self, operation: &str, outcome: Outcome) -> Result<Dispatched> {
        // Force termination: the raw result exits the fluent interface and
        // the chain state stays untouched.
        if self.is_forced(operation) {
            trace!(operation, "force-terminated");
            return Ok(match outcome {
                Outcome::Advance(source) | Outcome::Relation(source) => {
                    Dispatched::Source(source)
                }
                Outcome::Scalar(value) => Dispatched::Value(value),
                Outcome::Null => Dispatched::Value(Value::Null),
            });
        }

        match outcome {
            Outcome::Relation(relation) => {
                trace!(operation, "relation spawned");
                self.relations
                    .push(operation, Entity::Source(relation.clone()));
                if let Entity::Source(current) = &self.current {
                    current.write()?.attach_relation(operation, relation);
                    self.relation_owner = Some(current.clone());
                }
                Ok(Dispatched::Chained)
            }
            Outcome::Scalar(_) => {
                // The scalar is not stored; the previous resolver value is
                // re-registered under this operation's key, so "last
                // resolver" order advances while the effective data stands
                // still.
                trace!(operation, "scalar passthrough");
                let previous = self
                    .resolved
                    .last()
                    .cloned()
                    .unwrap_or_else(|| self.current.clone());
                self.resolved.push(operation, previous);
                Ok(Dispatched::Chained)
            }
            Outcome::Advance(source) => self.advance(operation, Entity::Source(source)),
            Outcome::Null => self.advance(operation, Entity::Null),
        }
    }

    fn advance(&mut self, operation: &str, entity: Entity) -> Result<Dispatched> {
        self.resolved.push(operation, entity);

        // Abstract resolution keeps the paginated view in front even though
        // the new entry is the last resolver.
        if let Some(resolved) = self.resolved.resolve(None) {
            self.current = resolved.clone();
        }

        // Back on a collection or paged view, relation traversal resets.
        if matches!(
            self.current.kind()?,
            Some(SourceKind::Collection | SourceKind::Page)
        ) {
            self.relations.clear();
            self.relation_owner = None;
        }

        trace!(operation, "advanced");
        Ok(Dispatched::Chained)
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

/// Proxy arguments are unwrapped to their current entity before invocation.
fn normalize_args(args: Vec<Arg>) -> Vec<Arg> {
    args.into_iter()
        .map(|arg| match arg {
            Arg::Proxy(proxy) => match proxy.entity() {
                Entity::Source(source) => Arg::Source(source.clone()),
                Entity::Scalar(value) => Arg::Value(value.clone()),
                Entity::Null => Arg::Value(Value::Null),
            },
            other => other,
        })
        .collect()
}

fn arg_u64(args: &[Arg], index: usize) -> Option<u64> {
    match args.get(index) {
        Some(Arg::Value(value)) => value.as_i64().map(|i| i as u64),
        _ => None,
    }
}

fn arg_text(args: &[Arg], index: usize) -> Option<String> {
    match args.get(index) {
        Some(Arg::Value(value)) => value.as_str().map(|s| s.to_string()),
        _ => None,
    }
}

/// Assertion spec from dispatch arguments: a text message, or nothing for
/// the stock message. Any other shape is an invalid assertion argument.
fn assertion_spec(args: &[Arg]) -> Result<String> {
    match args.first() {
        None => Ok("Data not exists".to_string()),
        Some(Arg::Value(Value::Text(message))) => Ok(message.clone()),
        Some(Arg::Value(other)) => Err(RepositoryError::InvalidAssertion(format!(
            "expected TEXT, got {}",
            other.type_name()
        ))),
        Some(_) => Err(RepositoryError::InvalidAssertion(
            "expected TEXT, got a source".to_string(),
        )),
    }
}

/// Force-list registration arguments must all be plain values; nesting is
/// validated downstream by the registration itself.
fn force_values(args: &[Arg]) -> Result<Vec<Value>> {
    args.iter()
        .map(|arg| match arg {
            Arg::Value(value) => Ok(value.clone()),
            _ => Err(RepositoryError::InvalidForceMethod(
                "expected TEXT or ARRAY, got a source".to_string(),
            )),
        })
        .collect()
}
