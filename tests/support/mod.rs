//! Fake collaborators for the integration suites.
//!
//! The crate never implements the capability source itself, so the tests
//! carry a scripted one: each operation name maps to a handler producing a
//! tagged outcome, and field access works over a plain map.

#![allow(dead_code)]

use repoproxy::{
    Arg, Outcome, QueryDiagnostics, QueryLogEntry, RepositoryError, Result, SharedSource, Source,
    SourceKind, TransactionControl, Value, shared,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

type Handler = Box<dyn FnMut(&[Arg]) -> Result<Outcome> + Send + Sync>;

/// Shared observation log. Handles stay usable after the fake disappears
/// behind its `dyn Source` lock.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: &str) {
        self.0.lock().unwrap().push(entry.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }
}

pub struct FakeSource {
    kind: SourceKind,
    fields: HashMap<String, Value>,
    members: Vec<SharedSource>,
    handlers: HashMap<String, Handler>,
    invocations: Journal,
    attachments: Journal,
}

impl FakeSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            fields: HashMap::new(),
            members: Vec::new(),
            handlers: HashMap::new(),
            invocations: Journal::default(),
            attachments: Journal::default(),
        }
    }

    /// Operation names in invocation order.
    pub fn invocations(&self) -> Journal {
        self.invocations.clone()
    }

    /// Relations attached through the proxy's relation-spawn path.
    pub fn attachments(&self) -> Journal {
        self.attachments.clone()
    }

    pub fn query() -> Self {
        Self::new(SourceKind::Query)
    }

    pub fn record(fields: &[(&str, Value)]) -> Self {
        let mut source = Self::new(SourceKind::Record);
        for (key, value) in fields {
            source.fields.insert(key.to_string(), value.clone());
        }
        source
    }

    pub fn collection(members: Vec<SharedSource>) -> Self {
        let mut source = Self::new(SourceKind::Collection);
        source.members = members;
        source
    }

    pub fn page(members: Vec<SharedSource>) -> Self {
        let mut source = Self::new(SourceKind::Page);
        source.members = members;
        source
    }

    pub fn relation() -> Self {
        Self::new(SourceKind::Relation)
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Script an operation.
    pub fn on(
        mut self,
        operation: &str,
        handler: impl FnMut(&[Arg]) -> Result<Outcome> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(operation.to_string(), Box::new(handler));
        self
    }

    /// Script an operation that advances to a fixed source.
    pub fn advances_to(self, operation: &str, next: SharedSource) -> Self {
        self.on(operation, move |_| Ok(Outcome::Advance(next.clone())))
    }

    /// Script an operation that spawns a fixed deferred relation.
    pub fn relates_to(self, operation: &str, relation: SharedSource) -> Self {
        self.on(operation, move |_| Ok(Outcome::Relation(relation.clone())))
    }

    /// Script an operation that returns a scalar.
    pub fn scalar(self, operation: &str, value: Value) -> Self {
        self.on(operation, move |_| Ok(Outcome::Scalar(value.clone())))
    }

    pub fn shared(self) -> SharedSource {
        shared(self)
    }
}

impl Source for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn invoke(&mut self, operation: &str, args: &[Arg]) -> Result<Outcome> {
        self.invocations.push(operation);
        match self.handlers.get_mut(operation) {
            Some(handler) => handler(args),
            None => Err(RepositoryError::UnsupportedOperation(operation.to_string())),
        }
    }

    fn get_field(&self, key: &str) -> Option<Value> {
        self.fields.get(key).cloned()
    }

    fn set_field(&mut self, key: &str, value: Value) -> bool {
        self.fields.insert(key.to_string(), value);
        true
    }

    fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    fn unset_field(&mut self, key: &str) {
        self.fields.remove(key);
    }

    fn elements(&self) -> Vec<SharedSource> {
        self.members.clone()
    }

    fn attach_relation(&mut self, name: &str, _relation: SharedSource) {
        self.attachments.push(name);
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Read a field off a shared fake source.
pub fn field_of(source: &SharedSource, key: &str) -> Option<Value> {
    source.read().unwrap().get_field(key)
}

/// Counting transaction collaborator; rollback can be made to fail.
#[derive(Default)]
pub struct FakeTransactions {
    pub begins: AtomicI64,
    pub commits: AtomicI64,
    pub rollbacks: AtomicI64,
    pub fail_rollback: AtomicBool,
}

impl FakeTransactions {
    pub fn failing_rollback() -> Self {
        let transactions = Self::default();
        transactions.fail_rollback.store(true, Ordering::SeqCst);
        transactions
    }

    pub fn rollback_count(&self) -> i64 {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

impl TransactionControl for FakeTransactions {
    fn begin(&self) -> Result<()> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        if self.fail_rollback.load(Ordering::SeqCst) {
            return Err(RepositoryError::Transaction("rollback failed".into()));
        }
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn current_depth(&self) -> Result<u64> {
        let depth = self.begins.load(Ordering::SeqCst)
            - self.commits.load(Ordering::SeqCst)
            - self.rollbacks.load(Ordering::SeqCst);
        Ok(depth.max(0) as u64)
    }
}

/// Diagnostics collaborator with a preset log.
#[derive(Default)]
pub struct FakeDiagnostics {
    pub enabled: AtomicBool,
    pub log: Mutex<Vec<QueryLogEntry>>,
}

impl FakeDiagnostics {
    pub fn with_log(entries: Vec<QueryLogEntry>) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            log: Mutex::new(entries),
        }
    }
}

impl QueryDiagnostics for FakeDiagnostics {
    fn enable_logging(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn fetch_log(&self) -> Vec<QueryLogEntry> {
        self.log.lock().unwrap().clone()
    }
}
