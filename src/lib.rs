//! # repoproxy
//!
//! A fluent repository proxy: one value fronting an evolving chain of
//! data-access operations against an opaque storage engine, whether the
//! chain currently holds an unexecuted query, a single record, a record
//! collection or a paged result.
//!
//! The crate implements the dispatch and resolver-chain engine only. The
//! storage engine itself stays behind the [`Source`] trait: callers wrap
//! their query builders, records, collections and paged results, and the
//! proxy decides which of them every operation applies to.
//!
//! ```no_run
//! use repoproxy::{Arg, Dispatched, Repository, Value};
//!
//! # fn demo(query: repoproxy::SharedSource) -> repoproxy::Result<()> {
//! let mut users = Repository::new(query);
//!
//! users.dispatch(
//!     "where",
//!     vec![Arg::from("active"), Arg::from(Value::from(true))],
//! )?;
//! users.paginations(None, Some(25), None)?;
//!
//! // `count` is force-listed: it terminates the chain with the raw value
//! // and leaves the paginated view in place.
//! if let Dispatched::Value(total) = users.call("count")? {
//!     println!("{total} active users");
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod diagnostics;
pub mod facade;
pub mod history;
pub mod interface;

pub use crate::core::{
    Arg, Dispatched, Entity, Outcome, RepositoryError, Result, SourceKind, Value,
};
pub use crate::diagnostics::QueryLogEntry;
pub use crate::facade::{DEFAULT_FORCE_METHODS, ErrorSpec, Repository};
pub use crate::history::History;
pub use crate::interface::{QueryDiagnostics, SharedSource, Source, TransactionControl, shared};
