pub mod error;
pub mod types;
pub mod value;

pub use error::{RepositoryError, Result};
pub use types::{Arg, Dispatched, Entity, Outcome, SourceKind};
pub use value::Value;
