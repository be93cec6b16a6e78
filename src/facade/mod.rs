mod dispatch;
mod repository;

pub use repository::{DEFAULT_FORCE_METHODS, ErrorSpec, Repository};
