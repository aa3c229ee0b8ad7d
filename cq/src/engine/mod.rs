//! Template execution engine

mod attempts;
mod error;
mod executor;

pub use error::{EngineError, ExecutionError};
pub use executor::Engine;
