//! Runtime for executing conversation turns
//!
//! Owns the I/O around the pure transition: loading and saving sessions,
//! running the moderation gate and model calls, and executing effects.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::db::DbError;
use std::sync::Arc;
use thiserror::Error;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = ConversationRuntime<Arc<dyn Storage>, Arc<dyn Nlu>>;

/// Session store failures; fatal for the turn
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] DbError),
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
