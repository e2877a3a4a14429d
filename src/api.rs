//! HTTP API for tablebot

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::ProductionRuntime;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ProductionRuntime>,
    pub health: HealthReport,
}

impl AppState {
    pub fn new(runtime: ProductionRuntime, health: HealthReport) -> Self {
        Self {
            runtime: Arc::new(runtime),
            health,
        }
    }
}
