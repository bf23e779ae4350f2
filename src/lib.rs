//! User Lifecycle API
//!
//! An HTTP service managing user records:
//! - Create and replace with full payload validation
//! - JSON Patch updates with a username uniqueness pre-check
//! - In-memory store shared behind an async `RwLock`

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::user::{Argon2Hasher, InMemoryUserRepository, UserService};
use tracing::info;

/// Build the application state for the given configuration
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let hasher = Argon2Hasher::new();

    let repository = if config.store.seed {
        InMemoryUserRepository::seeded(&hasher)?
    } else {
        InMemoryUserRepository::new()
    };

    info!(seeded = config.store.seed, "Initialized in-memory user store");

    let user_service = UserService::with_repository(repository, hasher);

    Ok(AppState::new(Arc::new(user_service)))
}
