//! LitKeep Common Library
//!
//! Shared code for the LitKeep service:
//! - Database models and repository pattern
//! - Author name normalization and the article-author linker
//! - Article, temp-library and migration services
//! - Error types and handling
//! - Configuration management
//! - Identity extraction for the gateway
//! - Metrics helpers

pub mod auth;
pub mod authors;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default article cap for free-plan accounts
pub const DEFAULT_FREE_PLAN_ARTICLE_LIMIT: u64 = 10;
