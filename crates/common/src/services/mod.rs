//! Library services
//!
//! The orchestration layer between the gateway handlers and the repository:
//! author directory + linker, the article and temp stores, and the session
//! migration engine. Every mutating operation here is all-or-nothing: it
//! either commits its transaction or rolls back without partial writes.

pub mod articles;
pub mod authors;
pub mod migration;
pub mod temp;

pub use articles::{ArticleFields, ArticleService, ArticleUpdate};
pub use migration::{MigrationOutcome, MigrationReport, MigrationService};
pub use temp::TempService;
