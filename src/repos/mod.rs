/*
 * Responsibility
 * - storage traits consumed by services
 * - Postgres (sqlx) and in-memory implementations
 */
pub mod error;
pub mod memory;
pub mod snippet_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use snippet_repo::{PgSnippetRepo, SnippetRepo};
pub use user_repo::{PgUserRepo, UserRepo};
