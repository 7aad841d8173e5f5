//! SQLite persistence: split read/write pool and the token store.

pub mod pool;
pub mod token;

pub use pool::DatabasePool;
pub use token::SqliteTokenStore;
