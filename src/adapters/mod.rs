// Adapters layer: concrete database stores and filesystem storage.

pub mod postgres;
pub mod sqlite;
pub mod storage;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
pub use storage::LocalStorage;
