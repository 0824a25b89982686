//! Database layer
//!
//! SQLite (default) or MySQL behind [`DatabasePool`]. Content lives in a
//! JSON document store (`documents` table) addressed by collection name;
//! accounts, sessions and auth tokens use relational tables.

pub mod documents;
pub mod migrations;
pub mod pool;
pub mod repositories;

pub use documents::{Document, DocumentStore, DynDocumentStore, FieldUpdate, SqlxDocumentStore};
pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
