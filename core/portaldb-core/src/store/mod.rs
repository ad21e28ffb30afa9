//! Document store: collections, cursors, filters and updates.
//!
//! ```text
//! Database ──collection(name)──▶ Collection ──find(filter)──▶ Cursor ──to_array()──▶ Vec<Value>
//!    │                               │
//!    └── get/set_collection_data ◀───┘  (single persistence path)
//! ```

pub mod collection;
pub mod cursor;
pub mod database;
pub mod id;
pub mod index;
pub mod query;
pub mod update;

pub use collection::{
    Collection, DeleteResult, FindOneAndUpdateOptions, InsertOneResult, ReturnDocument,
    UpdateResult,
};
pub use cursor::Cursor;
pub use database::{Database, DatabaseStats};
pub use id::generate_id;
pub use index::{IndexDirection, IndexInfo, IndexOptions, IndexSpec};
pub use query::{Clause, Filter};
pub use update::Update;
