//! Typed facade over the document store.
//!
//! ```text
//! DatabaseService ──repo::<T>()──▶ Repository<T> ──▶ Collection
//!    ├── TimedCache  (category listing, connection check)
//!    └── Clock       (created_at / updated_at)
//! ```

pub mod cache;
pub mod clock;
pub mod facade;
pub mod models;
pub mod repository;

pub use cache::{CacheStats, TimedCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use facade::{DatabaseService, IndexDefinition, SetupReport, default_indexes};
pub use repository::{Entity, Repository};
