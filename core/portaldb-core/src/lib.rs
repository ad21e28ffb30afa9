//! # portaldb: document store for the job portal
//!
//! portaldb keeps the portal's data (users, companies, jobs, job categories,
//! applications) as namespaced JSON arrays in a key-value backend and exposes
//! them through a small document-database style API plus a typed facade.
//!
//! ## Features
//!
//! - **Driver-style collections**: `insert_one`, `find`, `find_one_and_update`,
//!   `delete_one`, `create_index`
//! - **Filters**: equality clauses joined by AND, plus `$or`
//! - **Updates**: `$set`, replacing each named field wholesale
//! - **Backends**: in-memory ([`MemoryKv`]) or durable sled ([`SledKv`])
//! - **Typed facade**: [`DatabaseService`] with id/timestamp stamping,
//!   TTL caching and an idempotent index bootstrap
//!
//! ## Quick start
//!
//! ```rust
//! use portaldb_core::{DatabaseService, Filter, MemoryKv, StoreConfig};
//! use portaldb_core::service::models::{NewJob, JobStatus};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> portaldb_core::PortalDbResult<()> {
//! let service = DatabaseService::new(Arc::new(MemoryKv::new()), StoreConfig::default());
//!
//! let job = service
//!     .create_job(NewJob {
//!         title: "Rust Engineer".into(),
//!         company_id: "c1".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! assert_eq!(job.status, JobStatus::Active);
//!
//! let active = service.get_jobs(&Filter::eq("status", "active"), Some(10), None).await;
//! assert_eq!(active.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! DatabaseService → Repository<T> → Collection → Database → BackingStore → KvBackend
//! ```
//!
//! Every mutation rewrites the whole collection array under
//! `"{namespace}_{db_name}_{collection}"`.
//!
//! ## Modules
//!
//! - [`store`]: collections, filters, updates, cursors ([`Database`])
//! - [`storage`]: key-value backends and the namespaced backing store
//! - [`service`]: entities, repositories and [`DatabaseService`]
//! - [`config`]: [`StoreConfig`]

pub mod config;
pub mod error;
pub mod service;
pub mod storage;
pub mod store;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use config::StoreConfig;
pub use error::{PortalDbError, PortalDbResult};
pub use service::DatabaseService;
pub use storage::{KvBackend, MemoryKv, SledKv};
pub use store::{Collection, Cursor, Database, Filter, Update};
