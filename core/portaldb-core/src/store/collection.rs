//! Collection: driver-style CRUD over one named document array.
//!
//! Every mutating operation is read-modify-write on a snapshot of the whole
//! collection followed by a full write back through the [`Database`]. There
//! is no locking between the read and the write: two overlapping updates on
//! the same collection are last-writer-wins and the earlier one may be lost.

use crate::error::{PortalDbError, PortalDbResult};
use crate::store::cursor::Cursor;
use crate::store::database::Database;
use crate::store::id::generate_id;
use crate::store::index::{IndexInfo, IndexOptions, IndexSpec};
use crate::store::query::Filter;
use crate::store::update::Update;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Which snapshot `find_one_and_update` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOneAndUpdateOptions {
    pub return_document: ReturnDocument,
}

impl FindOneAndUpdateOptions {
    pub fn before() -> Self {
        Self {
            return_document: ReturnDocument::Before,
        }
    }

    pub fn after() -> Self {
        Self {
            return_document: ReturnDocument::After,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOneResult {
    pub inserted_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Handle to a named collection of a [`Database`].
#[derive(Clone)]
pub struct Collection {
    name: String,
    db: Arc<Database>,
}

impl Collection {
    pub(crate) fn new(name: &str, db: Arc<Database>) -> Self {
        Self {
            name: name.to_string(),
            db,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ════════════════════════════════════════════
    // CREATE
    // ════════════════════════════════════════════

    /// Insert a document, assigning its id.
    ///
    /// The id is the caller's `id` or `_id` (both must agree when both are
    /// given), else a freshly generated one; it is written to both fields.
    /// An id already held by another document is rejected.
    #[instrument(skip(self, doc), fields(collection = %self.name))]
    pub async fn insert_one(&self, doc: Value) -> PortalDbResult<InsertOneResult> {
        let (doc, id) = with_identity(doc)?;

        let mut docs = self.db.get_collection_data(&self.name);
        self.ensure_id_free(&docs, &id)?;
        self.db.simulate_latency().await;
        docs.push(doc);
        self.db.set_collection_data(&self.name, docs)?;

        debug!(%id, "inserted document");
        Ok(InsertOneResult { inserted_id: id })
    }

    /// Insert several documents with a single write. Returns ids in input order.
    #[instrument(skip(self, docs), fields(collection = %self.name, count = docs.len()))]
    pub async fn insert_many(&self, docs: Vec<Value>) -> PortalDbResult<Vec<String>> {
        let prepared = docs
            .into_iter()
            .map(with_identity)
            .collect::<PortalDbResult<Vec<_>>>()?;

        let mut current = self.db.get_collection_data(&self.name);
        let mut batch = HashSet::with_capacity(prepared.len());
        for (_, id) in &prepared {
            self.ensure_id_free(&current, id)?;
            if !batch.insert(id.as_str()) {
                return Err(self.duplicate_id(id));
            }
        }

        self.db.simulate_latency().await;
        let mut ids = Vec::with_capacity(prepared.len());
        for (doc, id) in prepared {
            current.push(doc);
            ids.push(id);
        }
        self.db.set_collection_data(&self.name, current)?;
        Ok(ids)
    }

    // ════════════════════════════════════════════
    // READ
    // ════════════════════════════════════════════

    /// First matching document in storage order.
    pub async fn find_one(&self, filter: &Filter) -> Option<Value> {
        self.db.simulate_latency().await;
        self.db
            .get_collection_data(&self.name)
            .into_iter()
            .find(|doc| filter.matches(doc))
    }

    /// Cursor over every matching document in storage order.
    pub fn find(&self, filter: &Filter) -> Cursor {
        let matching = self
            .db
            .get_collection_data(&self.name)
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .collect();
        Cursor::new(matching)
    }

    pub async fn count_documents(&self, filter: &Filter) -> u64 {
        self.db.simulate_latency().await;
        self.db
            .get_collection_data(&self.name)
            .iter()
            .filter(|doc| filter.matches(doc))
            .count() as u64
    }

    // ════════════════════════════════════════════
    // UPDATE
    // ════════════════════════════════════════════

    /// Apply `$set` to the first match.
    ///
    /// A miss returns `None` and writes nothing.
    #[instrument(skip(self, filter, update), fields(collection = %self.name))]
    pub async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        options: FindOneAndUpdateOptions,
    ) -> PortalDbResult<Option<Value>> {
        let mut docs = self.db.get_collection_data(&self.name);
        let Some(pos) = docs.iter().position(|doc| filter.matches(doc)) else {
            debug!(filter = %filter.to_json(), "no document matched update");
            return Ok(None);
        };

        self.db.simulate_latency().await;
        let before = docs[pos].clone();
        let after = update.apply(&before);
        docs[pos] = after.clone();
        self.db.set_collection_data(&self.name, docs)?;

        Ok(Some(match options.return_document {
            ReturnDocument::Before => before,
            ReturnDocument::After => after,
        }))
    }

    /// Like [`find_one_and_update`](Self::find_one_and_update) but reports counts.
    pub async fn update_one(&self, filter: &Filter, update: &Update) -> PortalDbResult<UpdateResult> {
        let before = self
            .find_one_and_update(filter, update, FindOneAndUpdateOptions::before())
            .await?;
        Ok(match before {
            Some(doc) => UpdateResult {
                matched_count: 1,
                modified_count: u64::from(update.apply(&doc) != doc),
            },
            None => UpdateResult {
                matched_count: 0,
                modified_count: 0,
            },
        })
    }

    // ════════════════════════════════════════════
    // DELETE
    // ════════════════════════════════════════════

    /// Remove the first match.
    #[instrument(skip(self, filter), fields(collection = %self.name))]
    pub async fn delete_one(&self, filter: &Filter) -> PortalDbResult<DeleteResult> {
        let mut docs = self.db.get_collection_data(&self.name);
        let Some(pos) = docs.iter().position(|doc| filter.matches(doc)) else {
            return Ok(DeleteResult { deleted_count: 0 });
        };

        self.db.simulate_latency().await;
        docs.remove(pos);
        self.db.set_collection_data(&self.name, docs)?;
        Ok(DeleteResult { deleted_count: 1 })
    }

    /// Remove the collection entirely.
    pub async fn drop(&self) -> PortalDbResult<bool> {
        self.db.drop_collection(&self.name)
    }

    // ════════════════════════════════════════════
    // INDEXES
    // ════════════════════════════════════════════

    /// Record an index and return its name.
    ///
    /// Indexes are bookkeeping only: queries never use them and `unique` is
    /// not enforced. Re-creating an existing index is a no-op.
    pub async fn create_index(
        &self,
        spec: IndexSpec,
        options: IndexOptions,
    ) -> PortalDbResult<String> {
        if spec.keys.is_empty() {
            return Err(PortalDbError::InvalidIndex {
                collection: self.name.clone(),
                reason: "empty key specification".to_string(),
            });
        }
        if let Some((field, _)) = spec.keys.iter().find(|(field, _)| field.is_empty()) {
            return Err(PortalDbError::InvalidIndex {
                collection: self.name.clone(),
                reason: format!("invalid field name '{field}'"),
            });
        }

        self.db.simulate_latency().await;
        let name = options.name.clone().unwrap_or_else(|| spec.default_name());
        let created = self.db.register_index(
            &self.name,
            IndexInfo {
                name: name.clone(),
                spec,
                unique: options.unique,
            },
        );
        if created {
            info!(collection = %self.name, index = %name, unique = options.unique, "index created");
        } else {
            debug!(collection = %self.name, index = %name, "index already exists");
        }
        Ok(name)
    }

    pub fn list_indexes(&self) -> Vec<IndexInfo> {
        self.db.indexes_of(&self.name)
    }

    fn ensure_id_free(&self, docs: &[Value], id: &str) -> PortalDbResult<()> {
        let taken = Filter::by_id(id);
        if docs.iter().any(|doc| taken.matches(doc)) {
            return Err(self.duplicate_id(id));
        }
        Ok(())
    }

    fn duplicate_id(&self, id: &str) -> PortalDbError {
        PortalDbError::InvalidDocument(format!(
            "duplicate id '{id}' in collection '{}'",
            self.name
        ))
    }
}

/// Resolve the document's id and stamp it onto both `id` and `_id`.
fn with_identity(doc: Value) -> PortalDbResult<(Value, String)> {
    let Value::Object(mut map) = doc else {
        return Err(PortalDbError::InvalidDocument(
            "documents must be JSON objects".to_string(),
        ));
    };

    let given = |field: &str| {
        map.get(field)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    };
    let id = match (given("id"), given("_id")) {
        (Some(id), Some(legacy)) if id != legacy => {
            return Err(PortalDbError::InvalidDocument(format!(
                "conflicting identifiers: id '{id}' and _id '{legacy}'"
            )));
        }
        (Some(id), _) | (None, Some(id)) => id,
        (None, None) => generate_id(),
    };

    map.insert("id".to_string(), Value::String(id.clone()));
    map.insert("_id".to_string(), Value::String(id.clone()));
    Ok((Value::Object(map), id))
}
