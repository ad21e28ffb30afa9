//! Generic typed repository over one collection.
//!
//! Stamps `id`, `created_at` and `updated_at` on create, resolves ids through
//! `{$or: [{id}, {_id}]}`, and keeps identifiers and `created_at` out of
//! updates. Reads deserialize with [`Cursor::to_typed`] semantics: documents
//! that do not fit the entity are skipped with a warning.

use crate::error::{PortalDbError, PortalDbResult};
use crate::service::clock::Clock;
use crate::store::{Collection, Filter, FindOneAndUpdateOptions, Update, generate_id};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Fields owned by the repository; callers can never write them.
const PROTECTED_ON_CREATE: [&str; 4] = ["id", "_id", "created_at", "updated_at"];
const PROTECTED_ON_UPDATE: [&str; 3] = ["id", "_id", "created_at"];

/// A document type stored in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Collection name
    const COLLECTION: &'static str;
    /// Human-readable kind used in logs and validation errors
    const KIND: &'static str;

    fn id(&self) -> &str;
}

pub struct Repository<T: Entity> {
    collection: Collection,
    clock: Arc<dyn Clock>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(collection: Collection, clock: Arc<dyn Clock>) -> Self {
        Self {
            collection,
            clock,
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Persist a draft as a new entity.
    ///
    /// The draft is serialized, stamped and deserialized into `T` before it
    /// is written, so a draft missing required entity fields is rejected
    /// without touching the store.
    pub async fn create<D: Serialize>(&self, draft: &D) -> PortalDbResult<T> {
        let Value::Object(mut map) = serde_json::to_value(draft)? else {
            return Err(PortalDbError::InvalidDocument(format!(
                "{} draft must serialize to an object",
                T::KIND
            )));
        };
        for field in PROTECTED_ON_CREATE {
            map.remove(field);
        }

        let now = serde_json::to_value(self.clock.now())?;
        map.insert("id".to_string(), Value::String(generate_id()));
        map.insert("created_at".to_string(), now.clone());
        map.insert("updated_at".to_string(), now);

        let entity: T = serde_json::from_value(Value::Object(map))?;
        self.collection.insert_one(serde_json::to_value(&entity)?).await?;
        debug!(kind = T::KIND, id = entity.id(), "created");
        Ok(entity)
    }

    pub async fn get_by_id(&self, id: &str) -> Option<T> {
        self.find_one(&Filter::by_id(id)).await
    }

    pub async fn find_one(&self, filter: &Filter) -> Option<T> {
        let doc = self.collection.find_one(filter).await?;
        decode(doc)
    }

    /// Matching entities in storage order, with optional skip and limit.
    pub async fn find(&self, filter: &Filter, limit: Option<i64>, skip: Option<i64>) -> Vec<T> {
        let mut cursor = self.collection.find(filter);
        if let Some(skip) = skip {
            cursor = cursor.skip(skip);
        }
        if let Some(limit) = limit {
            cursor = cursor.limit(limit);
        }
        cursor.to_typed().await
    }

    pub async fn count(&self, filter: &Filter) -> u64 {
        self.collection.count_documents(filter).await
    }

    /// `$set` the patch's fields and refresh `updated_at`.
    ///
    /// `Ok(None)` when no entity has this id. If the patched document no
    /// longer decodes, the write stays applied and `InvalidDocument` is
    /// returned.
    pub async fn update<P: Serialize>(&self, id: &str, patch: &P) -> PortalDbResult<Option<T>> {
        let mut update = Update::from_serializable(patch)?;
        for field in PROTECTED_ON_UPDATE {
            update = update.without(field);
        }
        let update = update.and_set("updated_at", serde_json::to_value(self.clock.now())?);

        let updated = self
            .collection
            .find_one_and_update(&Filter::by_id(id), &update, FindOneAndUpdateOptions::after())
            .await?;
        let Some(doc) = updated else {
            return Ok(None);
        };
        match serde_json::from_value(doc) {
            Ok(entity) => Ok(Some(entity)),
            Err(e) => {
                error!(kind = T::KIND, id, error = %e, "updated document no longer decodes");
                Err(PortalDbError::InvalidDocument(format!(
                    "{} '{id}' after update: {e}",
                    T::KIND
                )))
            }
        }
    }

    /// `true` if an entity was removed.
    pub async fn delete(&self, id: &str) -> PortalDbResult<bool> {
        let result = self.collection.delete_one(&Filter::by_id(id)).await?;
        Ok(result.deleted_count > 0)
    }
}

fn decode<T: Entity>(doc: Value) -> Option<T> {
    match serde_json::from_value(doc) {
        Ok(entity) => Some(entity),
        Err(e) => {
            warn!(kind = T::KIND, error = %e, "skipping malformed document");
            None
        }
    }
}
