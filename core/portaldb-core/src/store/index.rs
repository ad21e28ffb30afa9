//! Index descriptors.
//!
//! Indexes are recorded and reported but never consulted by queries and
//! never enforce uniqueness.

use serde::{Deserialize, Serialize};

/// Sort direction of an index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexDirection {
    Ascending,
    Descending,
}

impl IndexDirection {
    /// Driver-style numeric form (`1` / `-1`).
    pub fn as_i32(&self) -> i32 {
        match self {
            IndexDirection::Ascending => 1,
            IndexDirection::Descending => -1,
        }
    }
}

/// Ordered list of indexed fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexSpec {
    pub keys: Vec<(String, IndexDirection)>,
}

impl IndexSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(field: &str) -> Self {
        Self::new().then_asc(field)
    }

    pub fn desc(field: &str) -> Self {
        Self::new().then_desc(field)
    }

    pub fn then_asc(mut self, field: &str) -> Self {
        self.keys.push((field.to_string(), IndexDirection::Ascending));
        self
    }

    pub fn then_desc(mut self, field: &str) -> Self {
        self.keys.push((field.to_string(), IndexDirection::Descending));
        self
    }

    /// Default name, e.g. `job_id_1_job_seeker_id_1`.
    pub fn default_name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, dir)| format!("{}_{}", field, dir.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Options accepted by `create_index`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexOptions {
    pub name: Option<String>,
    pub unique: bool,
}

impl IndexOptions {
    pub fn unique() -> Self {
        Self {
            name: None,
            unique: true,
        }
    }
}

/// An index as recorded on a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub spec: IndexSpec,
    pub unique: bool,
}
