use crate::error::{PortalDbError, PortalDbResult};
use crate::service::models::require;
use crate::service::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Node of the three-tier category taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tier: u8,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for JobCategory {
    const COLLECTION: &'static str = "job_categories";
    const KIND: &'static str = "job_category";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJobCategory {
    pub name: String,
    /// Derived from `name` when empty
    pub slug: String,
    pub description: Option<String>,
    pub tier: u8,
    pub parent_id: Option<String>,
}

impl Default for NewJobCategory {
    fn default() -> Self {
        Self {
            name: String::new(),
            slug: String::new(),
            description: None,
            tier: 1,
            parent_id: None,
        }
    }
}

impl NewJobCategory {
    pub(crate) fn validated(mut self) -> PortalDbResult<Self> {
        require(JobCategory::KIND, "name", &self.name)?;
        if !(1..=3).contains(&self.tier) {
            return Err(PortalDbError::validation(
                JobCategory::KIND,
                format!("tier must be between 1 and 3, got {}", self.tier),
            ));
        }
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.name);
        }
        Ok(self)
    }
}

/// `"IT & Telecommunication"` → `"it-telecommunication"`
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
