use crate::error::{PortalDbError, PortalDbResult};
use crate::service::models::require;
use crate::service::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Inactive,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub company_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub salary_min: Option<f64>,
    #[serde(default)]
    pub salary_max: Option<f64>,
    #[serde(default)]
    pub salary_currency: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub is_featured: bool,
    /// User id of the employer who posted it
    #[serde(default)]
    pub posted_by: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Job {
    const COLLECTION: &'static str = "jobs";
    const KIND: &'static str = "job";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub company_id: String,
    pub category_id: Option<String>,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    pub experience_level: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub status: JobStatus,
    pub is_featured: bool,
    pub posted_by: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewJob {
    pub(crate) fn validated(self) -> PortalDbResult<Self> {
        require(Job::KIND, "title", &self.title)?;
        require(Job::KIND, "company_id", &self.company_id)?;
        check_salary(self.salary_min, self.salary_max)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Only checks what the patch itself carries; a patch setting just one
    /// salary bound is not compared against the stored other bound.
    pub(crate) fn validated(self) -> PortalDbResult<Self> {
        if let Some(title) = &self.title {
            require(Job::KIND, "title", title)?;
        }
        check_salary(self.salary_min, self.salary_max)?;
        Ok(self)
    }
}

fn check_salary(min: Option<f64>, max: Option<f64>) -> PortalDbResult<()> {
    for bound in [min, max].into_iter().flatten() {
        if !bound.is_finite() || bound < 0.0 {
            return Err(PortalDbError::validation(
                Job::KIND,
                format!("salary bound {bound} must be a non-negative number"),
            ));
        }
    }
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(PortalDbError::validation(
            Job::KIND,
            format!("salary_min {min} exceeds salary_max {max}"),
        ));
    }
    Ok(())
}
