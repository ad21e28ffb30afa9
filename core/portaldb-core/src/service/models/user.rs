use crate::error::{PortalDbError, PortalDbResult};
use crate::service::models::require;
use crate::service::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    JobSeeker,
    Employer,
    Admin,
}

/// Job-seeker profile. Replaced as a whole on update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub otp_code: Option<String>,
    #[serde(default)]
    pub otp_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub otp_code: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub profile: Option<UserProfile>,
}

impl NewUser {
    pub(crate) fn validated(mut self) -> PortalDbResult<Self> {
        self.email = normalize_email(&self.email);
        if !self.email.contains('@') {
            return Err(PortalDbError::validation(
                User::KIND,
                format!("'{}' is not an email address", self.email),
            ));
        }
        require(User::KIND, "password_hash", &self.password_hash)?;
        require(User::KIND, "full_name", &self.full_name)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

impl UserPatch {
    pub(crate) fn validated(mut self) -> PortalDbResult<Self> {
        if let Some(email) = self.email.take() {
            let email = normalize_email(&email);
            if !email.contains('@') {
                return Err(PortalDbError::validation(
                    User::KIND,
                    format!("'{email}' is not an email address"),
                ));
            }
            self.email = Some(email);
        }
        Ok(self)
    }
}

/// Emails are stored trimmed and lower-cased so lookups are exact matches.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
