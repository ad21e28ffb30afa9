//! Typed portal entities.
//!
//! Each entity comes with a draft (`New*`, what callers pass to `create_*`)
//! and a patch (`*Patch`, the `$set` of `update_*`). Patches serialize only
//! the fields that are set; a set field replaces the stored value wholesale.

pub mod application;
pub mod category;
pub mod company;
pub mod job;
pub mod user;

pub use application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};
pub use category::{JobCategory, NewJobCategory};
pub use company::{Company, CompanyPatch, NewCompany};
pub use job::{EmploymentType, Job, JobPatch, JobStatus, NewJob};
pub use user::{NewUser, User, UserPatch, UserProfile, UserRole};

use crate::error::{PortalDbError, PortalDbResult};

/// Reject blank required text fields.
pub(crate) fn require(entity: &str, field: &str, value: &str) -> PortalDbResult<()> {
    if value.trim().is_empty() {
        return Err(PortalDbError::validation(entity, format!("{field} is required")));
    }
    Ok(())
}
