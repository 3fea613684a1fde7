use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolhub_core::{DomainResult, StaffId};

use crate::item::normalize_name;

/// A staff member items can be issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStaff {
    pub name: String,
}

impl NewStaff {
    pub fn validate(self) -> DomainResult<NewStaff> {
        Ok(NewStaff {
            name: normalize_name(&self.name)?,
        })
    }
}
