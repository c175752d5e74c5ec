//! Authenticated staff identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use shared::jwt::StaffRole;

/// The staff member (or admin) operating a scanning device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffIdentity {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: StaffRole,
}

impl StaffIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin
    }
}
