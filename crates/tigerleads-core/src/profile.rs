//! Contractor and supplier profiles as seen by lead matching.

use serde::{Deserialize, Serialize};

use crate::{Error, UserId};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Contractor,
    Supplier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Contractor => "Contractor",
            Role::Supplier => "Supplier",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contractor" => Ok(Role::Contractor),
            "supplier" => Ok(Role::Supplier),
            _ => Err(Error::UnknownRole(s.to_string())),
        }
    }
}

/// Location and trade attributes of the account a feed is computed for.
///
/// `user_id` is the effective account: for a team member it is the parent
/// account that owns the profile and the exclusion rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub role: Role,
    /// Region codes (`state` for contractors, `service_states` for suppliers).
    pub states: Vec<String>,
    /// County names (`country_city`).
    pub counties: Vec<String>,
    /// Trade slugs (`user_type`); elements may hold comma-separated slugs.
    pub trade_types: Vec<String>,
}
