//! Role and capability vocabulary.
//!
//! # Responsibility
//! - Define the closed role set assigned to subjects.
//! - Define the named capability atoms that gate console surfaces.
//!
//! # Invariants
//! - Both sets are closed: adding a role or capability is a code change.
//! - String ids are stable and lowercase-kebab; parsing is exact-match.
//!
//! # See also
//! - `crate::access::matrix` for the role to capability mapping.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of the authenticated actor.
pub type SubjectId = Uuid;

/// Role tag assigned to a subject by an administrative action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Superadmin,
    AdminHr,
    Manager,
    Employee,
    SafetyOfficer,
    Auditor,
}

/// Persisted string value for the superadmin role.
pub const ROLE_SUPERADMIN: &str = "superadmin";
/// Persisted string value for the HR administrator role.
pub const ROLE_ADMIN_HR: &str = "admin-hr";
/// Persisted string value for the manager role.
pub const ROLE_MANAGER: &str = "manager";
/// Persisted string value for the employee role.
pub const ROLE_EMPLOYEE: &str = "employee";
/// Persisted string value for the safety officer role.
pub const ROLE_SAFETY_OFFICER: &str = "safety-officer";
/// Persisted string value for the auditor role.
pub const ROLE_AUDITOR: &str = "auditor";

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 6] = [
        Role::Superadmin,
        Role::AdminHr,
        Role::Manager,
        Role::Employee,
        Role::SafetyOfficer,
        Role::Auditor,
    ];

    /// Stable string id used by role assignment rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Superadmin => ROLE_SUPERADMIN,
            Self::AdminHr => ROLE_ADMIN_HR,
            Self::Manager => ROLE_MANAGER,
            Self::Employee => ROLE_EMPLOYEE,
            Self::SafetyOfficer => ROLE_SAFETY_OFFICER,
            Self::Auditor => ROLE_AUDITOR,
        }
    }

    /// Parses one role from its persisted string id.
    pub fn parse(value: &str) -> Result<Self, RoleParseError> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(RoleParseError::Empty);
        }

        match normalized {
            ROLE_SUPERADMIN => Ok(Self::Superadmin),
            ROLE_ADMIN_HR => Ok(Self::AdminHr),
            ROLE_MANAGER => Ok(Self::Manager),
            ROLE_EMPLOYEE => Ok(Self::Employee),
            ROLE_SAFETY_OFFICER => Ok(Self::SafetyOfficer),
            ROLE_AUDITOR => Ok(Self::Auditor),
            other => Err(RoleParseError::Unknown(other.to_string())),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleParseError {
    Empty,
    Unknown(String),
}

impl Display for RoleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "role value must not be empty"),
            Self::Unknown(value) => write!(f, "role is unknown: {value}"),
        }
    }
}

impl Error for RoleParseError {}

/// Named permission atom gating one console action or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    ManageUsers,
    ManageContracts,
    ManageInventory,
    ManageIncidents,
    ManageSafetyHygiene,
    ViewAuditLogs,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 6] = [
        Capability::ManageUsers,
        Capability::ManageContracts,
        Capability::ManageInventory,
        Capability::ManageIncidents,
        Capability::ManageSafetyHygiene,
        Capability::ViewAuditLogs,
    ];

    /// Stable string id used by presentation code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageUsers => "manage-users",
            Self::ManageContracts => "manage-contracts",
            Self::ManageInventory => "manage-inventory",
            Self::ManageIncidents => "manage-incidents",
            Self::ManageSafetyHygiene => "manage-safety-hygiene",
            Self::ViewAuditLogs => "view-audit-logs",
        }
    }

    /// User-facing short description.
    pub fn description(self) -> &'static str {
        match self {
            Self::ManageUsers => "Create, edit and deactivate staff accounts and role assignments.",
            Self::ManageContracts => "Create and amend employment contracts.",
            Self::ManageInventory => "Register, move and retire inventory items.",
            Self::ManageIncidents => "Open, update and close workplace incident reports.",
            Self::ManageSafetyHygiene => "Maintain safety and hygiene inspections and records.",
            Self::ViewAuditLogs => "Read the administrative audit log.",
        }
    }

    /// Parses one capability from its string id.
    pub fn parse(value: &str) -> Result<Self, CapabilityParseError> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(CapabilityParseError::Empty);
        }

        Self::ALL
            .into_iter()
            .find(|capability| capability.as_str() == normalized)
            .ok_or_else(|| CapabilityParseError::Unknown(normalized.to_string()))
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityParseError {
    Empty,
    Unknown(String),
}

impl Display for CapabilityParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "capability value must not be empty"),
            Self::Unknown(value) => write!(f, "capability is unknown: {value}"),
        }
    }
}

impl Error for CapabilityParseError {}

/// One `(subject, role)` assignment row. Read-only from core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub subject_id: SubjectId,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::{Capability, CapabilityParseError, Role, RoleParseError};

    #[test]
    fn role_ids_roundtrip_through_parse() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()).expect("known role"), role);
        }
    }

    #[test]
    fn rejects_empty_and_unknown_roles() {
        assert_eq!(Role::parse("  "), Err(RoleParseError::Empty));
        assert_eq!(
            Role::parse("root"),
            Err(RoleParseError::Unknown("root".to_string()))
        );
    }

    #[test]
    fn role_parse_is_case_sensitive() {
        assert_eq!(
            Role::parse("Manager"),
            Err(RoleParseError::Unknown("Manager".to_string()))
        );
    }

    #[test]
    fn capability_ids_roundtrip_through_parse() {
        for capability in Capability::ALL {
            assert_eq!(
                Capability::parse(capability.as_str()).expect("known capability"),
                capability
            );
        }
        assert_eq!(
            Capability::parse("delete-everything"),
            Err(CapabilityParseError::Unknown("delete-everything".to_string()))
        );
    }

    #[test]
    fn serde_uses_kebab_case_ids() {
        let json = serde_json::to_string(&Role::SafetyOfficer).expect("serialize role");
        assert_eq!(json, "\"safety-officer\"");
        let capability: Capability =
            serde_json::from_str("\"view-audit-logs\"").expect("deserialize capability");
        assert_eq!(capability, Capability::ViewAuditLogs);
    }
}
