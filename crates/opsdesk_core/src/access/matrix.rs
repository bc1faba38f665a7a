//! Static role to capability matrix.
//!
//! Pure lookup tables, no I/O. The standard table is the single place that
//! decides what each role may do in the console.

use crate::model::role::{Capability, Role};
use std::collections::BTreeSet;

/// One matrix row: a role and the capabilities it grants.
pub type MatrixRow = (Role, &'static [Capability]);

const STANDARD_TABLE: &[MatrixRow] = &[
    (Role::Superadmin, &Capability::ALL),
    (
        Role::AdminHr,
        &[Capability::ManageUsers, Capability::ManageContracts],
    ),
    (
        Role::Manager,
        &[
            Capability::ManageContracts,
            Capability::ManageInventory,
            Capability::ManageIncidents,
        ],
    ),
    (Role::Employee, &[]),
    (
        Role::SafetyOfficer,
        &[Capability::ManageSafetyHygiene, Capability::ManageIncidents],
    ),
    (Role::Auditor, &[Capability::ViewAuditLogs]),
];

/// Build-time mapping from role to granted capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityMatrix {
    table: &'static [MatrixRow],
}

impl CapabilityMatrix {
    /// The built-in console matrix.
    pub const fn standard() -> Self {
        Self::from_static(STANDARD_TABLE)
    }

    /// Builds a matrix over another static table. Roles missing from the
    /// table grant nothing; repeated rows for one role are unioned.
    pub const fn from_static(table: &'static [MatrixRow]) -> Self {
        Self { table }
    }

    /// Capabilities granted by a single role.
    pub fn grants(&self, role: Role) -> impl Iterator<Item = Capability> + '_ {
        self.table
            .iter()
            .filter(move |(row_role, _)| *row_role == role)
            .flat_map(|(_, capabilities)| capabilities.iter().copied())
    }

    /// Whether `role` grants `capability`.
    pub fn role_grants(&self, role: Role, capability: Capability) -> bool {
        self.grants(role).any(|granted| granted == capability)
    }

    /// Union of capabilities over `roles`.
    pub fn capabilities_for(&self, roles: impl IntoIterator<Item = Role>) -> BTreeSet<Capability> {
        roles
            .into_iter()
            .flat_map(|role| self.grants(role))
            .collect()
    }

    /// Roles that would grant `capability`, in table order.
    pub fn roles_granting(&self, capability: Capability) -> Vec<Role> {
        let mut roles = Vec::new();
        for (role, capabilities) in self.table {
            if capabilities.contains(&capability) && !roles.contains(role) {
                roles.push(*role);
            }
        }
        roles
    }
}

impl Default for CapabilityMatrix {
    fn default() -> Self {
        Self::standard()
    }
}
