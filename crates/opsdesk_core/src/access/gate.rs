//! Navigation/action gate.
//!
//! Pure filtering of console descriptors by a resolved [`CapabilitySet`].
//! Entries keep their input order; nothing here holds state.

use crate::access::capabilities::CapabilitySet;
use crate::model::role::Capability;
use serde::Serialize;

/// Visibility requirement declared by one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "capability", rename_all = "snake_case")]
pub enum Requirement {
    Always,
    Capability(Capability),
    /// Satisfied by the capability, or by an unprovisioned subject so the
    /// very first administrator can create records. Does not grant `has`.
    CapabilityOrBootstrap(Capability),
}

impl Requirement {
    pub fn is_satisfied_by(self, capabilities: &CapabilitySet) -> bool {
        match self {
            Self::Always => true,
            Self::Capability(capability) => capabilities.has(capability),
            Self::CapabilityOrBootstrap(capability) => {
                capabilities.has(capability) || capabilities.is_unprovisioned()
            }
        }
    }
}

/// Descriptor kind, used by presentation code to pick a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Navigation,
    Action,
}

/// One navigation link or action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub id: String,
    pub label: String,
    pub route: String,
    pub kind: EntryKind,
    pub requirement: Requirement,
}

impl NavEntry {
    pub fn navigation(
        id: impl Into<String>,
        label: impl Into<String>,
        route: impl Into<String>,
        requirement: Requirement,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            route: route.into(),
            kind: EntryKind::Navigation,
            requirement,
        }
    }

    pub fn action(
        id: impl Into<String>,
        label: impl Into<String>,
        route: impl Into<String>,
        requirement: Requirement,
    ) -> Self {
        Self {
            kind: EntryKind::Action,
            ..Self::navigation(id, label, route, requirement)
        }
    }
}

/// Keeps entries whose requirement is satisfied, preserving order.
pub fn filter_entries(capabilities: &CapabilitySet, entries: &[NavEntry]) -> Vec<NavEntry> {
    entries
        .iter()
        .filter(|entry| entry.requirement.is_satisfied_by(capabilities))
        .cloned()
        .collect()
}

/// Built-in admin console navigation and primary actions.
pub fn console_navigation() -> Vec<NavEntry> {
    use Requirement::{Always, Capability as Needs, CapabilityOrBootstrap};

    vec![
        NavEntry::navigation("dashboard", "Dashboard", "/", Always),
        NavEntry::navigation("notifications", "Notifications", "/notifications", Always),
        NavEntry::navigation("users", "Staff", "/users", Needs(Capability::ManageUsers)),
        NavEntry::navigation(
            "contracts",
            "Contracts",
            "/contracts",
            Needs(Capability::ManageContracts),
        ),
        NavEntry::navigation(
            "inventory",
            "Inventory",
            "/inventory",
            Needs(Capability::ManageInventory),
        ),
        NavEntry::navigation(
            "incidents",
            "Incidents",
            "/incidents",
            Needs(Capability::ManageIncidents),
        ),
        NavEntry::navigation(
            "safety-hygiene",
            "Safety & Hygiene",
            "/safety-hygiene",
            Needs(Capability::ManageSafetyHygiene),
        ),
        NavEntry::navigation(
            "audit-logs",
            "Audit Logs",
            "/audit-logs",
            Needs(Capability::ViewAuditLogs),
        ),
        NavEntry::action(
            "create-user",
            "New staff member",
            "/users/new",
            CapabilityOrBootstrap(Capability::ManageUsers),
        ),
        NavEntry::action(
            "create-contract",
            "New contract",
            "/contracts/new",
            Needs(Capability::ManageContracts),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{console_navigation, filter_entries, NavEntry, Requirement};
    use crate::access::capabilities::CapabilitySet;
    use crate::access::matrix::{CapabilityMatrix, MatrixRow};
    use crate::model::role::{Capability, Role};

    fn ids(entries: &[NavEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn employee_does_not_see_contract_entries() {
        const TABLE: &[MatrixRow] = &[
            (Role::Employee, &[]),
            (Role::Manager, &[Capability::ManageContracts]),
        ];
        let matrix = CapabilityMatrix::from_static(TABLE);
        let caps = CapabilitySet::from_roles(&matrix, [Role::Employee]);
        let visible = filter_entries(&caps, &console_navigation());
        assert!(!ids(&visible).contains(&"contracts"));
        assert!(!ids(&visible).contains(&"create-contract"));
        assert_eq!(ids(&visible), vec!["dashboard", "notifications"]);
    }

    #[test]
    fn filtering_preserves_input_order() {
        let caps = CapabilitySet::from_roles(&CapabilityMatrix::standard(), [Role::Superadmin]);
        let all = console_navigation();
        let visible = filter_entries(&caps, &all);
        assert_eq!(ids(&visible), ids(&all));
    }

    #[test]
    fn bootstrap_affordance_only_for_unprovisioned_subject() {
        let unprovisioned = CapabilitySet::from_roles(&CapabilityMatrix::standard(), []);
        let visible = filter_entries(&unprovisioned, &console_navigation());
        assert_eq!(
            ids(&visible),
            vec!["dashboard", "notifications", "create-user"]
        );
        assert!(!unprovisioned.has(Capability::ManageUsers));

        let employee = CapabilitySet::from_roles(&CapabilityMatrix::standard(), [Role::Employee]);
        assert!(!Requirement::CapabilityOrBootstrap(Capability::ManageUsers)
            .is_satisfied_by(&employee));
    }

    #[test]
    fn anonymous_subject_sees_only_always_entries() {
        let visible = filter_entries(&CapabilitySet::anonymous(), &console_navigation());
        assert!(visible
            .iter()
            .all(|entry| entry.requirement == Requirement::Always));
    }

    #[test]
    fn action_constructor_sets_kind() {
        let entry = NavEntry::action("x", "X", "/x", Requirement::Always);
        assert_eq!(entry.kind, super::EntryKind::Action);
    }
}
