//! Domain model for access control and notifications.
//!
//! # Responsibility
//! - Define canonical records consumed by resolver, gate and store client.
//! - Keep persisted string ids and in-memory enums in one place.
//!
//! # Invariants
//! - Role and capability sets are closed.
//! - Notifications are never deleted by core; only the read flag moves.

pub mod notification;
pub mod role;
