//! Discord role reconciliation for verified members.

pub mod reconcile;
pub mod sync;

pub use reconcile::{RoleGrant, RolePolicy};
pub use sync::{sync_roles, RoleGateway, RoleSyncOutcome};
