//! Domain entities and invariants for Rentfolio access control.

#![forbid(unsafe_code)]

mod access;
mod claims;
mod permission;
mod role;
mod user;

pub use access::{AccessSource, GuardOutcome, ResolvedAccess, SessionState, evaluate_route_guard};
pub use claims::CustomClaims;
pub use permission::Permission;
pub use role::{Role, permissions_for_role};
pub use user::{AccountStatus, EmailAddress, UserId, UserProfile};
