use chrono::Utc;
use rentfolio_core::CallerIdentity;
use rentfolio_domain::ResolvedAccess;

mod password;
mod session;

pub use password::{login_handler, signup_handler};
pub use session::{logout_handler, me_handler, refresh_handler};

pub const SESSION_USER_KEY: &str = "caller_identity";

/// Builds the session snapshot from resolved access.
pub(crate) fn caller_identity_from_access(
    access: &ResolvedAccess,
    email: Option<String>,
) -> CallerIdentity {
    let status = if access.role.is_some() && !access.needs_role_assignment {
        "active"
    } else {
        "pending"
    };

    CallerIdentity::new(
        access.uid.as_uuid(),
        email,
        access.role.clone(),
        access
            .permissions
            .iter()
            .map(|permission| permission.as_str().to_owned())
            .collect(),
        access.organization_id,
        status,
        Utc::now(),
    )
}
