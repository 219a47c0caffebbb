//! Application services and ports for Rentfolio access control.

#![forbid(unsafe_code)]

mod auth_service;
mod claims_service;
mod password;
mod profile_store;
mod session_service;

pub use auth_service::{AuthService, IdentityAuthGateway, LoginOutcome, RegisterInput};
pub use claims_service::{
    AuthIdentity, AuthIdentityRepository, ClaimsAssignment, ClaimsService, ClaimsSyncHandler,
    SetUserClaimsInput, UserClaimsView,
};
pub use password::PasswordHasher;
pub use profile_store::{ClaimsMirror, ProfileChangeHandler, ProfileRepository, ProfileStore};
pub use session_service::{
    AuthGateway, CachedSession, IdToken, ProfileLookup, SessionCache, SessionService,
    SignInOutcome, TOKEN_REFRESH_INTERVAL, resolve_access,
};
