//! User identity and profile document types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rentfolio_core::{AppError, AppResult, OrganizationId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::Permission;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, exactly one `@`,
    /// non-empty local part, domain with at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 || parts[0].is_empty() {
            return Err(AppError::Validation(
                "email address must contain a local part and exactly one '@'".to_owned(),
            ));
        }

        let domain = parts[1];
        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Lifecycle status of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Signed up, awaiting an administrator decision.
    Pending,
    /// Approved with an assigned role.
    Active,
    /// Denied access by an administrator.
    Rejected,
}

impl AccountStatus {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a storage string into an account status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown account status '{value}'"
            ))),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Mutable profile document describing a user's role, organization, and
/// status, distinct from the authenticator's identity record.
///
/// After any role-assignment event the profile and the identity claims
/// should agree; a propagation window where they diverge is expected and
/// tolerated by the session bootstrap fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable user identifier, shared with the auth identity.
    pub uid: UserId,
    /// Canonical email address.
    pub email: String,
    /// Display name for UI surfaces.
    pub display_name: String,
    /// Assigned role identifier; `None` until an administrator assigns one.
    pub role_id: Option<String>,
    /// Mirrored permission set for the assigned role.
    pub permissions: Vec<Permission>,
    /// Organization the user belongs to.
    pub organization_id: Option<OrganizationId>,
    /// Account lifecycle status.
    pub status: AccountStatus,
    /// Optional message submitted with an access request.
    pub access_request_message: Option<String>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates the initial pending profile written at signup.
    #[must_use]
    pub fn pending_signup(
        uid: UserId,
        email: impl Into<String>,
        display_name: impl Into<String>,
        access_request_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            uid,
            email: email.into(),
            display_name: display_name.into(),
            role_id: None,
            permissions: Vec::new(),
            organization_id: None,
            status: AccountStatus::Pending,
            access_request_message,
            updated_at: now,
        }
    }

    /// Returns whether the fields mirrored into identity claims differ
    /// between two revisions of the same profile.
    #[must_use]
    pub fn claims_fields_changed(&self, other: &Self) -> bool {
        self.role_id != other.role_id
            || self.status != other.status
            || self.organization_id != other.organization_id
    }

    /// Returns the role identifier when the account is active.
    #[must_use]
    pub fn active_role(&self) -> Option<&str> {
        match self.status {
            AccountStatus::Active => self.role_id.as_deref(),
            AccountStatus::Pending | AccountStatus::Rejected => None,
        }
    }
}
