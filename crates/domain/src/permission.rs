use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rentfolio_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Fine-grained capability of the shape `resource:action:scope`.
///
/// Permissions are opaque membership tokens: authorization only ever tests
/// set membership, never interprets the segments. The shape is still
/// validated at the boundary so malformed grants are rejected early.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    /// Parses and validates a permission string.
    pub fn parse(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let segments: Vec<&str> = value.split(':').collect();

        if segments.len() != 3 || segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "permission '{value}' must have the shape 'resource:action:scope'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the permission string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Builds a permission from a deploy-time table literal.
    ///
    /// Only the static role-permission table uses this; every literal there
    /// is covered by the shape test below.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_owned())
    }
}

impl TryFrom<String> for Permission {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.0
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::Permission;
    use crate::role::Role;

    #[test]
    fn well_formed_permission_is_accepted() {
        let permission = Permission::parse("payments:read:organization");
        assert!(permission.is_ok());
    }

    #[test]
    fn missing_scope_is_rejected() {
        assert!(Permission::parse("payments:read").is_err());
    }

    #[test]
    fn empty_segment_is_rejected() {
        assert!(Permission::parse("payments::organization").is_err());
    }

    #[test]
    fn extra_segment_is_rejected() {
        assert!(Permission::parse("payments:read:organization:extra").is_err());
    }

    #[test]
    fn every_table_literal_has_a_valid_shape() {
        for role in Role::all() {
            for permission in role.permissions() {
                assert!(
                    Permission::parse(permission.as_str()).is_ok(),
                    "malformed table literal '{permission}' for role '{}'",
                    role.as_str()
                );
            }
        }
    }

    proptest! {
        #[test]
        fn parse_accepts_exactly_three_non_empty_segments(
            resource in "[a-z_]{1,12}",
            action in "[a-z_]{1,12}",
            scope in "[a-z_]{1,12}",
        ) {
            let value = format!("{resource}:{action}:{scope}");
            prop_assert!(Permission::parse(value).is_ok());
        }

        #[test]
        fn parse_rejects_values_without_two_separators(value in "[a-z_]{1,24}") {
            prop_assert!(Permission::parse(value).is_err());
        }
    }
}
