use std::str::FromStr;

use rentfolio_core::AppError;
use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// Deploy-time roles recognized by the platform.
///
/// The role-permission table below is the single source of truth for both
/// the claims writer and the authorization guard; a role's effective
/// permissions are always its full static set, with no per-user overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full cross-organization access.
    SuperAdmin,
    /// Full access scoped to one organization, including user and role
    /// management and organization settings.
    OrgAdmin,
    /// Read/write scoped to properties, tenants, payments, and rent
    /// agreements explicitly assigned to the manager.
    PropertyManager,
    /// Read-only reports, properties, and payments.
    FinancialViewer,
}

impl Role {
    /// Returns the stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::OrgAdmin => "org_admin",
            Self::PropertyManager => "property_manager",
            Self::FinancialViewer => "financial_viewer",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::SuperAdmin,
            Role::OrgAdmin,
            Role::PropertyManager,
            Role::FinancialViewer,
        ];

        ALL
    }

    /// Returns the fixed permission set for this role.
    #[must_use]
    pub fn permissions(&self) -> Vec<Permission> {
        let table: &[&'static str] = match self {
            Self::SuperAdmin => SUPER_ADMIN_PERMISSIONS,
            Self::OrgAdmin => ORG_ADMIN_PERMISSIONS,
            Self::PropertyManager => PROPERTY_MANAGER_PERMISSIONS,
            Self::FinancialViewer => FINANCIAL_VIEWER_PERMISSIONS,
        };

        table.iter().map(|value| Permission::from_static(value)).collect()
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "org_admin" => Ok(Self::OrgAdmin),
            "property_manager" => Ok(Self::PropertyManager),
            "financial_viewer" => Ok(Self::FinancialViewer),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// Resolves the fixed permission set for a role identifier.
///
/// Unknown role identifiers resolve to the empty set (fail-closed) rather
/// than an error, so a mistyped assignment grants nothing and a later
/// corrected assignment can repair the claims without special casing.
#[must_use]
pub fn permissions_for_role(role_id: &str) -> Vec<Permission> {
    Role::from_str(role_id)
        .map(|role| role.permissions())
        .unwrap_or_default()
}

static SUPER_ADMIN_PERMISSIONS: &[&str] = &[
    "properties:read:all",
    "properties:write:all",
    "tenants:read:all",
    "tenants:write:all",
    "rent_agreements:read:all",
    "rent_agreements:write:all",
    "payments:read:all",
    "payments:write:all",
    "invoices:read:all",
    "invoices:write:all",
    "reports:read:all",
    "users:manage:all",
    "roles:manage:all",
    "settings:manage:all",
    "organizations:manage:all",
];

static ORG_ADMIN_PERMISSIONS: &[&str] = &[
    "properties:read:organization",
    "properties:write:organization",
    "tenants:read:organization",
    "tenants:write:organization",
    "rent_agreements:read:organization",
    "rent_agreements:write:organization",
    "payments:read:organization",
    "payments:write:organization",
    "invoices:read:organization",
    "invoices:write:organization",
    "reports:read:organization",
    "users:manage:organization",
    "roles:manage:organization",
    "settings:manage:organization",
];

static PROPERTY_MANAGER_PERMISSIONS: &[&str] = &[
    "properties:read:assigned",
    "properties:create:assigned",
    "properties:update:assigned",
    "tenants:read:assigned",
    "tenants:create:assigned",
    "tenants:update:assigned",
    "rent_agreements:read:assigned",
    "rent_agreements:create:assigned",
    "rent_agreements:update:assigned",
    "payments:read:assigned",
    "payments:create:assigned",
    "payments:update:assigned",
];

static FINANCIAL_VIEWER_PERMISSIONS: &[&str] = &[
    "reports:read:organization",
    "properties:read:organization",
    "payments:read:organization",
];

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Role, permissions_for_role};

    #[test]
    fn role_roundtrip_storage_value() {
        for role in Role::all() {
            let restored = Role::from_str(role.as_str());
            assert!(restored.is_ok());
            assert_eq!(restored.unwrap_or(Role::FinancialViewer), *role);
        }
    }

    #[test]
    fn unknown_role_is_rejected_by_parse() {
        assert!(Role::from_str("janitor").is_err());
    }

    #[test]
    fn unknown_role_resolves_to_empty_permission_set() {
        assert!(permissions_for_role("nonexistent_role").is_empty());
    }

    #[test]
    fn property_manager_has_exactly_twelve_permissions() {
        assert_eq!(permissions_for_role("property_manager").len(), 12);
    }

    #[test]
    fn financial_viewer_is_read_only() {
        let permissions = permissions_for_role("financial_viewer");
        assert_eq!(permissions.len(), 3);
        assert!(permissions.iter().all(|permission| {
            permission.as_str().contains(":read:")
        }));
    }

    #[test]
    fn admin_sets_differ_only_in_scope_and_org_management() {
        let super_admin = permissions_for_role("super_admin");
        let org_admin = permissions_for_role("org_admin");
        assert_eq!(super_admin.len(), 15);
        assert_eq!(org_admin.len(), 14);
    }
}
