use serde::Serialize;
use thiserror::Error;

use outpost_core::UserId;

use crate::{Permission, PermissionSet, UserRecord};

/// Snapshot of the authenticated user for one request.
///
/// Built from a fresh credential-store read; never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub permissions: PermissionSet,
}

impl From<&UserRecord> for CurrentUser {
    fn from(value: &UserRecord) -> Self {
        Self {
            id: value.id,
            username: value.username.clone(),
            is_admin: value.is_admin,
            permissions: value.permissions.clone(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no permission for {} section", .0.section())]
    MissingPermission(Permission),

    #[error("admin access required")]
    AdminRequired,
}

/// What an endpoint requires of its caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    /// The caller must carry this permission tag.
    Section(Permission),
    /// The caller must have the admin flag.
    Admin,
}

/// Fails `MissingPermission` unless `user` carries `permission`.
///
/// The admin flag does not imply any permission tag.
pub fn require_permission(user: &CurrentUser, permission: Permission) -> Result<(), AuthzError> {
    if user.permissions.contains(permission) {
        Ok(())
    } else {
        Err(AuthzError::MissingPermission(permission))
    }
}

pub fn require_admin(user: &CurrentUser) -> Result<(), AuthzError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

/// Single gate every protected endpoint passes through.
///
/// - No IO
/// - No panics
pub fn authorize(user: &CurrentUser, access: Access) -> Result<(), AuthzError> {
    match access {
        Access::Section(permission) => require_permission(user, permission),
        Access::Admin => require_admin(user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool, perms: &[Permission]) -> CurrentUser {
        CurrentUser {
            id: UserId::new(),
            username: "u".into(),
            is_admin,
            permissions: perms.iter().copied().collect(),
        }
    }

    #[test]
    fn section_access_requires_the_tag() {
        let hunter = user(false, &[Permission::Hunter]);
        assert_eq!(authorize(&hunter, Access::Section(Permission::Hunter)), Ok(()));
        assert_eq!(
            authorize(&hunter, Access::Section(Permission::Map)),
            Err(AuthzError::MissingPermission(Permission::Map))
        );
    }

    #[test]
    fn admin_flag_does_not_grant_sections() {
        let admin = user(true, &[]);
        assert_eq!(authorize(&admin, Access::Admin), Ok(()));
        assert!(authorize(&admin, Access::Section(Permission::Zug)).is_err());
    }

    #[test]
    fn non_admin_is_rejected_from_admin_access() {
        let everyone = user(false, &Permission::ALL);
        assert_eq!(authorize(&everyone, Access::Admin), Err(AuthzError::AdminRequired));
    }

    #[test]
    fn forbidden_message_names_the_section() {
        assert_eq!(
            AuthzError::MissingPermission(Permission::Hunter).to_string(),
            "no permission for Hunter section"
        );
    }
}
