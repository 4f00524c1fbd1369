//! User records and the request shapes that create or change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outpost_core::{DomainError, DomainResult, Entity, UserId};

use crate::PermissionSet;

// ─────────────────────────────────────────────────────────────────────────────
// Stored record
// ─────────────────────────────────────────────────────────────────────────────

/// A user as persisted in the credential store.
///
/// # Invariants
/// - `username` is unique across all users (enforced by the store at insert).
/// - `password_hash` never leaves the process; use [`UserRecord::to_public`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        is_admin: bool,
        permissions: PermissionSet,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            password_hash: password_hash.into(),
            is_admin,
            permissions,
            created_at,
        }
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin,
            permissions: self.permissions.clone(),
            created_at: self.created_at,
        }
    }

    /// Merge an admin update: only fields present in `update` change.
    pub fn apply_update(&mut self, update: &UserUpdate) {
        if let Some(permissions) = &update.permissions {
            self.permissions = permissions.clone();
        }
        if let Some(is_admin) = update.is_admin {
            self.is_admin = is_admin;
        }
    }
}

impl Entity for UserRecord {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Public projection of a user (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Self-service registration: credentials only, no flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

/// Admin-created user, flags included.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl From<Registration> for NewUser {
    fn from(value: Registration) -> Self {
        Self {
            username: value.username,
            password: value.password,
            is_admin: false,
            permissions: PermissionSet::new(),
        }
    }
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

/// Admin update of a user's flags (merge semantics).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub permissions: Option<PermissionSet>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> DomainResult<()> {
        validate_password(&self.new_password)
    }
}

fn validate_username(username: &str) -> DomainResult<()> {
    if username.trim().is_empty() {
        return Err(DomainError::validation("username cannot be empty"));
    }
    if username.len() > 64 {
        return Err(DomainError::validation("username cannot exceed 64 bytes"));
    }
    Ok(())
}

fn validate_password(password: &str) -> DomainResult<()> {
    if password.is_empty() {
        return Err(DomainError::validation("password cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Permission;

    fn record() -> UserRecord {
        UserRecord::new(
            "alice",
            "$argon2id$fake",
            false,
            PermissionSet::from([Permission::Hunter]),
            Utc::now(),
        )
    }

    #[test]
    fn public_projection_has_no_password_hash() {
        let json = serde_json::to_value(record().to_public()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
        assert_eq!(json["permissions"], serde_json::json!(["hunter"]));
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut user = record();
        user.apply_update(&UserUpdate {
            permissions: None,
            is_admin: Some(true),
        });
        assert!(user.is_admin);
        assert!(user.permissions.contains(Permission::Hunter));

        user.apply_update(&UserUpdate {
            permissions: Some(PermissionSet::from([Permission::Map])),
            is_admin: None,
        });
        assert!(user.is_admin);
        assert!(!user.permissions.contains(Permission::Hunter));
        assert!(user.permissions.contains(Permission::Map));
    }

    #[test]
    fn registration_never_grants_flags() {
        let reg: Registration = serde_json::from_value(serde_json::json!({
            "username": "mallory",
            "password": "pw",
            "is_admin": true,
            "permissions": ["hunter"],
        }))
        .unwrap();
        let user = NewUser::from(reg);
        assert!(!user.is_admin);
        assert!(user.permissions.is_empty());
    }

    #[test]
    fn blank_username_is_rejected() {
        let user = NewUser {
            username: "   ".into(),
            password: "pw".into(),
            is_admin: false,
            permissions: PermissionSet::new(),
        };
        assert!(matches!(user.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn stored_record_defaults_missing_flags() {
        let json = serde_json::json!({
            "id": UserId::new(),
            "username": "legacy",
            "password_hash": "x",
            "created_at": "2026-01-01T00:00:00Z",
        });
        let user: UserRecord = serde_json::from_value(json).unwrap();
        assert!(!user.is_admin);
        assert!(user.permissions.is_empty());
    }
}
