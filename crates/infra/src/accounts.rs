//! Account service: registration, login, password changes and admin user
//! management over a [`UserStore`].
//!
//! Argon2 work runs on tokio's blocking pool.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use outpost_auth::{
    CurrentUser, NewUser, PasswordChange, PasswordError, Permission, PermissionSet, PublicUser,
    UserRecord, UserUpdate, hash_password, verify_password,
};
use outpost_core::{DomainError, UserId};

use crate::config::AdminBootstrap;
use crate::store::{LIST_LIMIT, ListOrder, StoreError, UserStore};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username already exists")]
    UsernameTaken,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("incorrect old password")]
    IncorrectPassword,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("blocking task failed: {0}")]
    Task(String),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => Self::Domain(e),
            other => Self::Store(other),
        }
    }
}

#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserStore>,
}

impl Accounts {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username), err)]
    pub async fn register(&self, new_user: NewUser) -> Result<PublicUser, AccountError> {
        new_user.validate()?;
        let password_hash = hash(new_user.password).await?;
        let record = UserRecord::new(
            new_user.username,
            password_hash,
            new_user.is_admin,
            new_user.permissions,
            Utc::now(),
        );

        match self.users.insert(record).await {
            Ok(user) => {
                info!(user_id = %user.id, is_admin = user.is_admin, "user registered");
                Ok(user.to_public())
            }
            Err(StoreError::Conflict(_)) => Err(AccountError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials. Unknown user and wrong password are
    /// indistinguishable to the caller.
    #[instrument(skip(self, password), err(level = "warn"))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, AccountError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Err(AccountError::InvalidCredentials);
        };
        if !verify(password.to_string(), user.password_hash.clone()).await? {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(user)
    }

    #[instrument(skip(self, change), err)]
    pub async fn change_password(
        &self,
        user_id: UserId,
        change: PasswordChange,
    ) -> Result<(), AccountError> {
        change.validate()?;
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(AccountError::Store(StoreError::NotFound("user")))?;
        if !verify(change.old_password, user.password_hash).await? {
            return Err(AccountError::IncorrectPassword);
        }

        let password_hash = hash(change.new_password).await?;
        self.users
            .update(
                user_id,
                Box::new(move |u: &mut UserRecord| {
                    u.password_hash = password_hash;
                    Ok(())
                }),
            )
            .await?;
        info!(%user_id, "password changed");
        Ok(())
    }

    /// Fresh read of the caller's record; `None` if the account is gone.
    pub async fn current_user(&self, user_id: UserId) -> Result<Option<CurrentUser>, AccountError> {
        Ok(self
            .users
            .get(user_id)
            .await?
            .map(|u| CurrentUser::from(&u)))
    }

    pub async fn get(&self, user_id: UserId) -> Result<Option<PublicUser>, AccountError> {
        Ok(self.users.get(user_id).await?.map(|u| u.to_public()))
    }

    pub async fn list(&self) -> Result<Vec<PublicUser>, AccountError> {
        let users = self.users.list(ListOrder::Oldest, LIST_LIMIT).await?;
        Ok(users.iter().map(UserRecord::to_public).collect())
    }

    #[instrument(skip(self, update), err)]
    pub async fn update(
        &self,
        user_id: UserId,
        update: UserUpdate,
    ) -> Result<PublicUser, AccountError> {
        let user = self
            .users
            .update(
                user_id,
                Box::new(move |u: &mut UserRecord| {
                    u.apply_update(&update);
                    Ok(())
                }),
            )
            .await?;
        info!(%user_id, is_admin = user.is_admin, "user updated");
        Ok(user.to_public())
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, user_id: UserId) -> Result<bool, AccountError> {
        let removed = self.users.delete(user_id).await?;
        if removed {
            info!(%user_id, "user deleted");
        }
        Ok(removed)
    }

    /// Create the configured admin unless the username already exists.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> Result<bool, AccountError> {
        if self.users.find_by_username(&admin.username).await?.is_some() {
            return Ok(false);
        }
        let new_user = NewUser {
            username: admin.username.clone(),
            password: admin.password.clone(),
            is_admin: true,
            permissions: PermissionSet::from(Permission::ALL),
        };
        match self.register(new_user).await {
            Ok(_) => Ok(true),
            // Another instance seeded it first.
            Err(AccountError::UsernameTaken) => {
                warn!(username = %admin.username, "bootstrap admin already exists");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

async fn hash(password: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountError::Task(e.to_string()))?
        .map_err(AccountError::from)
}

async fn verify(password: String, stored_hash: String) -> Result<bool, AccountError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AccountError::Task(e.to_string()))?
        .map_err(AccountError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCollection;

    fn accounts() -> Accounts {
        Accounts::new(Arc::new(InMemoryCollection::<UserRecord>::new()))
    }

    fn registration(name: &str, password: &str) -> NewUser {
        NewUser {
            username: name.into(),
            password: password.into(),
            is_admin: false,
            permissions: PermissionSet::new(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let accounts = accounts();
        let public = accounts.register(registration("alice", "pw")).await.unwrap();
        assert_eq!(public.username, "alice");
        assert!(!public.is_admin);

        let user = accounts.authenticate("alice", "pw").await.unwrap();
        assert_eq!(user.id, public.id);
        assert_ne!(user.password_hash, "pw");
    }

    #[tokio::test]
    async fn second_registration_of_same_name_is_rejected() {
        let accounts = accounts();
        accounts.register(registration("alice", "pw")).await.unwrap();
        let err = accounts.register(registration("alice", "other")).await.unwrap_err();
        assert!(matches!(err, AccountError::UsernameTaken));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let accounts = accounts();
        accounts.register(registration("alice", "pw")).await.unwrap();

        let wrong = accounts.authenticate("alice", "nope").await.unwrap_err();
        let unknown = accounts.authenticate("mallory", "pw").await.unwrap_err();
        assert!(matches!(wrong, AccountError::InvalidCredentials));
        assert!(matches!(unknown, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn change_password_checks_the_old_one() {
        let accounts = accounts();
        let alice = accounts.register(registration("alice", "old")).await.unwrap();

        let err = accounts
            .change_password(
                alice.id,
                PasswordChange {
                    old_password: "wrong".into(),
                    new_password: "new".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::IncorrectPassword));

        accounts
            .change_password(
                alice.id,
                PasswordChange {
                    old_password: "old".into(),
                    new_password: "new".into(),
                },
            )
            .await
            .unwrap();
        assert!(accounts.authenticate("alice", "new").await.is_ok());
        assert!(accounts.authenticate("alice", "old").await.is_err());
    }

    #[tokio::test]
    async fn revoked_permission_shows_up_on_next_read() {
        let accounts = accounts();
        let mut new_user = registration("bob", "pw");
        new_user.permissions = PermissionSet::from([Permission::Hunter]);
        let bob = accounts.register(new_user).await.unwrap();

        accounts
            .update(
                bob.id,
                UserUpdate {
                    permissions: Some(PermissionSet::new()),
                    is_admin: None,
                },
            )
            .await
            .unwrap();

        let current = accounts.current_user(bob.id).await.unwrap().unwrap();
        assert!(current.permissions.is_empty());
    }

    #[tokio::test]
    async fn bootstrap_admin_is_created_once() {
        let accounts = accounts();
        let admin = AdminBootstrap {
            username: "root".into(),
            password: "pw".into(),
        };
        assert!(accounts.ensure_admin(&admin).await.unwrap());
        assert!(!accounts.ensure_admin(&admin).await.unwrap());

        let root = accounts.authenticate("root", "pw").await.unwrap();
        assert!(root.is_admin);
        assert!(root.permissions.contains(Permission::Zug));
        assert_eq!(accounts.list().await.unwrap().len(), 1);
    }
}
