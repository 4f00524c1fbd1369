use outpost_auth::CurrentUser;
use outpost_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware from a fresh user read; handlers never
/// see a request without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user: CurrentUser,
}

impl UserContext {
    pub fn new(user: CurrentUser) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }
}
