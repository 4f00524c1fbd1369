//! `outpost-auth`: authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: user records, permission tags, bearer
//! tokens, password hashing and the permission/admin checks live here.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod token;
pub mod user;

pub use authorize::{Access, AuthzError, CurrentUser, authorize, require_admin, require_permission};
pub use claims::{JwtClaims, TokenError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::{Permission, PermissionSet};
pub use token::TokenService;
pub use user::{NewUser, PasswordChange, PublicUser, Registration, UserRecord, UserUpdate};
