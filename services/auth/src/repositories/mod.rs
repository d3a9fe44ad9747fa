//! User persistence

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AuthResult,
    models::{NewUser, User},
};

#[cfg(test)]
pub mod memory;
pub mod user;

pub use user::UserRepository;

/// User persistence port
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Store a new user; a taken username or email is
    /// [`crate::error::AuthError::AlreadyRegistered`]
    async fn create(&self, new_user: &NewUser) -> AuthResult<User>;

    async fn find_by_username_or_email(&self, username_or_email: &str) -> AuthResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    async fn ping(&self) -> bool;
}
