//! In-memory user store for the handler tests

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use super::UserStore;
use crate::{
    error::{AuthError, AuthResult},
    models::{NewUser, User},
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    fn users(&self) -> AuthResult<std::sync::MutexGuard<'_, Vec<User>>> {
        self.users.lock().map_err(|_| AuthError::InternalServerError)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: &NewUser) -> AuthResult<User> {
        let mut users = self.users()?;
        if users
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(AuthError::AlreadyRegistered);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username_or_email(&self, username_or_email: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users()?
            .iter()
            .find(|u| u.username == username_or_email || u.email == username_or_email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        Ok(self.users()?.iter().find(|u| u.id == id).cloned())
    }

    async fn ping(&self) -> bool {
        true
    }
}
