//! User directory
//!
//! Small fixed set of users held in memory.

use std::collections::HashMap;

use crate::data::User;
use crate::error::AppError;

/// In-memory user lookup
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: HashMap<i64, User>,
}

impl UserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|user| (user.id, user)).collect(),
        }
    }

    /// Directory seeded with the two default users
    pub fn seeded() -> Self {
        Self::new([
            User {
                id: 1,
                name: "John Doe".to_string(),
                email: "john.doe@gmail.com".to_string(),
            },
            User {
                id: 2,
                name: "John Doe 2".to_string(),
                email: "john.doe+2@gmail.com".to_string(),
            },
        ])
    }

    /// Look up a user by id
    pub fn get(&self, id: i64) -> Result<User, AppError> {
        self.users
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::seeded()
    }
}
