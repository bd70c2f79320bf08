use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::auth::repo::{StoreError, UserStore};
use crate::auth::repo_types::{NewUser, User};
use crate::object_id::ObjectId;

#[derive(Default)]
struct Tables {
    users: HashMap<ObjectId, User>,
    by_email: HashMap<String, ObjectId>,
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.by_email.get(email).and_then(|id| t.users.get(id)).cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        // Check and insert under one write guard.
        let mut t = self.tables.write().await;
        if t.by_email.contains_key(&new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = OffsetDateTime::now_utc();
        let NewUser {
            email,
            password_hash,
            profile,
        } = new_user;
        let user = User {
            id: ObjectId::generate(),
            email,
            password_hash,
            first_name: profile.first_name,
            last_name: profile.last_name,
            headline: profile.headline,
            bio: profile.bio,
            location: profile.location,
            profile_pic: profile.profile_pic,
            created_at: now,
            updated_at: now,
        };

        t.by_email.insert(user.email.clone(), user.id.clone());
        t.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}
