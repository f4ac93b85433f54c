use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{DomainError, Result, User, UserId, UserRepository};

/// Accounts keyed by id, with unique indexes on username and email.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<UserId, User>,
    by_username: DashMap<String, UserId>,
    by_email: DashMap<String, UserId>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username_of(&self, id: UserId) -> Option<String> {
        self.users.get(&id).map(|u| u.username.clone())
    }
}

fn email_key(email: &str) -> String {
    email.to_ascii_lowercase()
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> Result<User> {
        // Claim the username first, then the email; back out on a clash.
        match self.by_username.entry(user.username.clone()) {
            Entry::Occupied(_) => return Err(DomainError::conflict("username is already taken")),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        match self.by_email.entry(email_key(&user.email)) {
            Entry::Occupied(_) => {
                self.by_username.remove(&user.username);
                return Err(DomainError::conflict("email is already registered"));
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let id = self.by_username.get(username).map(|id| *id.value());
        match id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let id = self.by_email.get(&email_key(email)).map(|id| *id.value());
        match id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }
}
