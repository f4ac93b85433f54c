//! # AuthService
//!
//! Username/password accounts and bearer tokens. Hashing and token signing
//! stay behind ports; this service only decides what is allowed.

use domains::{
    AuthSession, Clock, Credentials, DomainError, Identity, PasswordHasher, PublicUser,
    RegisterUser, Result, TokenIssuer, User, UserRepository,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;
const PASSWORD_MIN: usize = 8;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
        }
    }

    #[tracing::instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterUser) -> Result<AuthSession> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;
        if input.password.chars().count() < PASSWORD_MIN {
            return Err(DomainError::validation(format!(
                "password must be at least {PASSWORD_MIN} characters"
            )));
        }

        if self.users.find_by_username(&input.username).await?.is_some() {
            return Err(DomainError::conflict("username is already taken"));
        }
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(DomainError::conflict("email is already registered"));
        }

        let user = User {
            id: Uuid::now_v7(),
            username: input.username,
            email: input.email,
            password_hash: self.hasher.hash(&input.password)?,
            created_at: self.clock.now(),
        };
        // The store enforces uniqueness too; a concurrent duplicate surfaces as Conflict.
        let user = self.users.insert(user).await?;
        info!(user_id = %user.id, "user registered");

        self.session_for(&user)
    }

    pub async fn login(&self, credentials: Credentials) -> Result<AuthSession> {
        let user = self.users.find_by_username(&credentials.username).await?;
        match user {
            Some(user) if self.hasher.verify(&credentials.password, &user.password_hash) => {
                self.session_for(&user)
            }
            _ => {
                warn!(username = %credentials.username, "rejected login");
                Err(DomainError::unauthorized("invalid credentials"))
            }
        }
    }

    /// Resolves a bearer token to the caller, rejecting tokens whose subject
    /// no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Identity> {
        let identity = self.tokens.verify(token)?;
        match self.users.find_by_id(identity.user_id).await? {
            Some(user) => Ok(Identity {
                user_id: user.id,
                username: user.username,
            }),
            None => Err(DomainError::unauthorized("unknown user")),
        }
    }

    pub async fn profile(&self, identity: &Identity) -> Result<PublicUser> {
        self.users
            .find_by_id(identity.user_id)
            .await?
            .map(|user| PublicUser::from(&user))
            .ok_or_else(|| DomainError::not_found("user", identity.user_id))
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        let access_token = self.tokens.issue(&Identity {
            user_id: user.id,
            username: user.username.clone(),
        })?;
        Ok(AuthSession {
            access_token,
            user: PublicUser::from(user),
        })
    }
}

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    let charset_ok = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) || !charset_ok {
        return Err(DomainError::validation(format!(
            "username must be {USERNAME_MIN}-{USERNAME_MAX} letters, digits or underscores"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::validation("email address is not valid")),
    }
}
