//! Loads demo accounts and a short discussion into Postgres.
//!
//! Safe to run repeatedly: existing users are reused and the thread is only
//! written when the database holds no comments yet.

use anyhow::Context;
use auth_adapters::Argon2Hasher;
use chrono::{Duration, Utc};
use configs::Settings;
use domains::{Comment, CommentRepository, PasswordHasher, User, UserRepository};
use secrecy::ExposeSecret;
use storage_adapters::postgres::{connect, PgCommentRepository, PgUserRepository};
use tracing::info;
use uuid::Uuid;

const DEMO_PASSWORD: &str = "password123";
const DEMO_USERS: [&str; 3] = ["alice", "bob", "carol"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = Settings::load()?;
    let url = settings
        .database
        .url
        .as_ref()
        .context("database.url must be set to seed")?;
    let pool = connect(url.expose_secret(), settings.database.max_connections).await?;
    let users = PgUserRepository::new(pool.clone());
    let comments = PgCommentRepository::new(pool);
    let hasher = Argon2Hasher::new();

    let mut ids = Vec::with_capacity(DEMO_USERS.len());
    for name in DEMO_USERS {
        let user = match users.find_by_username(name).await? {
            Some(existing) => existing,
            None => {
                users
                    .insert(User {
                        id: Uuid::now_v7(),
                        username: name.to_string(),
                        email: format!("{name}@example.com"),
                        password_hash: hasher.hash(DEMO_PASSWORD)?,
                        created_at: Utc::now(),
                    })
                    .await?
            }
        };
        info!(username = name, id = %user.id, "demo user ready");
        ids.push(user.id);
    }

    if !comments.find_active().await?.is_empty() {
        info!("comments already present; leaving them alone");
        return Ok(());
    }

    // Backdated so the fixtures show both editable and locked comments.
    let start = Utc::now() - Duration::hours(1);
    let root = comments
        .insert(Comment::new(
            "Welcome to threadline! Replies nest as deep as you like.",
            ids[0],
            None,
            start,
        ))
        .await?;
    let reply = comments
        .insert(Comment::new(
            "Nice. Can I still edit this later?",
            ids[1],
            Some(root.id),
            start + Duration::minutes(5),
        ))
        .await?;
    comments
        .insert(Comment::new(
            "For fifteen minutes after posting, yes.",
            ids[0],
            Some(reply.id),
            start + Duration::minutes(7),
        ))
        .await?;
    comments
        .insert(Comment::new(
            "Fresh comment, still inside its edit window.",
            ids[2],
            None,
            Utc::now(),
        ))
        .await?;

    info!("seeded 4 comments");
    Ok(())
}
