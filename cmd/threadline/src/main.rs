//! # threadline binary
//!
//! Assembles the application from the adapters enabled at compile time.
//! Postgres and Redis are used when their URLs are configured; otherwise
//! the in-memory adapters stand in.

#[cfg(not(feature = "auth-jwt"))]
compile_error!("threadline needs the `auth-jwt` feature to issue bearer tokens");

#[cfg(not(feature = "web-axum"))]
compile_error!("threadline needs the `web-axum` feature to serve HTTP");

use anyhow::Context;
use api_adapters::{router, ApiMetrics, AppState};
use auth_adapters::{Argon2Hasher, JwtIssuer};
use configs::{LogFormat, LogSettings, Settings};
use domains::{
    Clock, CommentCache, CommentRepository, NotificationRepository, SystemClock, UserRepository,
};
use secrecy::ExposeSecret;
use services::{AuthService, CommentService, LifecyclePolicy, NotificationService};
use std::sync::Arc;
use std::time::Duration;
use storage_adapters::{
    InMemoryCommentCache, InMemoryCommentRepository, InMemoryNotificationRepository,
    InMemoryUserRepository, QueuedDispatcher,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

struct Stores {
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.log);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stores = open_stores(&settings).await?;
    let cache = open_cache(&settings)?;

    let (dispatcher, worker) = QueuedDispatcher::spawn(
        stores.notifications.clone(),
        clock.clone(),
        settings.notifications.queue_capacity,
    );

    let comments = CommentService::new(stores.comments, cache, Arc::new(dispatcher), clock.clone())
        .with_policy(LifecyclePolicy {
            edit_window: chrono::Duration::seconds(settings.comments.edit_window_secs),
            restore_window: chrono::Duration::seconds(settings.comments.restore_window_secs),
            max_content_chars: settings.comments.max_content_chars,
        })
        .with_settings(services::CommentSettings {
            cache_key: settings.comments.cache_key.clone(),
            cache_ttl: Duration::from_secs(settings.comments.cache_ttl_secs),
        });

    let secret = settings
        .auth
        .jwt_secret
        .as_ref()
        .context("auth.jwt_secret is required")?;
    let tokens = JwtIssuer::new(
        secret.expose_secret().as_bytes(),
        chrono::Duration::seconds(settings.auth.token_ttl_secs),
    );
    let auth = AuthService::new(stores.users, Arc::new(Argon2Hasher::new()), Arc::new(tokens), clock);

    let state = AppState {
        comments: Arc::new(comments),
        notifications: Arc::new(NotificationService::new(stores.notifications)),
        auth: Arc::new(auth),
        metrics: Arc::new(ApiMetrics::new()),
    };

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "threadline listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last dispatcher; the worker drains what is queued and exits.
    match tokio::time::timeout(Duration::from_secs(5), worker).await {
        Ok(Ok(())) => info!("notification queue drained"),
        Ok(Err(err)) => error!(error = %err, "notification worker panicked"),
        Err(_) => warn!("gave up waiting for the notification queue"),
    }
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[cfg_attr(not(feature = "db-postgres"), allow(unused_variables))]
async fn open_stores(settings: &Settings) -> anyhow::Result<Stores> {
    #[cfg(feature = "db-postgres")]
    if let Some(url) = &settings.database.url {
        use storage_adapters::postgres::{
            connect, PgCommentRepository, PgNotificationRepository, PgUserRepository,
        };
        let pool = connect(url.expose_secret(), settings.database.max_connections)
            .await
            .context("failed to open the postgres pool")?;
        return Ok(Stores {
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool)),
        });
    }

    warn!("using in-memory storage; data is lost on restart");
    let users = Arc::new(InMemoryUserRepository::new());
    Ok(Stores {
        comments: Arc::new(InMemoryCommentRepository::with_users(users.clone())),
        users,
        notifications: Arc::new(InMemoryNotificationRepository::new()),
    })
}

#[cfg_attr(not(feature = "redis"), allow(unused_variables))]
fn open_cache(settings: &Settings) -> anyhow::Result<Arc<dyn CommentCache>> {
    #[cfg(feature = "redis")]
    if let Some(url) = &settings.redis.url {
        let cache = storage_adapters::redis::RedisCommentCache::connect(
            url.expose_secret(),
            settings.redis.key_prefix.clone(),
        )
        .context("failed to create the redis pool")?;
        info!("comment cache backed by redis");
        return Ok(Arc::new(cache));
    }

    Ok(Arc::new(InMemoryCommentCache::new()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
