//! # storage-adapters
//!
//! Implementations of the persistence, cache and notification ports.
//! The in-memory adapters are always compiled; PostgreSQL and Redis are
//! behind the `db-postgres` and `redis` features.

pub mod memory;
pub mod notify;

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

pub use memory::{
    InMemoryCommentCache, InMemoryCommentRepository, InMemoryNotificationRepository,
    InMemoryUserRepository,
};
pub use notify::QueuedDispatcher;
