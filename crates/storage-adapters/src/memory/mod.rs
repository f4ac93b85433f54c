//! Process-local adapters backed by `dashmap`. Used by the test suites and as
//! the fallback when no backing service is configured.

mod cache;
mod comments;
mod notifications;
mod users;

pub use cache::InMemoryCommentCache;
pub use comments::InMemoryCommentRepository;
pub use notifications::InMemoryNotificationRepository;
pub use users::InMemoryUserRepository;
