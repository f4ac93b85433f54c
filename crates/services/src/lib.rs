//! # services
//!
//! Application services for threadline. Each service orchestrates the
//! domain ports; none of them knows which adapter sits behind a port.

pub mod auth;
pub mod comment;
pub mod notification;

pub use auth::AuthService;
pub use comment::{CommentService, CommentSettings, LifecyclePolicy};
pub use notification::NotificationService;
