//! Notification inbox.

pub mod service;

pub use service::NotificationService;
