//! Account registration, login and token resolution.

pub mod service;

pub use service::AuthService;
