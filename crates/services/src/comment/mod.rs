//! Comment lifecycle: window policy, reply-tree assembly and the
//! orchestrating service.

pub mod policy;
pub mod service;
pub mod tree;

pub use policy::LifecyclePolicy;
pub use service::{CommentService, CommentSettings};
