//! threadline/crates/domains/src/lib.rs
//!
//! The central domain types and port definitions for threadline.
//! Nothing in this crate performs I/O; adapters implement the ports.

pub mod clock;
pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use errors::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_comment_creation_v7() {
        let author = Uuid::now_v7();
        let comment = Comment::new("Hello Rust!", author, None, Utc::now());
        assert_eq!(comment.author_id, author);
        assert_eq!(comment.created_at, comment.updated_at);
        assert!(!comment.is_deleted());
        assert!(comment.is_root());
    }
}
