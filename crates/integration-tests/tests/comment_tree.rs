//! `list_all` forest shape and its cache.

mod common;

use chrono::Duration;
use common::Harness;
use domains::{
    Clock, CommentId, CommentNode, CommentPatch, CommentRepository, NewComment, UserId,
    WriteGuard,
};
use services::comment::service::ALL_COMMENTS_KEY;
use std::collections::HashSet;

async fn post(h: &Harness, content: &str, author: UserId, parent: Option<CommentId>) -> CommentId {
    let view = h
        .comments
        .create(NewComment {
            content: content.to_string(),
            parent_id: parent,
            author_id: author,
        })
        .await
        .unwrap();
    // Distinct timestamps keep the ordering deterministic.
    h.advance(Duration::seconds(1));
    view.comment.id
}

fn contents(nodes: &[CommentNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.comment.content.as_str()).collect()
}

fn flatten(nodes: &[CommentNode]) -> HashSet<CommentId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<&CommentNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        seen.insert(node.comment.id);
        stack.extend(node.replies.iter());
    }
    seen
}

#[tokio::test]
async fn test_forest_nests_replies_under_parents() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;

    let first = post(&h, "first root", alice, None).await;
    let reply = post(&h, "reply", bob, Some(first)).await;
    post(&h, "nested", alice, Some(reply)).await;
    post(&h, "second root", bob, None).await;

    let forest = h.comments.list_all().await.unwrap();
    assert_eq!(contents(&forest), ["second root", "first root"]);

    let first_root = &forest[1];
    assert_eq!(contents(&first_root.replies), ["reply"]);
    assert_eq!(contents(&first_root.replies[0].replies), ["nested"]);
    assert!(first_root.replies[0].replies[0].replies.is_empty());
    assert_eq!(flatten(&forest).len(), 4);
}

#[tokio::test]
async fn test_deleted_comment_hides_its_subtree() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;

    let root = post(&h, "root", alice, None).await;
    let middle = post(&h, "middle", bob, Some(root)).await;
    let leaf = post(&h, "leaf", alice, Some(middle)).await;

    h.comments.delete(middle, bob).await.unwrap();

    let forest = h.comments.list_all().await.unwrap();
    let ids = flatten(&forest);
    assert!(ids.contains(&root));
    assert!(!ids.contains(&middle));
    assert!(!ids.contains(&leaf));
}

#[tokio::test]
async fn test_mutations_invalidate_the_cached_forest() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let keep = post(&h, "keep", alice, None).await;
    let gone = post(&h, "gone", alice, None).await;

    assert_eq!(h.comments.list_all().await.unwrap().len(), 2);
    assert!(h.cache.contains(ALL_COMMENTS_KEY));

    h.comments.delete(gone, alice).await.unwrap();
    assert!(!h.cache.contains(ALL_COMMENTS_KEY));

    let forest = h.comments.list_all().await.unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].comment.id, keep);

    h.comments.restore(gone, alice).await.unwrap();
    assert_eq!(h.comments.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_cached_forest_flags_follow_the_clock() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    post(&h, "ticking", alice, None).await;

    let fresh = h.comments.list_all().await.unwrap();
    assert!(fresh[0].can_edit);

    h.advance(Duration::minutes(16));
    assert!(h.cache.contains(ALL_COMMENTS_KEY));
    let stale = h.comments.list_all().await.unwrap();
    assert!(!stale[0].can_edit);
}

#[tokio::test]
async fn test_deep_thread_is_served_from_cache() {
    let h = Harness::new();
    let alice = h.user("alice").await;

    let mut parent = None;
    let mut deepest = None;
    for depth in 0..100 {
        let id = post(&h, &format!("depth {depth}"), alice, parent).await;
        parent = Some(id);
        deepest = Some(id);
    }
    assert_eq!(flatten(&h.comments.list_all().await.unwrap()).len(), 100);
    assert!(h.cache.contains(ALL_COMMENTS_KEY));

    // Written straight to the store, so only a fresh fetch would notice.
    let leaf = h.store.find_by_id(deepest.unwrap()).await.unwrap().unwrap();
    h.store
        .apply(
            leaf.id,
            WriteGuard::observed(&leaf),
            CommentPatch::SoftDelete { at: h.clock.now() },
        )
        .await
        .unwrap();

    let forest = h.comments.list_all().await.unwrap();
    assert_eq!(flatten(&forest).len(), 100);
    assert!(h.cache.contains(ALL_COMMENTS_KEY));
}

#[tokio::test]
async fn test_restoring_a_parent_does_not_restore_replies() {
    let h = Harness::new();
    let alice = h.user("alice").await;

    let parent = post(&h, "parent", alice, None).await;
    let child = post(&h, "child", alice, Some(parent)).await;
    h.comments.delete(child, alice).await.unwrap();
    h.comments.delete(parent, alice).await.unwrap();

    h.comments.restore(parent, alice).await.unwrap();

    let forest = h.comments.list_all().await.unwrap();
    assert_eq!(contents(&forest), ["parent"]);
    assert!(forest[0].replies.is_empty());
    assert!(h.comments.get_by_id(child).await.unwrap().is_deleted);
}
