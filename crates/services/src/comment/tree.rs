//! # Tree Builder
//!
//! Turns the flat, time-ordered comment list into a forest of roots with
//! nested replies. Rows live in an arena indexed by position; parent links
//! are resolved once through an id map, and the nested output is assembled
//! bottom-up without recursion so reply depth is never a stack concern.

use chrono::{DateTime, Utc};
use domains::{Comment, CommentNode};
use std::collections::HashMap;
use uuid::Uuid;

use super::policy::LifecyclePolicy;

/// Builds the reply forest.
///
/// Roots keep their input order, and so do the replies under each parent.
/// A reply whose parent is not part of `comments` is dropped.
pub fn build_forest(comments: Vec<Comment>) -> Vec<CommentNode> {
    let n = comments.len();
    let index: HashMap<Uuid, usize> = comments
        .iter()
        .enumerate()
        .map(|(slot, c)| (c.id, slot))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots = Vec::new();

    for (slot, comment) in comments.iter().enumerate() {
        match comment.parent_id {
            None => roots.push(slot),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent) if parent != slot => children[parent].push(slot),
                _ => tracing::debug!(
                    comment_id = %comment.id,
                    parent_id = %parent_id,
                    "dropping reply whose parent is not in the fetched set"
                ),
            },
        }
    }

    // Pre-order walk from the roots: every parent precedes its replies.
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(slot) = stack.pop() {
        order.push(slot);
        stack.extend(children[slot].iter().rev().copied());
    }

    // Walking that order backwards finishes every reply before its parent.
    let mut rows: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = (0..n).map(|_| None).collect();
    for &slot in order.iter().rev() {
        let replies = children[slot]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        if let Some(comment) = rows[slot].take() {
            built[slot] = Some(CommentNode::new(comment, replies));
        }
    }

    roots
        .into_iter()
        .filter_map(|slot| built[slot].take())
        .collect()
}

/// Recomputes the per-node window flags for `now`.
pub fn annotate(forest: &mut [CommentNode], policy: &LifecyclePolicy, now: DateTime<Utc>) {
    let mut stack: Vec<&mut CommentNode> = forest.iter_mut().collect();
    while let Some(node) = stack.pop() {
        node.is_deleted = node.comment.is_deleted();
        node.can_edit = policy.can_edit(&node.comment, now);
        node.can_restore = policy.can_restore(&node.comment, now);
        stack.extend(node.replies.iter_mut());
    }
}

/// Number of comments in the forest, replies included.
pub fn count(forest: &[CommentNode]) -> usize {
    let mut total = 0;
    let mut stack: Vec<&CommentNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        total += 1;
        stack.extend(node.replies.iter());
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn comment(parent: Option<&Comment>, minutes: i64) -> Comment {
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        Comment::new(
            format!("at {minutes}"),
            Uuid::now_v7(),
            parent.map(|p| p.id),
            base + Duration::minutes(minutes),
        )
    }

    #[test]
    fn test_nests_replies_under_parents() {
        let r1 = comment(None, 0);
        let r2 = comment(None, 1);
        let a = comment(Some(&r1), 2);
        let b = comment(Some(&a), 3);
        // newest first, as the store returns them
        let input = vec![b.clone(), a.clone(), r2.clone(), r1.clone()];

        let forest = build_forest(input);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].comment.id, r2.id);
        assert_eq!(forest[1].comment.id, r1.id);
        assert_eq!(forest[1].replies[0].comment.id, a.id);
        assert_eq!(forest[1].replies[0].replies[0].comment.id, b.id);
        assert_eq!(count(&forest), 4);
    }

    #[test]
    fn test_sibling_order_follows_input() {
        let root = comment(None, 0);
        let first = comment(Some(&root), 1);
        let second = comment(Some(&root), 2);

        let forest = build_forest(vec![second.clone(), first.clone(), root.clone()]);
        let ids: Vec<_> = forest[0].replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_orphans_are_dropped() {
        let missing = comment(None, 0);
        let orphan = comment(Some(&missing), 1);
        let root = comment(None, 2);

        let forest = build_forest(vec![root.clone(), orphan]);
        assert_eq!(forest.len(), 1);
        assert_eq!(count(&forest), 1);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut chain = vec![comment(None, 0)];
        for i in 1..50_000 {
            let next = comment(chain.last(), i);
            chain.push(next);
        }
        let forest = build_forest(chain);
        assert_eq!(forest.len(), 1);
        assert_eq!(count(&forest), 50_000);
    }

    #[test]
    fn test_annotate_sets_window_flags() {
        let root = comment(None, 0);
        let reply = comment(Some(&root), 10);
        let mut forest = build_forest(vec![reply, root.clone()]);

        let policy = LifecyclePolicy::default();
        annotate(&mut forest, &policy, root.created_at + Duration::minutes(20));
        assert!(!forest[0].can_edit);
        assert!(forest[0].replies[0].can_edit);
        assert!(!forest[0].replies[0].can_restore);
    }
}
