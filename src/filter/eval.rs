// Predicate evaluation — one recursive walk over the closed node enum.

use crate::feed::FeedItem;

use super::ast::{AtomKind, PredicateNode};

/// Evaluate a predicate tree against one item. Pure; O(size of tree).
pub fn evaluate(node: &PredicateNode, item: &FeedItem) -> bool {
    match node {
        PredicateNode::Atom(kind) => evaluate_atom(*kind, item),
        PredicateNode::Not(inner) => !evaluate(inner, item),
        // An empty conjunction is deliberately false, not vacuously true.
        PredicateNode::And(children) => {
            !children.is_empty() && children.iter().all(|c| evaluate(c, item))
        }
        PredicateNode::Or(children) => children.iter().any(|c| evaluate(c, item)),
    }
}

fn evaluate_atom(kind: AtomKind, item: &FeedItem) -> bool {
    match kind {
        AtomKind::HasPhoto => item.has_photo(),
        AtomKind::HasVideo => item.has_video(),
        AtomKind::IsRepost => item.is_repost(),
        AtomKind::IsQuote => item.is_quote(),
        AtomKind::MatchAll => true,
    }
}
