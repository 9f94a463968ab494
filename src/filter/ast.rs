use std::fmt;

use crate::feed::FeedItem;

/// Leaf predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    HasPhoto,
    HasVideo,
    IsRepost,
    IsQuote,
    /// Matches every item.
    MatchAll,
}

impl AtomKind {
    /// The token this atom is written as.
    pub fn token(self) -> &'static str {
        match self {
            AtomKind::HasPhoto => "photo",
            AtomKind::HasVideo => "video",
            AtomKind::IsRepost => "rt",
            AtomKind::IsQuote => "qt",
            AtomKind::MatchAll => "all",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "photo" => Some(AtomKind::HasPhoto),
            "video" => Some(AtomKind::HasVideo),
            "rt" => Some(AtomKind::IsRepost),
            "qt" => Some(AtomKind::IsQuote),
            "all" => Some(AtomKind::MatchAll),
            _ => None,
        }
    }
}

/// A node of a filter expression tree.
///
/// `And` and `Or` with no children never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateNode {
    Atom(AtomKind),
    Not(Box<PredicateNode>),
    And(Vec<PredicateNode>),
    Or(Vec<PredicateNode>),
}

impl PredicateNode {
    pub fn negate(inner: PredicateNode) -> Self {
        PredicateNode::Not(Box::new(inner))
    }

    /// Whether this tree selects the item.
    pub fn matches(&self, item: &FeedItem) -> bool {
        super::eval::evaluate(self, item)
    }
}

impl From<AtomKind> for PredicateNode {
    fn from(kind: AtomKind) -> Self {
        PredicateNode::Atom(kind)
    }
}

/// Canonical text form; parsing it back yields an equal tree.
impl fmt::Display for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateNode::Atom(kind) => f.write_str(kind.token()),
            PredicateNode::Not(inner) => write!(f, "not({inner})"),
            PredicateNode::And(children) => write_call(f, "and", children),
            PredicateNode::Or(children) => write_call(f, "or", children),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, children: &[PredicateNode]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

/// Independently rooted trees combined with OR: an item is selected when any
/// entry matches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterList {
    entries: Vec<PredicateNode>,
}

impl FilterList {
    pub fn new(entries: Vec<PredicateNode>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PredicateNode] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append another list's entries, keeping order.
    pub fn extend(&mut self, other: FilterList) {
        self.entries.extend(other.entries);
    }

    pub fn matches(&self, item: &FeedItem) -> bool {
        self.entries.iter().any(|entry| entry.matches(item))
    }
}

impl fmt::Display for FilterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
