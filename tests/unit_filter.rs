// Filter expression tests — parsing, canonical form, and evaluation against
// hand-built feed items. Pure functions only.

use amplifier::feed::{FeedItem, MediaKind};
use amplifier::filter::{evaluate, parse, parse_expr, AtomKind, ParseError, PredicateNode};
use amplifier::target::TargetSet;

fn atom(kind: AtomKind) -> PredicateNode {
    PredicateNode::Atom(kind)
}

fn photo_item() -> FeedItem {
    FeedItem {
        id: 1,
        media: Some(vec![MediaKind::Photo]),
        ..FeedItem::default()
    }
}

fn repost_item() -> FeedItem {
    FeedItem {
        id: 2,
        reposted_id: Some(99),
        ..FeedItem::default()
    }
}

fn quote_item() -> FeedItem {
    FeedItem {
        id: 3,
        quoted_id: Some(42),
        ..FeedItem::default()
    }
}

// ============================================================
// Parsing
// ============================================================

#[test]
fn two_entry_list_parses_to_expected_trees() {
    let list = parse("and(rt,not(photo))/qt").unwrap();
    assert_eq!(
        list.entries(),
        &[
            PredicateNode::And(vec![
                atom(AtomKind::IsRepost),
                PredicateNode::Not(Box::new(atom(AtomKind::HasPhoto))),
            ]),
            atom(AtomKind::IsQuote),
        ]
    );
}

#[test]
fn canonical_text_reparses_to_the_same_tree() {
    for text in [
        "and(rt,not(photo))/qt",
        "or(and(photo,video),not(or(rt,qt)))",
        "not(not(not(all)))",
        "photo/video/rt/qt",
    ] {
        let list = parse(text).unwrap();
        let reparsed = parse(&list.to_string()).unwrap();
        assert_eq!(list, reparsed, "round trip of {text}");
        assert_eq!(list.to_string(), text);
    }
}

#[test]
fn unbalanced_and_empty_args_are_distinct_errors() {
    let unbalanced = parse("not(rt").unwrap_err();
    let empty = parse("and()").unwrap_err();

    assert!(matches!(unbalanced, ParseError::Unbalanced { .. }));
    assert!(matches!(empty, ParseError::EmptyArgs { .. }));
    assert_ne!(unbalanced, empty);
}

#[test]
fn unknown_atoms_are_rejected() {
    assert!(matches!(
        parse("photo/gif"),
        Err(ParseError::UnknownAtom { ref token }) if token == "gif"
    ));
    // Atoms are case-sensitive.
    assert!(matches!(parse_expr("Photo"), Err(ParseError::UnknownAtom { .. })));
}

#[test]
fn separators_inside_parentheses_do_not_split() {
    let list = parse("or(photo,and(video,qt))/rt").unwrap();
    assert_eq!(list.len(), 2);

    let or = &list.entries()[0];
    assert!(matches!(or, PredicateNode::Or(args) if args.len() == 2));
}

#[test]
fn deep_nesting_parses() {
    let depth = 64;
    let text = format!("{}photo{}", "not(".repeat(depth), ")".repeat(depth));
    let node = parse_expr(&text).unwrap();

    // Even number of negations cancels out.
    assert!(evaluate(&node, &photo_item()));
}

// ============================================================
// Evaluation
// ============================================================

#[test]
fn empty_combinators_never_match() {
    for item in [photo_item(), repost_item(), quote_item(), FeedItem::default()] {
        assert!(!evaluate(&PredicateNode::And(vec![]), &item));
        assert!(!evaluate(&PredicateNode::Or(vec![]), &item));
    }
}

#[test]
fn list_matches_when_any_entry_matches() {
    let list = parse("and(rt,not(photo))/qt").unwrap();

    assert!(list.matches(&repost_item()));
    assert!(list.matches(&quote_item()));
    assert!(!list.matches(&photo_item()));

    let photo_repost = FeedItem {
        reposted_id: Some(7),
        ..photo_item()
    };
    assert!(!list.matches(&photo_repost));
}

#[test]
fn zero_quote_id_is_not_a_quote() {
    let item = FeedItem {
        quoted_id: Some(0),
        ..FeedItem::default()
    };
    assert!(!parse("qt").unwrap().matches(&item));
}

#[test]
fn empty_extended_media_hides_plain_media() {
    let item = FeedItem {
        media: Some(vec![MediaKind::Photo]),
        extended_media: Some(vec![]),
        ..FeedItem::default()
    };
    assert!(!parse("photo").unwrap().matches(&item));
    assert!(parse("all").unwrap().matches(&item));
}

// ============================================================
// Target values
// ============================================================

#[test]
fn target_values_for_one_account_are_merged() {
    let set = TargetSet::from_values(&["news:photo", "other:rt", "news:qt/video"]).unwrap();
    let targets = set.targets();

    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].account, "news");
    assert_eq!(targets[0].filters.to_string(), "photo/qt/video");
    assert_eq!(targets[1].account, "other");
}

