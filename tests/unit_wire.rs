// Wire format tests — decoding timeline JSON into feed items and mapping
// action error bodies onto the soft/hard taxonomy. No network.

use chrono::{Datelike, Timelike};

use amplifier::feed::client::{classify_action_error, parse_timestamp, WireItem};
use amplifier::feed::{ActionError, FeedItem, MediaKind};
use amplifier::filter::parse;

fn decode(json: &str) -> FeedItem {
    let wire: WireItem = serde_json::from_str(json).unwrap();
    FeedItem::from(wire)
}

#[test]
fn timeline_entry_with_extended_media() {
    let item = decode(
        r#"{
            "id": 1800000000000000001,
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "full_text": "look at this",
            "retweeted": true,
            "entities": {"media": [{"type": "photo"}]},
            "extended_entities": {"media": [{"type": "photo"}, {"type": "video"}]}
        }"#,
    );

    assert_eq!(item.id, 1_800_000_000_000_000_001);
    assert_eq!(item.text, "look at this");
    assert!(item.amplified_by_us);
    assert_eq!(
        item.effective_media(),
        &[MediaKind::Photo, MediaKind::Video]
    );
    assert!(parse("and(photo,video)").unwrap().matches(&item));

    let created = item.created_at.unwrap();
    assert_eq!((created.year(), created.month(), created.day()), (2018, 10, 10));
    assert_eq!(created.hour(), 20);
}

#[test]
fn repost_and_quote_references() {
    let item = decode(
        r#"{
            "id": 5,
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "text": "RT something",
            "retweeted_status": {"id": 4},
            "quoted_status_id": 3
        }"#,
    );

    assert_eq!(item.reposted_id, Some(4));
    assert_eq!(item.quoted_id, Some(3));
    assert!(!item.amplified_by_us);
    assert!(parse("and(rt,qt)").unwrap().matches(&item));
}

#[test]
fn empty_plain_media_is_treated_as_absent() {
    let item = decode(
        r#"{
            "id": 6,
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "text": "plain",
            "entities": {"media": []}
        }"#,
    );

    assert_eq!(item.media, None);
    assert_eq!(item.extended_media, None);
    assert!(!item.has_photo());
}

#[test]
fn timestamps_accept_api_and_rfc3339_forms() {
    let api = parse_timestamp("Wed Oct 10 20:19:24 +0000 2018").unwrap();
    let rfc = parse_timestamp("2018-10-10T20:19:24Z").unwrap();
    assert_eq!(api, rfc);
    assert!(parse_timestamp("yesterday").is_none());
}

#[test]
fn action_error_codes_map_to_soft_outcomes() {
    let already = classify_action_error(
        403,
        r#"{"errors":[{"code":327,"message":"You have already retweeted this Tweet."}]}"#,
    );
    let denied = classify_action_error(
        403,
        r#"{"errors":[{"code":328,"message":"Retweet is not permitted for this status."}]}"#,
    );

    assert!(matches!(already, ActionError::AlreadyDone));
    assert!(matches!(denied, ActionError::NotPermitted));
    assert!(already.is_soft());
    assert!(denied.is_soft());
}

#[test]
fn other_action_errors_are_hard() {
    let coded = classify_action_error(
        401,
        r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#,
    );
    match &coded {
        ActionError::Failed { status, message } => {
            assert_eq!(*status, 401);
            assert!(message.contains("code 89"));
        }
        other => panic!("unexpected: {other}"),
    }
    assert!(!coded.is_soft());

    let raw = classify_action_error(502, "<html>Bad Gateway</html>");
    assert!(matches!(raw, ActionError::Failed { status: 502, ref message } if message.contains("Bad Gateway")));
}
