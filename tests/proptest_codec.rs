//! Property-based tests for the record codec and stream windows
//!
//! These verify that scalar fields survive an encode/decode cycle and that a
//! window never yields more items than it spans.

use std::collections::BTreeMap;

use proptest::prelude::*;
use social_client::{codec, Activity, Comment, Identity, Window};

proptest! {
    /// Text fields come back unchanged
    #[test]
    fn text_field_round_trips(title in ".*", body in "\\PC*") {
        let mut activity = Activity::new();
        activity.set_title(title.clone());
        activity.set_body(body.clone());

        let decoded: Activity = codec::decode_one(&codec::encode(&activity).unwrap()).unwrap();
        prop_assert_eq!(decoded.title().unwrap(), Some(title));
        prop_assert_eq!(decoded.body().unwrap(), Some(body));
    }

    /// Integer fields come back unchanged
    #[test]
    fn integer_field_round_trips(posted_time in any::<i64>()) {
        let mut comment = Comment::with_text("hi");
        comment.set_posted_time(posted_time);

        let decoded: Comment = codec::decode_one(&codec::encode(&comment).unwrap()).unwrap();
        prop_assert_eq!(decoded.posted_time().unwrap(), Some(posted_time));
    }

    /// Double fields come back bit-for-bit, including whole numbers
    #[test]
    fn double_field_round_trips(priority in -1.0e12f64..1.0e12f64) {
        let mut activity = Activity::new();
        activity.set_priority(priority);

        let decoded: Activity = codec::decode_one(&codec::encode(&activity).unwrap()).unwrap();
        prop_assert_eq!(decoded.priority().unwrap(), Some(priority));
    }

    /// Boolean fields come back unchanged
    #[test]
    fn boolean_field_round_trips(liked in any::<bool>()) {
        let mut activity = Activity::new();
        activity.set_liked(liked);

        let decoded: Activity = codec::decode_one(&codec::encode(&activity).unwrap()).unwrap();
        prop_assert_eq!(decoded.is_liked().unwrap(), liked);
    }

    /// Map fields come back unchanged
    #[test]
    fn map_field_round_trips(params in prop::collection::btree_map("[a-z]{1,8}", ".*", 0..6)) {
        let mut activity = Activity::new();
        activity.set_template_params(params.clone());

        let decoded: Activity = codec::decode_one(&codec::encode(&activity).unwrap()).unwrap();
        let expected: Option<&BTreeMap<String, String>> = Some(&params);
        prop_assert_eq!(decoded.template_params().unwrap(), expected);
    }

    /// A window never yields more than `end - start` items
    #[test]
    fn window_never_exceeds_its_span(
        start in 0usize..1000,
        end in 0usize..1000,
        returned in 0usize..50,
    ) {
        let window = Window::new(start, end);
        let items = window.clamp(vec![0u8; returned]);
        prop_assert!(items.len() <= end.saturating_sub(start));
        prop_assert_eq!(items.len(), returned.min(window.limit()));
    }

    /// One malformed element fails the whole array
    #[test]
    fn decode_many_is_atomic(
        ids in prop::collection::vec("[a-z0-9]{1,12}", 0..8),
        bad_at in any::<prop::sample::Index>(),
    ) {
        let mut elements: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{{"id":"{}"}}"#, id))
            .collect();
        let position = bad_at.index(elements.len() + 1);
        elements.insert(position, "42".to_string());
        let json = format!("[{}]", elements.join(","));

        let mut accumulator: Vec<Identity> = Vec::new();
        if let Ok(items) = codec::decode_many::<Identity>(&json) {
            accumulator.extend(items);
        }
        prop_assert!(accumulator.is_empty());
    }
}
