//! Property-based tests for the property codec and parcel.
//!
//! Verifies:
//! - a partial write/read moves exactly the fields owned by the action bits
//!   and leaves every other field at its prior value
//! - unknown action bits are ignored on read
//! - a full marshal round trip is value-identical
//! - a write that overflows the parcel leaves it byte-for-byte unchanged

use proptest::prelude::*;

use scenekeeper_core::geometry::Rect;
use scenekeeper_core::parcel::{Parcel, ParcelError};
use scenekeeper_core::property::{WindowSessionProperty, WsPropertyChangeAction};
use scenekeeper_core::types::WindowMode;

// ────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────

fn arb_rect() -> impl Strategy<Value = Rect> {
    (any::<i32>(), any::<i32>(), any::<u32>(), any::<u32>())
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn arb_mode() -> impl Strategy<Value = WindowMode> {
    prop::sample::select(WindowMode::ALL.to_vec())
}

fn arb_property() -> impl Strategy<Value = WindowSessionProperty> {
    (
        arb_rect(),       // window_rect
        arb_mode(),       // window_mode
        any::<u32>(),     // window_flags
        any::<bool>(),    // focusable
        any::<bool>(),    // touchable
        any::<bool>(),    // keep_screen_on
        -1.0f32..=1.0,    // brightness
        any::<bool>(),    // topmost
        0.0f32..=4.0,     // aspect_ratio
        any::<u8>(),      // background_alpha
        any::<bool>(),    // privacy_mode
        "[a-z]{0,12}",    // window_name
    )
        .prop_map(
            |(rect, mode, flags, focusable, touchable, keep_on, brightness, topmost, ratio, alpha, privacy, name)| {
                let mut property = WindowSessionProperty::default();
                property.set_window_rect(rect);
                property.set_window_mode(mode);
                property.set_window_flags(flags);
                property.set_focusable(focusable);
                property.set_touchable(touchable);
                property.set_keep_screen_on(keep_on);
                property.set_brightness(brightness);
                property.set_topmost(topmost);
                property.set_aspect_ratio(ratio);
                property.set_background_alpha(alpha);
                property.set_privacy_mode(privacy);
                property.set_window_name(name);
                property
            },
        )
}

fn arb_actions() -> impl Strategy<Value = WsPropertyChangeAction> {
    any::<u64>().prop_map(WsPropertyChangeAction::from_bits_truncate)
}

// ────────────────────────────────────────────────────────────────────
// Partial updates
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Reading a partial write equals copying the same action groups.
    #[test]
    fn prop_partial_round_trip_matches_copy_action(
        source in arb_property(),
        actions in arb_actions(),
    ) {
        let mut parcel = Parcel::new();
        source.write(&mut parcel, actions).unwrap();

        let mut decoded = WindowSessionProperty::default();
        decoded.read(&mut parcel, actions).unwrap();
        prop_assert_eq!(parcel.remaining(), 0);

        let mut expected = WindowSessionProperty::default();
        expected.copy_action(&source, actions);
        prop_assert_eq!(decoded, expected);
    }

    /// Fields outside the action mask keep their prior values.
    #[test]
    fn prop_untouched_fields_survive(
        base in arb_property(),
        source in arb_property(),
        actions in arb_actions(),
    ) {
        let mut parcel = Parcel::new();
        source.write(&mut parcel, actions).unwrap();

        let mut target = base.clone();
        target.read(&mut parcel, actions).unwrap();

        let mut expected = base.clone();
        expected.copy_action(&source, actions);
        prop_assert_eq!(target, expected);
    }

    /// Raw masks with bits above the known range decode like the known part.
    #[test]
    fn prop_unknown_bits_are_ignored(source in arb_property(), raw in any::<u64>()) {
        let known = WsPropertyChangeAction::from_bits_truncate(raw);
        let mut parcel = Parcel::new();
        source.write(&mut parcel, known).unwrap();

        let mut decoded = WindowSessionProperty::default();
        decoded.read_raw(&mut parcel, raw | (1 << 63)).unwrap();

        let mut expected = WindowSessionProperty::default();
        expected.copy_action(&source, known);
        prop_assert_eq!(decoded, expected);
    }

    /// Whole-value marshalling preserves every field.
    #[test]
    fn prop_full_marshal_round_trip(source in arb_property()) {
        let mut parcel = Parcel::new();
        parcel.write_value(&source).unwrap();
        let decoded: WindowSessionProperty = parcel.read_value().unwrap();
        prop_assert_eq!(decoded, source);
    }
}

// ────────────────────────────────────────────────────────────────────
// Parcel rollback
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A failed write leaves the parcel as it was.
    #[test]
    fn prop_failed_write_leaves_parcel_unchanged(
        capacity in 0usize..256,
        prefix in prop::collection::vec(any::<u8>(), 0..64),
        value in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let mut parcel = Parcel::with_capacity(capacity);
        let _ = parcel.write_bytes(&prefix);
        let before = parcel.clone();

        match parcel.write_bytes(&value) {
            Ok(()) => prop_assert_eq!(parcel.len(), before.len() + 4 + value.len()),
            Err(err) => {
                let is_capacity = matches!(err, ParcelError::CapacityExceeded { .. });
                prop_assert!(is_capacity);
                prop_assert_eq!(parcel, before);
            }
        }
    }

    /// A failed partial property write rolls back the whole group.
    #[test]
    fn prop_failed_property_write_rolls_back(
        source in arb_property(),
        actions in arb_actions(),
        capacity in 0usize..128,
    ) {
        let mut parcel = Parcel::with_capacity(capacity);
        parcel.write_u32(0xfeed).ok();
        let before = parcel.clone();

        if source.write(&mut parcel, actions).is_err() {
            prop_assert_eq!(parcel, before);
        }
    }
}
