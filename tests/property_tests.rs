//! Property-based tests for log_dispatch using proptest

use log_dispatch::prelude::*;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn event_type() -> impl Strategy<Value = EventType> {
    (0u32..=0x1fff).prop_map(EventType::from_bits_truncate)
}

fn masks() -> impl Strategy<Value = Vec<EventType>> {
    prop::collection::vec(event_type(), 0..4)
}

fn filter() -> impl Strategy<Value = Filter> {
    let leaf = prop_oneof![
        Just(Filter::AlwaysPass),
        Just(Filter::AlwaysBlock),
        event_type().prop_map(Filter::SingleMask),
        masks().prop_map(Filter::AllMasks),
        masks().prop_map(Filter::AnyMask),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Filter::CombinedAnd),
            prop::collection::vec(inner, 0..3).prop_map(Filter::CombinedOr),
        ]
    })
}

fn entry(kind: EventType) -> LogEntry {
    LogEntry::builder(kind)
        .trace_options(TraceOptions::empty())
        .title("property")
        .build()
}

// ============================================================================
// Mask Filter Laws
// ============================================================================

proptest! {
    /// A single mask passes exactly when every bit of the mask is present
    #[test]
    fn test_single_mask_rule(kind in event_type(), mask in event_type()) {
        let e = entry(kind);
        prop_assert_eq!(
            Filter::SingleMask(mask).matches(&e),
            (kind & mask) == mask
        );
    }

    /// AllMasks is the conjunction of single masks
    #[test]
    fn test_all_masks_is_conjunction(kind in event_type(), m1 in event_type(), m2 in event_type()) {
        let e = entry(kind);
        prop_assert_eq!(
            Filter::all_masks([m1, m2]).matches(&e),
            Filter::mask(m1).matches(&e) && Filter::mask(m2).matches(&e)
        );
    }

    /// AnyMask is the disjunction of single masks
    #[test]
    fn test_any_mask_is_disjunction(kind in event_type(), m1 in event_type(), m2 in event_type()) {
        let e = entry(kind);
        prop_assert_eq!(
            Filter::any_mask([m1, m2]).matches(&e),
            Filter::mask(m1).matches(&e) || Filter::mask(m2).matches(&e)
        );
    }

    /// Empty mask sets are constant regardless of the entry
    #[test]
    fn test_empty_mask_sets(kind in event_type()) {
        let e = entry(kind);
        prop_assert!(Filter::AllMasks(vec![]).matches(&e));
        prop_assert!(!Filter::AnyMask(vec![]).matches(&e));
    }
}

// ============================================================================
// Combinator Laws
// ============================================================================

proptest! {
    #[test]
    fn test_and_builder(kind in event_type(), f1 in filter(), f2 in filter()) {
        let e = entry(kind);
        let expected = f1.matches(&e) && f2.matches(&e);
        prop_assert_eq!(f1.and(f2).matches(&e), expected);
    }

    #[test]
    fn test_or_builder(kind in event_type(), f1 in filter(), f2 in filter()) {
        let e = entry(kind);
        let expected = f1.matches(&e) || f2.matches(&e);
        prop_assert_eq!(f1.or(f2).matches(&e), expected);
    }

    /// Chaining nests but stays equivalent to the flat combinator
    #[test]
    fn test_chained_and_matches_flat(kind in event_type(), fs in prop::collection::vec(filter(), 1..5)) {
        let e = entry(kind);
        let flat = Filter::CombinedAnd(fs.clone());
        let chained = fs.into_iter().reduce(Filter::and).unwrap();
        prop_assert_eq!(chained.matches(&e), flat.matches(&e));
    }

    #[test]
    fn test_chained_or_matches_flat(kind in event_type(), fs in prop::collection::vec(filter(), 1..5)) {
        let e = entry(kind);
        let flat = Filter::CombinedOr(fs.clone());
        let chained = fs.into_iter().reduce(Filter::or).unwrap();
        prop_assert_eq!(chained.matches(&e), flat.matches(&e));
    }

    /// Evaluating a filter never changes it or the entry
    #[test]
    fn test_matches_is_pure(kind in event_type(), f in filter()) {
        let e = entry(kind);
        let (before_filter, before_entry) = (f.clone(), e.clone());
        let first = f.matches(&e);
        let second = f.matches(&e);
        prop_assert_eq!(first, second);
        prop_assert_eq!(f, before_filter);
        prop_assert_eq!(e, before_entry);
    }

    /// Filters survive a JSON configuration round trip
    #[test]
    fn test_filter_json_roundtrip(f in filter()) {
        let json = serde_json::to_string(&f).unwrap();
        let back: Filter = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, f);
    }
}

// ============================================================================
// Gate Properties
// ============================================================================

proptest! {
    /// A disabled gate never reaches its sink
    #[test]
    fn test_disabled_gate_never_delivers(kinds in prop::collection::vec(event_type(), 0..20), f in filter()) {
        let sink = MemorySink::default();
        let records = sink.records();
        let logger = Gate::new(sink).with_enabled(false).with_filter(f);

        for kind in kinds {
            logger.log(&entry(kind)).unwrap();
        }
        prop_assert!(records.is_empty());
    }

    /// An enabled gate delivers exactly the entries its filter accepts
    #[test]
    fn test_enabled_gate_follows_filter(kinds in prop::collection::vec(event_type(), 0..20), f in filter()) {
        let sink = MemorySink::default();
        let records = sink.records();
        let logger = Gate::new(sink).with_filter(f.clone());

        let mut expected = 0;
        for kind in kinds {
            let e = entry(kind);
            if f.matches(&e) {
                expected += 1;
            }
            logger.log(&e).unwrap();
        }
        prop_assert_eq!(records.len(), expected);
    }

    /// Event types survive string formatting and parsing
    #[test]
    fn test_event_type_str_roundtrip(kind in event_type()) {
        let parsed: EventType = kind.to_string().parse().unwrap();
        prop_assert_eq!(parsed, kind);
    }
}
