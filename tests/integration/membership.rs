//! Integration test: membership.
//!
//! Update/Members round trips, the empty state, and the transitions between
//! empty and populated rings.

use std::collections::BTreeSet;

use ferry_balance::{LoadBalancer, RingError};
use ferry_integration_tests::{gen_buckets, gen_key};
use ferry_types::Bucket;

fn set_of(buckets: &[String]) -> BTreeSet<Bucket> {
    buckets.iter().cloned().map(Bucket::from).collect()
}

/// `Update(B)` then `Members()` is the deduplicated `B`.
#[test]
fn test_update_members_round_trip() {
    let buckets = gen_buckets(12);
    let mut with_dupes = buckets.clone();
    with_dupes.extend(buckets[..4].iter().cloned());

    let lb = LoadBalancer::new(gen_buckets(3));
    lb.update(with_dupes);
    assert_eq!(lb.members(), set_of(&buckets));

    let ring = lb.snapshot();
    for b in &buckets {
        let positions = ring.positions(b.as_bytes()).unwrap();
        assert_eq!(positions.len(), ring.replicas().get() as usize);
    }
}

/// Constructing with no buckets fails lookups with EmptyRing.
#[test]
fn test_empty_construction_reports_empty_ring() {
    let lb = LoadBalancer::new(Vec::<String>::new());
    for _ in 0..10 {
        assert_eq!(lb.get(gen_key()), Err(RingError::EmptyRing));
    }
    assert!(lb.members().is_empty());
}

/// Empty -> populated -> empty -> populated.
#[test]
fn test_empty_populated_transitions() {
    let lb = LoadBalancer::new(Vec::<String>::new());
    assert!(lb.is_empty());

    lb.add("first");
    assert_eq!(lb.get("k").unwrap(), "first");

    lb.remove("first");
    assert!(lb.is_empty());
    assert_eq!(lb.get("k"), Err(RingError::EmptyRing));

    lb.update(["a", "b"]);
    assert_eq!(lb.len(), 2);
    assert!(lb.get("k").is_ok());

    lb.update(Vec::<String>::new());
    assert_eq!(lb.get("k"), Err(RingError::EmptyRing));
}

/// The error is displayable and says why routing failed.
#[test]
fn test_empty_ring_error_message() {
    let lb = LoadBalancer::new(Vec::<String>::new());
    let err = lb.get("k").unwrap_err();
    assert!(err.to_string().contains("empty ring"), "{err}");
}

/// Every lookup resolves to a current member.
#[test]
fn test_lookups_resolve_to_members() {
    let lb = LoadBalancer::new(gen_buckets(7));
    let members = lb.members();
    for _ in 0..2_000 {
        assert!(members.contains(&lb.get(gen_key()).unwrap()));
    }

    let fallbacks = lb.get_n(gen_key(), 10).unwrap();
    assert_eq!(fallbacks.len(), 7);
    assert_eq!(fallbacks.iter().cloned().collect::<BTreeSet<_>>(), members);
}
