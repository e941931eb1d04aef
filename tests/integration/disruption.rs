//! Integration test: minimal disruption.
//!
//! Adding a bucket to a ring of N remaps roughly `1/(N+1)` of the keys;
//! removing a bucket only remaps the keys it owned.

use ferry_balance::LoadBalancer;
use ferry_integration_tests::{gen_buckets, gen_key};
use ferry_ring::Ring;

/// 10 buckets, add 1, re-resolve 10,000 keys: `|f*(N+1) - 1| < 0.1*N`.
#[test]
fn test_update_add_remaps_fair_share() {
    let bucket_count = 10;
    let key_count = 10_000;
    let buckets1 = gen_buckets(bucket_count + 1);
    let buckets2 = buckets1.clone();
    let buckets1 = &buckets1[..bucket_count];

    let lb = LoadBalancer::new(buckets1.iter().cloned());
    let keys: Vec<String> = (0..key_count).map(|_| gen_key()).collect();
    let before: Vec<_> = keys.iter().map(|k| lb.get(k).unwrap()).collect();

    lb.update(buckets2);
    let moved = keys
        .iter()
        .zip(&before)
        .filter(|(k, b)| lb.get(k).unwrap() != **b)
        .count();

    let rate = moved as f64 / key_count as f64;
    let offset = (rate * (bucket_count + 1) as f64 - 1.0).abs();
    assert!(
        offset < 0.1 * bucket_count as f64,
        "over offset: rate={rate:.4} expected={:.4} offset={offset:.4}",
        1.0 / (bucket_count + 1) as f64
    );
}

/// Keys that move on an add all move to the new bucket.
#[test]
fn test_add_moves_keys_only_to_newcomer() {
    let buckets = gen_buckets(6);
    let lb = LoadBalancer::new(buckets[..5].iter().cloned());
    let keys: Vec<String> = (0..5_000).map(|_| gen_key()).collect();

    let old = lb.snapshot();
    lb.add(buckets[5].clone());
    let new = lb.snapshot();

    let remaps = Ring::diff(&old, &new, &keys);
    assert!(!remaps.is_empty());
    for r in &remaps {
        assert_eq!(r.to, buckets[5].as_str());
    }
}

/// Removing a bucket remaps exactly the keys it owned.
#[test]
fn test_remove_moves_only_owned_keys() {
    let buckets = gen_buckets(8);
    let victim = buckets[3].clone();
    let lb = LoadBalancer::new(buckets);
    let keys: Vec<String> = (0..5_000).map(|_| gen_key()).collect();

    let old = lb.snapshot();
    let owned = keys
        .iter()
        .filter(|k| old.get(k.as_bytes()).unwrap() == victim.as_str())
        .count();

    lb.remove(&victim);
    let remaps = Ring::diff(&old, &lb.snapshot(), &keys);

    assert_eq!(remaps.len(), owned);
    assert!(remaps.iter().all(|r| r.from == victim.as_str()));
}

/// Add followed by remove restores the original placement exactly.
#[test]
fn test_add_then_remove_restores_placement() {
    let buckets = gen_buckets(5);
    let lb = LoadBalancer::new(buckets);
    let original = lb.snapshot();

    lb.add("transient");
    lb.remove("transient");
    assert_eq!(lb.snapshot().vnodes(), original.vnodes());
}
