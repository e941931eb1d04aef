//! Integration test: balance.
//!
//! Random keys spread evenly enough that the per-bucket standard deviation
//! stays below the per-bucket mean.

use std::collections::HashMap;

use ferry_balance::LoadBalancer;
use ferry_integration_tests::{gen_buckets, gen_key, statistic};
use ferry_types::Bucket;

fn route_counts(lb: &LoadBalancer, keys: usize) -> Vec<f64> {
    let mut counts: HashMap<Bucket, u64> = HashMap::new();
    for _ in 0..keys {
        let bucket = lb.get(gen_key()).unwrap();
        *counts.entry(bucket).or_default() += 1;
    }
    counts.values().map(|&c| c as f64).collect()
}

/// 2 random buckets, 1,000,000 random keys.
#[test]
fn test_two_buckets_million_keys() {
    let lb = LoadBalancer::new(gen_buckets(2));
    let counts = route_counts(&lb, 1_000_000);
    let stats = statistic(&counts);

    assert_eq!(counts.len(), 2, "both buckets should receive keys");
    assert_eq!(stats.sum, 1_000_000.0);
    assert!(
        stats.std_dev < stats.mean,
        "variance is too big: counts={counts:?} mean={} std={}",
        stats.mean,
        stats.std_dev
    );
}

/// 10 random buckets: no bucket is starved or hogs the load.
#[test]
fn test_ten_buckets_share_load() {
    let lb = LoadBalancer::new(gen_buckets(10));
    let counts = route_counts(&lb, 200_000);
    let stats = statistic(&counts);

    assert_eq!(counts.len(), 10);
    assert!(stats.std_dev < stats.mean);
    for c in &counts {
        let share = c / stats.sum;
        assert!(
            (0.05..=0.2).contains(&share),
            "bucket share {share:.3} far from 0.1: {counts:?}"
        );
    }
}
