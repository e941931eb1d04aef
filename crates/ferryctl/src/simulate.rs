//! Balance and disruption simulations over random buckets and keys.

use std::collections::{BTreeMap, HashSet};

use ferry_ring::{Blake3Hasher, Bucket, Ring, RingConfig};
use rand::Rng;

/// Characters used for generated bucket ids and keys.
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";

/// Length of generated bucket ids and keys.
pub const ID_LEN: usize = 32;

/// Per-bucket key counts from a balance run.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    /// Keys routed to each bucket.
    pub counts: BTreeMap<Bucket, u64>,
    /// Mean keys per bucket.
    pub mean: f64,
    /// Population standard deviation of keys per bucket.
    pub std_dev: f64,
}

impl BalanceReport {
    /// Balanced means the spread stays below the mean.
    pub fn is_balanced(&self) -> bool {
        self.std_dev < self.mean
    }
}

/// Outcome of adding one bucket to an existing ring.
#[derive(Debug, Clone, Copy)]
pub struct DisruptionReport {
    /// Buckets before the addition.
    pub buckets: usize,
    /// Keys sampled.
    pub keys: usize,
    /// Keys whose bucket changed.
    pub moved: usize,
}

impl DisruptionReport {
    /// Fraction of sampled keys that moved.
    pub fn fraction(&self) -> f64 {
        self.moved as f64 / self.keys.max(1) as f64
    }

    /// Ideal fraction: the new bucket's fair share, `1 / (N + 1)`.
    pub fn expected(&self) -> f64 {
        1.0 / (self.buckets + 1) as f64
    }

    /// `|f * (N + 1) - 1|`: zero when exactly the fair share moved.
    pub fn offset(&self) -> f64 {
        (self.fraction() * (self.buckets + 1) as f64 - 1.0).abs()
    }

    /// Whether the offset stays under `0.1 * N`.
    pub fn within_tolerance(&self) -> bool {
        self.offset() < 0.1 * self.buckets as f64
    }
}

/// Random string of `len` characters from [`ALPHABET`].
pub fn random_id<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// `n` distinct random bucket ids.
pub fn random_buckets<R: Rng>(rng: &mut R, n: usize) -> Vec<Bucket> {
    let mut seen = HashSet::with_capacity(n);
    let mut buckets = Vec::with_capacity(n);
    while buckets.len() < n {
        let id = random_id(rng, ID_LEN);
        if seen.insert(id.clone()) {
            buckets.push(Bucket::from(id));
        }
    }
    buckets
}

/// `(sum, mean, variance, std_dev)` of `values`; all zero for an empty slice.
pub fn statistic(values: &[f64]) -> (f64, f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (sum, mean, variance, variance.sqrt())
}

/// Route `keys` random keys over `buckets` random buckets and count per bucket.
pub fn balance<R: Rng>(
    rng: &mut R,
    config: RingConfig,
    hasher: Blake3Hasher,
    buckets: usize,
    keys: usize,
) -> BalanceReport {
    let members = random_buckets(rng, buckets);
    let ring = Ring::from_buckets(config, hasher, members.iter().cloned());

    let mut counts: BTreeMap<Bucket, u64> = members.into_iter().map(|b| (b, 0)).collect();
    for _ in 0..keys {
        let key = random_id(rng, ID_LEN);
        if let Ok(bucket) = ring.get(key.as_bytes()) {
            *counts.entry(bucket.clone()).or_default() += 1;
        }
    }

    let values: Vec<f64> = counts.values().map(|&c| c as f64).collect();
    let (_, mean, _, std_dev) = statistic(&values);
    BalanceReport {
        counts,
        mean,
        std_dev,
    }
}

/// Route `keys` random keys over `buckets` random buckets, add one more
/// bucket, and count how many keys changed owner.
pub fn disruption<R: Rng>(
    rng: &mut R,
    config: RingConfig,
    hasher: Blake3Hasher,
    buckets: usize,
    keys: usize,
) -> DisruptionReport {
    let mut initial = random_buckets(rng, buckets + 1);
    let newcomer = initial.pop();

    let before = Ring::from_buckets(config, hasher, initial);
    let mut after = before.clone();
    if let Some(newcomer) = newcomer {
        after.add(newcomer);
    }

    let sample: Vec<String> = (0..keys).map(|_| random_id(rng, ID_LEN)).collect();
    let moved = Ring::diff(&before, &after, &sample).len();

    DisruptionReport {
        buckets,
        keys,
        moved,
    }
}
