//! Shared test harness for ferry integration tests.
//!
//! Provides random bucket and key generators matching the shape of real
//! routing input (32-character ids over `[0-9A-Za-z-]`) and the summary
//! statistics the balance checks are phrased in.

use std::collections::HashSet;

use rand::Rng;

/// Characters used for generated ids.
const LETTERS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";

/// Length of generated bucket ids and keys.
pub const ID_LEN: usize = 32;

/// Summary of a list of counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub sum: f64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

/// Random string of `n` characters.
pub fn random_string(n: usize) -> String {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
        .collect()
}

/// Random routing key.
pub fn gen_key() -> String {
    random_string(ID_LEN)
}

/// `n` distinct random bucket ids.
pub fn gen_buckets(n: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(n);
    let mut buckets = Vec::with_capacity(n);
    while buckets.len() < n {
        let bucket = random_string(ID_LEN);
        if seen.insert(bucket.clone()) {
            buckets.push(bucket);
        }
    }
    buckets
}

/// Population statistics of `values`.
pub fn statistic(values: &[f64]) -> Stats {
    let n = values.len().max(1) as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Stats {
        sum,
        mean,
        variance,
        std_dev: variance.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_buckets_distinct_and_sized() {
        let buckets = gen_buckets(20);
        assert_eq!(buckets.len(), 20);
        assert!(buckets.iter().all(|b| b.len() == ID_LEN));
        let unique: HashSet<_> = buckets.iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_statistic() {
        let s = statistic(&[1.0, 3.0]);
        assert_eq!(s.sum, 4.0);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.variance, 1.0);
        assert_eq!(s.std_dev, 1.0);
    }
}
