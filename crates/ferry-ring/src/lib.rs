//! Consistent hashing ring for routing keys to buckets.
//!
//! This crate implements the routing core of a load balancer: a ring that
//! maps arbitrary keys to one of a dynamic set of buckets such that the same
//! key always lands on the same bucket, load spreads evenly, and membership
//! changes only remap a small fraction of keys.
//!
//! Each bucket is expanded into `R` virtual nodes placed on a `u64` ring at
//! `hash(bucket ++ 0x1f ++ replica_index ++ salt)`. A key resolves to the
//! owner of the first virtual node at or after `hash(key)`, wrapping around
//! past the largest position.
//!
//! - [`KeyHasher`] / [`Blake3Hasher`] — the placement and lookup hash.
//! - [`Ring`] — the sorted virtual-node collection.
//! - [`RingError`] — the empty-ring lookup failure.

mod error;
mod hasher;
mod ring;

pub use error::RingError;
pub use ferry_types::Bucket;
pub use hasher::{Blake3Hasher, KeyHasher};
pub use ring::{DEFAULT_REPLICAS, Remap, Ring, RingConfig, VirtualNode};
