//! Routing facade over the consistent hashing ring.
//!
//! [`LoadBalancer`] owns one [`Ring`] and routes keys to buckets. Reads are
//! wait-free: the ring is an immutable snapshot behind an atomic pointer.
//! Writers rebuild a new snapshot off to the side and publish it in one
//! swap, so a lookup sees either the old bucket set or the new one, never a
//! half-built ring.

mod balancer;


pub use balancer::LoadBalancer;
pub use ferry_ring::{Blake3Hasher, KeyHasher, Ring, RingConfig, RingError};
pub use ferry_types::Bucket;
