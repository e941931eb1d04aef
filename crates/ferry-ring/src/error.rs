//! Error types for ring lookups.

/// Errors produced by ring lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// A lookup was attempted while no bucket is active.
    ///
    /// The caller must populate buckets before routing keys.
    #[error("empty ring: no buckets to route to")]
    EmptyRing,
}
