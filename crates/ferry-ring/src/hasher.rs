//! Hash functions that place virtual nodes and keys on the ring.

/// Context string for deriving a keyed-hash key from a user seed.
const SEED_CONTEXT: &str = "ferry 2026-01-01 ring placement seed";

/// A pure, deterministic hash from bytes to a ring position.
///
/// Implementations must hold no mutable state: the same input always yields
/// the same output, from any thread. Good avalanche behavior matters, since
/// both virtual-node positions and key positions need to scatter uniformly
/// over the `u64` space for the ring to balance.
pub trait KeyHasher: Clone + Send + Sync {
    /// Hash `bytes` to a ring position.
    fn hash(&self, bytes: &[u8]) -> u64;
}

/// BLAKE3-based ring hasher: the first 8 bytes of the digest as a little-endian `u64`.
///
/// The default hasher is unkeyed. [`Blake3Hasher::seeded`] switches to BLAKE3's
/// keyed mode, producing an independent but equally reproducible placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher {
    key: Option<[u8; 32]>,
}

impl Blake3Hasher {
    /// Create an unkeyed hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a keyed hasher whose key is derived from `seed`.
    ///
    /// Two hashers built from the same seed are interchangeable.
    pub fn seeded(seed: &str) -> Self {
        Self {
            key: Some(blake3::derive_key(SEED_CONTEXT, seed.as_bytes())),
        }
    }

    /// Whether this hasher runs in keyed mode.
    pub fn is_seeded(&self) -> bool {
        self.key.is_some()
    }
}

impl KeyHasher for Blake3Hasher {
    fn hash(&self, bytes: &[u8]) -> u64 {
        let hash = match &self.key {
            Some(key) => blake3::keyed_hash(key, bytes),
            None => blake3::hash(bytes),
        };
        let digest = hash.as_bytes();
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(word)
    }
}
