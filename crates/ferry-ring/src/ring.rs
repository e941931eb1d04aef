//! Consistent hashing ring implementation.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::num::NonZeroU32;

use ferry_types::Bucket;
use tracing::debug;

use crate::error::RingError;
use crate::hasher::{Blake3Hasher, KeyHasher};

/// Default number of virtual nodes per bucket.
pub const DEFAULT_REPLICAS: NonZeroU32 = match NonZeroU32::new(160) {
    Some(n) => n,
    None => unreachable!(),
};

/// Byte placed between a bucket id and its replica index when deriving positions.
const VNODE_SEPARATOR: u8 = 0x1f;

/// Ring construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Virtual nodes per bucket (`R`).
    pub replicas: NonZeroU32,
}

impl RingConfig {
    /// Config with `replicas` virtual nodes per bucket.
    pub fn new(replicas: NonZeroU32) -> Self {
        Self { replicas }
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
        }
    }
}

/// One position on the ring and the bucket that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    /// Position in the `u64` hash space.
    pub position: u64,
    /// Bucket owning this position.
    pub owner: Bucket,
}

/// A key whose owning bucket differs between two ring states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    /// The key that moved.
    pub key: Vec<u8>,
    /// Owner in the old ring.
    pub from: Bucket,
    /// Owner in the new ring.
    pub to: Bucket,
}

/// Consistent hashing ring for routing keys to buckets.
///
/// Each bucket is mapped to `R` virtual nodes on a `u64` ring. A key is
/// routed by walking clockwise from its hash to the first virtual node,
/// wrapping past the largest position back to the smallest.
///
/// # Collisions
///
/// Positions are unique. When a derived position is already taken, the
/// incoming virtual node is re-derived with salt 1, 2, ... until a free
/// position turns up, so a bucket always owns exactly `R` virtual nodes.
/// [`Ring::from_buckets`] deduplicates and places buckets in ascending byte
/// order, which makes the ring it builds a pure function of the bucket *set*.
/// Incremental [`Ring::add`] gives the later arrival the salted position.
#[derive(Debug, Clone)]
pub struct Ring<H = Blake3Hasher> {
    /// Virtual nodes, sorted ascending by position.
    vnodes: Vec<VirtualNode>,
    /// Active buckets and the positions each one owns.
    members: BTreeMap<Bucket, Vec<u64>>,
    /// Virtual nodes per bucket.
    replicas: NonZeroU32,
    hasher: H,
}

impl Ring<Blake3Hasher> {
    /// Create an empty ring using the default BLAKE3 hasher.
    pub fn new(config: RingConfig) -> Self {
        Self::with_hasher(config, Blake3Hasher::new())
    }
}

impl Default for Ring<Blake3Hasher> {
    fn default() -> Self {
        Self::new(RingConfig::default())
    }
}

impl<H: KeyHasher> Ring<H> {
    /// Create an empty ring with an explicit hasher.
    pub fn with_hasher(config: RingConfig, hasher: H) -> Self {
        Self {
            vnodes: Vec::new(),
            members: BTreeMap::new(),
            replicas: config.replicas,
            hasher,
        }
    }

    /// Build a ring from a bucket list in one pass.
    ///
    /// Duplicate buckets collapse to one. The result does not depend on the
    /// order of `buckets`.
    pub fn from_buckets<I>(config: RingConfig, hasher: H, buckets: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bucket>,
    {
        let unique: BTreeSet<Bucket> = buckets.into_iter().map(Into::into).collect();
        let replicas = config.replicas.get();
        let total = unique.len() * replicas as usize;

        let mut taken = HashSet::with_capacity(total);
        let mut vnodes = Vec::with_capacity(total);
        let mut members = BTreeMap::new();

        for bucket in unique {
            let positions = derive_positions(&hasher, replicas, &bucket, |pos| taken.insert(pos));
            vnodes.extend(positions.iter().map(|&position| VirtualNode {
                position,
                owner: bucket.clone(),
            }));
            members.insert(bucket, positions);
        }
        vnodes.sort_unstable_by_key(|v| v.position);

        Self {
            vnodes,
            members,
            replicas: config.replicas,
            hasher,
        }
    }

    /// Add a bucket to the ring.
    ///
    /// Adding a bucket that is already present replaces its virtual nodes
    /// with a freshly derived set. Returns `true` if the bucket was new.
    pub fn add(&mut self, bucket: impl Into<Bucket>) -> bool {
        let bucket = bucket.into();
        let existed = self.remove(bucket.as_bytes());

        let vnodes = &self.vnodes;
        let mut claimed = HashSet::with_capacity(self.replicas.get() as usize);
        let positions = derive_positions(&self.hasher, self.replicas.get(), &bucket, |pos| {
            vnodes.binary_search_by_key(&pos, |v| v.position).is_err() && claimed.insert(pos)
        });

        self.vnodes
            .extend(positions.iter().map(|&position| VirtualNode {
                position,
                owner: bucket.clone(),
            }));
        self.vnodes.sort_unstable_by_key(|v| v.position);

        debug!(%bucket, replicas = self.replicas.get(), "added bucket to ring");
        self.members.insert(bucket, positions);
        !existed
    }

    /// Remove a bucket and all of its virtual nodes.
    ///
    /// Removing an absent bucket is a no-op. Returns `true` if the bucket was present.
    pub fn remove(&mut self, bucket: &[u8]) -> bool {
        let Some((owner, _)) = self.members.remove_entry(bucket) else {
            return false;
        };
        self.vnodes.retain(|v| v.owner != owner);
        debug!(bucket = %owner, "removed bucket from ring");
        true
    }

    /// Replace every bucket with `buckets`, rebuilding from scratch.
    pub fn set<I>(&mut self, buckets: I)
    where
        I: IntoIterator,
        I::Item: Into<Bucket>,
    {
        let config = RingConfig::new(self.replicas);
        *self = Self::from_buckets(config, self.hasher.clone(), buckets);
    }

    /// Resolve `key` to its owning bucket.
    ///
    /// Fails with [`RingError::EmptyRing`] if no bucket is active.
    pub fn get(&self, key: &[u8]) -> Result<&Bucket, RingError> {
        let idx = self.successor(self.hasher.hash(key))?;
        Ok(&self.vnodes[idx].owner)
    }

    /// Resolve `key` to up to `n` distinct buckets, in clockwise order.
    ///
    /// The first entry is the same bucket [`Ring::get`] returns; the rest are
    /// fallbacks. If fewer than `n` buckets exist, all of them are returned.
    pub fn get_n(&self, key: &[u8], n: usize) -> Result<Vec<&Bucket>, RingError> {
        let start = self.successor(self.hasher.hash(key))?;
        let want = n.min(self.members.len());
        let mut owners: Vec<&Bucket> = Vec::with_capacity(want);
        if want == 0 {
            return Ok(owners);
        }

        let (before, after) = self.vnodes.split_at(start);
        for vnode in after.iter().chain(before) {
            if !owners.contains(&&vnode.owner) {
                owners.push(&vnode.owner);
                if owners.len() == want {
                    break;
                }
            }
        }

        Ok(owners)
    }

    /// Keys whose owner differs between `old` and `new`.
    ///
    /// Keys that cannot be routed in either ring (because it is empty) are skipped.
    pub fn diff<K: AsRef<[u8]>>(old: &Ring<H>, new: &Ring<H>, keys: &[K]) -> Vec<Remap> {
        keys.iter()
            .filter_map(|key| {
                let key = key.as_ref();
                let from = old.get(key).ok()?;
                let to = new.get(key).ok()?;
                (from != to).then(|| Remap {
                    key: key.to_vec(),
                    from: from.clone(),
                    to: to.clone(),
                })
            })
            .collect()
    }

    /// Iterate over the active buckets in ascending byte order.
    pub fn members(&self) -> impl ExactSizeIterator<Item = &Bucket> + '_ {
        self.members.keys()
    }

    /// Whether `bucket` is active.
    pub fn contains(&self, bucket: &[u8]) -> bool {
        self.members.contains_key(bucket)
    }

    /// Positions owned by `bucket`, in derivation order (replica 0 first).
    pub fn positions(&self, bucket: &[u8]) -> Option<&[u64]> {
        self.members.get(bucket).map(Vec::as_slice)
    }

    /// Number of active buckets.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the ring has no buckets.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Total number of virtual nodes.
    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }

    /// All virtual nodes, sorted by position.
    pub fn vnodes(&self) -> &[VirtualNode] {
        &self.vnodes
    }

    /// Virtual nodes per bucket.
    pub fn replicas(&self) -> NonZeroU32 {
        self.replicas
    }

    /// The hasher used for placement and lookup.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Index of the first virtual node at or after `hash`, wrapping to 0.
    fn successor(&self, hash: u64) -> Result<usize, RingError> {
        if self.vnodes.is_empty() {
            return Err(RingError::EmptyRing);
        }
        let idx = self.vnodes.partition_point(|v| v.position < hash);
        Ok(if idx == self.vnodes.len() { 0 } else { idx })
    }
}

/// Derive `replicas` free positions for `bucket`.
///
/// `claim` returns `true` if the position was free (and takes it). A taken
/// position is re-derived with the next salt.
fn derive_positions<H: KeyHasher>(
    hasher: &H,
    replicas: u32,
    bucket: &Bucket,
    mut claim: impl FnMut(u64) -> bool,
) -> Vec<u64> {
    let mut input = Vec::with_capacity(bucket.len() + 9);
    input.extend_from_slice(bucket.as_bytes());
    input.push(VNODE_SEPARATOR);
    let prefix_len = input.len();

    let mut positions = Vec::with_capacity(replicas as usize);
    for replica in 0..replicas {
        let mut salt = 0u32;
        loop {
            input.truncate(prefix_len);
            input.extend_from_slice(&replica.to_le_bytes());
            input.extend_from_slice(&salt.to_le_bytes());
            let pos = hasher.hash(&input);
            if claim(pos) {
                positions.push(pos);
                break;
            }
            salt = salt.wrapping_add(1);
        }
    }
    positions
}
