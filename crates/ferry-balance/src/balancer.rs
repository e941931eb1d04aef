//! The routing facade: a ring snapshot behind an atomic swap.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use ferry_ring::{Blake3Hasher, KeyHasher, Ring, RingConfig, RingError};
use ferry_types::Bucket;
use tracing::{debug, info};

/// Routes keys to a dynamic set of buckets.
///
/// Any number of threads may call [`get`](Self::get) concurrently with a
/// writer calling [`update`](Self::update), [`add`](Self::add) or
/// [`remove`](Self::remove). Readers load the current snapshot without
/// locking. Writers are serialized among themselves; each one builds the
/// next ring from a private copy and publishes it with a single store.
pub struct LoadBalancer<H = Blake3Hasher> {
    /// Current ring snapshot.
    ring: ArcSwap<Ring<H>>,
    /// Serializes writers so concurrent add/remove calls do not lose updates.
    writer: Mutex<()>,
}

impl LoadBalancer<Blake3Hasher> {
    /// Create a balancer over `buckets` with the default ring config.
    ///
    /// An empty bucket list is valid; lookups fail until buckets are added.
    pub fn new<I>(buckets: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bucket>,
    {
        Self::with_hasher(RingConfig::default(), Blake3Hasher::new(), buckets)
    }
}

impl Default for LoadBalancer<Blake3Hasher> {
    fn default() -> Self {
        Self::new(Vec::<Bucket>::new())
    }
}

impl<H: KeyHasher> LoadBalancer<H> {
    /// Create a balancer with an explicit ring config and hasher.
    pub fn with_hasher<I>(config: RingConfig, hasher: H, buckets: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bucket>,
    {
        let ring = Ring::from_buckets(config, hasher, buckets);
        debug!(
            buckets = ring.len(),
            vnodes = ring.vnode_count(),
            "load balancer created"
        );
        Self {
            ring: ArcSwap::from_pointee(ring),
            writer: Mutex::new(()),
        }
    }

    /// Resolve `key` to its bucket.
    ///
    /// Fails with [`RingError::EmptyRing`] when no bucket is active.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Bucket, RingError> {
        self.ring.load().get(key.as_ref()).cloned()
    }

    /// Resolve `key` to up to `n` distinct buckets: the owner, then fallbacks.
    pub fn get_n(&self, key: impl AsRef<[u8]>, n: usize) -> Result<Vec<Bucket>, RingError> {
        let ring = self.ring.load();
        let owners = ring.get_n(key.as_ref(), n)?;
        Ok(owners.into_iter().cloned().collect())
    }

    /// Replace the active bucket set with `buckets`.
    ///
    /// Duplicates are collapsed. An empty list empties the ring.
    pub fn update<I>(&self, buckets: I)
    where
        I: IntoIterator,
        I::Item: Into<Bucket>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.ring.load();
        let next = Ring::from_buckets(
            RingConfig::new(current.replicas()),
            current.hasher().clone(),
            buckets,
        );
        info!(
            before = current.len(),
            after = next.len(),
            vnodes = next.vnode_count(),
            "bucket set updated"
        );
        self.ring.store(Arc::new(next));
    }

    /// Add one bucket. Returns `true` if it was not already active.
    pub fn add(&self, bucket: impl Into<Bucket>) -> bool {
        let bucket = bucket.into();
        self.publish(|ring| ring.add(bucket))
    }

    /// Remove one bucket. Returns `true` if it was active.
    pub fn remove(&self, bucket: impl AsRef<[u8]>) -> bool {
        self.publish(|ring| ring.remove(bucket.as_ref()))
    }

    /// The active buckets.
    pub fn members(&self) -> BTreeSet<Bucket> {
        self.ring.load().members().cloned().collect()
    }

    /// Number of active buckets.
    pub fn len(&self) -> usize {
        self.ring.load().len()
    }

    /// Whether no bucket is active.
    pub fn is_empty(&self) -> bool {
        self.ring.load().is_empty()
    }

    /// A consistent view of the ring for routing many keys against one state.
    pub fn snapshot(&self) -> Arc<Ring<H>> {
        self.ring.load_full()
    }

    /// Apply `change` to a private copy of the ring, then publish it.
    fn publish<R>(&self, change: impl FnOnce(&mut Ring<H>) -> R) -> R {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = (**self.ring.load()).clone();
        let out = change(&mut next);
        self.ring.store(Arc::new(next));
        out
    }
}

impl<H: KeyHasher> std::fmt::Debug for LoadBalancer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = self.ring.load();
        f.debug_struct("LoadBalancer")
            .field("buckets", &ring.len())
            .field("vnodes", &ring.vnode_count())
            .finish_non_exhaustive()
    }
}
