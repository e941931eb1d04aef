//! Shared types and identifiers for ferry.
//!
//! This crate defines the [`Bucket`] identifier used across the workspace:
//! the routing destination (a backend shard, a server address, ...) that a
//! key resolves to.

use std::borrow::Borrow;
use std::fmt;

use bytes::Bytes;

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// Opaque identifier naming a routing destination.
///
/// A bucket is an arbitrary byte sequence. Two buckets are the same bucket
/// iff their bytes are equal; no encoding is assumed. Ordering is plain
/// lexicographic byte order, which the ring relies on to build a canonical
/// placement from an unordered bucket list.
///
/// Cloning is cheap (reference-counted bytes), so lookups can hand out owned
/// buckets without copying.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Bucket(Bytes);

impl Bucket {
    /// Create a bucket from any byte source.
    pub fn new(id: impl Into<Bytes>) -> Self {
        Self(id.into())
    }

    /// Return the raw bytes of this bucket.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the bucket as UTF-8 text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Length of the identifier in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the identifier is the empty byte string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for Bucket {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for Bucket {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl From<Vec<u8>> for Bucket {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl From<Bytes> for Bucket {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}

impl AsRef<[u8]> for Bucket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Bucket {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<str> for Bucket {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Bucket {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

/// UTF-8 buckets print as text; anything else prints as lowercase hex.
impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => {
                for byte in self.0.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bucket({self})")
    }
}
