//! Content-derived cache keys for realized requests.
//!
//! The fingerprint of a request is the lowercase hex MD5 digest of its
//! canonical form ([`RealizedRequest::canonical_form`]). It is a cache key
//! only and carries no integrity or security meaning.
//!
//! The hash primitive sits behind [`ContentHasher`]. When no hasher is
//! available the engine yields the empty fingerprint, which callers treat as
//! "do not cache this call".

use std::fmt;
use std::sync::Arc;

use md5::{Digest, Md5};
use tracing::{debug, warn};

use crate::request::RealizedRequest;

/// Length in hex characters of a non-empty fingerprint (128-bit digest).
pub const FINGERPRINT_HEX_LEN: usize = 32;

/// A cache key derived from a request's canonical form.
///
/// The empty fingerprint is the sentinel for "caching disabled".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The "do not cache" sentinel.
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// ContentHasher
// ---------------------------------------------------------------------------

/// 128-bit content hash primitive.
pub trait ContentHasher: Send + Sync {
    /// Hashes `bytes`, or returns `None` when the primitive is unavailable.
    fn hash128(&self, bytes: &[u8]) -> Option<[u8; 16]>;
}

/// MD5 via the `md-5` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl ContentHasher for Md5Hasher {
    fn hash128(&self, bytes: &[u8]) -> Option<[u8; 16]> {
        let mut out = [0u8; 16];
        out.copy_from_slice(&Md5::digest(bytes));
        Some(out)
    }
}

/// Stand-in for a platform without a usable hash primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableHasher;

impl ContentHasher for UnavailableHasher {
    fn hash128(&self, _bytes: &[u8]) -> Option<[u8; 16]> {
        None
    }
}

// ---------------------------------------------------------------------------
// FingerprintEngine
// ---------------------------------------------------------------------------

/// Derives [`Fingerprint`]s from realized requests.
#[derive(Clone)]
pub struct FingerprintEngine {
    hasher: Arc<dyn ContentHasher>,
}

impl FingerprintEngine {
    #[must_use]
    pub fn new(hasher: Arc<dyn ContentHasher>) -> Self {
        Self { hasher }
    }

    /// Engine backed by [`Md5Hasher`].
    #[must_use]
    pub fn md5() -> Self {
        Self::new(Arc::new(Md5Hasher))
    }

    /// Fingerprints `request` over its canonical form.
    #[must_use]
    pub fn fingerprint(&self, request: &RealizedRequest) -> Fingerprint {
        let canonical = request.canonical_form();
        debug!(request = %request, "computing request fingerprint");
        self.digest(&canonical)
    }

    /// Hex digest of an already-built canonical string.
    ///
    /// Degrades to [`Fingerprint::empty`] when the hasher is unavailable.
    #[must_use]
    pub fn digest(&self, canonical: &str) -> Fingerprint {
        match self.hasher.hash128(canonical.as_bytes()) {
            Some(raw) => Fingerprint(hex::encode(raw)),
            None => {
                warn!("content hasher unavailable; caching disabled for this call");
                Fingerprint::empty()
            }
        }
    }
}

impl Default for FingerprintEngine {
    fn default() -> Self {
        Self::md5()
    }
}

impl fmt::Debug for FingerprintEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FingerprintEngine").finish_non_exhaustive()
    }
}
