use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

/// Process-local handle bound to in-memory image bytes, `mem:<uuid>`.
///
/// Handles are never persisted: every load from the blob store mints fresh
/// ones, and a handle stops resolving the moment it is released.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageUrl(String);

impl ImageUrl {
    fn mint() -> Self {
        Self(format!("mem:{}", uuid::Uuid::now_v7()))
    }

    /// The handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageUrl({})", self.0)
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry of live image handles.
///
/// Owns the bytes behind every handle it has minted. The session holds one
/// handle per loaded result (plus at most one staged crop source) and
/// releases each exactly once; a second release of the same handle reports
/// `false` rather than doing anything.
#[derive(Debug, Default)]
pub struct ImageHandles {
    live: HashMap<ImageUrl, Bytes>,
}

impl ImageHandles {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            live: HashMap::new(),
        }
    }

    /// Mint a fresh handle bound to `bytes`.
    pub fn mint(&mut self, bytes: Bytes) -> ImageUrl {
        let url = ImageUrl::mint();
        self.live.insert(url.clone(), bytes);
        url
    }

    /// The bytes behind a handle, while it is live.
    pub fn resolve(&self, url: &ImageUrl) -> Option<Bytes> {
        self.live.get(url).cloned()
    }

    /// Whether a handle is currently live.
    pub fn is_live(&self, url: &ImageUrl) -> bool {
        self.live.contains_key(url)
    }

    /// Release a handle. Returns `false` if it was not (or no longer) live.
    pub fn release(&mut self, url: &ImageUrl) -> bool {
        self.live.remove(url).is_some()
    }

    /// Release every live handle.
    pub fn release_all(&mut self) {
        self.live.clear();
    }

    /// Number of live handles.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
