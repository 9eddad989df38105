//! Display handles for decoded and encoded image data.
//!
//! A [`DisplayHandle`] is an opaque ticket that resolves to a shared byte
//! buffer, the way a browser object URL resolves to a blob. Handles are
//! issued by a [`HandleStore`] and stay live until released. The session
//! keeps at most two live at a time: the original's and the current
//! converted output's.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque reference to image bytes held by a [`HandleStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct DisplayHandle(u64);

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle:{}", self.0)
    }
}

/// Issues, resolves and releases [`DisplayHandle`]s.
///
/// Ids are never reused within a store, so a released handle can never
/// resolve to someone else's bytes.
#[derive(Debug, Default)]
pub struct HandleStore {
    next_id: u64,
    live: HashMap<u64, Arc<[u8]>>,
}

impl HandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, bytes: Arc<[u8]>) -> DisplayHandle {
        self.next_id += 1;
        self.live.insert(self.next_id, bytes);
        DisplayHandle(self.next_id)
    }

    pub fn resolve(&self, handle: DisplayHandle) -> Option<Arc<[u8]>> {
        self.live.get(&handle.0).cloned()
    }

    /// Release a handle. Returns `false` if it was not live.
    pub fn release(&mut self, handle: DisplayHandle) -> bool {
        self.live.remove(&handle.0).is_some()
    }

    /// Release every live handle, returning how many there were.
    pub fn release_all(&mut self) -> usize {
        let count = self.live.len();
        self.live.clear();
        count
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
