//! Session registry for routing sink callbacks.
//!
//! The engine hands back whatever context it was given. Instead of handing
//! it the address of a wrapper, each wrapper registers a [`SinkChannel`] and
//! hands out a [`SessionHandle`] packed into the context. A handle only
//! resolves while its slot holds the same generation, so a context that
//! outlives its session resolves to nothing.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

use super::dispatch::SinkChannel;
use super::engine::ModelContext;
use crate::error::{HarnessError, Result};

/// Bits of the context used for the slot index.
const INDEX_BITS: u32 = 16;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;

/// Maximum number of live sessions. Index `INDEX_MASK` is reserved so that
/// `index + 1` always fits.
pub const MAX_SESSIONS: usize = INDEX_MASK;

/// Generation counter width: whatever the pointer has left above the index.
const GENERATION_MASK: usize = usize::MAX >> INDEX_BITS;

/// Registry entry point used by wrappers and the callback entry point.
pub(crate) static SESSIONS: SessionRegistry = SessionRegistry::new();

/// Handle to a registered session: slot index plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    index: usize,
    generation: usize,
}

impl SessionHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Pack into an engine context. Never null.
    pub fn to_context(self) -> ModelContext {
        ModelContext::from_bits((self.generation << INDEX_BITS) | (self.index + 1))
    }

    /// Unpack an engine context. `None` for null.
    pub fn from_context(context: ModelContext) -> Option<Self> {
        let bits = context.bits();
        let slot = bits & INDEX_MASK;
        if slot == 0 {
            return None;
        }
        Some(Self {
            index: slot - 1,
            generation: bits >> INDEX_BITS,
        })
    }
}

struct Slot {
    generation: usize,
    channel: Option<Arc<Mutex<SinkChannel>>>,
}

struct Slots {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

/// Dispatch table from session handles to sink channels.
pub struct SessionRegistry {
    inner: Mutex<Slots>,
}

impl SessionRegistry {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Slots {
                slots: Vec::new(),
                free: Vec::new(),
            }),
        }
    }

    /// Register a channel and return its handle.
    pub fn register(&self, channel: Arc<Mutex<SinkChannel>>) -> Result<SessionHandle> {
        let mut inner = self.inner.lock();
        let index = match inner.free.pop() {
            Some(index) => index,
            None if inner.slots.len() < MAX_SESSIONS => {
                inner.slots.push(Slot {
                    generation: 0,
                    channel: None,
                });
                inner.slots.len() - 1
            }
            None => return Err(HarnessError::SessionLimit),
        };

        let slot = &mut inner.slots[index];
        slot.channel = Some(channel);
        let handle = SessionHandle {
            index,
            generation: slot.generation,
        };
        trace!(index, generation = handle.generation, "session registered");
        Ok(handle)
    }

    /// Remove a session. Stale handles are ignored.
    pub fn unregister(&self, handle: SessionHandle) -> bool {
        let mut inner = self.inner.lock();
        let Some(slot) = inner.slots.get_mut(handle.index) else {
            return false;
        };
        if slot.generation != handle.generation || slot.channel.is_none() {
            return false;
        }
        slot.channel = None;
        slot.generation = (slot.generation + 1) & GENERATION_MASK;
        inner.free.push(handle.index);
        trace!(index = handle.index, "session unregistered");
        true
    }

    /// Resolve a handle to its channel if it is still live.
    pub fn resolve(&self, handle: SessionHandle) -> Option<Arc<Mutex<SinkChannel>>> {
        let inner = self.inner.lock();
        let slot = inner.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.channel.clone()
    }

    /// Resolve an engine context. `None` for null or stale contexts.
    pub fn resolve_context(&self, context: ModelContext) -> Option<Arc<Mutex<SinkChannel>>> {
        SessionHandle::from_context(context).and_then(|handle| self.resolve(handle))
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.slots.len() - inner.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::dummy::DummyEngine;

    fn channel() -> Arc<Mutex<SinkChannel>> {
        Arc::new(Mutex::new(SinkChannel::new(Arc::new(DummyEngine::default()))))
    }

    #[test]
    fn test_context_round_trip_is_non_null() {
        let registry = SessionRegistry::new();
        let handle = registry.register(channel()).unwrap();
        let context = handle.to_context();
        assert!(!context.is_null());
        assert_eq!(SessionHandle::from_context(context), Some(handle));
        assert_eq!(SessionHandle::from_context(ModelContext::null()), None);
    }

    #[test]
    fn test_unregister_invalidates_stale_handle() {
        let registry = SessionRegistry::new();
        let first = registry.register(channel()).unwrap();
        assert!(registry.resolve(first).is_some());
        assert!(registry.unregister(first));
        assert!(registry.resolve(first).is_none());
        assert!(!registry.unregister(first));

        // The slot is reused under a new generation.
        let second = registry.register(channel()).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(registry.resolve(first).is_none());
        assert!(registry.resolve_context(second.to_context()).is_some());
    }

    #[test]
    fn test_distinct_sessions_resolve_to_distinct_channels() {
        let registry = SessionRegistry::new();
        let a = channel();
        let b = channel();
        let ha = registry.register(a.clone()).unwrap();
        let hb = registry.register(b.clone()).unwrap();
        assert_eq!(registry.len(), 2);

        assert!(Arc::ptr_eq(&registry.resolve(ha).unwrap(), &a));
        assert!(Arc::ptr_eq(&registry.resolve(hb).unwrap(), &b));

        registry.unregister(ha);
        registry.unregister(hb);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_index_resolves_to_nothing() {
        let registry = SessionRegistry::new();
        let bogus = ModelContext::from_bits(42);
        assert!(registry.resolve_context(bogus).is_none());
    }

    #[test]
    fn test_exhausted_registry_reports_session_limit() {
        let registry = SessionRegistry::new();
        let shared = channel();
        let handles = (0..MAX_SESSIONS)
            .map(|_| registry.register(shared.clone()))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(registry.len(), MAX_SESSIONS);

        assert!(matches!(
            registry.register(shared.clone()),
            Err(HarnessError::SessionLimit)
        ));

        let freed = handles[100];
        assert!(registry.unregister(freed));
        let reused = registry.register(shared).unwrap();
        assert_eq!(reused.index(), freed.index());
        assert!(!reused.to_context().is_null());
    }
}
