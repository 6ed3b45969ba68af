//! String storage shared by segmentations.
//!
//! Segments never hold text. They name a [`StringId`] and a byte range, and
//! the text itself lives in a [`StringStore`] that callers create, fill and
//! pass by reference to every operation. Several segmentations can therefore
//! share one store without copying any content.
//!
//! Ids come from process-wide atomic counters, so two stores never hand out
//! the same [`StringId`]. This is what makes [`StringStore::union`] possible
//! without renumbering segments.

use crate::error::{Error, Result};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_STRING_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(0);

/// Identifier of a registered string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StringId(u64);

impl StringId {
    /// Largest id accepted by [`StringStore::register_as`].
    ///
    /// Keeping explicit ids below half the `u64` range leaves the allocator
    /// room to keep counting upwards.
    pub const MAX: StringId = StringId(u64::MAX >> 1);

    /// Wraps a raw id, e.g. one read back from a snapshot.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    fn allocate() -> Self {
        Self(NEXT_STRING_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(u64);

impl StoreId {
    fn allocate() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry of immutable source strings.
#[derive(Debug, Clone)]
pub struct StringStore {
    id: StoreId,
    /// Store ids whose segmentations may be used with this store.
    covers: BTreeSet<StoreId>,
    strings: HashMap<StringId, Arc<str>>,
}

impl StringStore {
    /// Creates an empty store with a fresh identity.
    pub fn new() -> Self {
        let id = StoreId::allocate();
        Self {
            id,
            covers: BTreeSet::from([id]),
            strings: HashMap::new(),
        }
    }

    /// Returns the identity of this store.
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Returns true if segmentations built against `store` may be used here.
    pub fn covers(&self, store: StoreId) -> bool {
        self.covers.contains(&store)
    }

    /// Registers a string and returns its freshly allocated id.
    pub fn register(&mut self, content: impl Into<Arc<str>>) -> StringId {
        let id = StringId::allocate();
        let content = content.into();
        trace!("Registered string {} ({} bytes) in store {}", id, content.len(), self.id);
        self.strings.insert(id, content);
        id
    }

    /// Registers a string under an explicit id.
    ///
    /// Registering the same content twice under the same id is a no-op.
    /// Registering different content under an existing id fails with
    /// [`Error::ContentConflict`], and ids above [`StringId::MAX`] fail with
    /// [`Error::InvalidArgument`].
    pub fn register_as(&mut self, id: StringId, content: impl Into<Arc<str>>) -> Result<StringId> {
        if id > StringId::MAX {
            return Err(Error::InvalidArgument(format!(
                "string id {} exceeds the largest explicit id {}",
                id,
                StringId::MAX
            )));
        }
        let content = content.into();
        if let Some(existing) = self.strings.get(&id) {
            if **existing == *content {
                return Ok(id);
            }
            return Err(Error::ContentConflict(id));
        }

        // Keep the allocator ahead of every explicitly chosen id.
        let next = id.0.checked_add(1).ok_or_else(|| {
            Error::InvalidArgument(format!("string id {} leaves no room for allocation", id))
        })?;
        NEXT_STRING_ID.fetch_max(next, Ordering::Relaxed);
        trace!("Registered string {} ({} bytes) in store {}", id, content.len(), self.id);
        self.strings.insert(id, content);
        Ok(id)
    }

    /// Returns the content of a registered string.
    pub fn get(&self, id: StringId) -> Result<&str> {
        self.strings
            .get(&id)
            .map(|s| s.as_ref())
            .ok_or(Error::NotFound(id))
    }

    /// Checks whether a string id is registered.
    pub fn contains(&self, id: StringId) -> bool {
        self.strings.contains_key(&id)
    }

    /// Returns the number of registered strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if no string is registered.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Returns all registered ids in ascending order.
    pub fn ids(&self) -> Vec<StringId> {
        let mut ids: Vec<StringId> = self.strings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterates over `(id, content)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (StringId, &str)> + '_ {
        self.ids()
            .into_iter()
            .filter_map(move |id| self.strings.get(&id).map(|s| (id, s.as_ref())))
    }

    /// Builds a new store holding the strings of both stores.
    ///
    /// The result covers every store covered by either input, so
    /// segmentations from both sides can be combined against it.
    pub fn union(&self, other: &StringStore) -> Result<StringStore> {
        let mut merged = StringStore::new();
        merged.covers.extend(self.covers.iter().copied());
        merged.covers.extend(other.covers.iter().copied());

        merged.strings = self.strings.clone();
        for (id, content) in &other.strings {
            match merged.strings.get(id) {
                Some(existing) if existing != content => return Err(Error::ContentConflict(*id)),
                Some(_) => {}
                None => {
                    merged.strings.insert(*id, Arc::clone(content));
                }
            }
        }

        trace!(
            "Unioned stores {} and {} into {} ({} strings)",
            self.id,
            other.id,
            merged.id,
            merged.len()
        );
        Ok(merged)
    }

    /// Removes every string. Ids are not reused afterwards.
    pub fn reset(&mut self) {
        self.strings.clear();
    }
}

impl Default for StringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut store = StringStore::new();
        let id = store.register("hello");
        assert_eq!(store.get(id).unwrap(), "hello");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_register_allocates_fresh_ids() {
        let mut store = StringStore::new();
        let a = store.register("same");
        let b = store.register("same");
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_get_missing() {
        let store = StringStore::new();
        let err = store.get(StringId::from_raw(u64::MAX)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_register_as_is_idempotent() {
        let mut store = StringStore::new();
        let id = store.register("text");
        assert_eq!(store.register_as(id, "text").unwrap(), id);
        assert_eq!(store.len(), 1);

        let err = store.register_as(id, "other").unwrap_err();
        assert!(matches!(err, Error::ContentConflict(_)));
    }

    #[test]
    fn test_register_as_advances_allocator() {
        let mut store = StringStore::new();
        let explicit = StringId::from_raw(1_000_000_000);
        store.register_as(explicit, "restored").unwrap();
        let fresh = store.register("new");
        assert!(fresh > explicit);
    }

    #[test]
    fn test_register_as_rejects_ids_past_max() {
        let mut store = StringStore::new();
        for raw in [u64::MAX, StringId::MAX.as_u64() + 1] {
            let err = store.register_as(StringId::from_raw(raw), "x").unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
        assert!(store.is_empty());

        store.register_as(StringId::MAX, "last").unwrap();
        let fresh = store.register("next");
        assert!(fresh > StringId::MAX);
    }

    #[test]
    fn test_union_covers_both() {
        let mut a = StringStore::new();
        let mut b = StringStore::new();
        let ia = a.register("a");
        let ib = b.register("b");

        let merged = a.union(&b).unwrap();
        assert!(merged.covers(a.id()));
        assert!(merged.covers(b.id()));
        assert!(!a.covers(b.id()));
        assert_eq!(merged.get(ia).unwrap(), "a");
        assert_eq!(merged.get(ib).unwrap(), "b");
    }

    #[test]
    fn test_reset_keeps_ids_unique() {
        let mut store = StringStore::new();
        let before = store.register("x");
        store.reset();
        assert!(store.is_empty());
        let after = store.register("x");
        assert_ne!(before, after);
    }

    #[test]
    fn test_iter_sorted() {
        let mut store = StringStore::new();
        let a = store.register("a");
        let b = store.register("b");
        let pairs: Vec<_> = store.iter().collect();
        assert_eq!(pairs, vec![(a, "a"), (b, "b")]);
    }
}
