//! Thread-safe id-keyed entity store.
//!
//! Every operation takes the lock for exactly its own duration. Writes replace the
//! whole value; partial updates go through [`Store::modify`].

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Error type for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid id: id must not be empty")]
    IdInvalid,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store is disabled")]
    Disabled,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Backing strategy for a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBacking {
    /// Hash map, unspecified iteration order
    #[default]
    Unordered,
    /// Insertion-ordered map
    Ordered,
}

enum Backing<T> {
    Unordered(HashMap<String, T>),
    Ordered(IndexMap<String, T>),
}

impl<T> Backing<T> {
    fn new(kind: StoreBacking) -> Self {
        match kind {
            StoreBacking::Unordered => Self::Unordered(HashMap::new()),
            StoreBacking::Ordered => Self::Ordered(IndexMap::new()),
        }
    }

    fn get(&self, id: &str) -> Option<&T> {
        match self {
            Self::Unordered(map) => map.get(id),
            Self::Ordered(map) => map.get(id),
        }
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        match self {
            Self::Unordered(map) => map.get_mut(id),
            Self::Ordered(map) => map.get_mut(id),
        }
    }

    fn insert(&mut self, id: String, value: T) {
        match self {
            Self::Unordered(map) => {
                map.insert(id, value);
            }
            Self::Ordered(map) => {
                map.insert(id, value);
            }
        }
    }

    fn remove(&mut self, id: &str) {
        match self {
            Self::Unordered(map) => {
                map.remove(id);
            }
            Self::Ordered(map) => {
                map.shift_remove(id);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Unordered(map) => map.len(),
            Self::Ordered(map) => map.len(),
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Self::Unordered(map) => Box::new(map.values()),
            Self::Ordered(map) => Box::new(map.values()),
        }
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        match self {
            Self::Unordered(map) => Box::new(map.keys()),
            Self::Ordered(map) => Box::new(map.keys()),
        }
    }
}

/// Concurrent map from id to the most recent entity snapshot
pub struct Store<T> {
    inner: RwLock<Backing<T>>,
    backing: StoreBacking,
    disabled: bool,
}

impl<T> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("backing", &self.backing)
            .field("disabled", &self.disabled)
            .field("len", &self.len())
            .finish()
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new(StoreBacking::Unordered)
    }
}

impl<T: Clone> Store<T> {
    /// Look up the current value for `id`
    pub fn get(&self, id: &str) -> StoreResult<T> {
        self.check(id)?;
        self.inner
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Snapshot of all values; insertion order for the ordered backing
    pub fn values(&self) -> StoreResult<Vec<T>> {
        if self.disabled {
            return Err(StoreError::Disabled);
        }
        Ok(self.inner.read().values().cloned().collect())
    }
}

impl<T> Store<T> {
    /// Create an enabled store with the given backing
    #[must_use]
    pub fn new(backing: StoreBacking) -> Self {
        Self {
            inner: RwLock::new(Backing::new(backing)),
            backing,
            disabled: false,
        }
    }

    /// Create a store on which every operation fails with [`StoreError::Disabled`]
    #[must_use]
    pub fn disabled(backing: StoreBacking) -> Self {
        Self {
            disabled: true,
            ..Self::new(backing)
        }
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[inline]
    pub fn backing(&self) -> StoreBacking {
        self.backing
    }

    /// Store `value` under `id`, replacing any previous value
    pub fn set(&self, id: impl Into<String>, value: T) -> StoreResult<()> {
        let id = id.into();
        self.check(&id)?;
        self.inner.write().insert(id, value);
        Ok(())
    }

    /// Remove `id`; removing an absent id is not an error
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.check(id)?;
        self.inner.write().remove(id);
        Ok(())
    }

    /// Mutate the stored value in place under the write lock
    pub fn modify<F>(&self, id: &str, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut T),
    {
        self.check(id)?;
        let mut inner = self.inner.write();
        let value = inner
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(value);
        Ok(())
    }

    /// Snapshot of all ids
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        if self.disabled {
            return Err(StoreError::Disabled);
        }
        Ok(self.inner.read().keys().cloned().collect())
    }

    /// Number of stored entities (always 0 when disabled)
    pub fn len(&self) -> usize {
        if self.disabled {
            return 0;
        }
        self.inner.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, id: &str) -> StoreResult<()> {
        if id.is_empty() {
            return Err(StoreError::IdInvalid);
        }
        if self.disabled {
            return Err(StoreError::Disabled);
        }
        Ok(())
    }
}
