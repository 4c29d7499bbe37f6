//! Key discovery shared by grouping, set algebra, and group-join.
//!
//! A [`KeyIndex`] assigns each distinct key (under an equality comparer) a
//! dense slot in first-seen order. The lookup strategy is picked once, when
//! the index is created:
//! - the default comparer gets a hash table over the slots (O(1) amortized);
//! - any other comparer gets a linear scan over the accepted keys, since an
//!   arbitrary equality relation cannot be hashed safely.
//!
//! A comparer that claims to be the default but returns no hash for some key
//! drops the index to the scanned path for the rest of the session.

use hashbrown::HashTable;
use lazyq_core::comparer::EqualityComparer;

/// Which membership strategy a [`KeyIndex`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipPath {
    Hashed,
    Scanned,
}

/// `C` is usually a reference to a comparer owned by the combinator.
pub struct KeyIndex<K, C> {
    comparer: C,
    keys: Vec<K>,
    table: Option<HashTable<usize>>,
}

impl<K, C> KeyIndex<K, C>
where
    C: EqualityComparer<K>,
{
    pub fn new(comparer: C) -> Self {
        let table = comparer.is_default().then(HashTable::new);
        Self {
            comparer,
            keys: Vec::new(),
            table,
        }
    }

    pub fn comparer(&self) -> &C {
        &self.comparer
    }

    pub fn path(&self) -> MembershipPath {
        if self.table.is_some() {
            MembershipPath::Hashed
        } else {
            MembershipPath::Scanned
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn into_keys(self) -> Vec<K> {
        self.keys
    }

    /// Slot of a key equal to `key`, if any.
    pub fn find(&self, key: &K) -> Option<usize> {
        let comparer = &self.comparer;
        match (&self.table, comparer.hash_key(key)) {
            (Some(table), Some(hash)) => table
                .find(hash, |&slot| comparer.equals(&self.keys[slot], key))
                .copied(),
            _ => self.keys.iter().position(|seen| comparer.equals(seen, key)),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Slot of `key` and whether it was newly inserted.
    pub fn insert(&mut self, key: K) -> (usize, bool) {
        if let Some(slot) = self.find(&key) {
            return (slot, false);
        }
        let slot = self.keys.len();
        let Self {
            comparer,
            keys,
            table,
        } = self;
        if let Some(index) = table {
            let comparer = &*comparer;
            match comparer.hash_key(&key) {
                Some(hash) => {
                    index.insert_unique(hash, slot, |&existing| {
                        // Every key already in the table hashed when it went in.
                        comparer.hash_key(&keys[existing]).unwrap_or_default()
                    });
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(keys = keys.len(), "default comparer gave no hash; scanning");
                    *table = None;
                }
            }
        }
        keys.push(key);
        (slot, true)
    }
}

/// Ordered `(key, bucket)` pairs built on a [`KeyIndex`].
pub struct Buckets<K, E, C> {
    index: KeyIndex<K, C>,
    buckets: Vec<Vec<E>>,
}

impl<K, E, C> Buckets<K, E, C>
where
    C: EqualityComparer<K>,
{
    pub fn new(comparer: C) -> Self {
        Self {
            index: KeyIndex::new(comparer),
            buckets: Vec::new(),
        }
    }

    pub fn path(&self) -> MembershipPath {
        self.index.path()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn push(&mut self, key: K, element: E) {
        let (slot, fresh) = self.index.insert(key);
        if fresh {
            self.buckets.push(Vec::new());
        }
        self.buckets[slot].push(element);
    }

    pub fn get(&self, key: &K) -> Option<&[E]> {
        self.index.find(key).map(|slot| self.buckets[slot].as_slice())
    }

    /// `(key, bucket)` pairs in first-seen key order, borrowed.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[E])> {
        self.index
            .keys()
            .iter()
            .zip(self.buckets.iter().map(Vec::as_slice))
    }

    /// `(key, bucket)` pairs in first-seen key order.
    pub fn into_pairs(self) -> impl Iterator<Item = (K, Vec<E>)> {
        self.index.into_keys().into_iter().zip(self.buckets)
    }
}
