//! Key discovery for the suspending combinators.
//!
//! Mirrors `lazyq_operators::keys`: slots in first-seen order, a hash index
//! only when the comparer is the canonical default, a linear scan otherwise.
//! Equality answers are awaited one at a time, so a hashed lookup first
//! narrows the candidates by hash and then confirms them through the
//! comparer. A default-claiming comparer that returns no hash for a key drops
//! the index to scanning for the rest of the session.

use hashbrown::HashMap;

use crate::comparer::AsyncEqualityComparer;

pub use lazyq_operators::keys::MembershipPath;

pub struct AsyncKeyIndex<K, C> {
    comparer: C,
    keys: Vec<K>,
    by_hash: Option<HashMap<u64, Vec<usize>>>,
}

impl<K, C> AsyncKeyIndex<K, C>
where
    C: AsyncEqualityComparer<K>,
{
    pub fn new(comparer: C) -> Self {
        let by_hash = comparer.is_default().then(HashMap::new);
        Self {
            comparer,
            keys: Vec::new(),
            by_hash,
        }
    }

    pub fn path(&self) -> MembershipPath {
        if self.by_hash.is_some() {
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

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn into_keys(self) -> Vec<K> {
        self.keys
    }

    pub async fn find(&self, key: &K) -> Option<usize> {
        match (&self.by_hash, self.comparer.hash_key(key)) {
            (Some(by_hash), Some(hash)) => {
                let candidates = by_hash.get(&hash)?;
                for &slot in candidates {
                    if self.comparer.equals(&self.keys[slot], key).await {
                        return Some(slot);
                    }
                }
                None
            }
            _ => {
                for (slot, seen) in self.keys.iter().enumerate() {
                    if self.comparer.equals(seen, key).await {
                        return Some(slot);
                    }
                }
                None
            }
        }
    }

    pub async fn contains(&self, key: &K) -> bool {
        self.find(key).await.is_some()
    }

    /// Slot of `key` and whether it was newly inserted.
    pub async fn insert(&mut self, key: K) -> (usize, bool) {
        if let Some(slot) = self.find(&key).await {
            return (slot, false);
        }
        let slot = self.keys.len();
        if self.by_hash.is_some() {
            match self.comparer.hash_key(&key) {
                Some(hash) => {
                    if let Some(by_hash) = &mut self.by_hash {
                        by_hash.entry(hash).or_default().push(slot);
                    }
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(keys = slot, "default comparer gave no hash; scanning");
                    self.by_hash = None;
                }
            }
        }
        self.keys.push(key);
        (slot, true)
    }
}

/// Ordered `(key, bucket)` pairs built on an [`AsyncKeyIndex`].
pub struct AsyncBuckets<K, E, C> {
    index: AsyncKeyIndex<K, C>,
    buckets: Vec<Vec<E>>,
}

impl<K, E, C> AsyncBuckets<K, E, C>
where
    C: AsyncEqualityComparer<K>,
{
    pub fn new(comparer: C) -> Self {
        Self {
            index: AsyncKeyIndex::new(comparer),
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

    pub async fn push(&mut self, key: K, element: E) {
        let (slot, fresh) = self.index.insert(key).await;
        if fresh {
            self.buckets.push(Vec::new());
        }
        self.buckets[slot].push(element);
    }

    pub async fn get(&self, key: &K) -> Option<&[E]> {
        let slot = self.index.find(key).await?;
        Some(self.buckets[slot].as_slice())
    }

    pub fn into_pairs(self) -> impl Iterator<Item = (K, Vec<E>)> {
        self.index.into_keys().into_iter().zip(self.buckets)
    }
}
