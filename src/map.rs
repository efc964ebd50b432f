use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::mem;
use std::collections::hash_map::RandomState;

use crate::node::MapNode;
use crate::node::Node;
use crate::node::is_key_empty;
use crate::table::Entry as TableEntry;
use crate::table::FlatHashTable;
use crate::table::Iter as TableIter;
use crate::table::OccupiedEntry as TableOccupiedEntry;
use crate::table::VacantEntry as TableVacantEntry;

/// A hash map backed by the flat open-addressed table.
///
/// `FlatHashMap<K, V, S>` stores key-value pairs in a single flat
/// allocation, probing linearly and deleting by backward shift, so lookups
/// never cross tombstones. Keys implement `Hash + Eq` and hashing is
/// configurable through `S: BuildHasher` (defaulting to the standard
/// library's `RandomState`).
///
/// # The reserved key
///
/// Slot occupancy is encoded in the key itself: **`K::default()` is
/// reserved as the empty-slot marker and cannot be inserted**. Inserting it
/// panics; looking it up or removing it simply misses. For integer keys the
/// reserved value is `0`, for strings the empty string. Wrap the key in a
/// newtype if your application needs the default value as a live key.
///
/// Iteration order is unspecified and deliberately randomized per call; do
/// not rely on it.
///
/// # Examples
///
/// ```rust
/// use flat_hash::FlatHashMap;
///
/// let mut map = FlatHashMap::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
/// assert_eq!(map.get(&"a"), Some(&1));
/// assert_eq!(map.len(), 2);
/// ```
pub struct FlatHashMap<K: Eq + Default, V, S = RandomState> {
    table: FlatHashTable<MapNode<K, V>>,
    hash_builder: S,
}

impl<K: Eq + Default, V> FlatHashMap<K, V, RandomState> {
    /// Creates an empty map without allocating.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates an empty map with room for at least `capacity` entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flat_hash::FlatHashMap;
    ///
    /// let map: FlatHashMap<u32, u32> = FlatHashMap::with_capacity(100);
    /// assert!(map.bucket_count() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self
    where
        K: Hash,
    {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K: Eq + Default, V, S> FlatHashMap<K, V, S> {
    /// Creates an empty map that hashes with `hash_builder`.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: FlatHashTable::new(),
            hash_builder,
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of buckets, zero before the first insertion.
    ///
    /// The map grows once the entry count exceeds 3/5 of the buckets.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Removes every entry and releases the storage.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the entries, starting at a random bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flat_hash::FlatHashMap;
    ///
    /// let mut map = FlatHashMap::new();
    /// map.insert(1u32, "one");
    /// map.insert(2, "two");
    ///
    /// let mut keys: Vec<u32> = map.iter().map(|(&k, _)| k).collect();
    /// keys.sort_unstable();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> FlatHashMap<K, V, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher,
{
    /// Creates an empty map with the given capacity and hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let mut table = FlatHashTable::new();
        table.reserve(capacity, |key| hash_builder.hash_one(key));
        Self {
            table,
            hash_builder,
        }
    }

    /// Ensures the map can hold `size` entries without growing.
    ///
    /// Never shrinks the map.
    pub fn reserve(&mut self, size: usize) {
        let Self {
            table,
            hash_builder,
        } = self;
        table.reserve(size, |key| hash_builder.hash_one(key));
    }

    /// Inserts a key-value pair, returning the previous value for the key
    /// if there was one.
    ///
    /// # Panics
    ///
    /// Panics if `key` equals `K::default()`, the reserved empty-slot
    /// marker.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flat_hash::FlatHashMap;
    ///
    /// let mut map = FlatHashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns a reference to the value for `key`.
    ///
    /// Looking up the reserved default key always misses.
    pub fn get(&self, key: &K) -> Option<&V> {
        if is_key_empty(key) {
            return None;
        }
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |k| k == key).map(MapNode::value)
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if is_key_empty(key) {
            return None;
        }
        let hash = self.hash_builder.hash_one(key);
        self.table.find_mut(hash, |k| k == key).map(MapNode::value_mut)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key` from the map, returning its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flat_hash::FlatHashMap;
    ///
    /// let mut map = FlatHashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` from the map, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        if is_key_empty(key) {
            return None;
        }
        let Self {
            table,
            hash_builder,
        } = self;
        let hash = hash_builder.hash_one(key);
        table.remove(hash, |k| k == key, |k| hash_builder.hash_one(k))
    }

    /// Locates the entry for `key`, for in-place inspection and insertion.
    ///
    /// # Panics
    ///
    /// Panics if `key` equals `K::default()`, the reserved empty-slot
    /// marker.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flat_hash::FlatHashMap;
    ///
    /// let mut counts: FlatHashMap<&str, u32> = FlatHashMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&2));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S> {
        assert!(
            !is_key_empty(&key),
            "the default key value is reserved as the empty-slot marker"
        );
        let Self {
            table,
            hash_builder,
        } = self;
        let hash = hash_builder.hash_one(&key);
        match table.entry(hash, |k| *k == key, |k| hash_builder.hash_one(k)) {
            TableEntry::Occupied(inner) => Entry::Occupied(OccupiedEntry {
                inner,
                hash_builder,
            }),
            TableEntry::Vacant(inner) => Entry::Vacant(VacantEntry { inner, key }),
        }
    }

    /// Retains only the entries for which `f` returns `true`.
    ///
    /// Visits every entry exactly once; `f` may mutate the values.
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) {
        let Self {
            table,
            hash_builder,
        } = self;
        table.retain(
            |node| {
                let (key, value) = node.key_value_mut();
                f(key, value)
            },
            |k| hash_builder.hash_one(k),
        );
    }
}

impl<K: Eq + Default, V> Default for FlatHashMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Debug for FlatHashMap<K, V, S>
where
    K: Debug + Eq + Default,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Clone for FlatHashMap<K, V, S>
where
    K: Hash + Eq + Default + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self
                .table
                .clone_with(|key| self.hash_builder.hash_one(key)),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for FlatHashMap<K, V, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher + Default,
{
    /// Builds a map from an iterator of pairs.
    ///
    /// When a key occurs more than once, the first occurrence wins and
    /// later ones are silently dropped.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for FlatHashMap<K, V, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher,
{
    /// Inserts the pairs whose keys are not yet present; existing entries
    /// keep their values.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.entry(key).or_insert(value);
        }
    }
}

impl<K, V, const M: usize> From<[(K, V); M]> for FlatHashMap<K, V, RandomState>
where
    K: Hash + Eq + Default,
{
    /// Seeds a map from an array of pairs; the first occurrence of a
    /// duplicate key wins.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flat_hash::FlatHashMap;
    ///
    /// let map = FlatHashMap::from([(1, "one"), (2, "two"), (1, "uno")]);
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// ```
    fn from(entries: [(K, V); M]) -> Self {
        Self::from_iter(entries)
    }
}

impl<'a, K: Eq + Default, V, S> IntoIterator for &'a FlatHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// A view into a single map slot, occupied or vacant.
pub enum Entry<'a, K: Eq + Default, V, S> {
    /// The key is present.
    Occupied(OccupiedEntry<'a, K, V, S>),
    /// The key is absent.
    Vacant(VacantEntry<'a, K, V>),
}

impl<'a, K: Eq + Default, V, S> Entry<'a, K, V, S> {
    /// Returns the value in place, inserting `default` if the key is
    /// absent.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Returns the value in place, inserting `default()` if the key is
    /// absent.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Returns the value in place, inserting `V::default()` if the key is
    /// absent.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Applies `f` to the value if the key is present.
    pub fn and_modify(mut self, f: impl FnOnce(&mut V)) -> Self {
        if let Entry::Occupied(ref mut entry) = self {
            f(entry.get_mut());
        }
        self
    }

    /// Returns the entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

/// A map slot holding the looked-up key.
pub struct OccupiedEntry<'a, K: Eq + Default, V, S> {
    inner: TableOccupiedEntry<'a, MapNode<K, V>>,
    hash_builder: &'a S,
}

impl<'a, K: Eq + Default, V, S> OccupiedEntry<'a, K, V, S> {
    /// Returns the stored key.
    pub fn key(&self) -> &K {
        self.inner.get().key()
    }

    /// Returns a reference to the value.
    pub fn get(&self) -> &V {
        self.inner.get().value()
    }

    /// Returns a mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut V {
        self.inner.get_mut().value_mut()
    }

    /// Converts the entry into a value reference tied to the map borrow.
    pub fn into_mut(self) -> &'a mut V {
        self.inner.into_mut().value_mut()
    }

    /// Replaces the value, returning the previous one.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }
}

impl<'a, K, V, S> OccupiedEntry<'a, K, V, S>
where
    K: Hash + Eq + Default,
    S: BuildHasher,
{
    /// Removes the entry, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry, returning the stored key and value.
    pub fn remove_entry(self) -> (K, V) {
        let OccupiedEntry {
            inner,
            hash_builder,
        } = self;
        inner.remove(|k| hash_builder.hash_one(k))
    }
}

/// A map slot ready to receive the looked-up key.
pub struct VacantEntry<'a, K: Eq + Default, V> {
    inner: TableVacantEntry<'a, MapNode<K, V>>,
    key: K,
}

impl<'a, K: Eq + Default, V> VacantEntry<'a, K, V> {
    /// Returns the key that will be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Inserts the key with `value`, returning a reference to the new
    /// value.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry { inner, key } = self;
        inner.insert(key, value).value_mut()
    }
}

/// An iterator over the entries of a [`FlatHashMap`].
pub struct Iter<'a, K: Eq + Default, V> {
    inner: TableIter<'a, MapNode<K, V>>,
}

impl<'a, K: Eq + Default, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| (node.key(), node.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Eq + Default, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a [`FlatHashMap`].
pub struct Keys<'a, K: Eq + Default, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K: Eq + Default, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Eq + Default, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`FlatHashMap`].
pub struct Values<'a, K: Eq + Default, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K: Eq + Default, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Eq + Default, V> ExactSizeIterator for Values<'_, K, V> {}
