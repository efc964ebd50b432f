use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use std::collections::hash_map::RandomState;

use crate::node::Node;
use crate::node::SetNode;
use crate::node::is_key_empty;
use crate::table::Entry as TableEntry;
use crate::table::FlatHashTable;
use crate::table::Iter as TableIter;

/// A hash set backed by the flat open-addressed table.
///
/// `FlatHashSet<T, S>` stores each value once, probing linearly and
/// deleting by backward shift. Values implement `Hash + Eq` and hashing is
/// configurable through `S: BuildHasher` (defaulting to the standard
/// library's `RandomState`).
///
/// # The reserved value
///
/// Slot occupancy is encoded in the stored value itself: **`T::default()`
/// is reserved as the empty-slot marker and cannot be inserted**.
/// Inserting it panics; membership tests for it simply miss. For integer
/// elements the reserved value is `0`, for strings the empty string.
///
/// Iteration order is unspecified and deliberately randomized per call; do
/// not rely on it.
///
/// # Examples
///
/// ```rust
/// use flat_hash::FlatHashSet;
///
/// let mut set = FlatHashSet::new();
/// assert!(set.insert(7));
/// assert!(!set.insert(7));
/// assert!(set.contains(&7));
/// assert_eq!(set.len(), 1);
/// ```
pub struct FlatHashSet<T: Eq + Default, S = RandomState> {
    table: FlatHashTable<SetNode<T>>,
    hash_builder: S,
}

impl<T: Eq + Default> FlatHashSet<T, RandomState> {
    /// Creates an empty set without allocating.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates an empty set with room for at least `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self
    where
        T: Hash,
    {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<T: Eq + Default, S> FlatHashSet<T, S> {
    /// Creates an empty set that hashes with `hash_builder`.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: FlatHashTable::new(),
            hash_builder,
        }
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set holds no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of buckets, zero before the first insertion.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Removes every value and releases the storage.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the values, starting at a random bucket.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<T, S> FlatHashSet<T, S>
where
    T: Hash + Eq + Default,
    S: BuildHasher,
{
    /// Creates an empty set with the given capacity and hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let mut table = FlatHashTable::new();
        table.reserve(capacity, |value| hash_builder.hash_one(value));
        Self {
            table,
            hash_builder,
        }
    }

    /// Ensures the set can hold `size` values without growing.
    ///
    /// Never shrinks the set.
    pub fn reserve(&mut self, size: usize) {
        let Self {
            table,
            hash_builder,
        } = self;
        table.reserve(size, |value| hash_builder.hash_one(value));
    }

    /// Adds a value to the set, returning `true` if it was not already
    /// present.
    ///
    /// # Panics
    ///
    /// Panics if `value` equals `T::default()`, the reserved empty-slot
    /// marker.
    pub fn insert(&mut self, value: T) -> bool {
        assert!(
            !is_key_empty(&value),
            "the default value is reserved as the empty-slot marker"
        );
        let Self {
            table,
            hash_builder,
        } = self;
        let hash = hash_builder.hash_one(&value);
        match table.entry(hash, |v| *v == value, |v| hash_builder.hash_one(v)) {
            TableEntry::Occupied(_) => false,
            TableEntry::Vacant(entry) => {
                entry.insert(value, ());
                true
            }
        }
    }

    /// Returns `true` if the set contains `value`.
    ///
    /// Testing for the reserved default value always misses.
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Returns a reference to the stored value equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        if is_key_empty(value) {
            return None;
        }
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value).map(|node| node.key())
    }

    /// Removes `value` from the set, returning ownership of the stored
    /// value.
    pub fn take(&mut self, value: &T) -> Option<T> {
        if is_key_empty(value) {
            return None;
        }
        let Self {
            table,
            hash_builder,
        } = self;
        let hash = hash_builder.hash_one(value);
        table
            .remove(hash, |v| v == value, |v| hash_builder.hash_one(v))
            .map(|(stored, ())| stored)
    }

    /// Removes `value` from the set, returning `true` if it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Retains only the values for which `f` returns `true`.
    ///
    /// Visits every value exactly once.
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        let Self {
            table,
            hash_builder,
        } = self;
        table.retain(|node| f(node.key()), |v| hash_builder.hash_one(v));
    }
}

impl<T: Eq + Default> Default for FlatHashSet<T, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug + Eq + Default, S> Debug for FlatHashSet<T, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> Clone for FlatHashSet<T, S>
where
    T: Hash + Eq + Default + Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self
                .table
                .clone_with(|value| self.hash_builder.hash_one(value)),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<T, S> FromIterator<T> for FlatHashSet<T, S>
where
    T: Hash + Eq + Default,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for FlatHashSet<T, S>
where
    T: Hash + Eq + Default,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, const M: usize> From<[T; M]> for FlatHashSet<T, RandomState>
where
    T: Hash + Eq + Default,
{
    /// Seeds a set from an array; duplicates collapse to one value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flat_hash::FlatHashSet;
    ///
    /// let set = FlatHashSet::from([1, 2, 2, 3]);
    /// assert_eq!(set.len(), 3);
    /// ```
    fn from(values: [T; M]) -> Self {
        Self::from_iter(values)
    }
}

impl<'a, T: Eq + Default, S> IntoIterator for &'a FlatHashSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// An iterator over the values of a [`FlatHashSet`].
pub struct Iter<'a, T: Eq + Default> {
    inner: TableIter<'a, SetNode<T>>,
}

impl<'a, T: Eq + Default> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|node| node.key())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Eq + Default> ExactSizeIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            Self {
                k1: OsRng.try_next_u64().unwrap_or(0),
                k2: OsRng.try_next_u64().unwrap_or(0),
            }
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let set: FlatHashSet<i32> = FlatHashSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.bucket_count(), 0);

        let set2 = FlatHashSet::<i32, _>::with_hasher(SipHashBuilder::default());
        assert!(set2.is_empty());
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());

        assert!(set.insert(1));
        assert!(set.insert(2));
        assert!(!set.insert(1));

        assert_eq!(set.len(), 2);
        assert!(set.contains(&1));
        assert!(set.contains(&2));
        assert!(!set.contains(&3));
    }

    #[test]
    fn test_remove_and_take() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        set.insert("hello".to_string());
        set.insert("world".to_string());

        assert!(set.remove(&"hello".to_string()));
        assert!(!set.remove(&"hello".to_string()));
        assert_eq!(set.len(), 1);

        assert_eq!(set.take(&"world".to_string()), Some("world".to_string()));
        assert!(set.is_empty());
    }

    #[test]
    fn test_get() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        set.insert("value".to_string());

        assert_eq!(set.get(&"value".to_string()), Some(&"value".to_string()));
        assert_eq!(set.get(&"missing".to_string()), None);
    }

    #[test]
    fn test_clear_releases_storage() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        for i in 1..=20 {
            set.insert(i);
        }

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.bucket_count(), 0);

        assert!(set.insert(5));
        assert!(set.contains(&5));
    }

    #[test]
    fn test_reserve() {
        let mut set = FlatHashSet::<i32, _>::with_hasher(SipHashBuilder::default());
        set.reserve(1000);
        assert!(set.bucket_count() >= 1000);
    }

    #[test]
    fn test_iter_covers_all_values() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        for i in 1..=50 {
            set.insert(i);
        }

        let mut seen: Vec<i32> = set.iter().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=50).collect::<Vec<i32>>());
        assert_eq!(set.iter().len(), 50);
    }

    #[cfg(not(feature = "deterministic-iteration"))]
    #[test]
    fn test_randomized_iteration_start() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        for i in 1..=4 {
            set.insert(i);
        }

        let mut firsts = std::collections::HashSet::new();
        for _ in 0..64 {
            let mut values: Vec<i32> = set.iter().copied().collect();
            firsts.insert(values[0]);
            values.sort_unstable();
            assert_eq!(values, vec![1, 2, 3, 4]);
        }
        assert!(firsts.len() >= 2);
    }

    #[test]
    fn test_retain() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        for i in 1..=100 {
            set.insert(i);
        }

        set.retain(|&v| v % 2 == 0);

        assert_eq!(set.len(), 50);
        for i in 1..=100 {
            assert_eq!(set.contains(&i), i % 2 == 0);
        }
    }

    #[test]
    fn test_clone_then_diverge() {
        let mut a = FlatHashSet::with_hasher(SipHashBuilder::default());
        a.insert(1);
        a.insert(2);

        let b = a.clone();
        a.remove(&1);

        assert!(!a.contains(&1));
        assert!(b.contains(&1));
        assert!(a.contains(&2));
        assert!(b.contains(&2));
    }

    #[test]
    fn test_from_iter_and_extend() {
        let set: FlatHashSet<i32> = FlatHashSet::from([1, 2, 2, 3]);
        assert_eq!(set.len(), 3);

        let mut other = FlatHashSet::with_hasher(SipHashBuilder::default());
        other.extend([3, 4, 4, 5]);
        assert_eq!(other.len(), 3);
        assert!(other.contains(&3));
        assert!(other.contains(&4));
        assert!(other.contains(&5));
    }

    #[test]
    #[should_panic(expected = "reserved as the empty-slot marker")]
    fn test_inserting_default_value_panics() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        set.insert(String::new());
    }

    #[test]
    fn test_membership_of_default_value_misses() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        set.insert(1);

        assert!(!set.contains(&0));
        assert!(!set.remove(&0));
        assert_eq!(set.take(&0), None);
    }

    #[test]
    fn test_many_values() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        for i in 1..=1000 {
            assert!(set.insert(i));
        }
        assert_eq!(set.len(), 1000);

        for i in (2..=1000).step_by(2) {
            assert!(set.remove(&i));
        }
        assert_eq!(set.len(), 500);

        for i in (1..=999).step_by(2) {
            assert!(set.contains(&i));
        }
    }

    #[test]
    fn test_default_trait() {
        let set: FlatHashSet<i32> = FlatHashSet::default();
        assert!(set.is_empty());
    }

    #[test]
    fn test_debug_format() {
        let mut set = FlatHashSet::with_hasher(SipHashBuilder::default());
        set.insert(9);
        assert_eq!(format!("{set:?}"), "{9}");
    }
}
