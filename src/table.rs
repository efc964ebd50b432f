//! A flat open-addressed hash table with backward-shift deletion.
//!
//! The table is a single heap block holding a small header (entry count and
//! bucket mask) followed by a power-of-two array of nodes. A slot is empty
//! iff its key equals the key type's default value, so occupancy needs no
//! side metadata at all. Probing is plain linear probing from a *home
//! bucket*: the user-supplied hash is pushed through the 32-bit Murmur3
//! finalizer ([`randomize_hash`]) and masked, which keeps bucket
//! distribution good even for identity-quality hashers.
//!
//! [`FlatHashTable<N>`] is generic over the slot shape `N:`[`Node`] and is
//! a fairly low-level structure: operations take the hash value plus
//! equality and re-hash closures, in the style of a raw table. Prefer the
//! [`FlatHashMap`](crate::map::FlatHashMap) or
//! [`FlatHashSet`](crate::set::FlatHashSet) wrappers unless you are
//! building your own map or set on top.
//!
//! ## Deletion
//!
//! Removal never writes a tombstone. After a slot is vacated, the entries
//! following it on the probe chain are examined in order: an entry whose
//! home bucket lies at or before the hole (accounting for wraparound) is
//! slid back into it, and the hole advances to the slot it vacated. The
//! walk stops at the first empty slot. This preserves the invariant that
//! every live key is reachable from its home bucket without crossing an
//! empty slot, so lookups stay two-outcome: match or truly absent.
//!
//! ## Growth and shrink
//!
//! The first insertion allocates 8 buckets. The table doubles when the
//! load factor would exceed 3/5 and, after an erase, shrinks to
//! `normalize((used + 1) * 5 / 3 + 1)` once the load factor drops below
//! 1/10 (never below 8 buckets). Capacity is capped at 2^29 buckets;
//! exceeding it is a contract violation and panics. Rehashing happens
//! atomically inside the triggering operation.
//!
//! ## Invariants
//!
//! 1. `bucket_count` is zero (no block) or a power of two in `8..=2^29`.
//! 2. The header's entry count equals the number of occupied slots.
//! 3. For every occupied slot, every slot on the circular path from the
//!    entry's home bucket to its actual slot is occupied.
//! 4. No occupied slot holds the sentinel key.
//!
//! Iteration starts at a random bucket (see [`FlatHashTable::iter`]) so
//! callers cannot come to depend on an order that would change across
//! resizes.

use alloc::alloc::handle_alloc_error;
use core::alloc::Layout;
use core::fmt::Debug;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;
use core::slice;

use cfg_if::cfg_if;

use crate::node::Node;
use crate::node::is_key_empty;

/// Smallest bucket count the table ever allocates.
const MIN_BUCKET_COUNT: u32 = 8;

/// Largest supported bucket count. Requesting more is a contract violation.
const MAX_BUCKET_COUNT: u32 = 1 << 29;

/// Mixes a user-supplied hash into a well-distributed 32-bit value.
///
/// This is the Murmur3 32-bit finalizer applied to the low 32 bits of `h`.
/// The table derives home buckets from the mixed value, so the quality of
/// the caller's hasher only matters up to collisions in the low 32 bits.
#[inline]
pub fn randomize_hash(h: u64) -> u32 {
    let mut x = h as u32;
    x ^= x >> 16;
    x = x.wrapping_mul(0x85eb_ca6b);
    x ^= x >> 13;
    x = x.wrapping_mul(0xc2b2_ae35);
    x ^= x >> 16;
    x
}

cfg_if! {
    if #[cfg(feature = "deterministic-iteration")] {
        #[inline(always)]
        fn first_bucket(mask: u32) -> u32 {
            let _ = mask;
            0
        }
    } else {
        #[inline(always)]
        fn first_bucket(mask: u32) -> u32 {
            rand::random::<u32>() & mask
        }
    }
}

/// Block header preceding the node array.
#[repr(C)]
struct Header {
    used_node_count: u32,
    bucket_count_mask: u32,
}

#[derive(Clone, Copy)]
struct DataLayout {
    layout: Layout,
    nodes_offset: usize,
}

impl DataLayout {
    fn new<N>(bucket_count: u32) -> Self {
        let nodes =
            Layout::array::<N>(bucket_count as usize).expect("allocation size overflow");
        let (layout, nodes_offset) = Layout::new::<Header>()
            .extend(nodes)
            .expect("allocation size overflow");
        DataLayout {
            layout: layout.pad_to_align(),
            nodes_offset,
        }
    }
}

#[inline(always)]
fn nodes_offset<N>() -> usize {
    Layout::new::<Header>()
        .extend(Layout::new::<N>())
        .expect("allocation size overflow")
        .1
}

/// A flat open-addressed hash table over slots of shape `N`.
///
/// The table owns at most one heap block; before the first insertion (and
/// after [`clear`](FlatHashTable::clear)) it owns none and occupies a
/// single pointer.
///
/// Every operation that may need to relocate entries takes a `rehash`
/// closure mapping a stored key back to its hash. Callers must pass
/// closures consistent with the hashes used at insertion, and the `eq`
/// closures must never match the sentinel (default) key.
pub struct FlatHashTable<N: Node> {
    inner: Option<NonNull<u8>>,
    _marker: PhantomData<N>,
}

// SAFETY: the table exclusively owns its storage block. Sending the table
// transfers unique ownership of the nodes; sharing it only hands out shared
// references to them.
unsafe impl<N: Node + Send> Send for FlatHashTable<N> {}
// SAFETY: see above.
unsafe impl<N: Node + Sync> Sync for FlatHashTable<N> {}

impl<N: Node> FlatHashTable<N> {
    /// Creates an empty table without allocating.
    pub const fn new() -> Self {
        Self {
            inner: None,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    fn header(&self) -> Option<&Header> {
        // SAFETY: a present pointer always addresses a live block whose
        // first bytes are the header.
        self.inner.map(|ptr| unsafe { ptr.cast::<Header>().as_ref() })
    }

    #[inline(always)]
    fn used_mut(&mut self) -> &mut u32 {
        let mut ptr = self.inner.expect("no storage block allocated");
        // SAFETY: a present pointer always addresses a live block whose
        // first bytes are the header, and `&mut self` grants exclusivity.
        unsafe { &mut ptr.cast::<Header>().as_mut().used_node_count }
    }

    #[inline(always)]
    fn mask(&self) -> u32 {
        self.header()
            .expect("no storage block allocated")
            .bucket_count_mask
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.header().map_or(0, |h| h.used_node_count as usize)
    }

    /// Returns `true` if the table holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of buckets, zero before the first insertion.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.header()
            .map_or(0, |h| h.bucket_count_mask as usize + 1)
    }

    #[inline(always)]
    fn nodes(&self) -> &[N] {
        match self.inner {
            None => &[],
            // SAFETY: the block holds `mask + 1` initialized nodes starting
            // at the layout's node offset.
            Some(ptr) => unsafe {
                let count = ptr.cast::<Header>().as_ref().bucket_count_mask as usize + 1;
                slice::from_raw_parts(ptr.as_ptr().add(nodes_offset::<N>()).cast(), count)
            },
        }
    }

    #[inline(always)]
    fn nodes_mut(&mut self) -> &mut [N] {
        match self.inner {
            None => &mut [],
            // SAFETY: as in `nodes`; `&mut self` grants exclusivity.
            Some(ptr) => unsafe {
                let count = ptr.cast::<Header>().as_ref().bucket_count_mask as usize + 1;
                slice::from_raw_parts_mut(ptr.as_ptr().add(nodes_offset::<N>()).cast(), count)
            },
        }
    }

    #[inline(always)]
    fn home_bucket(&self, hash: u64) -> u32 {
        randomize_hash(hash) & self.mask()
    }

    /// Walks the probe chain for `hash`, returning the bucket whose key
    /// matches `eq`, or `None` at the first empty slot.
    #[inline]
    fn find_bucket(&self, hash: u64, eq: impl Fn(&N::Key) -> bool) -> Option<u32> {
        if self.len() == 0 {
            return None;
        }
        let mask = self.mask();
        let nodes = self.nodes();
        let mut bucket = randomize_hash(hash) & mask;
        loop {
            let node = &nodes[bucket as usize];
            if eq(node.key()) {
                return Some(bucket);
            }
            if node.is_empty() {
                return None;
            }
            bucket = (bucket + 1) & mask;
        }
    }

    /// Finds the node whose key matches `eq`.
    ///
    /// `eq` must never return `true` for the sentinel (default) key;
    /// lookups for the sentinel belong to the wrappers, which answer them
    /// with a miss without probing.
    ///
    /// # Arguments
    ///
    /// * `hash` - The hash of the key to search for
    /// * `eq` - A predicate that returns `true` for the stored key
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&N::Key) -> bool) -> Option<&N> {
        let bucket = self.find_bucket(hash, eq)?;
        Some(&self.nodes()[bucket as usize])
    }

    /// Finds the node whose key matches `eq`, returning a mutable
    /// reference.
    ///
    /// The reference allows in-place mutation of the payload; the key must
    /// not be altered through it.
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&N::Key) -> bool) -> Option<&mut N> {
        let bucket = self.find_bucket(hash, eq)?;
        Some(&mut self.nodes_mut()[bucket as usize])
    }

    /// Locates the slot for a key, growing the table first if needed.
    ///
    /// Returns [`Entry::Occupied`] for a present key and [`Entry::Vacant`]
    /// for an absent one; the vacant arm inserts without re-probing and
    /// without having constructed a payload up front.
    ///
    /// # Arguments
    ///
    /// * `hash` - The hash of the key being looked up
    /// * `eq` - A predicate that returns `true` for the stored key
    /// * `rehash` - Maps any stored key back to its hash; used when the
    ///   lookup triggers a resize
    pub fn entry(
        &mut self,
        hash: u64,
        eq: impl Fn(&N::Key) -> bool,
        rehash: impl Fn(&N::Key) -> u64,
    ) -> Entry<'_, N> {
        self.try_grow(&rehash);
        let mask = self.mask();
        let mut bucket = randomize_hash(hash) & mask;
        let occupied = loop {
            let node = &self.nodes()[bucket as usize];
            if eq(node.key()) {
                break true;
            }
            if node.is_empty() {
                break false;
            }
            bucket = (bucket + 1) & mask;
        };
        if occupied {
            Entry::Occupied(OccupiedEntry {
                table: self,
                bucket,
            })
        } else {
            Entry::Vacant(VacantEntry {
                table: self,
                bucket,
            })
        }
    }

    /// Removes the entry whose key matches `eq` and returns its key and
    /// payload.
    ///
    /// The vacated slot is healed by backward shifting, and the table may
    /// shrink afterwards.
    pub fn remove(
        &mut self,
        hash: u64,
        eq: impl Fn(&N::Key) -> bool,
        rehash: impl Fn(&N::Key) -> u64,
    ) -> Option<(N::Key, N::Value)> {
        let bucket = self.find_bucket(hash, eq)?;
        let entry = self.erase_node(bucket, &rehash);
        self.try_shrink(&rehash);
        Some(entry)
    }

    /// Ensures the table can hold `size` entries without growing.
    ///
    /// Never shrinks.
    ///
    /// # Panics
    ///
    /// Panics if the required bucket count would exceed 2^29.
    pub fn reserve(&mut self, size: usize, rehash: impl Fn(&N::Key) -> u64) {
        if size == 0 {
            return;
        }
        assert!(
            size <= MAX_BUCKET_COUNT as usize,
            "requested capacity exceeds the 2^29 bucket limit"
        );
        let want = normalize(size as u32 * 5 / 3 + 1);
        if want as usize > self.bucket_count() {
            self.resize(want, &rehash);
        }
    }

    /// Removes every entry and releases the storage block, returning the
    /// table to its unallocated state.
    pub fn clear(&mut self) {
        if let Some(ptr) = self.inner.take() {
            // SAFETY: the pointer was the table's live block, and after
            // `take` nothing else refers to it.
            unsafe { Self::free_block(ptr) };
        }
    }

    /// Retains only the entries for which `keep` returns `true`.
    ///
    /// Every occupied slot is visited exactly once, including entries that
    /// backward shifting relocates mid-traversal; `keep` may mutate the
    /// payload of the nodes it inspects but must leave keys untouched. One
    /// shrink check runs at the end.
    pub fn retain(
        &mut self,
        mut keep: impl FnMut(&mut N) -> bool,
        rehash: impl Fn(&N::Key) -> u64,
    ) {
        if self.is_empty() {
            return;
        }
        let bucket_count = self.bucket_count() as u32;
        let mask = self.mask();

        // Pick a cut point that no probe chain crosses: the first empty
        // slot at or after a randomly chosen occupied one (in array order),
        // or the last empty slot scanning backward when the tail of the
        // array is fully occupied. Entries relocated by backward shifting
        // then land only in slots this traversal has not visited yet.
        let mut start = first_bucket(mask);
        while self.nodes()[start as usize].is_empty() {
            start = (start + 1) & mask;
        }
        let mut cut = start;
        while cut < bucket_count && !self.nodes()[cut as usize].is_empty() {
            cut += 1;
        }
        if cut == bucket_count {
            // The load factor stays below one, so an empty slot exists
            // before `start`.
            loop {
                cut -= 1;
                if self.nodes()[cut as usize].is_empty() {
                    break;
                }
            }
        }

        let mut i = cut;
        while i < bucket_count {
            let node = &mut self.nodes_mut()[i as usize];
            if !node.is_empty() && !keep(node) {
                self.erase_node(i, &rehash);
            } else {
                i += 1;
            }
        }
        let mut i = 0;
        while i < cut {
            let node = &mut self.nodes_mut()[i as usize];
            if !node.is_empty() && !keep(node) {
                self.erase_node(i, &rehash);
            } else {
                i += 1;
            }
        }
        self.try_shrink(&rehash);
    }

    /// Returns an iterator over the occupied nodes.
    ///
    /// The walk starts at a uniformly random bucket and proceeds
    /// circularly, so the order differs from call to call by design. Each
    /// entry is yielded exactly once.
    pub fn iter(&self) -> Iter<'_, N> {
        if self.len() == 0 {
            return Iter {
                nodes: &[],
                start: 0,
                cur: None,
                remaining: 0,
            };
        }
        let mask = self.mask();
        let nodes = self.nodes();
        let mut bucket = first_bucket(mask);
        while nodes[bucket as usize].is_empty() {
            bucket = (bucket + 1) & mask;
        }
        Iter {
            nodes,
            start: bucket,
            cur: Some(bucket),
            remaining: self.len(),
        }
    }

    /// Creates a copy of the table with the same bucket count.
    ///
    /// The engine does not own a hasher, so cloning takes the `rehash`
    /// closure the same way the mutating operations do; the wrappers build
    /// their `Clone` impls on top of this.
    pub fn clone_with(&self, rehash: impl Fn(&N::Key) -> u64) -> Self
    where
        N: Clone,
    {
        let mut copy = Self::new();
        if self.len() == 0 {
            return copy;
        }
        copy.inner = Some(Self::allocate(self.bucket_count() as u32));
        let mask = copy.mask();
        for node in self.nodes().iter().filter(|node| !node.is_empty()) {
            let mut bucket = randomize_hash(rehash(node.key())) & mask;
            while !copy.nodes()[bucket as usize].is_empty() {
                bucket = (bucket + 1) & mask;
            }
            copy.nodes_mut()[bucket as usize].clone_from(node);
        }
        *copy.used_mut() = self.len() as u32;
        copy
    }

    fn try_grow(&mut self, rehash: &impl Fn(&N::Key) -> u64) {
        let Some(header) = self.header() else {
            self.resize(MIN_BUCKET_COUNT, rehash);
            return;
        };
        let (used, mask) = (header.used_node_count, header.bucket_count_mask);
        if used * 5 > mask * 3 {
            self.resize((mask + 1) * 2, rehash);
        }
    }

    fn try_shrink(&mut self, rehash: &impl Fn(&N::Key) -> u64) {
        let header = self.header().expect("no storage block allocated");
        let (used, mask) = (header.used_node_count, header.bucket_count_mask);
        if used * 10 < mask && mask > 7 {
            self.resize(normalize((used + 1) * 5 / 3 + 1), rehash);
        }
    }

    /// Replaces the storage block with one of `new_bucket_count` buckets and
    /// re-inserts every entry under the new mask.
    #[cold]
    fn resize(&mut self, new_bucket_count: u32, rehash: &impl Fn(&N::Key) -> u64) {
        let new_block = Self::allocate(new_bucket_count);
        let old_block = mem::replace(&mut self.inner, Some(new_block));
        let Some(old_ptr) = old_block else {
            return;
        };

        // SAFETY: `old_ptr` is the block we just detached; its header and
        // node array are live and nothing else references them.
        let (old_count, old_used) = unsafe {
            let h = old_ptr.cast::<Header>().as_ref();
            (h.bucket_count_mask as usize + 1, h.used_node_count)
        };
        *self.used_mut() = old_used;
        // SAFETY: as above; the old node array is disjoint from the new
        // block the table now owns.
        let old_nodes: &mut [N] = unsafe {
            slice::from_raw_parts_mut(
                old_ptr.as_ptr().add(nodes_offset::<N>()).cast(),
                old_count,
            )
        };

        let mask = self.mask();
        for old_node in old_nodes.iter_mut() {
            if old_node.is_empty() {
                continue;
            }
            // The new block has no deletions, so probing to the first empty
            // slot re-establishes the chain invariant directly.
            let mut bucket = randomize_hash(rehash(old_node.key())) & mask;
            while !self.nodes()[bucket as usize].is_empty() {
                bucket = (bucket + 1) & mask;
            }
            self.nodes_mut()[bucket as usize].move_from(old_node);
        }

        // SAFETY: every occupied node was moved out above, so the old block
        // holds only empty nodes and can be torn down.
        unsafe { Self::free_block(old_ptr) };
    }

    /// Vacates the occupied slot at `index`, returning its entry, then
    /// restores the probe-chain invariant by backward shifting.
    fn erase_node(&mut self, index: u32, rehash: &impl Fn(&N::Key) -> u64) -> (N::Key, N::Value) {
        let bucket_count = self.bucket_count() as u32;
        debug_assert!(index < bucket_count);
        let entry = self.nodes_mut()[index as usize].take();
        *self.used_mut() -= 1;

        // `empty_i` and `test_i` are linearized (they run past the array
        // end instead of wrapping) so the home-bucket comparison below can
        // reason about wraparound with plain arithmetic. `empty_bucket` and
        // `test_bucket` are their wrapped counterparts.
        let mut empty_i = index;
        let mut empty_bucket = index;
        let mut test_i = index;
        loop {
            test_i += 1;
            let mut test_bucket = test_i;
            if test_bucket >= bucket_count {
                test_bucket -= bucket_count;
            }
            if self.nodes()[test_bucket as usize].is_empty() {
                break;
            }
            let mut want_i = self.home_bucket(rehash(self.nodes()[test_bucket as usize].key()));
            if want_i < empty_i {
                want_i += bucket_count;
            }
            // The entry slides back iff the hole lies on its probe path:
            // its home is at or before the hole, or past `test_i` because
            // the chain wrapped. An entry homed strictly between the hole
            // and its slot must stay, or a later lookup would lose it.
            if want_i <= empty_i || want_i > test_i {
                let (dst, src) = (empty_bucket as usize, test_bucket as usize);
                let nodes = self.nodes_mut();
                if dst < src {
                    let (head, tail) = nodes.split_at_mut(src);
                    head[dst].move_from(&mut tail[0]);
                } else {
                    let (head, tail) = nodes.split_at_mut(dst);
                    tail[0].move_from(&mut head[src]);
                }
                empty_i = test_i;
                empty_bucket = test_bucket;
            }
        }
        entry
    }

    fn allocate(bucket_count: u32) -> NonNull<u8> {
        debug_assert!(bucket_count >= MIN_BUCKET_COUNT);
        debug_assert!(bucket_count.is_power_of_two());
        assert!(
            bucket_count <= MAX_BUCKET_COUNT,
            "bucket count exceeds the 2^29 limit"
        );
        let layout = DataLayout::new::<N>(bucket_count);
        // SAFETY: the layout has non-zero size (it always contains the
        // header). A null return is routed to `handle_alloc_error`, and
        // every byte written below lies inside the allocation.
        unsafe {
            let raw = alloc::alloc::alloc(layout.layout);
            if raw.is_null() {
                handle_alloc_error(layout.layout);
            }
            raw.cast::<Header>().write(Header {
                used_node_count: 0,
                bucket_count_mask: bucket_count - 1,
            });
            let nodes = raw.add(layout.nodes_offset).cast::<N>();
            for i in 0..bucket_count as usize {
                nodes.add(i).write(N::new());
            }
            NonNull::new_unchecked(raw)
        }
    }

    /// Drops every node in the block and deallocates it.
    ///
    /// # Safety
    ///
    /// `ptr` must be a block previously returned by `allocate` that nothing
    /// else references.
    unsafe fn free_block(ptr: NonNull<u8>) {
        // SAFETY: per the contract, the header and all `mask + 1` nodes are
        // live; each node is dropped exactly once before the block is
        // released with the layout it was allocated with.
        unsafe {
            let bucket_count = ptr.cast::<Header>().as_ref().bucket_count_mask + 1;
            let layout = DataLayout::new::<N>(bucket_count);
            let nodes = ptr.as_ptr().add(layout.nodes_offset).cast::<N>();
            for i in 0..bucket_count as usize {
                core::ptr::drop_in_place(nodes.add(i));
            }
            alloc::alloc::dealloc(ptr.as_ptr(), layout.layout);
        }
    }
}

#[inline(always)]
fn normalize(size: u32) -> u32 {
    size.next_power_of_two().max(MIN_BUCKET_COUNT)
}

impl<N: Node> Default for FlatHashTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> Debug for FlatHashTable<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlatHashTable")
            .field("len", &self.len())
            .field("bucket_count", &self.bucket_count())
            .finish_non_exhaustive()
    }
}

impl<N: Node> Drop for FlatHashTable<N> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// The result of a slot lookup via [`FlatHashTable::entry`].
pub enum Entry<'a, N: Node> {
    /// The key is present; the entry points at its slot.
    Occupied(OccupiedEntry<'a, N>),
    /// The key is absent; the entry points at the slot it would occupy.
    Vacant(VacantEntry<'a, N>),
}

/// A slot holding the looked-up key.
pub struct OccupiedEntry<'a, N: Node> {
    table: &'a mut FlatHashTable<N>,
    bucket: u32,
}

impl<'a, N: Node> OccupiedEntry<'a, N> {
    /// Returns a reference to the occupied node.
    pub fn get(&self) -> &N {
        &self.table.nodes()[self.bucket as usize]
    }

    /// Returns a mutable reference to the occupied node.
    ///
    /// The payload may be mutated in place; the key must stay untouched.
    pub fn get_mut(&mut self) -> &mut N {
        &mut self.table.nodes_mut()[self.bucket as usize]
    }

    /// Converts the entry into a mutable reference tied to the table
    /// borrow.
    pub fn into_mut(self) -> &'a mut N {
        &mut self.table.nodes_mut()[self.bucket as usize]
    }

    /// Removes the entry, returning its key and payload.
    ///
    /// The vacated slot is healed by backward shifting and a shrink check
    /// runs afterwards. `rehash` must be consistent with the hashes the
    /// entries were inserted under.
    pub fn remove(self, rehash: impl Fn(&N::Key) -> u64) -> (N::Key, N::Value) {
        let entry = self.table.erase_node(self.bucket, &rehash);
        self.table.try_shrink(&rehash);
        entry
    }
}

/// A slot ready to receive the looked-up key.
pub struct VacantEntry<'a, N: Node> {
    table: &'a mut FlatHashTable<N>,
    bucket: u32,
}

impl<'a, N: Node> VacantEntry<'a, N> {
    /// Fills the slot with `key` and `value`.
    ///
    /// `key` must be the key the entry was located with.
    ///
    /// # Panics
    ///
    /// Panics if `key` is the empty sentinel (the key type's default
    /// value).
    pub fn insert(self, key: N::Key, value: N::Value) -> &'a mut N {
        assert!(
            !is_key_empty(&key),
            "the default key value is reserved as the empty-slot marker"
        );
        let bucket = self.bucket as usize;
        let table = self.table;
        table.nodes_mut()[bucket].emplace(key, value);
        *table.used_mut() += 1;
        &mut table.nodes_mut()[bucket]
    }
}

/// An iterator over the occupied nodes of a [`FlatHashTable`].
///
/// Starts at a random bucket and walks the array circularly; see the
/// module docs for why the order is deliberately unstable.
pub struct Iter<'a, N: Node> {
    nodes: &'a [N],
    start: u32,
    cur: Option<u32>,
    remaining: usize,
}

impl<'a, N: Node> Iterator for Iter<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<&'a N> {
        let cur = self.cur?;
        let item = &self.nodes[cur as usize];
        let mask = self.nodes.len() as u32 - 1;
        let mut next = cur;
        self.cur = loop {
            next = (next + 1) & mask;
            if next == self.start {
                break None;
            }
            if !self.nodes[next as usize].is_empty() {
                break Some(next);
            }
        };
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<N: Node> ExactSizeIterator for Iter<'_, N> {}
