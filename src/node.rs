use core::mem;
use core::mem::MaybeUninit;

/// Returns `true` if `key` equals the empty sentinel, i.e. the key type's
/// default value.
///
/// The table reserves this value to mark unoccupied slots; it can never be
/// stored as a live key.
#[inline]
pub fn is_key_empty<K: Eq + Default>(key: &K) -> bool {
    *key == K::default()
}

/// The contract a slot payload must satisfy for the table engine.
///
/// A node either holds a live entry or is *empty*, and the two states are
/// distinguished solely by the key: a node is empty iff its key equals
/// `Key::default()`. The engine drives every occupancy transition through
/// this trait and never branches on the concrete node shape.
pub trait Node {
    /// The key stored in the slot. Its default value is the empty sentinel.
    type Key: Eq + Default;

    /// The payload carried alongside the key; `()` for set-shaped nodes.
    type Value;

    /// Creates an empty node.
    fn new() -> Self;

    /// Returns a reference to the slot's key. For an empty node this is the
    /// sentinel value.
    fn key(&self) -> &Self::Key;

    /// Returns `true` if the slot holds no entry.
    fn is_empty(&self) -> bool;

    /// Fills an empty node with `key` and `value`.
    ///
    /// `key` must not be the empty sentinel and the node must be empty.
    fn emplace(&mut self, key: Self::Key, value: Self::Value);

    /// Moves the entry out of an occupied node, leaving it empty.
    fn take(&mut self) -> (Self::Key, Self::Value);

    /// Destroys the entry of an occupied node, leaving it empty.
    fn clear(&mut self) {
        let _ = self.take();
    }

    /// Relocates the entry of `src` into this empty node, leaving `src`
    /// empty.
    fn move_from(&mut self, src: &mut Self);
}

/// A key-value slot. The value lives in uninitialized storage and is only a
/// live object while the slot is occupied.
pub struct MapNode<K: Eq + Default, V> {
    key: K,
    value: MaybeUninit<V>,
}

impl<K: Eq + Default, V> MapNode<K, V> {
    /// Returns a reference to the value of an occupied node.
    ///
    /// # Panics
    ///
    /// Panics if the node is empty.
    #[inline]
    pub fn value(&self) -> &V {
        assert!(!self.is_empty(), "value() called on an empty node");
        // SAFETY: the value is initialized whenever the key is not the
        // sentinel, which the assert above establishes.
        unsafe { self.value.assume_init_ref() }
    }

    /// Returns a mutable reference to the value of an occupied node.
    ///
    /// # Panics
    ///
    /// Panics if the node is empty.
    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        assert!(!self.is_empty(), "value_mut() called on an empty node");
        // SAFETY: the value is initialized whenever the key is not the
        // sentinel, which the assert above establishes.
        unsafe { self.value.assume_init_mut() }
    }

    /// Returns the key together with a mutable reference to the value.
    ///
    /// # Panics
    ///
    /// Panics if the node is empty.
    #[inline]
    pub fn key_value_mut(&mut self) -> (&K, &mut V) {
        assert!(!self.is_empty(), "key_value_mut() called on an empty node");
        // SAFETY: the value is initialized whenever the key is not the
        // sentinel, which the assert above establishes.
        (&self.key, unsafe { self.value.assume_init_mut() })
    }
}

impl<K: Eq + Default, V> Node for MapNode<K, V> {
    type Key = K;
    type Value = V;

    #[inline]
    fn new() -> Self {
        Self {
            key: K::default(),
            value: MaybeUninit::uninit(),
        }
    }

    #[inline]
    fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    fn is_empty(&self) -> bool {
        is_key_empty(&self.key)
    }

    #[inline]
    fn emplace(&mut self, key: K, value: V) {
        debug_assert!(self.is_empty());
        debug_assert!(!is_key_empty(&key));
        self.key = key;
        self.value.write(value);
    }

    #[inline]
    fn take(&mut self) -> (K, V) {
        debug_assert!(!self.is_empty());
        let key = mem::take(&mut self.key);
        // SAFETY: the node was occupied, so the value is initialized. The
        // key has been reset to the sentinel, so neither `Drop` nor a later
        // `take` will touch the value again.
        let value = unsafe { self.value.assume_init_read() };
        (key, value)
    }

    #[inline]
    fn move_from(&mut self, src: &mut Self) {
        debug_assert!(self.is_empty());
        let (key, value) = src.take();
        self.key = key;
        self.value.write(value);
    }
}

impl<K: Eq + Default, V> Drop for MapNode<K, V> {
    fn drop(&mut self) {
        if !self.is_empty() {
            // SAFETY: the value is initialized whenever the slot is
            // occupied.
            unsafe { self.value.assume_init_drop() }
        }
    }
}

impl<K: Eq + Default + Clone, V: Clone> Clone for MapNode<K, V> {
    fn clone(&self) -> Self {
        if self.is_empty() {
            Self::new()
        } else {
            Self {
                key: self.key.clone(),
                // SAFETY: the value is initialized whenever the slot is
                // occupied.
                value: MaybeUninit::new(unsafe { self.value.assume_init_ref() }.clone()),
            }
        }
    }
}

/// A key-only slot.
#[derive(Clone)]
pub struct SetNode<T: Eq + Default> {
    key: T,
}

impl<T: Eq + Default> Node for SetNode<T> {
    type Key = T;
    type Value = ();

    #[inline]
    fn new() -> Self {
        Self { key: T::default() }
    }

    #[inline]
    fn key(&self) -> &T {
        &self.key
    }

    #[inline]
    fn is_empty(&self) -> bool {
        is_key_empty(&self.key)
    }

    #[inline]
    fn emplace(&mut self, key: T, _value: ()) {
        debug_assert!(self.is_empty());
        debug_assert!(!is_key_empty(&key));
        self.key = key;
    }

    #[inline]
    fn take(&mut self) -> (T, ()) {
        debug_assert!(!self.is_empty());
        (mem::take(&mut self.key), ())
    }

    #[inline]
    fn move_from(&mut self, src: &mut Self) {
        debug_assert!(self.is_empty());
        debug_assert!(!src.is_empty());
        self.key = mem::take(&mut src.key);
    }
}
