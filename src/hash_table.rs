//! The raw open-addressed table underneath [`HashMap`](crate::HashMap).
//!
//! `HashTable<V>` knows nothing about keys. Every operation takes the hash of
//! the value being looked for and an equality predicate, which keeps the
//! probing logic independent of how callers hash or compare.
//!
//! Collisions are resolved with triangular quadratic probing: attempt `i`
//! inspects slot `(hash + (i*i + i) / 2) mod capacity`. The slot count is
//! always a power of two, so the first `capacity` attempts visit every slot
//! exactly once. Removal leaves a tombstone so that probe chains passing
//! through the removed slot stay intact; tombstones are reused by later
//! inserts and dropped on resize.
use alloc::vec::Vec;
use core::fmt::Debug;

/// Maximum load factor, as a ratio: an insert never leaves the table more
/// than 4/5 full.
const MAX_LOAD_NUMERATOR: u128 = 4;
const MAX_LOAD_DENOMINATOR: u128 = 5;

#[inline(always)]
fn exceeds_max_load(populated: usize, slots: usize) -> bool {
    populated as u128 * MAX_LOAD_DENOMINATOR > slots as u128 * MAX_LOAD_NUMERATOR
}

/// Rounds a requested capacity up to the slot count actually allocated.
#[inline(always)]
fn slots_for(requested: usize) -> usize {
    requested
        .max(1)
        .checked_next_power_of_two()
        .expect("capacity overflow")
}

fn empty_slots<V>(len: usize) -> Vec<Slot<V>> {
    let mut slots = Vec::with_capacity(len);
    slots.resize_with(len, || Slot::Empty);
    slots
}

#[derive(Clone)]
enum Slot<V> {
    Empty,
    Live { hash: u64, value: V },
    Tombstone,
}

/// Triangular probe sequence over a power-of-two table.
///
/// Yields `hash, hash + 1, hash + 3, hash + 6, ...` masked to the table, and
/// stops after `mask + 1` positions.
struct ProbeSeq {
    pos: usize,
    stride: usize,
    remaining: usize,
    mask: usize,
}

impl ProbeSeq {
    #[inline(always)]
    fn new(hash: u64, mask: usize) -> Self {
        Self {
            pos: hash as usize & mask,
            stride: 0,
            remaining: mask.wrapping_add(1),
            mask,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let pos = self.pos;
        self.stride += 1;
        self.pos = self.pos.wrapping_add(self.stride) & self.mask;
        Some(pos)
    }
}

/// Outcome of walking a probe sequence for a value.
enum Probe {
    Found(usize),
    /// The value is not in the table. `insert_at` is the first tombstone or
    /// empty slot seen on the walk, if any.
    Absent { insert_at: Option<usize> },
}

/// Debug statistics for hash table analysis.
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries
    pub populated: usize,
    /// Total number of slots allocated
    pub capacity: usize,
    /// Number of tombstoned slots
    pub tombstones: usize,
    /// Number of never-used (or cleared) slots
    pub empty: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Longest probe walk needed to reach a live entry, in attempts
    pub max_probe_length: usize,
    /// Mean number of attempts needed to reach a live entry
    pub mean_probe_length: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Slots: {} live, {} tombstoned, {} empty",
            self.populated, self.tombstones, self.empty
        );
        println!(
            "Probe length: max {}, mean {:.03}",
            self.max_probe_length, self.mean_probe_length
        );
    }
}

/// An open-addressed hash table using triangular quadratic probing.
///
/// `HashTable<V>` stores values of type `V`. Like `hashbrown::HashTable`, it
/// does not hash anything itself: each operation is given the value's hash
/// and an equality predicate.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use siphasher::sip::SipHasher;
/// # use tri_probe::hash_table::Entry;
/// # use tri_probe::hash_table::HashTable;
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
/// #
/// let mut table = HashTable::with_capacity(16);
/// let hash = hash_id(7);
///
/// match table.entry(hash, |&(id, _): &(u64, u32)| id == 7) {
///     Entry::Vacant(entry) => {
///         entry.insert((7, 70));
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(hash, |&(id, _)| id == 7), Some(&(7, 70)));
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    slots: Vec<Slot<V>>,
    populated: usize,
    tombstones: usize,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        f.debug_struct("HashTable")
            .field(
                "slots",
                &self
                    .slots
                    .chunks(16)
                    .map(|row| {
                        row.iter()
                            .map(|slot| match slot {
                                Slot::Empty => "..".to_string(),
                                Slot::Tombstone => "xx".to_string(),
                                Slot::Live { hash, .. } => format!("{:02x}", *hash as u8),
                            })
                            .collect::<Vec<String>>()
                            .join(", ")
                    })
                    .collect::<Vec<_>>(),
            )
            .field("populated", &self.populated)
            .field("tombstones", &self.tombstones)
            .field("capacity", &self.slots.len())
            .finish()
    }
}

impl<V> HashTable<V> {
    /// Creates a new hash table with room for at least `capacity` slots.
    ///
    /// The slot count is rounded up to the next power of two (minimum 1).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tri_probe::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: empty_slots(slots_for(capacity)),
            populated: 0,
            tombstones: 0,
        }
    }

    /// Returns the number of live values in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no live values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of slots in the table. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstoned slots.
    ///
    /// Tombstones are left behind by removals and are cleared when the table
    /// grows or when an insert reuses the slot.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Ratio of live values to slots.
    pub fn load_factor(&self) -> f64 {
        self.populated as f64 / self.slots.len() as f64
    }

    /// Returns an iterator over all live values, in slot order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Removes every value from the table, keeping its capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tri_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.entry(1, |&v: &u64| v == 1).or_insert(1);
    /// table.entry(2, |&v: &u64| v == 2).or_insert(2);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.populated = 0;
        self.tombstones = 0;
    }

    /// Returns a reference to the value matching `hash` and `eq`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tri_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.entry(42, |&v: &u64| v == 42).or_insert(42);
    ///
    /// assert_eq!(table.find(42, |&v| v == 42), Some(&42));
    /// assert_eq!(table.find(43, |&v| v == 43), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        if self.populated == 0 {
            return None;
        }

        match self.resolve(hash, eq) {
            Probe::Found(index) => Some(self.live(index)),
            Probe::Absent { .. } => None,
        }
    }

    /// Returns a mutable reference to the value matching `hash` and `eq`, if
    /// any.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        if self.populated == 0 {
            return None;
        }

        match self.resolve(hash, eq) {
            Probe::Found(index) => Some(self.live_mut(index)),
            Probe::Absent { .. } => None,
        }
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// The slot becomes a tombstone, so values whose probe chains pass
    /// through it remain reachable. Returns `None` and leaves the table
    /// untouched if no value matches.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tri_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.entry(42, |&v: &u64| v == 42).or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&v| v == 42), Some(42));
    /// assert_eq!(table.remove(42, |&v| v == 42), None);
    /// assert_eq!(table.tombstones(), 1);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        if self.populated == 0 {
            return None;
        }

        match self.resolve(hash, eq) {
            Probe::Found(index) => Some(self.take_live(index)),
            Probe::Absent { .. } => None,
        }
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// Looking up a value that is already present never resizes the table.
    /// For a vacant entry the table first grows if one more value would push
    /// it past its maximum load, so the returned [`VacantEntry`] always
    /// points at a usable slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tri_probe::hash_table::Entry;
    /// # use tri_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    ///
    /// match table.entry(5, |&(k, _): &(u64, u32)| k == 5) {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert((5, 1));
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         entry.get_mut().1 += 1;
    ///     }
    /// }
    ///
    /// table.entry(5, |&(k, _)| k == 5).or_insert((5, 0)).1 += 1;
    /// assert_eq!(table.find(5, |&(k, _)| k == 5), Some(&(5, 2)));
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        match self.resolve(hash, eq) {
            Probe::Found(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Probe::Absent { insert_at } => {
                let index = self.vacant_slot(hash, insert_at);
                Entry::Vacant(VacantEntry {
                    table: self,
                    hash,
                    index,
                })
            }
        }
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Walks the probe sequence for `hash`.
    ///
    /// An empty slot ends the walk: by construction no live value can sit
    /// beyond the first empty slot of its own chain. Tombstones and
    /// non-matching values are stepped over.
    fn resolve(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Probe {
        let mut insert_at = None;
        for index in ProbeSeq::new(hash, self.mask()) {
            match &self.slots[index] {
                Slot::Empty => {
                    return Probe::Absent {
                        insert_at: insert_at.or(Some(index)),
                    };
                }
                Slot::Live { hash: stored, value } if *stored == hash && eq(value) => {
                    return Probe::Found(index);
                }
                Slot::Live { .. } => {}
                Slot::Tombstone => {
                    insert_at = insert_at.or(Some(index));
                }
            }
        }

        Probe::Absent { insert_at }
    }

    /// First slot on the probe sequence for `hash` that is empty or
    /// tombstoned.
    fn find_insert_slot(&self, hash: u64) -> Option<usize> {
        ProbeSeq::new(hash, self.mask())
            .find(|&index| !matches!(self.slots[index], Slot::Live { .. }))
    }

    fn vacant_slot(&mut self, hash: u64, mut insert_at: Option<usize>) -> usize {
        if exceeds_max_load(self.populated + 1, self.slots.len()) {
            self.grow();
            insert_at = self.find_insert_slot(hash);
        }

        loop {
            if let Some(index) = insert_at {
                return index;
            }
            // Every slot on the chain is live. The load bound rules this out,
            // but growing always makes room.
            self.grow();
            insert_at = self.find_insert_slot(hash);
        }
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self) {
        let doubled = self
            .slots
            .len()
            .checked_mul(2)
            .expect("capacity overflow");
        self.resize(slots_for(doubled));
    }

    /// Moves every live value into a fresh array of `new_len` slots.
    ///
    /// Values are re-placed from their stored hashes; tombstones are dropped.
    fn resize(&mut self, new_len: usize) {
        debug_assert!(new_len.is_power_of_two());
        debug_assert!(new_len > self.populated);

        let old_slots = core::mem::replace(&mut self.slots, empty_slots(new_len));
        log::trace!(
            "growing table from {} to {} slots ({} live, {} tombstones dropped)",
            old_slots.len(),
            new_len,
            self.populated,
            self.tombstones
        );

        self.populated = 0;
        self.tombstones = 0;
        for slot in old_slots {
            if let Slot::Live { hash, value } = slot {
                let Some(index) = self.find_insert_slot(hash) else {
                    unreachable!("a grown table always has a free slot");
                };
                self.slots[index] = Slot::Live { hash, value };
                self.populated += 1;
            }
        }
    }

    fn live(&self, index: usize) -> &V {
        match &self.slots[index] {
            Slot::Live { value, .. } => value,
            _ => unreachable!("slot {index} is not live"),
        }
    }

    fn live_mut(&mut self, index: usize) -> &mut V {
        match &mut self.slots[index] {
            Slot::Live { value, .. } => value,
            _ => unreachable!("slot {index} is not live"),
        }
    }

    fn take_live(&mut self, index: usize) -> V {
        match core::mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Live { value, .. } => {
                self.populated -= 1;
                self.tombstones += 1;
                value
            }
            _ => unreachable!("slot {index} is not live"),
        }
    }

    /// Panics if the counters, the load bound or any live value's probe
    /// chain is inconsistent.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert!(self.slots.len().is_power_of_two());
        assert!(!exceeds_max_load(self.populated, self.slots.len()));

        let mut live = 0;
        let mut tombstones = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Empty => {}
                Slot::Tombstone => tombstones += 1,
                Slot::Live { hash, .. } => {
                    live += 1;
                    let mut reached = false;
                    for pos in ProbeSeq::new(*hash, self.mask()) {
                        if pos == index {
                            reached = true;
                            break;
                        }
                        assert!(
                            !matches!(self.slots[pos], Slot::Empty),
                            "empty slot {pos} cuts off live slot {index}"
                        );
                    }
                    assert!(reached, "slot {index} is not on its own probe sequence");
                }
            }
        }
        assert_eq!(live, self.populated);
        assert_eq!(tombstones, self.tombstones);
    }

    /// Number of probe attempts needed to reach slot `index` from `hash`.
    #[cfg(any(test, feature = "stats"))]
    fn probe_length(&self, hash: u64, index: usize) -> usize {
        ProbeSeq::new(hash, self.mask())
            .position(|pos| pos == index)
            .map_or(self.slots.len(), |attempt| attempt + 1)
    }

    /// Computes a histogram of probe lengths for the current table state.
    ///
    /// Entry `n` counts the live values that a lookup reaches on its `n`-th
    /// attempt, so index 0 is always zero and index 1 holds the values that
    /// sit in their home slot.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; 2];
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Live { hash, .. } = slot {
                let length = self.probe_length(*hash, index);
                if hist.len() <= length {
                    hist.resize(length + 1, 0);
                }
                hist[length] += 1;
            }
        }
        hist
    }

    /// Collects statistics about slot usage and probe lengths.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let hist = self.probe_histogram();
        let total_probes: usize = hist
            .iter()
            .enumerate()
            .map(|(length, count)| length * count)
            .sum();

        DebugStats {
            populated: self.populated,
            capacity: self.slots.len(),
            tombstones: self.tombstones,
            empty: self.slots.len() - self.populated - self.tombstones,
            load_factor: self.load_factor(),
            max_probe_length: hist.iter().rposition(|&count| count > 0).unwrap_or(0),
            mean_probe_length: if self.populated == 0 {
                0.0
            } else {
                total_probes as f64 / self.populated as f64
            },
        }
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type IntoIter = Iter<'a, V>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A view into a single entry in the table, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, V>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value in the entry.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }
}

/// A view into a vacant slot in a [`HashTable`].
///
/// The slot is the first empty or tombstoned position on the value's probe
/// sequence.
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
    index: usize,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Inserts `value` into the slot and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry { table, hash, index } = self;

        if matches!(table.slots[index], Slot::Tombstone) {
            table.tombstones -= 1;
        }
        table.populated += 1;
        debug_assert!(!exceeds_max_load(table.populated, table.slots.len()));

        table.slots[index] = Slot::Live { hash, value };
        table.live_mut(index)
    }
}

/// A view into an occupied slot in a [`HashTable`].
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.table.live(self.index)
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.live_mut(self.index)
    }

    /// Converts the entry into a mutable reference to the value with the
    /// lifetime of the table borrow.
    pub fn into_mut(self) -> &'a mut V {
        let OccupiedEntry { table, index } = self;
        table.live_mut(index)
    }

    /// Removes the value, leaving a tombstone in its slot.
    pub fn remove(self) -> V {
        self.table.take_live(self.index)
    }
}

/// An iterator over the live values of a [`HashTable`], in slot order.
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    slots: core::slice::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Live { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
