//! SIEVE replacement policy.
//!
//! Tracks keys in an insertion-ordered ring (head = newest, tail = oldest)
//! with one persistent scan hand. Hits only flip a visited bit; insertion
//! never reorders existing entries.
//!
//! # Algorithm
//!
//! - On hit: set the visited bit
//! - On miss with room: insert at head, unvisited
//! - On miss at capacity: sweep from the hand (or the tail) towards the head,
//!   wrapping to the tail, clearing visited bits until an unvisited entry is
//!   found. That entry is evicted and the hand parks on its predecessor.
//!
//! # Complexity
//!
//! - Hit: O(1)
//! - Eviction: O(n) worst case, at most `len + 1` entries inspected

use std::{
    collections::{hash_map::RandomState, HashMap},
    hash::{BuildHasher, Hash},
    mem,
};

use tracing::trace;

use crate::{
    error::{PolicyError, Result},
    intrusive_dll::{IntrusiveList, IntrusiveNode},
};

#[derive(Debug, Clone)]
pub(crate) struct Entry<K> {
    pub(crate) key: K,
    pub(crate) visited: bool,
    prev_idx: Option<usize>,
    next_idx: Option<usize>,
}

impl<K> Entry<K> {
    fn new(key: K, visited: bool) -> Self {
        Self {
            key,
            visited,
            prev_idx: None,
            next_idx: None,
        }
    }
}

impl<K> IntrusiveNode for Entry<K> {
    fn prev(&self) -> Option<usize> {
        self.prev_idx
    }

    fn set_prev(&mut self, prev: Option<usize>) {
        self.prev_idx = prev
    }

    fn next(&self) -> Option<usize> {
        self.next_idx
    }

    fn set_next(&mut self, next: Option<usize>) {
        self.next_idx = next
    }
}

/// Number of index slots reserved for `capacity` keys.
///
/// Fails if `capacity` is not greater than 1 or if the scaled size does not
/// fit a non-negative 32-bit integer.
pub(crate) fn index_size(capacity: usize) -> Result<usize> {
    if capacity <= 1 {
        return Err(PolicyError::InvalidArgument(format!(
            "capacity must be greater than 1, got {capacity}"
        )));
    }
    capacity
        .checked_mul(4)
        .map(|scaled| scaled / 3)
        .filter(|&scaled| scaled <= i32::MAX as usize)
        .ok_or_else(|| {
            PolicyError::InvalidArgument(format!(
                "capacity {capacity} is too large to size the key index"
            ))
        })
}

/// SIEVE eviction policy over keys of type `K`.
///
/// Stores no values: callers report accesses and are told which key, if any,
/// fell out. Entries live in an arena and are linked by slot index, so the
/// hand is a plain slot number rather than a reference.
#[derive(Debug)]
pub struct SievePolicy<K, S = RandomState> {
    capacity: usize,
    entries: Vec<Entry<K>>,
    list: IntrusiveList,
    index: HashMap<K, usize, S>,
    hand: Option<usize>,
}

impl<K> SievePolicy<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hasher(capacity, RandomState::new())
    }
}

impl<K, S> SievePolicy<K, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Creates a policy whose key index hashes with `hasher`.
    pub fn with_hasher(capacity: usize, hasher: S) -> Result<Self> {
        let index_slots = index_size(capacity)?;
        Ok(Self::with_reserved(capacity, capacity, index_slots, hasher))
    }

    /// Capacity must already be validated.
    pub(crate) fn with_reserved(
        capacity: usize,
        entry_slots: usize,
        index_slots: usize,
        hasher: S,
    ) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(entry_slots),
            list: IntrusiveList::new(),
            index: HashMap::with_capacity_and_hasher(index_slots, hasher),
            hand: None,
        }
    }

    /// Records an access to `key` and returns the key evicted to make room
    /// for it, if any.
    pub fn access(&mut self, key: K) -> Option<K> {
        if let Some(&idx) = self.index.get(&key) {
            self.entries[idx].visited = true;
            return None;
        }

        if self.list.len() < self.capacity {
            let idx = self.entries.len();
            self.entries.push(Entry::new(key.clone(), false));
            self.list.insert_at_head(&mut self.entries, idx);
            self.index.insert(key, idx);
            return None;
        }

        let (victim, _) = self.evict();
        let evicted = mem::replace(&mut self.entries[victim], Entry::new(key.clone(), false));
        self.list.insert_at_head(&mut self.entries, victim);
        self.index.insert(key, victim);
        Some(evicted.key)
    }

    /// Selects and unlinks a victim. Returns its slot and the number of
    /// entries inspected to find it. The slot's key is left in place for the
    /// caller to take.
    pub(crate) fn evict(&mut self) -> (usize, usize) {
        let mut cursor = self
            .hand
            .or_else(|| self.list.peek_tail())
            .expect("Invariant broken: evicting from an empty ring");
        let mut inspected = 1;

        while self.entries[cursor].visited {
            self.entries[cursor].visited = false;
            cursor = self.entries[cursor]
                .prev()
                .or_else(|| self.list.peek_tail())
                .expect("Invariant broken: non-empty ring without a tail");
            inspected += 1;
        }

        self.hand = self.entries[cursor].prev();
        self.list.remove_node(&mut self.entries, cursor);
        self.index.remove(&self.entries[cursor].key);
        trace!(victim = cursor, inspected, "sieve eviction");
        (cursor, inspected)
    }

    /// Appends `key` behind the current tail. Returns false if the key is
    /// already tracked.
    pub(crate) fn push_tail(&mut self, key: K, visited: bool) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let idx = self.entries.len();
        self.entries.push(Entry::new(key.clone(), visited));
        self.list.push_tail(&mut self.entries, idx);
        self.index.insert(key, idx);
        true
    }

    /// Points the hand at the entry `position` places from the head. Returns
    /// false and leaves the hand alone if no such entry exists.
    pub(crate) fn set_hand_position(&mut self, position: usize) -> bool {
        match self.list.iter(&self.entries).nth(position) {
            Some(idx) => {
                self.hand = Some(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Visited flag of `key`, or `None` if it is not tracked.
    pub fn is_visited(&self, key: &K) -> Option<bool> {
        self.index.get(key).map(|&idx| self.entries[idx].visited)
    }
}

impl<K, S> SievePolicy<K, S> {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tracked keys from head (newest) to tail (oldest).
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.list
            .iter(&self.entries)
            .map(move |idx| &self.entries[idx].key)
    }

    /// Hand position as a zero-based offset from the head.
    pub fn hand_position(&self) -> Option<usize> {
        let hand = self.hand?;
        self.list.iter(&self.entries).position(|idx| idx == hand)
    }

    /// Entries from head to tail, each flagged with whether the hand rests on it.
    pub(crate) fn walk(&self) -> impl Iterator<Item = (&Entry<K>, bool)> + '_ {
        self.list
            .iter(&self.entries)
            .map(move |idx| (&self.entries[idx], self.hand == Some(idx)))
    }
}
