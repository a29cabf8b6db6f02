//! # skipset-rs
//!
//! An ordered set backed by a skip list: a probabilistic, multi-level linked
//! structure with expected O(log n) search, insertion, removal and rank
//! access, and no tree-rebalancing logic.
//!
//! ## Example
//!
//! ```rust
//! use skipset_rs::SkipSet;
//!
//! let mut set: SkipSet<u64> = SkipSet::new();
//! set.insert(5);
//! set.insert(3);
//! set.insert(8);
//!
//! assert!(set.contains(&3));
//! assert_eq!(set.first(), Some(&3));
//! assert_eq!(set.ceiling(&4), Some(&5));
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![3, 5, 8]);
//! ```

#![forbid(unsafe_code)]

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// Configuration
// =============================================================================

/// Hard cap on the number of levels. Bounds the tallest possible node and the
/// range of the level sampler.
pub const MAX_LEVELS: usize = 33;

/// Arena slot index. The two sentinels occupy fixed slots.
type NodeId = u32;

const HEAD: NodeId = 0;
const TAIL: NodeId = 1;

// =============================================================================
// Node arena
// =============================================================================

/// A single skip-list node, stored in the arena.
///
/// The head and tail sentinels hold no element; every other node holds exactly
/// one. `next.len()` is the node's level: a node linked at level `i` is linked
/// at every level below it. `prev` is maintained at level 0 only and is the
/// inverse of the level-0 forward link; tail's `prev` gives O(1) access to the
/// largest element.
#[derive(Clone)]
struct Node<T> {
    elem: Option<T>,
    next: Vec<NodeId>,
    prev: NodeId,
}

// =============================================================================
// SkipSet
// =============================================================================

/// An ordered set of unique elements backed by a skip list.
///
/// Nodes live in a slot arena indexed by `u32` ids; removed slots go on a free
/// list and are reused by later insertions. Each node is assigned a random
/// level at insertion, with P(level = k) = 2^-k, and participates in the
/// forward chains of every level below its own.
///
/// The current maximum active level only ever grows; it is not lowered when
/// tall nodes are removed. Wasted descent depth is bounded by the level cap,
/// and this avoids per-removal level bookkeeping.
pub struct SkipSet<T> {
    nodes: Vec<Node<T>>,
    /// Slots of removed nodes, reusable by `alloc`.
    free: Vec<NodeId>,
    len: usize,
    /// Highest level any live node currently occupies (>= 1).
    max_level: usize,
    /// Fixed level capacity chosen at construction (<= MAX_LEVELS).
    level_cap: usize,
    rng: SmallRng,
}

impl<T> SkipSet<T> {
    /// Creates an empty set with the default level capacity of [`MAX_LEVELS`].
    pub fn new() -> Self {
        Self::with_max_level(MAX_LEVELS)
    }

    /// Creates an empty set whose nodes are capped at `cap` levels.
    ///
    /// # Panics
    ///
    /// Panics if `cap` is 0 or exceeds [`MAX_LEVELS`].
    pub fn with_max_level(cap: usize) -> Self {
        assert!(
            cap >= 1 && cap <= MAX_LEVELS,
            "level capacity must be in 1..={MAX_LEVELS}, got {cap}"
        );

        // Head links to tail at every capacity level; tail needs no forward
        // links of its own, it only terminates the chains.
        let head = Node {
            elem: None,
            next: vec![TAIL; cap],
            prev: HEAD,
        };
        let tail = Node {
            elem: None,
            next: Vec::new(),
            prev: HEAD,
        };

        Self {
            nodes: vec![head, tail],
            free: Vec::new(),
            len: 0,
            max_level: 1,
            level_cap: cap,
            rng: SmallRng::from_entropy(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id as usize]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id as usize]
    }

    /// Smallest element, or `None` if the set is empty.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.node(self.node(HEAD).next[0]).elem.as_ref()
    }

    /// Largest element, or `None` if the set is empty. O(1) via tail's
    /// backward link.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.node(self.node(TAIL).prev).elem.as_ref()
    }

    /// Element at 0-based rank `n` in ascending order, or `None` when
    /// `n >= len`. Walks `n + 1` level-0 links, so this is O(n).
    pub fn get(&self, n: usize) -> Option<&T> {
        if n >= self.len {
            return None;
        }
        let mut cursor = self.node(HEAD).next[0];
        for _ in 0..n {
            cursor = self.node(cursor).next[0];
        }
        self.node(cursor).elem.as_ref()
    }

    /// Visits the elements in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            set: self,
            cursor: self.node(HEAD).next[0],
            remaining: self.len,
        }
    }

    /// Removes all elements, reclaiming every arena slot.
    pub fn clear(&mut self) {
        self.nodes.truncate(2);
        self.free.clear();
        for lvl in 0..self.level_cap {
            self.nodes[HEAD as usize].next[lvl] = TAIL;
        }
        self.nodes[TAIL as usize].prev = HEAD;
        self.len = 0;
        self.max_level = 1;
    }
}

impl<T: Ord> SkipSet<T> {
    /// Positioning primitive shared by every keyed operation.
    ///
    /// Descends from the current maximum level, at each level advancing while
    /// the next element compares strictly less than `key`, and records the
    /// stopping node per level. Postcondition: `trail[lvl]` is the rightmost
    /// node at `lvl` whose element is strictly less than `key` (head if none),
    /// so `trail[0]`'s level-0 successor is the first node >= `key`.
    ///
    /// Slots above `max_level` stay at head, which is exactly the predecessor
    /// an insertion needs if its drawn level raises `max_level` mid-splice.
    fn locate(&self, key: &T) -> [NodeId; MAX_LEVELS] {
        let mut trail = [HEAD; MAX_LEVELS];
        let mut cursor = HEAD;
        for lvl in (0..self.max_level).rev() {
            loop {
                let next = self.node(cursor).next[lvl];
                match self.node(next).elem {
                    Some(ref e) if *e < *key => cursor = next,
                    _ => break,
                }
            }
            trail[lvl] = cursor;
        }
        trail
    }

    /// Draws a level in `1..=level_cap` with P(level = k) = 2^-k, by counting
    /// trailing zero bits of a random word. Raises `max_level` if exceeded;
    /// this is the only way the list grows in height.
    fn choose_level(&mut self) -> usize {
        let word: u64 = self.rng.gen();
        let level = (1 + word.trailing_zeros() as usize).min(self.level_cap);
        if level > self.max_level {
            self.max_level = level;
        }
        level
    }

    /// Places `elem` in an arena slot, reusing a freed one when available.
    fn alloc(&mut self, elem: T, level: usize) -> NodeId {
        let node = Node {
            elem: Some(elem),
            next: vec![TAIL; level],
            prev: HEAD,
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id as usize] = node;
                id
            }
            None => {
                let id = self.nodes.len() as NodeId;
                self.nodes.push(node);
                id
            }
        }
    }

    /// Returns whether `elem` is in the set. Read-only.
    pub fn contains(&self, elem: &T) -> bool {
        let trail = self.locate(elem);
        let succ = self.node(trail[0]).next[0];
        matches!(self.node(succ).elem.as_ref(), Some(e) if e == elem)
    }

    /// Adds `elem` to the set. Returns `false` without mutating if an equal
    /// element is already present.
    pub fn insert(&mut self, elem: T) -> bool {
        let trail = self.locate(&elem);
        let succ = self.node(trail[0]).next[0];
        if matches!(self.node(succ).elem.as_ref(), Some(e) if *e == elem) {
            return false;
        }

        let level = self.choose_level();
        let id = self.alloc(elem, level);

        // Splice between each level's predecessor and its current successor.
        for lvl in 0..level {
            let pred = trail[lvl];
            let next = self.node(pred).next[lvl];
            self.node_mut(id).next[lvl] = next;
            self.node_mut(pred).next[lvl] = id;
        }

        // Base level is doubly linked; fix both backward links.
        let succ0 = self.node(id).next[0];
        self.node_mut(id).prev = trail[0];
        self.node_mut(succ0).prev = id;

        self.len += 1;
        true
    }

    /// Removes `elem` from the set, returning the stored value, or `None`
    /// without mutating if it is not present.
    pub fn remove(&mut self, elem: &T) -> Option<T> {
        let trail = self.locate(elem);
        let target = self.node(trail[0]).next[0];
        match self.node(target).elem.as_ref() {
            Some(e) if e == elem => {}
            _ => return None,
        }

        // Unlink from every level the node occupies. Its predecessors at
        // those levels are exactly the trail entries.
        let height = self.node(target).next.len();
        for lvl in 0..height {
            let pred = trail[lvl];
            debug_assert_eq!(self.node(pred).next[lvl], target);
            let next = self.node(target).next[lvl];
            self.node_mut(pred).next[lvl] = next;
        }

        // New level-0 successor (possibly tail) points back at the
        // predecessor. max_level intentionally stays put even if this was the
        // last tall node.
        let succ0 = self.node(trail[0]).next[0];
        self.node_mut(succ0).prev = trail[0];

        self.len -= 1;
        let removed = self.node_mut(target).elem.take();
        debug_assert!(removed.is_some());
        self.node_mut(target).next = Vec::new();
        self.free.push(target);
        removed
    }

    /// Smallest element >= `elem`, or `None` if every element is smaller
    /// (or the set is empty). Returns `elem`'s stored equal if present.
    pub fn ceiling(&self, elem: &T) -> Option<&T> {
        let trail = self.locate(elem);
        let succ = self.node(trail[0]).next[0];
        self.node(succ).elem.as_ref()
    }

    /// Largest element <= `elem`, or `None` if every element is larger
    /// (or the set is empty). Returns `elem`'s stored equal if present.
    pub fn floor(&self, elem: &T) -> Option<&T> {
        let trail = self.locate(elem);
        let succ = self.node(trail[0]).next[0];
        if let Some(e) = self.node(succ).elem.as_ref() {
            if e == elem {
                return Some(e);
            }
        }
        self.node(trail[0]).elem.as_ref()
    }
}

impl<T> Default for SkipSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for SkipSet<T> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            free: self.free.clone(),
            len: self.len,
            max_level: self.max_level,
            level_cap: self.level_cap,
            rng: self.rng.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SkipSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> FromIterator<T> for SkipSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for elem in iter {
            set.insert(elem);
        }
        set
    }
}

impl<T: Ord> Extend<T> for SkipSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for elem in iter {
            self.insert(elem);
        }
    }
}

impl<'a, T> IntoIterator for &'a SkipSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Ascending iterator over a [`SkipSet`], walking level-0 forward links.
pub struct Iter<'a, T> {
    set: &'a SkipSet<T>,
    cursor: NodeId,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.set.node(self.cursor);
        // Tail holds no element and terminates the walk.
        let elem = node.elem.as_ref()?;
        self.cursor = node.next[0];
        self.remaining -= 1;
        Some(elem)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
