//! Insert, exact lookup, and tombstone over the node arena.

use rand::seq::SliceRandom;
use rand::Rng;
use tern_core::key_within_limits;

use crate::arena::Arena;
use crate::node::{NIL, ROOT};
use crate::walk::Direction;

/// Which child link of a parent node a fresh chain hangs off.
#[derive(Clone, Copy)]
enum Link {
    Low,
    High,
    Equal,
}

/// In-memory ternary search tree. Stores key existence only; this is
/// an ordered set of byte strings, not a map.
///
/// Keys are opaque byte strings of 1 to 512 bytes. Removal tombstones
/// (clears the terminating flag); the structural nodes remain until
/// [`Tree::clear`] or [`Tree::rebuild`].
#[derive(Debug, Default)]
pub struct Tree {
    arena: Arena,
    key_count: u32,
}

impl Tree {
    /// An empty tree.
    pub fn new() -> Tree {
        Tree {
            arena: Arena::new(),
            key_count: 0,
        }
    }

    /// Number of live keys.
    #[inline]
    pub fn key_count(&self) -> u32 {
        self.key_count
    }

    /// Number of allocated node records, nil sentinel included. An
    /// empty tree reports 1.
    #[inline]
    pub fn node_count(&self) -> u32 {
        self.arena.len()
    }

    /// True when no live key is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    /// True iff `key` is live in the set. Empty keys and keys over the
    /// length limit are never members.
    pub fn contains(&self, key: &[u8]) -> bool {
        if key.is_empty() || self.arena.is_empty() {
            return false;
        }
        let mut cur = ROOT;
        let mut i = 0;
        while cur != NIL {
            let node = self.arena.node(cur);
            let c = key[i];
            if c < node.splitchar {
                cur = node.low;
            } else if c > node.splitchar {
                cur = node.high;
            } else if i + 1 == key.len() {
                return node.flag;
            } else {
                i += 1;
                cur = node.equal;
            }
        }
        false
    }

    /// Insert `key`. Returns true iff the set changed (the key was not
    /// already live). Invalid keys (empty or oversize) change nothing.
    pub fn insert(&mut self, key: &[u8]) -> bool {
        self.update(key, false)
    }

    /// Tombstone `key`. Returns true iff the set changed (the key was
    /// live). Structural nodes are retained.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.update(key, true)
    }

    /// Shared walk for insert and tombstone; `clear` selects tombstone
    /// mode.
    fn update(&mut self, key: &[u8], clear: bool) -> bool {
        if !key_within_limits(key) {
            return false;
        }
        if self.arena.is_empty() {
            // Structurally empty: the first insertion allocates the
            // root as the head of its chain.
            if clear {
                return false;
            }
            let first = self.alloc_chain(key);
            debug_assert_eq!(first, ROOT);
            self.key_count += 1;
            return true;
        }

        let mut cur = ROOT;
        let mut i = 0;
        loop {
            let node = self.arena.node(cur);
            let c = key[i];
            let next = if c < node.splitchar {
                if node.low == NIL {
                    return !clear && self.splice(cur, Link::Low, &key[i..]);
                }
                node.low
            } else if c > node.splitchar {
                if node.high == NIL {
                    return !clear && self.splice(cur, Link::High, &key[i..]);
                }
                node.high
            } else if i + 1 == key.len() {
                // Terminal position on an existing path.
                let node = self.arena.node_mut(cur);
                return if clear {
                    if node.flag {
                        node.flag = false;
                        self.key_count -= 1;
                        true
                    } else {
                        false
                    }
                } else if node.flag {
                    false
                } else {
                    node.flag = true;
                    self.key_count += 1;
                    true
                };
            } else {
                i += 1;
                if node.equal == NIL {
                    return !clear && self.splice(cur, Link::Equal, &key[i..]);
                }
                node.equal
            };
            cur = next;
        }
    }

    /// Hang a fresh equal-linked chain for `rest` off `parent`'s
    /// `link` child. Always changes the set.
    fn splice(&mut self, parent: u32, link: Link, rest: &[u8]) -> bool {
        let head = self.alloc_chain(rest);
        let p = self.arena.node_mut(parent);
        match link {
            Link::Low => p.low = head,
            Link::High => p.high = head,
            Link::Equal => p.equal = head,
        }
        self.key_count += 1;
        true
    }

    /// Allocate one node per byte of `bytes`, linked by `equal`, with
    /// the terminating flag on the last. Returns the head index.
    fn alloc_chain(&mut self, bytes: &[u8]) -> u32 {
        debug_assert!(!bytes.is_empty());
        let head = self.arena.reserve_one();
        let mut cur = head;
        for (k, &b) in bytes.iter().enumerate() {
            if k + 1 < bytes.len() {
                let next = self.arena.reserve_one();
                let node = self.arena.node_mut(cur);
                node.splitchar = b;
                node.equal = next;
                cur = next;
            } else {
                let node = self.arena.node_mut(cur);
                node.splitchar = b;
                node.flag = true;
            }
        }
        head
    }

    /// Drop every key and every node. Capacity is retained.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.key_count = 0;
    }

    /// All live keys in ascending byte-lexicographic order.
    pub fn collect_keys(&self) -> Vec<Vec<u8>> {
        let mut keys = Vec::with_capacity(self.key_count as usize);
        self.for_each(Direction::Ascending, &mut |k: &[u8]| keys.push(k.to_vec()));
        keys
    }

    /// Shuffle-rebuild: extract all live keys, permute them with the
    /// caller's entropy, and re-insert into a cleared arena. The key
    /// set and the node count are preserved; only the low/high shape
    /// (and with it the balance metric) changes. Tombstoned paths are
    /// reclaimed as a side effect.
    pub fn rebuild<R: Rng>(&mut self, rng: &mut R) {
        let mut keys = self.collect_keys();
        keys.shuffle(rng);
        tracing::debug!(
            target: "terndb::tree",
            keys = keys.len(),
            nodes_before = self.node_count(),
            "shuffle rebuild"
        );
        self.clear();
        for key in &keys {
            self.insert(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tern_core::MAX_KEY_LEN;

    // === Membership ===

    #[test]
    fn fresh_tree_is_empty() {
        let tree = Tree::new();
        assert_eq!(tree.key_count(), 0);
        assert_eq!(tree.node_count(), 1);
        assert!(!tree.contains(b"anything"));
    }

    #[test]
    fn insert_then_contains() {
        let mut tree = Tree::new();
        assert!(tree.insert(b"bananas"));
        assert!(tree.insert(b"apples"));
        assert!(tree.insert(b"cherries"));
        assert!(!tree.insert(b"apples"));

        assert!(tree.contains(b"apples"));
        assert!(!tree.contains(b"grapes"));
        assert_eq!(tree.key_count(), 3);
    }

    #[test]
    fn prefix_of_a_key_is_not_a_member() {
        let mut tree = Tree::new();
        tree.insert(b"bananas");
        assert!(!tree.contains(b"banana"));
        assert!(!tree.contains(b"bananass"));
        assert!(!tree.contains(b"b"));
    }

    #[test]
    fn empty_and_oversize_keys_are_rejected() {
        let mut tree = Tree::new();
        assert!(!tree.insert(b""));
        assert!(!tree.contains(b""));
        assert!(!tree.remove(b""));

        let big = vec![b'k'; MAX_KEY_LEN + 1];
        assert!(!tree.insert(&big));
        assert_eq!(tree.key_count(), 0);

        let max = vec![b'k'; MAX_KEY_LEN];
        assert!(tree.insert(&max));
        assert!(tree.contains(&max));
    }

    #[test]
    fn keys_may_contain_any_byte() {
        let mut tree = Tree::new();
        assert!(tree.insert(b"\0"));
        assert!(tree.insert(b"\0\x01"));
        assert!(tree.insert(b"a\tb\nc"));
        assert!(tree.contains(b"\0"));
        assert!(tree.contains(b"\0\x01"));
        assert!(tree.contains(b"a\tb\nc"));
        assert!(!tree.contains(b"\x01"));
    }

    // === Node accounting ===

    #[test]
    fn node_count_matches_shared_prefixes() {
        let mut tree = Tree::new();
        tree.insert(b"banana");
        tree.insert(b"apples");
        tree.insert(b"bananas");
        // sentinel + 6 + 6 + 1
        assert_eq!(tree.node_count(), 14);
    }

    #[test]
    fn node_count_is_insertion_order_invariant() {
        let keys: [&[u8]; 5] = [b"carrot", b"car", b"cart", b"dog", b"door"];
        let mut forward = Tree::new();
        for k in keys {
            forward.insert(k);
        }
        let mut backward = Tree::new();
        for k in keys.iter().rev() {
            backward.insert(k);
        }
        assert_eq!(forward.node_count(), backward.node_count());
        assert_eq!(forward.key_count(), backward.key_count());
    }

    // === Tombstoning ===

    #[test]
    fn remove_tombstones_without_freeing_nodes() {
        let mut tree = Tree::new();
        tree.insert(b"walter");
        tree.insert(b"water");
        let nodes = tree.node_count();

        assert!(tree.remove(b"walter"));
        assert!(!tree.contains(b"walter"));
        assert!(tree.contains(b"water"));
        assert_eq!(tree.node_count(), nodes);
        assert_eq!(tree.key_count(), 1);

        assert!(!tree.remove(b"walter"));
        assert!(!tree.remove(b"never-inserted"));
    }

    #[test]
    fn reinsert_after_remove_reuses_the_path() {
        let mut tree = Tree::new();
        tree.insert(b"jesse");
        let nodes = tree.node_count();
        tree.remove(b"jesse");
        assert!(tree.insert(b"jesse"));
        assert_eq!(tree.node_count(), nodes);
        assert!(tree.contains(b"jesse"));
    }

    #[test]
    fn clear_resets_to_sentinel_only() {
        let mut tree = Tree::new();
        tree.insert(b"one");
        tree.insert(b"two");
        tree.clear();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.key_count(), 0);
        assert!(!tree.contains(b"one"));

        // The cleared tree accepts inserts again.
        assert!(tree.insert(b"three"));
        assert!(tree.contains(b"three"));
    }

    // === Rebuild ===

    #[test]
    fn rebuild_preserves_keys_and_node_count() {
        let mut tree = Tree::new();
        let keys: Vec<Vec<u8>> = (0..200)
            .map(|i| format!("key/{:04}", i * 7 % 200).into_bytes())
            .collect();
        for k in &keys {
            tree.insert(k);
        }
        tree.remove(b"key/0000");
        let nodes_live = {
            // Node count after a rebuild reflects only live keys.
            let mut reference = Tree::new();
            for k in &keys {
                if k.as_slice() != b"key/0000" {
                    reference.insert(k);
                }
            }
            reference.node_count()
        };

        let mut rng = StdRng::seed_from_u64(42);
        tree.rebuild(&mut rng);

        assert_eq!(tree.key_count(), keys.len() as u32 - 1);
        assert_eq!(tree.node_count(), nodes_live);
        for k in &keys {
            assert_eq!(tree.contains(k), k.as_slice() != b"key/0000");
        }
    }

    #[test]
    fn rebuild_of_empty_tree_is_a_noop() {
        let mut tree = Tree::new();
        let mut rng = StdRng::seed_from_u64(1);
        tree.rebuild(&mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.key_count(), 0);
    }

    // === Properties ===

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn key() -> impl Strategy<Value = Vec<u8>> {
            prop::collection::vec(any::<u8>(), 1..=16)
        }

        proptest! {
            #[test]
            fn membership_tracks_inserts_and_removes(
                keys in prop::collection::hash_set(key(), 1..32),
            ) {
                let mut tree = Tree::new();
                for k in &keys {
                    prop_assert!(tree.insert(k));
                }
                prop_assert_eq!(tree.key_count() as usize, keys.len());
                for k in &keys {
                    prop_assert!(tree.contains(k));
                }
                for k in &keys {
                    prop_assert!(tree.remove(k));
                    prop_assert!(!tree.contains(k));
                }
                prop_assert_eq!(tree.key_count(), 0);
            }

            #[test]
            fn rebuild_is_invisible_to_lookups(
                keys in prop::collection::hash_set(key(), 1..32),
                seed in any::<u64>(),
            ) {
                let mut tree = Tree::new();
                for k in &keys {
                    tree.insert(k);
                }
                let nodes = tree.node_count();

                tree.rebuild(&mut StdRng::seed_from_u64(seed));

                prop_assert_eq!(tree.node_count(), nodes);
                prop_assert_eq!(tree.key_count() as usize, keys.len());
                for k in &keys {
                    prop_assert!(tree.contains(k));
                }
            }
        }
    }
}
