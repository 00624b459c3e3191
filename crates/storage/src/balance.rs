//! Advisory balance metric.

use crate::node::NIL;
use crate::tree::Tree;

impl Tree {
    /// Balance estimate in `[0, 1]`; higher is better balanced.
    ///
    /// Two symmetry terms are averaged: how evenly low and high child
    /// links are populated, and how evenly the child indices they
    /// point at are distributed across the arena. An empty tree and a
    /// pure chain (no sideways links at all) both report 1. The value
    /// is advisory; callers compare it against a threshold to decide
    /// when a shuffle rebuild is worth it.
    pub fn state(&self) -> f64 {
        if self.arena().is_empty() {
            return 1.0;
        }
        let mut low_cnt: u64 = 0;
        let mut high_cnt: u64 = 0;
        let mut low_sum: u64 = 0;
        let mut high_sum: u64 = 0;
        for index in 1..self.node_count() {
            let node = self.arena().node(index);
            if node.low != NIL {
                low_cnt += 1;
                low_sum += u64::from(node.low);
            }
            if node.high != NIL {
                high_cnt += 1;
                high_sum += u64::from(node.high);
            }
        }
        (symmetry(low_cnt, high_cnt) + symmetry(low_sum, high_sum)) / 2.0
    }
}

/// `1 − |a − b| / (a + b)`, with the zero-denominator case reading as
/// perfectly symmetric.
fn symmetry(a: u64, b: u64) -> f64 {
    if a + b == 0 {
        1.0
    } else {
        1.0 - a.abs_diff(b) as f64 / (a + b) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn empty_tree_reports_one() {
        assert_eq!(Tree::new().state(), 1.0);
    }

    #[test]
    fn single_chain_reports_one() {
        let mut tree = Tree::new();
        tree.insert(b"onlykey");
        // No low or high links exist; both terms degenerate to 1.
        assert_eq!(tree.state(), 1.0);
    }

    #[test]
    fn state_stays_in_unit_interval() {
        let mut tree = Tree::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let len = rng.gen_range(1..=24);
            let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect();
            tree.insert(&key);
        }
        let s = tree.state();
        assert!((0.0..=1.0).contains(&s), "state out of range: {s}");
    }

    #[test]
    fn sorted_insertion_scores_below_shuffled_insertion() {
        // Keys drawn from a small alphabet, inserted sorted, produce
        // one-sided high chains; the same set inserted shuffled does
        // not.
        let mut keys: Vec<Vec<u8>> = Vec::new();
        let mut rng = StdRng::seed_from_u64(99);
        while keys.len() < 300 {
            let len = rng.gen_range(8..=16);
            let key: Vec<u8> = (0..len).map(|_| b"abcd"[rng.gen_range(0..4)]).collect();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys.sort();

        let mut sorted = Tree::new();
        for k in &keys {
            sorted.insert(k);
        }
        let before = sorted.state();

        sorted.rebuild(&mut rng);
        let after = sorted.state();
        assert!(
            after > before,
            "rebuild did not improve balance: {before} -> {after}"
        );
    }
}
