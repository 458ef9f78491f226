//! An ordered map keyed by a user-supplied total order, backed by the
//! AVL interior in [`crate::core`].
//!
//! A `put`/`get`-style associative container over owned keys and values.
//! Each entry is boxed individually and linked through raw pointers, so
//! the shared iterative core (search/insert/remove/teardown) can operate
//! on the tree without recursion.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::ptr::NonNull;

use crate::comparator::{Comparator, OrdComparator};
use crate::core::insert::{self, InsertResult};
use crate::core::node::{AvlLink, Linked};
use crate::core::remove;
use crate::core::search;
use crate::core::teardown;

struct MapNode<K, V> {
    link: AvlLink<MapNode<K, V>>,
    key: K,
    value: V,
}

unsafe impl<K, V> Linked for MapNode<K, V> {
    fn link(&self) -> &AvlLink<Self> {
        &self.link
    }

    fn link_mut(&mut self) -> &mut AvlLink<Self> {
        &mut self.link
    }
}

/// Adapts a homogeneous/heterogeneous key comparator into one comparing
/// a lookup key against a node's embedded key.
struct NodeCmp<'a, C>(&'a C);

impl<'a, C, K, V, Q> Comparator<Q, MapNode<K, V>> for NodeCmp<'a, C>
where
    C: Comparator<Q, K>,
    Q: ?Sized,
{
    fn compare(&self, key: &Q, node: &MapNode<K, V>) -> Ordering {
        self.0.compare(key, &node.key)
    }
}

/// Adapts a key comparator into one comparing two full nodes by their
/// embedded keys, for use while descending during insertion.
struct InsertCmp<'a, C>(&'a C);

impl<'a, C, K, V> Comparator<MapNode<K, V>, MapNode<K, V>> for InsertCmp<'a, C>
where
    C: Comparator<K, K>,
{
    fn compare(&self, key: &MapNode<K, V>, node: &MapNode<K, V>) -> Ordering {
        self.0.compare(&key.key, &node.key)
    }
}

/// An ordered map keyed by `K` under comparator `C`, defaulting to `K`'s
/// own `Ord` implementation.
pub struct AvlMap<K, V, C = OrdComparator<K>> {
    root: Option<NonNull<MapNode<K, V>>>,
    len: usize,
    compare: C,
}

impl<K: Ord, V> AvlMap<K, V, OrdComparator<K>> {
    pub fn new() -> Self {
        AvlMap {
            root: None,
            len: 0,
            compare: OrdComparator::new(),
        }
    }
}

impl<K: Ord, V> Default for AvlMap<K, V, OrdComparator<K>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> AvlMap<K, V, C> {
    pub fn with_comparator(compare: C) -> Self {
        AvlMap {
            root: None,
            len: 0,
            compare,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<K, V, C> AvlMap<K, V, C> {
    /// Looks up `key`, accepting any borrowed shape `Q` the comparator
    /// knows how to compare against `K`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized,
        C: Comparator<Q, K>,
    {
        let found = unsafe { search::search(self.root, key, &NodeCmp(&self.compare)) }?;
        Some(unsafe { &found.as_ref().value })
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized,
        C: Comparator<Q, K>,
    {
        let mut found = unsafe { search::search(self.root, key, &NodeCmp(&self.compare)) }?;
        Some(unsafe { &mut found.as_mut().value })
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized,
        C: Comparator<Q, K>,
    {
        self.get(key).is_some()
    }

    /// Inserts `key`/`value`. If an equal key is already present, its
    /// value is replaced and the previous value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        C: Comparator<K, K>,
    {
        let new_node = Box::into_raw(Box::new(MapNode {
            link: AvlLink::new(),
            key,
            value,
        }));
        let new_node = unsafe { NonNull::new_unchecked(new_node) };

        match unsafe { insert::insert(self.root, new_node, &InsertCmp(&self.compare)) } {
            InsertResult::Inserted { new_root } => {
                self.root = Some(new_root);
                self.len += 1;
                None
            }
            InsertResult::Occupied { mut existing, .. } => {
                // Reclaim the node we just allocated; it was never linked in.
                let discarded = unsafe { Box::from_raw(new_node.as_ptr()) };
                let MapNode { value: new_value, .. } = *discarded;
                let previous = std::mem::replace(unsafe { &mut existing.as_mut().value }, new_value);
                Some(previous)
            }
        }
    }

    /// Returns the value for `key`, inserting `value` (built lazily by
    /// `factory`) if absent. The `bool` is `true` when `factory` actually
    /// ran, `false` when `key` was already present.
    pub fn get_or_insert_with<F>(&mut self, key: K, factory: F) -> (&mut V, bool)
    where
        C: Comparator<K, K>,
        F: FnOnce() -> V,
    {
        let existing = unsafe { search::search(self.root, &key, &NodeCmp(&self.compare)) };
        if let Some(mut found) = existing {
            return (unsafe { &mut found.as_mut().value }, false);
        }

        let value = factory();
        let new_node = Box::into_raw(Box::new(MapNode {
            link: AvlLink::new(),
            key,
            value,
        }));
        let mut new_node = unsafe { NonNull::new_unchecked(new_node) };

        match unsafe { insert::insert(self.root, new_node, &InsertCmp(&self.compare)) } {
            InsertResult::Inserted { new_root } => {
                self.root = Some(new_root);
                self.len += 1;
            }
            InsertResult::Occupied { .. } => {
                unreachable!("key was just confirmed absent by search")
            }
        }
        (unsafe { &mut new_node.as_mut().value }, true)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized,
        C: Comparator<Q, K>,
    {
        let result = unsafe { remove::remove(self.root, key, &NodeCmp(&self.compare)) }?;
        self.root = result.new_root;
        self.len -= 1;
        let boxed = unsafe { Box::from_raw(result.removed.as_ptr()) };
        Some(boxed.value)
    }

    /// Removes every entry, invoking each value's destructor exactly
    /// once per entry.
    pub fn clear(&mut self) {
        let root = self.root.take();
        unsafe {
            teardown::teardown(root, |n| {
                drop(Box::from_raw(n.as_ptr()));
            });
        }
        self.len = 0;
    }
}

impl<K, V, C> Drop for AvlMap<K, V, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Iterative inorder traversal used only by tests, to confirm BST
    /// order without recursing (the tree's own height may exceed a
    /// comfortable recursion depth at stress-test sizes).
    fn inorder_keys<K: Clone, V>(map: &AvlMap<K, V, OrdComparator<K>>) -> Vec<K> {
        let mut out = Vec::new();
        let mut stack: Vec<NonNull<MapNode<K, V>>> = Vec::new();
        let mut current = map.root;
        loop {
            while let Some(node) = current {
                stack.push(node);
                current = unsafe { node.as_ref().link.left };
            }
            match stack.pop() {
                Some(node) => {
                    out.push(unsafe { node.as_ref().key.clone() });
                    current = unsafe { node.as_ref().link.right };
                }
                None => break,
            }
        }
        out
    }

    fn avl_height<K, V>(node: Option<NonNull<MapNode<K, V>>>) -> usize {
        let Some(n) = node else { return 0 };
        let n_ref = unsafe { n.as_ref() };
        let left_h = avl_height(n_ref.link.left);
        let right_h = avl_height(n_ref.link.right);
        let bf = right_h as i64 - left_h as i64;
        assert!(bf.abs() <= 1, "AVL invariant violated");
        assert_eq!(bf, n_ref.link.balance_factor as i64, "balance factor mismatch");
        1 + left_h.max(right_h)
    }

    fn check_invariants<K: Ord + Clone + std::fmt::Debug, V>(map: &AvlMap<K, V, OrdComparator<K>>) {
        let keys = inorder_keys(map);
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "BST order violated: {:?}", keys);
        }
        assert_eq!(keys.len(), map.len());
        avl_height(map.root);
    }

    #[test]
    fn string_insert_and_traverse() {
        let mut map: AvlMap<&str, ()> = AvlMap::new();
        for k in ["foo", "bar", "baz", "qux"] {
            map.insert(k, ());
        }
        assert_eq!(map.len(), 4);
        assert_eq!(inorder_keys(&map), vec!["bar", "baz", "foo", "qux"]);
    }

    #[test]
    fn duplicate_insert_replaces_value() {
        let mut map: AvlMap<&str, i32> = AvlMap::new();
        map.insert("foo", 1);
        let previous = map.insert("foo", 2);
        assert_eq!(previous, Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("foo"), Some(&2));
    }

    #[test]
    fn get_or_insert_with_only_calls_factory_on_miss() {
        let mut map: AvlMap<&str, i32> = AvlMap::new();
        let mut calls = 0;
        let (value, inserted) = map.get_or_insert_with("foo", || {
            calls += 1;
            1
        });
        *value += 10;
        assert!(inserted);

        let (_, inserted_again) = map.get_or_insert_with("foo", || {
            calls += 1;
            99
        });
        assert!(!inserted_again);
        assert_eq!(calls, 1);
        assert_eq!(map.get("foo"), Some(&11));
    }

    #[test]
    fn integer_balance_sequence() {
        let mut map: AvlMap<i32, ()> = AvlMap::new();
        for k in [3, 2, 1, 4, 5, 6, 7, 16, 15, 14] {
            map.insert(k, ());
            check_invariants(&map);
        }
        assert_eq!(
            inorder_keys(&map),
            vec![1, 2, 3, 4, 5, 6, 7, 14, 15, 16]
        );
    }

    #[test]
    fn sorted_stress_insert() {
        let mut map: AvlMap<i32, i32> = AvlMap::new();
        const N: i32 = 2048;
        for k in 0..N {
            map.insert(k, k * 2);
            let bound = (1.44 * ((map.len() as f64) + 1.065).log2() - 0.328).ceil() as usize;
            assert!(avl_height(map.root) <= bound, "height bound violated at len={}", map.len());
        }
        check_invariants(&map);
        for k in 0..N {
            assert_eq!(map.get(&k), Some(&(k * 2)));
        }
    }

    #[test]
    fn random_remove_cascade() {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut insert_order: Vec<i32> = (0..2048).collect();
        insert_order.shuffle(&mut rng);
        let mut remove_order = insert_order.clone();
        remove_order.shuffle(&mut rng);

        let mut map: AvlMap<i32, i32> = AvlMap::new();
        for &k in &insert_order {
            map.insert(k, k);
        }
        check_invariants(&map);

        let mut remaining: std::collections::HashSet<i32> = insert_order.iter().copied().collect();
        for &k in &remove_order {
            let removed = map.remove(&k);
            assert_eq!(removed, Some(k));
            remaining.remove(&k);
            assert_eq!(map.len(), remaining.len());
            for &present in &remaining {
                assert!(map.get(&present).is_some());
            }
            assert!(map.get(&k).is_none());
        }
        assert!(map.is_empty());
    }

    #[test]
    fn clear_accounting() {
        let mut map: AvlMap<i32, i32> = AvlMap::new();
        for k in 0..100 {
            map.insert(k, k);
        }
        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.get(&0), None);
    }
}
