//! An intrusive AVL tree: nodes are caller-defined types embedding an
//! [`AvlLink`], so the tree never allocates node storage itself — it
//! only manages linkage. The caller transfers ownership of each node
//! into the tree as a `Box<N>` and gets one back from `remove`. This
//! keeps the payload type entirely up to the caller while still giving
//! the tree sole, unambiguous ownership of every linked node.

use std::ptr::NonNull;

use crate::comparator::Comparator;
use crate::core::insert::{self, InsertResult};
use crate::core::node::Linked;
use crate::core::remove;
use crate::core::search;
use crate::core::teardown;

/// Invoked exactly once per node when it leaves the tree via `clear` or
/// `drop` — never from `remove`, which returns ownership to the caller.
/// Stands in for the source's `delete_node`/`delete_context` pair.
pub trait Deleter<N> {
    fn delete(&mut self, node: Box<N>);
}

/// The default deleter: simply drops the boxed node.
pub struct DropDeleter;

impl<N> Deleter<N> for DropDeleter {
    fn delete(&mut self, node: Box<N>) {
        drop(node);
    }
}

/// An intrusive AVL tree over caller-defined nodes `N: Linked`.
pub struct AvlTree<N, C, D = DropDeleter> {
    root: Option<NonNull<N>>,
    len: usize,
    compare: C,
    deleter: D,
}

impl<N: Linked, C> AvlTree<N, C, DropDeleter> {
    pub fn new(compare: C) -> Self {
        AvlTree {
            root: None,
            len: 0,
            compare,
            deleter: DropDeleter,
        }
    }
}

impl<N: Linked, C, D: Deleter<N>> AvlTree<N, C, D> {
    pub fn with_deleter(compare: C, deleter: D) -> Self {
        AvlTree {
            root: None,
            len: 0,
            compare,
            deleter,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&N>
    where
        Q: ?Sized,
        C: Comparator<Q, N>,
    {
        let found = unsafe { search::search(self.root, key, &self.compare) }?;
        Some(unsafe { found.as_ref() })
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut N>
    where
        Q: ?Sized,
        C: Comparator<Q, N>,
    {
        let mut found = unsafe { search::search(self.root, key, &self.compare) }?;
        Some(unsafe { found.as_mut() })
    }

    /// Inserts `node`. If a node comparing equal is already present, it
    /// is swapped out of the tree and returned to the caller; `node`
    /// takes its place.
    pub fn insert(&mut self, node: Box<N>) -> Option<Box<N>>
    where
        C: Comparator<N, N>,
    {
        use crate::core::node;

        let new_node = unsafe { NonNull::new_unchecked(Box::into_raw(node)) };

        match unsafe { insert::insert(self.root, new_node, &self.compare) } {
            InsertResult::Inserted { new_root } => {
                self.root = Some(new_root);
                self.len += 1;
                None
            }
            InsertResult::Occupied { existing, parent } => {
                // `new_node` was never linked in; carry over `existing`'s
                // linkage and relink its slot to point at `new_node`
                // instead, using the parent `insert` already found so no
                // re-search is needed.
                let mut new_node = new_node;
                unsafe {
                    let link = new_node.as_mut().link_mut();
                    link.left = node::left(existing);
                    link.right = node::right(existing);
                    link.balance_factor = node::bf(existing);
                }
                match parent {
                    Some((p, node::Direction::Left)) => {
                        unsafe { node::set_left(p, Some(new_node)) };
                    }
                    Some((p, node::Direction::Right)) => {
                        unsafe { node::set_right(p, Some(new_node)) };
                    }
                    None => self.root = Some(new_node),
                }
                Some(unsafe { Box::from_raw(existing.as_ptr()) })
            }
        }
    }

    /// Returns the node comparing equal to `key`, inserting the node
    /// built lazily by `factory` if absent. The `bool` is `true` when
    /// `factory` actually ran, `false` when a matching node was already
    /// present.
    pub fn get_or_insert_with<Q, F>(&mut self, key: &Q, factory: F) -> (&mut N, bool)
    where
        Q: ?Sized,
        C: Comparator<Q, N> + Comparator<N, N>,
        F: FnOnce() -> Box<N>,
    {
        let existing = unsafe { search::search(self.root, key, &self.compare) };
        if let Some(mut found) = existing {
            return (unsafe { found.as_mut() }, false);
        }

        let node = factory();
        let new_node = unsafe { NonNull::new_unchecked(Box::into_raw(node)) };

        match unsafe { insert::insert(self.root, new_node, &self.compare) } {
            InsertResult::Inserted { new_root } => {
                self.root = Some(new_root);
                self.len += 1;
            }
            InsertResult::Occupied { .. } => {
                unreachable!("key was just confirmed absent by search")
            }
        }
        let mut new_node = new_node;
        (unsafe { new_node.as_mut() }, true)
    }

    /// Removes the node comparing equal to `key`, returning it to the
    /// caller.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Box<N>>
    where
        Q: ?Sized,
        C: Comparator<Q, N>,
    {
        let result = unsafe { remove::remove(self.root, key, &self.compare) }?;
        self.root = result.new_root;
        self.len -= 1;
        Some(unsafe { Box::from_raw(result.removed.as_ptr()) })
    }

    /// Removes every node, invoking the deleter on each exactly once.
    pub fn clear(&mut self) {
        let root = self.root.take();
        let deleter = &mut self.deleter;
        unsafe {
            teardown::teardown(root, |n| {
                deleter.delete(Box::from_raw(n.as_ptr()));
            });
        }
        self.len = 0;
    }
}

impl<N: Linked, C, D: Deleter<N>> Drop for AvlTree<N, C, D> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Comparator;
    use crate::core::node::AvlLink;
    use std::cmp::Ordering;

    struct Entry {
        link: AvlLink<Entry>,
        id: i32,
        tag: &'static str,
    }

    unsafe impl Linked for Entry {
        fn link(&self) -> &AvlLink<Self> {
            &self.link
        }
        fn link_mut(&mut self) -> &mut AvlLink<Self> {
            &mut self.link
        }
    }

    struct ById;

    impl Comparator<Entry, Entry> for ById {
        fn compare(&self, key: &Entry, node: &Entry) -> Ordering {
            key.id.cmp(&node.id)
        }
    }

    impl Comparator<i32, Entry> for ById {
        fn compare(&self, key: &i32, node: &Entry) -> Ordering {
            key.cmp(&node.id)
        }
    }

    fn entry(id: i32, tag: &'static str) -> Box<Entry> {
        Box::new(Entry {
            link: AvlLink::new(),
            id,
            tag,
        })
    }

    #[test]
    fn insert_and_lookup() {
        let mut tree: AvlTree<Entry, ById> = AvlTree::new(ById);
        tree.insert(entry(1, "one"));
        tree.insert(entry(2, "two"));
        tree.insert(entry(3, "three"));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(&2).map(|e| e.tag), Some("two"));
        assert_eq!(tree.get(&5), None);
    }

    #[test]
    fn duplicate_insert_swaps_node() {
        let mut tree: AvlTree<Entry, ById> = AvlTree::new(ById);
        tree.insert(entry(1, "first"));
        let swapped_out = tree.insert(entry(1, "second"));
        assert_eq!(swapped_out.map(|e| e.tag), Some("first"));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(&1).map(|e| e.tag), Some("second"));
    }

    #[test]
    fn get_or_insert_with_only_calls_factory_on_miss() {
        let mut tree: AvlTree<Entry, ById> = AvlTree::new(ById);
        tree.insert(entry(1, "one"));

        let mut calls = 0;
        let (found, inserted) = tree.get_or_insert_with(&1, || {
            calls += 1;
            entry(1, "replacement")
        });
        assert_eq!(found.tag, "one");
        assert!(!inserted);
        assert_eq!(calls, 0);

        let (created, inserted) = tree.get_or_insert_with(&2, || {
            calls += 1;
            entry(2, "two")
        });
        assert_eq!(created.tag, "two");
        assert!(inserted);
        assert_eq!(calls, 1);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn remove_returns_ownership_without_invoking_deleter() {
        struct CountingDeleter(usize);
        impl Deleter<Entry> for CountingDeleter {
            fn delete(&mut self, node: Box<Entry>) {
                self.0 += 1;
                drop(node);
            }
        }

        let mut tree: AvlTree<Entry, ById, CountingDeleter> =
            AvlTree::with_deleter(ById, CountingDeleter(0));
        tree.insert(entry(1, "one"));
        tree.insert(entry(2, "two"));
        let removed = tree.remove(&1);
        assert!(removed.is_some());
        assert_eq!(tree.deleter.0, 0);
        tree.clear();
        assert_eq!(tree.deleter.0, 1);
    }

    #[test]
    fn clear_accounting() {
        struct CountingDeleter(usize);
        impl Deleter<Entry> for CountingDeleter {
            fn delete(&mut self, node: Box<Entry>) {
                self.0 += 1;
                drop(node);
            }
        }

        let mut tree: AvlTree<Entry, ById, CountingDeleter> =
            AvlTree::with_deleter(ById, CountingDeleter(0));
        for i in 0..100 {
            tree.insert(entry(i, "x"));
        }
        tree.clear();
        assert_eq!(tree.deleter.0, 100);
        assert_eq!(tree.len(), 0);
    }
}
