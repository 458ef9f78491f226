//! Lookup along the BST order, generalized from
//! `searching::avl::AVL::_get`'s recursion into a loop over raw pointers.

use std::cmp::Ordering;
use std::ptr::NonNull;

use super::node::{self, Linked};
use crate::comparator::Comparator;

/// Descends from `root` comparing `key` against each visited node via
/// `cmp`, returning the matching node if one exists.
pub unsafe fn search<N, K, C>(root: Option<NonNull<N>>, key: &K, cmp: &C) -> Option<NonNull<N>>
where
    N: Linked,
    K: ?Sized,
    C: Comparator<K, N>,
{
    let mut current = root;
    while let Some(n) = current {
        current = match cmp.compare(key, unsafe { n.as_ref() }) {
            Ordering::Less => unsafe { node::left(n) },
            Ordering::Greater => unsafe { node::right(n) },
            Ordering::Equal => return Some(n),
        };
    }
    None
}
