//! Iterative insertion with pivot tracking, per the single-rotation
//! rebalance scheme: after descending to the insertion point, walk back
//! from the deepest ancestor whose balance factor was non-zero (the
//! "pivot") toward the new leaf, adjusting balance factors, then apply
//! at most one rotation at the pivot.

use std::cmp::Ordering;
use std::ptr::NonNull;

use super::node::{self, Direction, Linked};
use super::rotate::dispatch_rotate_insert;
use crate::comparator::Comparator;

/// Where a new node landed relative to the existing tree.
pub enum InsertResult<N> {
    /// No node compared equal; `new_node` was attached as a leaf. Carries
    /// the tree's new root (unchanged unless a rotation occurred at the
    /// very top).
    Inserted { new_root: NonNull<N> },
    /// A node comparing equal to `new_node.key` was already present; it
    /// is returned to the caller to reconcile (replace value / swap
    /// node) and `new_node` was not attached. `parent` names the slot
    /// `existing` occupies (`None` if it is the tree's root), so a
    /// caller that needs to physically swap it out for `new_node` can
    /// relink in O(1) instead of re-searching.
    Occupied {
        existing: NonNull<N>,
        parent: Option<(NonNull<N>, Direction)>,
    },
}

/// Inserts `new_node` into the tree rooted at `root` (or makes it the
/// root if the tree is empty), using `cmp` for both descent and equality
/// detection.
///
/// # Safety
///
/// `new_node` must be a freshly-initialized, unlinked node (both
/// children `None`, balance factor `0`) that the caller now transfers to
/// the tree.
pub unsafe fn insert<N, C>(
    root: Option<NonNull<N>>,
    new_node: NonNull<N>,
    cmp: &C,
) -> InsertResult<N>
where
    N: Linked,
    C: Comparator<N, N>,
{
    let Some(root) = root else {
        return InsertResult::Inserted { new_root: new_node };
    };

    // Descend to the insertion point, remembering the deepest ancestor
    // with a non-zero balance factor (the pivot) and the path from it.
    let mut pivot = root;
    let mut pivot_parent: Option<(NonNull<N>, Direction)> = None;
    let mut path: Vec<Direction> = Vec::new();

    let mut current = root;
    let mut current_parent: Option<(NonNull<N>, Direction)> = None;
    loop {
        let ordering = cmp.compare(unsafe { new_node.as_ref() }, unsafe { current.as_ref() });
        let direction = match ordering {
            Ordering::Less => Direction::Left,
            Ordering::Greater => Direction::Right,
            Ordering::Equal => {
                return InsertResult::Occupied {
                    existing: current,
                    parent: current_parent,
                }
            }
        };

        if unsafe { node::bf(current) } != 0 {
            pivot = current;
            pivot_parent = current_parent;
            path.clear();
        }
        path.push(direction);

        let child = match direction {
            Direction::Left => unsafe { node::left(current) },
            Direction::Right => unsafe { node::right(current) },
        };

        match child {
            Some(next) => {
                current_parent = Some((current, direction));
                current = next;
            }
            None => {
                match direction {
                    Direction::Left => unsafe { node::set_left(current, Some(new_node)) },
                    Direction::Right => unsafe { node::set_right(current, Some(new_node)) },
                }
                break;
            }
        }
    }

    // Replay the path from the pivot down to the new leaf, adjusting
    // balance factors by -1 for a left step, +1 for a right step.
    let mut walker = pivot;
    for direction in &path {
        let delta = match direction {
            Direction::Left => -1,
            Direction::Right => 1,
        };
        unsafe { node::set_bf(walker, node::bf(walker) + delta) };
        let next = match direction {
            Direction::Left => unsafe { node::left(walker) },
            Direction::Right => unsafe { node::right(walker) },
        };
        walker = next.expect("path must lead to the freshly inserted leaf");
    }

    let pivot_bf = unsafe { node::bf(pivot) };
    if pivot_bf != 2 && pivot_bf != -2 {
        return InsertResult::Inserted { new_root: root };
    }

    let new_subtree_root = unsafe { dispatch_rotate_insert(pivot) };
    match pivot_parent {
        Some((parent, Direction::Left)) => {
            unsafe { node::set_left(parent, Some(new_subtree_root)) };
            InsertResult::Inserted { new_root: root }
        }
        Some((parent, Direction::Right)) => {
            unsafe { node::set_right(parent, Some(new_subtree_root)) };
            InsertResult::Inserted { new_root: root }
        }
        None => InsertResult::Inserted {
            new_root: new_subtree_root,
        },
    }
}
