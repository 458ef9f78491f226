//! Iterative removal: locate the target, splice it out (swapping with its
//! inorder successor when it has two children), then retrace the
//! ancestor path applying rotations until the tree's height invariant is
//! restored.
//!
//! The retrace walks the scratch stacks recorded during the descent
//! rather than following parent pointers, since nodes don't carry any.
//! When the removed node has two children, the stack entry recorded for
//! it is overwritten in place with its inorder successor once the splice
//! completes, so the same retrace loop handles both cases uniformly.

use std::cmp::Ordering;
use std::ptr::NonNull;

use super::node::{self, Direction, Linked};
use super::rotate::dispatch_rotate_remove;
use super::stack::{ScratchStack, INLINE_CAPACITY};
use crate::comparator::Comparator;

pub struct RemoveResult<N> {
    pub removed: NonNull<N>,
    pub new_root: Option<NonNull<N>>,
}

/// Removes the node comparing equal to `key`, if any, rebalancing along
/// the way. Returns `None` if no such node exists (the tree is
/// unchanged).
pub unsafe fn remove<N, K, C>(root: Option<NonNull<N>>, key: &K, cmp: &C) -> Option<RemoveResult<N>>
where
    N: Linked,
    K: ?Sized,
    C: Comparator<K, N>,
{
    let root_node = root?;

    let mut nodes: ScratchStack<NonNull<N>, INLINE_CAPACITY> = ScratchStack::new();
    let mut dirs: ScratchStack<Direction, INLINE_CAPACITY> = ScratchStack::new();

    let mut current = root_node;
    let target = loop {
        match cmp.compare(key, unsafe { current.as_ref() }) {
            Ordering::Equal => break current,
            Ordering::Less => {
                nodes.push(current);
                dirs.push(Direction::Left);
                current = unsafe { node::left(current) }?;
            }
            Ordering::Greater => {
                nodes.push(current);
                dirs.push(Direction::Right);
                current = unsafe { node::right(current) }?;
            }
        }
    };

    let left_child = unsafe { node::left(target) };
    let right_child = unsafe { node::right(target) };

    let mut child_result: Option<NonNull<N>> = match (left_child, right_child) {
        (None, None) => None,
        (Some(c), None) | (None, Some(c)) => Some(c),
        (Some(tl), Some(tr)) => {
            let target_slot = nodes.len();
            nodes.push(target);
            dirs.push(Direction::Right);

            let mut successor = tr;
            while let Some(l) = unsafe { node::left(successor) } {
                nodes.push(successor);
                dirs.push(Direction::Left);
                successor = l;
            }

            let orphan = unsafe { node::right(successor) };
            if successor != tr {
                unsafe { node::set_right(successor, Some(tr)) };
            }
            unsafe {
                node::set_left(successor, Some(tl));
                node::set_bf(successor, node::bf(target));
            }
            nodes.set(target_slot, successor);

            orphan
        }
    };

    // Retrace: cascade balance-factor fixes and rotations upward until
    // height stabilizes, then perform at most one more pointer fix-up
    // for the (now-unaffected) ancestor above the stopping point.
    let mut cascading = true;
    loop {
        if !cascading {
            if let (Some(ancestor), Some(direction)) = (nodes.pop(), dirs.pop()) {
                match direction {
                    Direction::Left => unsafe { node::set_left(ancestor, child_result) },
                    Direction::Right => unsafe { node::set_right(ancestor, child_result) },
                }
            }
            break;
        }

        match (nodes.pop(), dirs.pop()) {
            (Some(ancestor), Some(direction)) => {
                match direction {
                    Direction::Left => unsafe { node::set_left(ancestor, child_result) },
                    Direction::Right => unsafe { node::set_right(ancestor, child_result) },
                }
                let delta: i8 = if direction == Direction::Left { 1 } else { -1 };
                let new_bf = unsafe { node::bf(ancestor) } + delta;
                unsafe { node::set_bf(ancestor, new_bf) };

                if new_bf == 0 {
                    child_result = Some(ancestor);
                } else if new_bf == 1 || new_bf == -1 {
                    child_result = Some(ancestor);
                    cascading = false;
                } else {
                    let rebalance = unsafe { dispatch_rotate_remove(ancestor) };
                    child_result = Some(rebalance.new_root);
                    if !rebalance.height_decreased {
                        cascading = false;
                    }
                }
            }
            _ => break,
        }
    }

    unsafe {
        node::set_left(target, None);
        node::set_right(target, None);
        node::set_bf(target, 0);
    }

    Some(RemoveResult {
        removed: target,
        new_root: child_result,
    })
}
