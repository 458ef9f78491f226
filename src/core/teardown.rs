//! Recursion-free teardown, used by `clear` and `Drop` on both facades.
//!
//! Repeatedly rotates the current subtree's left child to the top until
//! none remains, then visits the current node and descends right. Each
//! "rotate up" step reuses [`rotate_right_raw`] verbatim rather than
//! re-implementing pointer relinking, and the whole walk uses O(1)
//! auxiliary stack frames regardless of tree height.

use std::ptr::NonNull;

use super::node::{self, Linked};
use super::rotate::rotate_right_raw;

/// Visits every node reachable from `root` exactly once, in an order
/// convenient for teardown (not inorder), handing each to `visit` before
/// it is no longer reachable from anywhere else. `visit` is expected to
/// deallocate the node (or otherwise finalize it); the node's own
/// `left`/`right` links must not be relied upon after `visit` returns.
pub unsafe fn teardown<N, F>(root: Option<NonNull<N>>, mut visit: F)
where
    N: Linked,
    F: FnMut(NonNull<N>),
{
    let mut current = root;
    while let Some(mut node) = current {
        while let Some(left) = unsafe { node::left(node) } {
            node = unsafe { rotate_right_raw(node, left) };
        }
        let next = unsafe { node::right(node) };
        visit(node);
        current = next;
    }
}
