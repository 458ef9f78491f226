//! Rotation primitives shared by insertion, removal, and teardown.
//!
//! The four rebalancing shapes follow the same case analysis as
//! `searching::avl::Node::re_balance`, generalized from recursive,
//! owned-`Box` subtrees with recomputed heights to iterative pointer
//! relinking over stored balance factors.
//!
//! ```text
//!      y                               x
//!     / \     Right Rotation          /  \
//!    x   T3   - - - - - - - >        T1   y
//!   / \       < - - - - - - -            / \
//!  T1  T2     Left Rotation            T2  T3
//! ```

use std::ptr::NonNull;

use super::node::{self, Linked};

/// Relinks `top.right` to `bottom`'s left child and `bottom`'s left
/// child to `top`, returning the new subtree root. Touches only child
/// pointers; balance factors are the caller's responsibility.
pub unsafe fn rotate_left_raw<N: Linked>(top: NonNull<N>, bottom: NonNull<N>) -> NonNull<N> {
    unsafe {
        let bottom_left = node::left(bottom);
        node::set_right(top, bottom_left);
        node::set_left(bottom, Some(top));
    }
    bottom
}

/// Mirror of [`rotate_left_raw`].
pub unsafe fn rotate_right_raw<N: Linked>(top: NonNull<N>, bottom: NonNull<N>) -> NonNull<N> {
    unsafe {
        let bottom_right = node::right(bottom);
        node::set_left(top, bottom_right);
        node::set_right(bottom, Some(top));
    }
    bottom
}

/// Single left rotation. Precondition: `bf(top) == 2 && bf(bottom) == 1`.
pub unsafe fn rotate_left<N: Linked>(top: NonNull<N>, bottom: NonNull<N>) -> NonNull<N> {
    debug_assert_eq!(unsafe { node::bf(top) }, 2);
    debug_assert_eq!(unsafe { node::bf(bottom) }, 1);
    let new_root = unsafe { rotate_left_raw(top, bottom) };
    unsafe {
        node::set_bf(top, 0);
        node::set_bf(bottom, 0);
    }
    new_root
}

/// Single right rotation. Precondition: `bf(top) == -2 && bf(bottom) == -1`.
pub unsafe fn rotate_right<N: Linked>(top: NonNull<N>, bottom: NonNull<N>) -> NonNull<N> {
    debug_assert_eq!(unsafe { node::bf(top) }, -2);
    debug_assert_eq!(unsafe { node::bf(bottom) }, -1);
    let new_root = unsafe { rotate_right_raw(top, bottom) };
    unsafe {
        node::set_bf(top, 0);
        node::set_bf(bottom, 0);
    }
    new_root
}

/// Right-left compound rotation: `top.right = middle`, `middle.left = bottom`.
/// Precondition: `bf(top) == 2 && bf(middle) == -1`.
pub unsafe fn rotate_right_left<N: Linked>(
    top: NonNull<N>,
    middle: NonNull<N>,
    bottom: NonNull<N>,
) -> NonNull<N> {
    debug_assert_eq!(unsafe { node::bf(top) }, 2);
    debug_assert_eq!(unsafe { node::bf(middle) }, -1);
    let bottom_bf = unsafe { node::bf(bottom) };

    let new_right = unsafe { rotate_right_raw(middle, bottom) };
    unsafe { node::set_right(top, Some(new_right)) };
    let new_root = unsafe { rotate_left_raw(top, bottom) };

    let (top_bf, middle_bf) = match bottom_bf {
        -1 => (1, 0),
        0 => (0, 0),
        1 => (0, -1),
        other => unreachable!("balance factor out of range: {other}"),
    };
    unsafe {
        node::set_bf(top, top_bf);
        node::set_bf(middle, middle_bf);
        node::set_bf(bottom, 0);
    }
    new_root
}

/// Left-right compound rotation, mirror of [`rotate_right_left`].
/// Precondition: `bf(top) == -2 && bf(middle) == 1`.
pub unsafe fn rotate_left_right<N: Linked>(
    top: NonNull<N>,
    middle: NonNull<N>,
    bottom: NonNull<N>,
) -> NonNull<N> {
    debug_assert_eq!(unsafe { node::bf(top) }, -2);
    debug_assert_eq!(unsafe { node::bf(middle) }, 1);
    let bottom_bf = unsafe { node::bf(bottom) };

    let new_left = unsafe { rotate_left_raw(middle, bottom) };
    unsafe { node::set_left(top, Some(new_left)) };
    let new_root = unsafe { rotate_right_raw(top, bottom) };

    let (top_bf, middle_bf) = match bottom_bf {
        1 => (-1, 0),
        0 => (0, 0),
        -1 => (0, 1),
        other => unreachable!("balance factor out of range: {other}"),
    };
    unsafe {
        node::set_bf(top, top_bf);
        node::set_bf(middle, middle_bf);
        node::set_bf(bottom, 0);
    }
    new_root
}

/// Selects and applies the correct rotation for an imbalanced node
/// discovered during insertion, where the heavy child's balance factor
/// is always `+-1` (never `0` — insertion only ever adds one leaf).
pub unsafe fn dispatch_rotate_insert<N: Linked>(top: NonNull<N>) -> NonNull<N> {
    let top_bf = unsafe { node::bf(top) };
    debug_assert!(top_bf == 2 || top_bf == -2);
    if top_bf == 2 {
        let right = unsafe { node::right(top) }.expect("bf=2 implies a right child");
        let right_bf = unsafe { node::bf(right) };
        if right_bf == 1 {
            unsafe { rotate_left(top, right) }
        } else {
            let middle_left = unsafe { node::left(right) }.expect("bf=-1 implies a left child");
            unsafe { rotate_right_left(top, right, middle_left) }
        }
    } else {
        let left = unsafe { node::left(top) }.expect("bf=-2 implies a left child");
        let left_bf = unsafe { node::bf(left) };
        if left_bf == -1 {
            unsafe { rotate_right(top, left) }
        } else {
            let middle_right = unsafe { node::right(left) }.expect("bf=1 implies a right child");
            unsafe { rotate_left_right(top, left, middle_right) }
        }
    }
}

/// Outcome of rebalancing one ancestor during removal retrace: whether
/// the subtree's height decreased (retrace should continue upward) or
/// stayed the same (retrace should stop).
pub struct RemovalRebalance<N> {
    pub new_root: NonNull<N>,
    pub height_decreased: bool,
}

/// Selects and applies the correct rotation for an imbalanced node
/// discovered during removal retrace, where the heavy child's balance
/// factor may be `0` (a case insertion never produces).
pub unsafe fn dispatch_rotate_remove<N: Linked>(top: NonNull<N>) -> RemovalRebalance<N> {
    let top_bf = unsafe { node::bf(top) };
    debug_assert!(top_bf == 2 || top_bf == -2);
    if top_bf == 2 {
        let right = unsafe { node::right(top) }.expect("bf=2 implies a right child");
        let right_bf = unsafe { node::bf(right) };
        if right_bf == 0 {
            let new_root = unsafe { rotate_left_raw(top, right) };
            unsafe {
                node::set_bf(top, 1);
                node::set_bf(right, -1);
            }
            RemovalRebalance {
                new_root,
                height_decreased: false,
            }
        } else if right_bf == 1 {
            let new_root = unsafe { rotate_left(top, right) };
            RemovalRebalance {
                new_root,
                height_decreased: true,
            }
        } else {
            let middle_left = unsafe { node::left(right) }.expect("bf=-1 implies a left child");
            let new_root = unsafe { rotate_right_left(top, right, middle_left) };
            RemovalRebalance {
                new_root,
                height_decreased: true,
            }
        }
    } else {
        let left = unsafe { node::left(top) }.expect("bf=-2 implies a left child");
        let left_bf = unsafe { node::bf(left) };
        if left_bf == 0 {
            let new_root = unsafe { rotate_right_raw(top, left) };
            unsafe {
                node::set_bf(top, -1);
                node::set_bf(left, 1);
            }
            RemovalRebalance {
                new_root,
                height_decreased: false,
            }
        } else if left_bf == -1 {
            let new_root = unsafe { rotate_right(top, left) };
            RemovalRebalance {
                new_root,
                height_decreased: true,
            }
        } else {
            let middle_right = unsafe { node::right(left) }.expect("bf=1 implies a right child");
            let new_root = unsafe { rotate_left_right(top, left, middle_right) };
            RemovalRebalance {
                new_root,
                height_decreased: true,
            }
        }
    }
}
