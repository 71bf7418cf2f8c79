//! Balancing engine: LLRB rotations, color flips, and the recursive
//! insert/delete descents.
//!
//! Every descent consumes an owned subtree and hands back the (possibly
//! rotated) subtree root, so no parent pointers are ever needed. The
//! invariants only hold again once the outermost call has returned and the
//! caller has painted the root black.
//!
//! ```text
//!        h                    x
//!       / \                  / \
//!      a  (x)     <=>      (h)  c
//!         / \              / \
//!        b   c            a   b
//!  rotate_left(h)    rotate_right(x)
//! ```

use crate::compare::Compare;
use crate::node::{Color, Link, Node};
use core::cmp::Ordering;
use core::mem;

type Subtree<K, V> = Box<Node<K, V>>;

pub(crate) fn rotate_left<K, V>(mut h: Subtree<K, V>) -> Subtree<K, V> {
    let mut x = h.right.take().expect("rotate_left requires a right child");
    debug_assert_eq!(x.color, Color::Red, "rotating a black link");
    h.right = x.left.take();
    x.color = h.color;
    h.color = Color::Red;
    x.left = Some(h);
    x
}

pub(crate) fn rotate_right<K, V>(mut h: Subtree<K, V>) -> Subtree<K, V> {
    let mut x = h.left.take().expect("rotate_right requires a left child");
    debug_assert_eq!(x.color, Color::Red, "rotating a black link");
    h.left = x.right.take();
    x.color = h.color;
    h.color = Color::Red;
    x.right = Some(h);
    x
}

/// Invert the color of `h` and both of its children.
pub(crate) fn flip_colors<K, V>(h: &mut Node<K, V>) {
    debug_assert!(h.left.is_some() && h.right.is_some());
    h.color = h.color.flipped();
    if let Some(l) = h.left.as_mut() {
        l.color = l.color.flipped();
    }
    if let Some(r) = h.right.as_mut() {
        r.color = r.color.flipped();
    }
}

/// Local fix-up applied on the way back up after every structural change.
pub(crate) fn subtree_balance<K, V>(mut h: Subtree<K, V>) -> Subtree<K, V> {
    if h.right_is_red() && !h.left_is_red() {
        h = rotate_left(h);
    }
    if h.left_is_red() && h.left_left_is_red() {
        h = rotate_right(h);
    }
    if h.left_is_red() && h.right_is_red() {
        flip_colors(&mut h);
    }
    h
}

/// Make `h.left` or one of its children red before descending left.
pub(crate) fn move_red_left<K, V>(mut h: Subtree<K, V>) -> Subtree<K, V> {
    flip_colors(&mut h);
    if h.right.as_ref().is_some_and(|r| r.left_is_red()) {
        h.right = h.right.take().map(rotate_right);
        h = rotate_left(h);
        flip_colors(&mut h);
    }
    h
}

/// Make `h.right` or one of its children red before descending right.
pub(crate) fn move_red_right<K, V>(mut h: Subtree<K, V>) -> Subtree<K, V> {
    flip_colors(&mut h);
    if h.left_left_is_red() {
        h = rotate_right(h);
        flip_colors(&mut h);
    }
    h
}

/// Link `fresh` into the subtree at `link`. Equal keys descend right.
pub(crate) fn insert<K, V, C>(link: Link<K, V>, fresh: Subtree<K, V>, cmp: &C) -> Subtree<K, V>
where
    C: Compare<K>,
{
    let mut h = match link {
        None => return fresh,
        Some(h) => h,
    };
    match cmp.compare(&fresh.key, &h.key) {
        Ordering::Less => h.left = Some(insert(h.left.take(), fresh, cmp)),
        Ordering::Equal | Ordering::Greater => {
            h.right = Some(insert(h.right.take(), fresh, cmp))
        }
    }
    subtree_balance(h)
}

/// Detach the minimum node of `h`. Returns the new subtree and the node.
pub(crate) fn remove_min<K, V>(mut h: Subtree<K, V>) -> (Link<K, V>, Subtree<K, V>) {
    if h.left.is_none() {
        let rest = h.right.take();
        debug_assert!(rest.is_none());
        return (rest, h);
    }
    if !h.left_is_red() && !h.left_left_is_red() {
        h = move_red_left(h);
    }
    let left = h.left.take().expect("left child survives move_red_left");
    let (left, min) = remove_min(left);
    h.left = left;
    (Some(subtree_balance(h)), min)
}

/// Detach the maximum node of `h`. Returns the new subtree and the node.
pub(crate) fn remove_max<K, V>(mut h: Subtree<K, V>) -> (Link<K, V>, Subtree<K, V>) {
    if h.left_is_red() {
        h = rotate_right(h);
    }
    if h.right.is_none() {
        let rest = h.left.take();
        debug_assert!(rest.is_none());
        return (rest, h);
    }
    if !h.right_is_red() && !h.right.as_ref().is_some_and(|r| r.left_is_red()) {
        h = move_red_right(h);
    }
    let right = h.right.take().expect("right child survives move_red_right");
    let (right, max) = remove_max(right);
    h.right = right;
    (Some(subtree_balance(h)), max)
}

/// Detach the node holding `key`.
///
/// The caller must have checked that `key` is present; the move-red steps
/// reshape the tree on the way down and are only undone by the fix-ups on
/// the way back up of a descent that actually reaches its target.
///
/// A matched node with a right subtree is not unlinked itself: it swaps
/// payloads with the minimum of its right subtree, and that minimum node,
/// now carrying the removed entry, is what gets detached.
pub(crate) fn remove<K, V, C>(
    mut h: Subtree<K, V>,
    key: &K,
    cmp: &C,
) -> (Link<K, V>, Option<Subtree<K, V>>)
where
    C: Compare<K>,
{
    let removed;
    if cmp.compare(key, &h.key) == Ordering::Less {
        if h.left.is_none() {
            debug_assert!(false, "remove descended towards an absent key");
            return (Some(h), None);
        }
        if !h.left_is_red() && !h.left_left_is_red() {
            h = move_red_left(h);
        }
        let left = h.left.take().expect("left child survives move_red_left");
        let (left, r) = remove(left, key, cmp);
        h.left = left;
        removed = r;
    } else {
        if h.left_is_red() {
            h = rotate_right(h);
        }
        if h.right.is_none() {
            if cmp.compare(key, &h.key) == Ordering::Equal {
                // Terminal 2-node: unlink it directly.
                let rest = h.left.take();
                debug_assert!(rest.is_none());
                return (rest, Some(h));
            }
            debug_assert!(false, "remove descended towards an absent key");
            return (Some(subtree_balance(h)), None);
        }
        if !h.right_is_red() && !h.right.as_ref().is_some_and(|r| r.left_is_red()) {
            h = move_red_right(h);
        }
        let right = h.right.take().expect("right child survives move_red_right");
        if cmp.compare(key, &h.key) == Ordering::Equal {
            let (right, mut min) = remove_min(right);
            h.right = right;
            mem::swap(&mut h.key, &mut min.key);
            mem::swap(&mut h.value, &mut min.value);
            removed = Some(min);
        } else {
            let (right, r) = remove(right, key, cmp);
            h.right = right;
            removed = r;
        }
    }
    (Some(subtree_balance(h)), removed)
}

pub(crate) fn find<'a, K, V, C>(link: &'a Link<K, V>, key: &K, cmp: &C) -> Option<&'a Node<K, V>>
where
    C: Compare<K>,
{
    let mut cur = link.as_deref();
    while let Some(n) = cur {
        cur = match cmp.compare(key, &n.key) {
            Ordering::Less => n.left.as_deref(),
            Ordering::Greater => n.right.as_deref(),
            Ordering::Equal => return Some(n),
        };
    }
    None
}

pub(crate) fn find_mut<'a, K, V, C>(
    link: &'a mut Link<K, V>,
    key: &K,
    cmp: &C,
) -> Option<&'a mut Node<K, V>>
where
    C: Compare<K>,
{
    let mut cur = link.as_deref_mut();
    while let Some(n) = cur {
        cur = match cmp.compare(key, &n.key) {
            Ordering::Less => n.left.as_deref_mut(),
            Ordering::Greater => n.right.as_deref_mut(),
            Ordering::Equal => return Some(n),
        };
    }
    None
}

pub(crate) fn leftmost<K, V>(link: &Link<K, V>) -> Option<&Node<K, V>> {
    let mut n = link.as_deref()?;
    while let Some(l) = n.left.as_deref() {
        n = l;
    }
    Some(n)
}

pub(crate) fn rightmost<K, V>(link: &Link<K, V>) -> Option<&Node<K, V>> {
    let mut n = link.as_deref()?;
    while let Some(r) = n.right.as_deref() {
        n = r;
    }
    Some(n)
}
