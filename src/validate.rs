//! Structural checker for the red-black invariants.

use crate::compare::Compare;
use crate::node::{count, Color, Link, Node};
use core::cmp::Ordering;
use core::fmt;

/// First invariant found broken by [`check`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InvariantError {
    /// A key sits on the wrong side of an ancestor.
    OutOfOrder,
    /// A right child is red.
    RightLeaningRed,
    /// A red node has a red left child.
    ConsecutiveReds,
    /// Two sibling subtrees disagree on their black height.
    UnbalancedBlacks { left: usize, right: usize },
    /// The root is red.
    RedRoot,
    /// The recorded length differs from the number of reachable nodes.
    LenMismatch { recorded: usize, counted: usize },
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantError::OutOfOrder => f.write_str("keys out of order"),
            InvariantError::RightLeaningRed => f.write_str("red right link"),
            InvariantError::ConsecutiveReds => f.write_str("two red links in a row"),
            InvariantError::UnbalancedBlacks { left, right } => {
                write!(f, "unbalanced black height: left {left}, right {right}")
            }
            InvariantError::RedRoot => f.write_str("root is red"),
            InvariantError::LenMismatch { recorded, counted } => {
                write!(f, "len is {recorded} but {counted} nodes are reachable")
            }
        }
    }
}

impl std::error::Error for InvariantError {}

/// Validate the whole tree rooted at `root` and return its black height.
pub(crate) fn check<K, V, C>(root: &Link<K, V>, len: usize, cmp: &C) -> Result<usize, InvariantError>
where
    C: Compare<K>,
{
    if Node::is_red(root) {
        return Err(InvariantError::RedRoot);
    }
    let counted = count(root);
    if counted != len {
        return Err(InvariantError::LenMismatch {
            recorded: len,
            counted,
        });
    }
    check_subtree(root, None, None, cmp)
}

/// Keys under `link` must lie strictly between `lo` and `hi`.
fn check_subtree<K, V, C>(
    link: &Link<K, V>,
    lo: Option<&K>,
    hi: Option<&K>,
    cmp: &C,
) -> Result<usize, InvariantError>
where
    C: Compare<K>,
{
    let n = match link {
        None => return Ok(0),
        Some(n) => n,
    };
    if lo.is_some_and(|lo| cmp.compare(&n.key, lo) != Ordering::Greater)
        || hi.is_some_and(|hi| cmp.compare(&n.key, hi) != Ordering::Less)
    {
        return Err(InvariantError::OutOfOrder);
    }
    if n.right_is_red() {
        return Err(InvariantError::RightLeaningRed);
    }
    if n.color == Color::Red && n.left_is_red() {
        return Err(InvariantError::ConsecutiveReds);
    }

    let left = check_subtree(&n.left, lo, Some(&n.key), cmp)?;
    let right = check_subtree(&n.right, Some(&n.key), hi, cmp)?;
    if left != right {
        return Err(InvariantError::UnbalancedBlacks { left, right });
    }
    Ok(left + usize::from(n.color == Color::Black))
}
