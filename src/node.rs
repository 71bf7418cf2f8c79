//! Tree nodes: one heap block per entry, owning both children.

use crate::lifecycle::Cleanup;
use crate::tracing_helpers::warn_log;
use std::collections::TryReserveError;
use std::fmt;

/// Owned edge to a child; `None` is a nil link.
pub(crate) type Link<K, V> = Option<Box<Node<K, V>>>;

/// Color of the link from a node's parent into the node.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

impl Color {
    #[inline]
    pub(crate) fn flipped(self) -> Self {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }
}

pub(crate) struct Node<K, V> {
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    pub(crate) color: Color,
    pub(crate) key: K,
    pub(crate) value: V,
}

/// A node could not be allocated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocError(TryReserveError);

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree node allocation failed: {}", self.0)
    }
}

impl std::error::Error for AllocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl<K, V> Node<K, V> {
    /// Allocate a fresh red node. Fresh nodes always enter as red links.
    ///
    /// On failure `key` and `value` are handed back untouched so the caller
    /// decides how to dispose of them.
    pub(crate) fn create(key: K, value: V) -> Result<Box<Self>, (AllocError, K, V)> {
        let mut slot: Vec<Self> = Vec::new();
        let reserved = fault::check().and_then(|()| slot.try_reserve_exact(1));
        if let Err(e) = reserved {
            warn_log!(error = %e, "node allocation failed");
            return Err((AllocError(e), key, value));
        }
        slot.push(Node {
            left: None,
            right: None,
            color: Color::Red,
            key,
            value,
        });
        let one: Box<[Self; 1]> = match slot.into_boxed_slice().try_into() {
            Ok(b) => b,
            Err(_) => unreachable!("exactly one node was pushed"),
        };
        // SAFETY: `[T; 1]` and `T` share size and alignment, so the block
        // allocated for the array is a valid allocation for a single node.
        Ok(unsafe { Box::from_raw(Box::into_raw(one).cast::<Self>()) })
    }

    /// Run the cleanup hooks on a detached node and free it.
    pub(crate) fn destroy<KA, VA>(mut self: Box<Self>, key_hooks: &KA, value_hooks: &VA)
    where
        KA: Cleanup<K>,
        VA: Cleanup<V>,
    {
        debug_assert!(self.left.is_none() && self.right.is_none());
        key_hooks.cleanup(&mut self.key);
        value_hooks.cleanup(&mut self.value);
    }

    /// Detach the node's payload, freeing the block without running hooks.
    pub(crate) fn into_entry(self: Box<Self>) -> (K, V) {
        debug_assert!(self.left.is_none() && self.right.is_none());
        let node = *self;
        (node.key, node.value)
    }

    #[inline]
    pub(crate) fn is_red(link: &Link<K, V>) -> bool {
        matches!(link, Some(n) if n.color == Color::Red)
    }

    #[inline]
    pub(crate) fn left_is_red(&self) -> bool {
        Self::is_red(&self.left)
    }

    #[inline]
    pub(crate) fn right_is_red(&self) -> bool {
        Self::is_red(&self.right)
    }

    /// Whether the left-left grandchild is red.
    #[inline]
    pub(crate) fn left_left_is_red(&self) -> bool {
        self.left.as_ref().is_some_and(|l| l.left_is_red())
    }
}

/// Post-order teardown of a whole subtree, children before parent.
pub(crate) fn destroy_subtree<K, V, KA, VA>(link: Link<K, V>, key_hooks: &KA, value_hooks: &VA)
where
    KA: Cleanup<K>,
    VA: Cleanup<V>,
{
    if let Some(mut node) = link {
        destroy_subtree(node.left.take(), key_hooks, value_hooks);
        destroy_subtree(node.right.take(), key_hooks, value_hooks);
        node.destroy(key_hooks, value_hooks);
    }
}

/// Number of nodes reachable from `link`.
pub(crate) fn count<K, V>(link: &Link<K, V>) -> usize {
    match link {
        None => 0,
        Some(n) => 1 + count(&n.left) + count(&n.right),
    }
}


#[cfg(not(test))]
mod fault {
    use std::collections::TryReserveError;

    #[inline(always)]
    pub(crate) fn check() -> Result<(), TryReserveError> {
        Ok(())
    }
}
