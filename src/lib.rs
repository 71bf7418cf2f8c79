//! llrb-map: an ordered map built on a left-leaning red-black tree, with a
//! pluggable ordering function and per-field lifecycle hooks.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the balancing logic small and locally checkable, and keep
//!   every call into user code at a point where the structure is whole.
//! - Layers:
//!   - `node`: one heap block per entry owning both children; fallible
//!     allocation so a failed insert or copy never touches the tree.
//!   - `balance`: rotations, color flips, the `subtree_balance` fix-up and
//!     the recursive insert/delete descents. Each descent consumes an owned
//!     subtree and returns the new subtree root.
//!   - `LlrbTree<K, V, C, KA, VA>`: public surface; owns the root, the
//!     comparator `C` and the key/value lifecycle hooks `KA`/`VA`.
//!
//! Constraints
//! - Single-threaded: trees are `!Send` and `!Sync`.
//! - Strictly hierarchical ownership: `Box` children, no parent pointers,
//!   no reference counting.
//! - Unique keys: inserting an existing key fails with
//!   `InsertError::DuplicateKey`; `set` and `insert_or_set` overwrite.
//! - O(log n) insert, remove, lookup and min/max.
//!
//! Red-black invariants (hold after every public call, not mid-descent)
//! - Keys in a left subtree compare less, keys in a right subtree greater.
//! - Red links lean left; no node has a red right child.
//! - No two red links in a row.
//! - Every root-to-nil path crosses the same number of black links.
//! - The root is black.
//!
//! `LlrbTree::check_invariants` verifies all of them and returns the black
//! height.
//!
//! Lifecycle hooks
//! - `Cleanup` runs on every key and value the tree destroys: `remove`,
//!   `remove_min`/`remove_max`, the old value in `set`, `clear`, `Drop`.
//! - `Lifecycle` adds `copy` (`insert_cloned`, `copy_from`, `try_clone`)
//!   and `init` (`insert_default`).
//! - Entries handed back by value (`take`, `pop_min`, `pop_max`) skip
//!   cleanup; their ownership moves to the caller.
//! - On deletion a matched node with a right subtree swaps payloads with
//!   its successor; the payloads move and no hook runs for the move.
//!
//! Reentrancy and panics
//! - Comparators and hooks may use other trees freely. Reaching back into
//!   the tree that invoked them panics in debug builds, naming both
//!   operations.
//! - A comparator that panics during an insert or remove descent leaves the
//!   tree empty (`len() == 0`); the entries it held are dropped without the
//!   cleanup hooks. Lookups never take the root out and keep the tree whole.
//!
//! Logging
//! - Enable the `tracing` feature to route the crate's trace/debug/warn
//!   events to `tracing`. Without it the log statements compile away.

mod balance;
pub mod compare;
mod iter;
pub mod lifecycle;
mod llrb_tree;
#[cfg(test)]
mod llrb_tree_proptest;
mod node;
mod reentrancy;
mod tracing_helpers;
mod validate;

// Public surface
pub use compare::{Compare, Natural};
pub use iter::{Iter, IterMut};
pub use lifecycle::{Cleanup, FnLifecycle, Lifecycle, Plain};
pub use llrb_tree::{InsertError, LlrbTree};
pub use node::AllocError;
pub use validate::InvariantError;
