//! LlrbTree: the public ordered map over the balancing engine.

use crate::balance;
use crate::compare::{Compare, Natural};
use crate::iter::{Iter, IterMut};
use crate::lifecycle::{Cleanup, Lifecycle, Plain};
use crate::node::{destroy_subtree, AllocError, Color, Link, Node};
use crate::reentrancy::OpTracker;
use crate::tracing_helpers::{debug_log, trace_log, warn_log};
use crate::validate::{self, InvariantError};
use core::fmt;
use core::mem;
use std::alloc::{handle_alloc_error, Layout};

#[derive(Debug)]
pub enum InsertError {
    DuplicateKey,
    Alloc(AllocError),
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::DuplicateKey => f.write_str("key already present"),
            InsertError::Alloc(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for InsertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InsertError::DuplicateKey => None,
            InsertError::Alloc(e) => Some(e),
        }
    }
}

impl From<AllocError> for InsertError {
    fn from(e: AllocError) -> Self {
        InsertError::Alloc(e)
    }
}

/// Ordered map backed by a left-leaning red-black tree.
///
/// `C` orders the keys; `KA` and `VA` are the lifecycle hooks for keys and
/// values. With the defaults the tree behaves like an ordinary owned map
/// over `Ord` keys.
pub struct LlrbTree<K, V, C = Natural, KA = Plain, VA = Plain>
where
    KA: Cleanup<K>,
    VA: Cleanup<V>,
{
    core: Core<K, V, C>,
    key_hooks: KA,
    value_hooks: VA,
    ops: OpTracker,
}

/// Structural state, kept apart from the hooks and the operation tracker
/// so a scope can stay open while the structure is mutated.
struct Core<K, V, C> {
    root: Link<K, V>,
    len: usize,
    compare: C,
}

impl<K: Ord, V> LlrbTree<K, V> {
    pub fn new() -> Self {
        Self::with_hooks(Natural, Plain, Plain)
    }
}

impl<K: Ord, V> Default for LlrbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> LlrbTree<K, V, C>
where
    C: Compare<K>,
{
    pub fn with_comparator(compare: C) -> Self {
        Self::with_hooks(compare, Plain, Plain)
    }
}

impl<K, V, C, KA, VA> LlrbTree<K, V, C, KA, VA>
where
    C: Compare<K>,
    KA: Cleanup<K>,
    VA: Cleanup<V>,
{
    pub fn with_hooks(compare: C, key_hooks: KA, value_hooks: VA) -> Self {
        Self {
            core: Core {
                root: None,
                len: 0,
                compare,
            },
            key_hooks,
            value_hooks,
            ops: OpTracker::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.core.len
    }

    pub fn is_empty(&self) -> bool {
        self.core.root.is_none()
    }

    pub fn comparator(&self) -> &C {
        &self.core.compare
    }

    /// Insert a new entry. An existing key is rejected with
    /// `InsertError::DuplicateKey` and the tree is left untouched.
    ///
    /// Rejected or unallocatable `key`/`value` are dropped without running
    /// the cleanup hooks; they never belonged to the tree.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let _op = self.ops.begin("insert");
        if balance::find(&self.core.root, &key, &self.core.compare).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        let fresh = Node::create(key, value).map_err(|(e, _k, _v)| e)?;
        self.core.link(fresh);
        Ok(())
    }

    /// Insert a key whose value is default-constructed by the value hooks.
    pub fn insert_default(&mut self, key: K) -> Result<(), InsertError>
    where
        VA: Lifecycle<V>,
    {
        let _op = self.ops.begin("insert_default");
        if balance::find(&self.core.root, &key, &self.core.compare).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        let value = self.value_hooks.init();
        let fresh = match Node::create(key, value) {
            Ok(n) => n,
            Err((e, _key, mut value)) => {
                self.value_hooks.cleanup(&mut value);
                return Err(e.into());
            }
        };
        self.core.link(fresh);
        Ok(())
    }

    /// Insert copies of `key` and `value` made by the lifecycle hooks.
    pub fn insert_cloned(&mut self, key: &K, value: &V) -> Result<(), InsertError>
    where
        KA: Lifecycle<K>,
        VA: Lifecycle<V>,
    {
        let _op = self.ops.begin("insert_cloned");
        if balance::find(&self.core.root, key, &self.core.compare).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        let fresh = create_copy(key, value, &self.key_hooks, &self.value_hooks)?;
        self.core.link(fresh);
        Ok(())
    }

    /// Insert `key`, or overwrite its value when already present.
    ///
    /// Returns `Ok(true)` when a new entry was created.
    pub fn insert_or_set(&mut self, key: K, value: V) -> Result<bool, InsertError> {
        let _op = self.ops.begin("insert_or_set");
        if let Some(n) = balance::find_mut(&mut self.core.root, &key, &self.core.compare) {
            replace_value(n, value, &self.value_hooks);
            return Ok(false);
        }
        let fresh = Node::create(key, value).map_err(|(e, _k, _v)| e)?;
        self.core.link(fresh);
        Ok(true)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let _op = self.ops.begin("get");
        balance::find(&self.core.root, key, &self.core.compare).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let _op = self.ops.begin("get_mut");
        balance::find_mut(&mut self.core.root, key, &self.core.compare).map(|n| &mut n.value)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let _op = self.ops.begin("get_key_value");
        balance::find(&self.core.root, key, &self.core.compare).map(|n| (&n.key, &n.value))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let _op = self.ops.begin("contains_key");
        balance::find(&self.core.root, key, &self.core.compare).is_some()
    }

    /// Overwrite the value stored under `key` in place; the old value goes
    /// through the cleanup hook. Returns `false` (dropping `value`) when the
    /// key is absent. The tree's shape never changes.
    pub fn set(&mut self, key: &K, value: V) -> bool {
        let _op = self.ops.begin("set");
        match balance::find_mut(&mut self.core.root, key, &self.core.compare) {
            Some(n) => {
                replace_value(n, value, &self.value_hooks);
                true
            }
            None => false,
        }
    }

    /// Smallest entry, or `None` for an empty tree.
    pub fn min(&self) -> Option<(&K, &V)> {
        balance::leftmost(&self.core.root).map(|n| (&n.key, &n.value))
    }

    /// Largest entry, or `None` for an empty tree.
    pub fn max(&self) -> Option<(&K, &V)> {
        balance::rightmost(&self.core.root).map(|n| (&n.key, &n.value))
    }

    /// Remove `key`, running the cleanup hooks on its entry. Removing an
    /// absent key is a no-op that returns `false`.
    pub fn remove(&mut self, key: &K) -> bool {
        let _op = self.ops.begin("remove");
        match self.core.detach(key) {
            Some(node) => {
                node.destroy(&self.key_hooks, &self.value_hooks);
                true
            }
            None => false,
        }
    }

    /// Remove `key` and hand its entry back without running any hook.
    pub fn take(&mut self, key: &K) -> Option<(K, V)> {
        let _op = self.ops.begin("take");
        self.core.detach(key).map(Node::into_entry)
    }

    pub fn remove_min(&mut self) -> bool {
        let _op = self.ops.begin("remove_min");
        match self.core.detach_extreme(balance::remove_min) {
            Some(node) => {
                node.destroy(&self.key_hooks, &self.value_hooks);
                true
            }
            None => false,
        }
    }

    pub fn remove_max(&mut self) -> bool {
        let _op = self.ops.begin("remove_max");
        match self.core.detach_extreme(balance::remove_max) {
            Some(node) => {
                node.destroy(&self.key_hooks, &self.value_hooks);
                true
            }
            None => false,
        }
    }

    pub fn pop_min(&mut self) -> Option<(K, V)> {
        let _op = self.ops.begin("pop_min");
        self.core.detach_extreme(balance::remove_min).map(Node::into_entry)
    }

    pub fn pop_max(&mut self) -> Option<(K, V)> {
        let _op = self.ops.begin("pop_max");
        self.core.detach_extreme(balance::remove_max).map(Node::into_entry)
    }

    /// Destroy every entry, children before parents.
    pub fn clear(&mut self) {
        let _op = self.ops.begin("clear");
        debug_log!(entries = self.core.len, "clearing");
        self.core.len = 0;
        destroy_subtree(self.core.root.take(), &self.key_hooks, &self.value_hooks);
    }

    /// Replace this tree's contents with a deep copy of `src`, made through
    /// the lifecycle hooks of `self`. The copy keeps `src`'s shape, so
    /// `self` takes over a clone of `src`'s comparator as well.
    ///
    /// On allocation failure the partial copy is torn down and `self` keeps
    /// its previous contents and comparator.
    pub fn copy_from<KA2, VA2>(
        &mut self,
        src: &LlrbTree<K, V, C, KA2, VA2>,
    ) -> Result<(), AllocError>
    where
        C: Clone,
        KA: Lifecycle<K>,
        VA: Lifecycle<V>,
        KA2: Cleanup<K>,
        VA2: Cleanup<V>,
    {
        let _op = self.ops.begin("copy_from");
        let _src_op = src.ops.begin("copy_from");
        let compare = src.core.compare.clone();
        let copied = clone_link(&src.core.root, &self.key_hooks, &self.value_hooks)?;
        let old = mem::replace(&mut self.core.root, copied);
        self.core.len = src.core.len;
        self.core.compare = compare;
        destroy_subtree(old, &self.key_hooks, &self.value_hooks);
        debug_log!(entries = self.core.len, "copied");
        Ok(())
    }

    /// Deep copy through the lifecycle hooks.
    pub fn try_clone(&self) -> Result<Self, AllocError>
    where
        C: Clone,
        KA: Lifecycle<K> + Clone,
        VA: Lifecycle<V> + Clone,
    {
        let _op = self.ops.begin("try_clone");
        let root = clone_link(&self.core.root, &self.key_hooks, &self.value_hooks)?;
        Ok(Self {
            core: Core {
                root,
                len: self.core.len,
                compare: self.core.compare.clone(),
            },
            key_hooks: self.key_hooks.clone(),
            value_hooks: self.value_hooks.clone(),
            ops: OpTracker::default(),
        })
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.core.root, self.core.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.core.root, self.core.len)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Check every red-black invariant and return the tree's black height.
    pub fn check_invariants(&self) -> Result<usize, InvariantError> {
        let _op = self.ops.begin("check_invariants");
        validate::check(&self.core.root, self.core.len, &self.core.compare)
    }
}

impl<K, V, C: Compare<K>> Core<K, V, C> {
    fn link(&mut self, fresh: Box<Node<K, V>>) {
        let len = self.len;
        let out = RootOut::new(&mut self.len);
        let mut root = balance::insert(self.root.take(), fresh, &self.compare);
        root.color = Color::Black;
        self.root = Some(root);
        out.commit(len + 1);
        trace_log!(len = self.len, "inserted");
    }

    fn detach(&mut self, key: &K) -> Option<Box<Node<K, V>>> {
        if balance::find(&self.root, key, &self.compare).is_none() {
            return None;
        }
        let root = prime(self.root.take()?);
        let len = self.len;
        let out = RootOut::new(&mut self.len);
        let (root, removed) = balance::remove(root, key, &self.compare);
        self.root = blacken(root);
        out.commit(len - usize::from(removed.is_some()));
        trace_log!(len = self.len, "removed");
        removed
    }

    /// Detach the minimum or maximum. These descents never call the
    /// comparator, so no unwind can interrupt them.
    fn detach_extreme(
        &mut self,
        descend: fn(Box<Node<K, V>>) -> (Link<K, V>, Box<Node<K, V>>),
    ) -> Option<Box<Node<K, V>>> {
        let root = prime(self.root.take()?);
        let (root, removed) = descend(root);
        self.root = blacken(root);
        self.len -= 1;
        trace_log!(len = self.len, "removed");
        Some(removed)
    }
}

/// Open while a descent has the root taken out of the tree.
///
/// If the comparator panics mid-descent the nodes held by the unwinding
/// frames are dropped without the cleanup hooks, and the tree is left
/// empty with `len` zeroed to match.
struct RootOut<'a> {
    len: &'a mut usize,
    armed: bool,
}

impl<'a> RootOut<'a> {
    fn new(len: &'a mut usize) -> Self {
        Self { len, armed: true }
    }

    /// The root is back in place; record the new length.
    fn commit(mut self, len: usize) {
        *self.len = len;
        self.armed = false;
    }
}

impl Drop for RootOut<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn_log!(lost = *self.len, "descent unwound, tree emptied");
            *self.len = 0;
        }
    }
}

fn blacken<K, V>(mut root: Link<K, V>) -> Link<K, V> {
    if let Some(r) = root.as_mut() {
        r.color = Color::Black;
    }
    root
}

/// Paint the root red when neither child is, so the move-red steps apply
/// uniformly at the top of a deletion descent.
fn prime<K, V>(mut root: Box<Node<K, V>>) -> Box<Node<K, V>> {
    if !root.left_is_red() && !root.right_is_red() {
        root.color = Color::Red;
    }
    root
}

fn replace_value<K, V, VA: Cleanup<V>>(node: &mut Node<K, V>, value: V, value_hooks: &VA) {
    let mut old = mem::replace(&mut node.value, value);
    value_hooks.cleanup(&mut old);
}

/// Build a detached node from hook-made copies of `key` and `value`.
fn create_copy<K, V, KA, VA>(
    key: &K,
    value: &V,
    key_hooks: &KA,
    value_hooks: &VA,
) -> Result<Box<Node<K, V>>, AllocError>
where
    KA: Lifecycle<K>,
    VA: Lifecycle<V>,
{
    let k = key_hooks.copy(key);
    let v = value_hooks.copy(value);
    Node::create(k, v).map_err(|(e, mut k, mut v)| {
        key_hooks.cleanup(&mut k);
        value_hooks.cleanup(&mut v);
        e
    })
}

/// Deep copy of a subtree, preserving shape and colors. A failure anywhere
/// tears down whatever was already built for this subtree.
fn clone_link<K, V, KA, VA>(
    link: &Link<K, V>,
    key_hooks: &KA,
    value_hooks: &VA,
) -> Result<Link<K, V>, AllocError>
where
    KA: Lifecycle<K>,
    VA: Lifecycle<V>,
{
    let src = match link {
        None => return Ok(None),
        Some(n) => n,
    };
    let mut fresh = create_copy(&src.key, &src.value, key_hooks, value_hooks)?;
    fresh.color = src.color;
    match clone_link(&src.left, key_hooks, value_hooks) {
        Ok(left) => fresh.left = left,
        Err(e) => {
            fresh.destroy(key_hooks, value_hooks);
            return Err(e);
        }
    }
    match clone_link(&src.right, key_hooks, value_hooks) {
        Ok(right) => fresh.right = right,
        Err(e) => {
            warn_log!("rolling back partial copy");
            destroy_subtree(Some(fresh), key_hooks, value_hooks);
            return Err(e);
        }
    }
    Ok(Some(fresh))
}

fn alloc_failed<K, V>() -> ! {
    handle_alloc_error(Layout::new::<Node<K, V>>())
}

impl<K, V, C, KA, VA> Drop for LlrbTree<K, V, C, KA, VA>
where
    KA: Cleanup<K>,
    VA: Cleanup<V>,
{
    fn drop(&mut self) {
        let _op = self.ops.begin("drop");
        destroy_subtree(self.core.root.take(), &self.key_hooks, &self.value_hooks);
    }
}

impl<K, V, C, KA, VA> Clone for LlrbTree<K, V, C, KA, VA>
where
    C: Compare<K> + Clone,
    KA: Lifecycle<K> + Clone,
    VA: Lifecycle<V> + Clone,
{
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|_| alloc_failed::<K, V>())
    }
}

impl<K, V, C, KA, VA> fmt::Debug for LlrbTree<K, V, C, KA, VA>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Compare<K>,
    KA: Cleanup<K>,
    VA: Cleanup<V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C, KA, VA> IntoIterator for &'a LlrbTree<K, V, C, KA, VA>
where
    C: Compare<K>,
    KA: Cleanup<K>,
    VA: Cleanup<V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C, KA, VA> IntoIterator for &'a mut LlrbTree<K, V, C, KA, VA>
where
    C: Compare<K>,
    KA: Cleanup<K>,
    VA: Cleanup<V>,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Later pairs overwrite earlier ones with the same key.
impl<K, V, C, KA, VA> Extend<(K, V)> for LlrbTree<K, V, C, KA, VA>
where
    C: Compare<K>,
    KA: Cleanup<K>,
    VA: Cleanup<V>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            if let Err(InsertError::Alloc(_)) = self.insert_or_set(k, v) {
                alloc_failed::<K, V>();
            }
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for LlrbTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut t = Self::new();
        t.extend(iter);
        t
    }
}
