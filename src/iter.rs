//! In-order iterators over a tree.

use crate::node::{Link, Node};
use core::iter::FusedIterator;

/// Iterator over `(&K, &V)` in ascending key order.
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(root: &'a Link<K, V>, len: usize) -> Self {
        let mut it = Self {
            stack: Vec::new(),
            remaining: len,
        };
        it.push_left(root.as_deref());
        it
    }

    fn push_left(&mut self, mut link: Option<&'a Node<K, V>>) {
        while let Some(n) = link {
            self.stack.push(n);
            link = n.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        self.push_left(n.right.as_deref());
        self.remaining -= 1;
        Some((&n.key, &n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over `(&K, &mut V)` in ascending key order.
pub struct IterMut<'a, K, V> {
    // Each frame is a visited node split into its disjoint parts.
    stack: Vec<(&'a K, &'a mut V, Option<&'a mut Node<K, V>>)>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(root: &'a mut Link<K, V>, len: usize) -> Self {
        let mut it = Self {
            stack: Vec::new(),
            remaining: len,
        };
        it.push_left(root.as_deref_mut());
        it
    }

    fn push_left(&mut self, mut link: Option<&'a mut Node<K, V>>) {
        while let Some(n) = link {
            let Node {
                left,
                right,
                key,
                value,
                ..
            } = n;
            self.stack.push((&*key, value, right.as_deref_mut()));
            link = left.as_deref_mut();
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value, right) = self.stack.pop()?;
        self.push_left(right);
        self.remaining -= 1;
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}
