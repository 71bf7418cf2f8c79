//! Per-field lifecycle hooks.
//!
//! A tree holds one `Lifecycle` for its keys and one for its values. The
//! tree calls `copy` whenever it duplicates an element (`insert_cloned`,
//! `copy_from`, `try_clone`), `init` when it has to produce a value from
//! nothing (`insert_default`), and `cleanup` right before an element it owns
//! is dropped (`remove`, `set`, `clear`, teardown).
//!
//! Elements that leave the tree by value (`take`, `pop_min`, `pop_max`) are
//! handed to the caller as-is; no `cleanup` runs for them.

use core::fmt;

/// Destruct hook. Split from `Lifecycle` so trees over types that are
/// neither `Clone` nor `Default` can still run cleanup on teardown.
pub trait Cleanup<T> {
    /// Release resources held by `item`. It is dropped right after.
    fn cleanup(&self, _item: &mut T) {}
}

/// Copy and init hooks, completing the lifecycle triple.
pub trait Lifecycle<T>: Cleanup<T> {
    /// Copy-construct a new element from `src`.
    fn copy(&self, src: &T) -> T;

    /// Default-construct a new element.
    fn init(&self) -> T;
}

/// Hooks that degrade to `Clone`, `Default`, and a no-op cleanup.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Plain;

impl<T> Cleanup<T> for Plain {}

impl<T: Clone + Default> Lifecycle<T> for Plain {
    #[inline]
    fn copy(&self, src: &T) -> T {
        src.clone()
    }

    #[inline]
    fn init(&self) -> T {
        T::default()
    }
}

/// Hooks assembled from closures, for callers that pick behavior at runtime.
///
/// Any of the three can be left out. A missing cleanup is a no-op; a missing
/// copy or init falls back to `Clone` / `Default`.
pub struct FnLifecycle<T> {
    copy: Option<Box<dyn Fn(&T) -> T>>,
    init: Option<Box<dyn Fn() -> T>>,
    cleanup: Option<Box<dyn Fn(&mut T)>>,
}

impl<T> FnLifecycle<T> {
    pub fn new() -> Self {
        Self {
            copy: None,
            init: None,
            cleanup: None,
        }
    }

    pub fn on_copy(mut self, f: impl Fn(&T) -> T + 'static) -> Self {
        self.copy = Some(Box::new(f));
        self
    }

    pub fn on_init(mut self, f: impl Fn() -> T + 'static) -> Self {
        self.init = Some(Box::new(f));
        self
    }

    pub fn on_cleanup(mut self, f: impl Fn(&mut T) + 'static) -> Self {
        self.cleanup = Some(Box::new(f));
        self
    }
}

impl<T> Default for FnLifecycle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FnLifecycle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLifecycle")
            .field("copy", &self.copy.is_some())
            .field("init", &self.init.is_some())
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}

impl<T> Cleanup<T> for FnLifecycle<T> {
    fn cleanup(&self, item: &mut T) {
        if let Some(f) = &self.cleanup {
            f(item);
        }
    }
}

impl<T: Clone + Default> Lifecycle<T> for FnLifecycle<T> {
    fn copy(&self, src: &T) -> T {
        match &self.copy {
            Some(f) => f(src),
            None => src.clone(),
        }
    }

    fn init(&self) -> T {
        match &self.init {
            Some(f) => f(),
            None => T::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn plain_clones_and_defaults() {
        let s = "abc".to_string();
        assert_eq!(Lifecycle::<String>::copy(&Plain, &s), "abc");
        assert_eq!(Lifecycle::<String>::init(&Plain), "");
        let mut v = 5u32;
        Cleanup::<u32>::cleanup(&Plain, &mut v);
        assert_eq!(v, 5);
    }

    #[test]
    fn fn_lifecycle_uses_closures_when_present() {
        let cleaned = Rc::new(Cell::new(0));
        let c = cleaned.clone();
        let hooks = FnLifecycle::<i32>::new()
            .on_copy(|v| v * 2)
            .on_init(|| 42)
            .on_cleanup(move |v| {
                c.set(c.get() + 1);
                *v = 0;
            });

        assert_eq!(hooks.copy(&21), 42);
        assert_eq!(hooks.init(), 42);
        let mut x = 9;
        hooks.cleanup(&mut x);
        assert_eq!(x, 0);
        assert_eq!(cleaned.get(), 1);
    }

    #[test]
    fn fn_lifecycle_falls_back_to_plain() {
        let hooks = FnLifecycle::<String>::default();
        assert_eq!(hooks.copy(&"k".to_string()), "k");
        assert_eq!(hooks.init(), "");
        let mut s = "keep".to_string();
        hooks.cleanup(&mut s);
        assert_eq!(s, "keep");
    }
}
