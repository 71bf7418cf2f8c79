//! Nested-operation detection for trees.
//!
//! A tree runs user code in the middle of its own operations: the
//! comparator on every descent, the lifecycle hooks whenever it copies or
//! destroys an element. That code may use any other tree. It must not call
//! back into the tree running it, which at that point may have its root
//! taken out for a descent.
//!
//! Debug builds record the name of the public operation in progress and
//! panic on a nested one, naming both. Release builds keep no state.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// The public operation currently running on one tree, if any.
#[derive(Debug, Default)]
pub(crate) struct OpTracker {
    #[cfg(debug_assertions)]
    running: Cell<Option<&'static str>>,
    // Trees are unsynchronized; the raw-pointer marker keeps them !Send + !Sync.
    _single_thread: PhantomData<*mut ()>,
}

impl OpTracker {
    /// Mark `op` as running until the returned scope drops.
    ///
    /// Panics in debug builds when another operation on the same tree is
    /// still on the stack.
    #[inline]
    pub(crate) fn begin(&self, op: &'static str) -> OpScope<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.running.replace(Some(op)) {
                // The outer operation is still on the stack and clears the
                // slot when its own scope unwinds.
                self.running.set(Some(outer));
                panic!("tree reentered: `{op}` called while `{outer}` is running");
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = op;

        OpScope {
            #[cfg(debug_assertions)]
            tracker: self,
            #[cfg(not(debug_assertions))]
            _tracker: PhantomData,
        }
    }

    #[cfg(all(test, debug_assertions))]
    fn running(&self) -> Option<&'static str> {
        self.running.get()
    }
}

/// Open operation on a tree; see [`OpTracker::begin`].
pub(crate) struct OpScope<'a> {
    #[cfg(debug_assertions)]
    tracker: &'a OpTracker,
    #[cfg(not(debug_assertions))]
    _tracker: PhantomData<&'a OpTracker>,
}

impl Drop for OpScope<'_> {
    #[inline]
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.tracker.running.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OpTracker;

    #[cfg(debug_assertions)]
    #[test]
    fn scope_records_running_operation() {
        let ops = OpTracker::default();
        assert_eq!(ops.running(), None);
        {
            let _op = ops.begin("insert");
            assert_eq!(ops.running(), Some("insert"));
        }
        assert_eq!(ops.running(), None);
        let _op = ops.begin("remove");
        assert_eq!(ops.running(), Some("remove"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_operation_panics_naming_both() {
        let ops = OpTracker::default();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = ops.begin("copy_from");
            let _inner = ops.begin("get");
        }));
        let payload = res.expect_err("nested operation must panic in debug builds");
        let msg = payload
            .downcast_ref::<String>()
            .expect("formatted panic message");
        assert!(msg.contains("`get`"), "{msg}");
        assert!(msg.contains("`copy_from`"), "{msg}");

        // The outer scope cleared the slot while unwinding.
        assert_eq!(ops.running(), None);
        let _op = ops.begin("clear");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_operation_is_unchecked_in_release() {
        let ops = OpTracker::default();
        let _outer = ops.begin("copy_from");
        let _inner = ops.begin("get");
    }
}
