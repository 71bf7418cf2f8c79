// Property tests for LlrbTree kept inside the crate so they can reach the
// allocation fault injector.

use crate::llrb_tree::{InsertError, LlrbTree};
use crate::node::fault;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    InsertOrSet(u16, i32),
    Set(u16, i32),
    Remove(u16),
    Take(u16),
    RemoveMin,
    RemoveMax,
    PopMin,
    PopMax,
    Get(u16),
    Clear,
}

prop_compose! {
    fn arb_ops()(ops in proptest::collection::vec(
        prop_oneof![
            6 => (0u16..200, any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => (0u16..200, any::<i32>()).prop_map(|(k, v)| Op::InsertOrSet(k, v)),
            1 => (0u16..200, any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
            4 => (0u16..200).prop_map(Op::Remove),
            1 => (0u16..200).prop_map(Op::Take),
            1 => Just(Op::RemoveMin),
            1 => Just(Op::RemoveMax),
            1 => Just(Op::PopMin),
            1 => Just(Op::PopMax),
            2 => (0u16..200).prop_map(Op::Get),
            1 => Just(Op::Clear),
        ], 1..300)) -> Vec<Op> { ops }
}

// State machine harness over LlrbTree against a BTreeMap model.
proptest! {
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let mut sut: LlrbTree<u16, i32> = LlrbTree::new();
        let mut model: BTreeMap<u16, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let already = model.contains_key(&k);
                    match sut.insert(k, v) {
                        Ok(()) => {
                            prop_assert!(!already, "insert must fail on duplicate");
                            model.insert(k, v);
                        }
                        Err(InsertError::DuplicateKey) => prop_assert!(already),
                        Err(InsertError::Alloc(e)) => prop_assert!(false, "unexpected {}", e),
                    }
                }
                Op::InsertOrSet(k, v) => {
                    let created = sut.insert_or_set(k, v).unwrap();
                    prop_assert_eq!(created, model.insert(k, v).is_none());
                }
                Op::Set(k, v) => {
                    let hit = sut.set(&k, v);
                    prop_assert_eq!(hit, model.contains_key(&k));
                    if hit {
                        model.insert(k, v);
                    }
                }
                Op::Remove(k) => {
                    prop_assert_eq!(sut.remove(&k), model.remove(&k).is_some());
                }
                Op::Take(k) => {
                    prop_assert_eq!(sut.take(&k), model.remove_entry(&k));
                }
                Op::RemoveMin => {
                    prop_assert_eq!(sut.remove_min(), model.pop_first().is_some());
                }
                Op::RemoveMax => {
                    prop_assert_eq!(sut.remove_max(), model.pop_last().is_some());
                }
                Op::PopMin => prop_assert_eq!(sut.pop_min(), model.pop_first()),
                Op::PopMax => prop_assert_eq!(sut.pop_max(), model.pop_last()),
                Op::Get(k) => prop_assert_eq!(sut.get(&k), model.get(&k)),
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            // Post-conditions after each op
            prop_assert!(sut.check_invariants().is_ok(), "{:?}", sut.check_invariants());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert_eq!(sut.min(), model.first_key_value());
            prop_assert_eq!(sut.max(), model.last_key_value());
        }

        prop_assert!(sut.iter().eq(model.iter()));
    }
}

proptest! {
    // An insert whose node allocation fails is invisible: same entries,
    // same invariants, same black height.
    #[test]
    fn prop_failed_insert_is_atomic(keys in proptest::collection::btree_set(0u32..10_000, 1..200), extra in 10_000u32..20_000) {
        let mut t: LlrbTree<u32, u32> = keys.iter().map(|&k| (k, k)).collect();
        let height = t.check_invariants().unwrap();

        fault::fail_after(0);
        let res = t.insert(extra, 0);
        fault::reset();

        prop_assert!(matches!(res, Err(InsertError::Alloc(_))));
        prop_assert_eq!(t.check_invariants(), Ok(height));
        prop_assert!(t.keys().eq(keys.iter()));
    }

    // A copy that fails after any number of node allocations leaves the
    // destination exactly as it was.
    #[test]
    fn prop_failed_copy_is_atomic(n in 1u32..120, budget_frac in 0.0f64..1.0) {
        let src: LlrbTree<u32, u32> = (0..n).map(|k| (k, k * 3)).collect();
        let mut dst: LlrbTree<u32, u32> = (1000..1010).map(|k| (k, k)).collect();
        let budget = ((n as f64) * budget_frac) as usize;

        fault::fail_after(budget);
        let res = dst.copy_from(&src);
        fault::reset();

        prop_assert!(res.is_err());
        prop_assert_eq!(dst.len(), 10);
        prop_assert!(dst.keys().copied().eq(1000..1010));
        prop_assert!(dst.check_invariants().is_ok());
    }
}
