//! Property tests for statement removal and index bookkeeping.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use seqgen_check::simplify::{compute_index_in_original, compute_unused_indices, index_in_current, remove_statement};
use seqgen_core::{OperationRegistry, Sequence, StatementKind, TypeId, TypeRegistry, Value};

fn random_sequence(steps: Vec<(bool, i32, usize, usize)>) -> (TypeRegistry, Sequence) {
    let (types, ops) = seqgen_demo::build().unwrap();
    let max = Arc::new(StatementKind::call(Arc::clone(ops_max(&ops))));
    let mut seq = Sequence::new();
    for (is_literal, value, a, b) in steps {
        if is_literal || seq.is_empty() {
            let lit = Arc::new(StatementKind::literal(TypeId::INT, Value::Int(value)));
            seq = seq.extend(lit, &[], &types).unwrap();
        } else {
            let inputs = [a % seq.len(), b % seq.len()];
            seq = seq.extend(Arc::clone(&max), &inputs, &types).unwrap();
        }
    }
    (types, seq)
}

fn ops_max(ops: &OperationRegistry) -> &Arc<seqgen_core::Operation> {
    ops.by_descriptor("demo.MathUtil.max(int,int)").unwrap()
}

proptest! {
    #[test]
    fn unused_statements_can_be_removed(
        steps in proptest::collection::vec((any::<bool>(), -50i32..50, 0usize..64, 0usize..64), 1..30),
    ) {
        let (_types, seq) = random_sequence(steps);
        let unused = compute_unused_indices(&seq, &[]);
        // The last statement is never read.
        prop_assert!(unused.contains(&(seq.len() - 1)));
        for &idx in &unused {
            prop_assert!(!seq.is_used(idx));
            let smaller = remove_statement(&seq, idx).unwrap();
            prop_assert_eq!(smaller.len(), seq.len() - 1);
            for (i, stmt) in smaller.statements().iter().enumerate() {
                prop_assert!(stmt.inputs.iter().all(|&input| input < i));
            }
        }
        for idx in 0..seq.len() {
            if !unused.contains(&idx) {
                prop_assert!(remove_statement(&seq, idx).is_err());
            }
        }
    }

    #[test]
    fn index_mapping_is_a_bijection_on_survivors(
        removed in proptest::collection::btree_set(0usize..40, 0..20),
        len in 40usize..60,
    ) {
        let removed: Vec<usize> = removed.into_iter().collect();
        let survivors: BTreeSet<usize> = (0..len).filter(|i| !removed.contains(i)).collect();
        for (current, &original) in survivors.iter().enumerate() {
            prop_assert_eq!(compute_index_in_original(current, &removed), original);
            prop_assert_eq!(index_in_current(original, &removed), Some(current));
        }
        for &r in &removed {
            prop_assert_eq!(index_in_current(r, &removed), None);
        }
    }
}
