//! Minimisation of failing sequences.
//!
//! Two phases alternate until neither makes progress:
//!
//! * **Removal**: statements whose variable is read by no later statement
//!   and no check are deleted one at a time, trying the last one first. A
//!   deletion is kept when the sequence still fails at the same place;
//!   otherwise that statement is never tried again.
//! * **Rewiring**: from the last statement backward, each input is pointed
//!   at the earliest earlier variable of a compatible type. An accepted
//!   rewiring is followed by another removal phase.
//!
//! "Same failure" means that the earliest failing check, mapped back to
//! the original sequence, sits at the original failure index. Exception
//! types and messages are not compared, so two different failures at the
//! same statement count as the same.
//!
//! Positions are tracked with the sorted list of original indices removed
//! so far; [`compute_index_in_original`] and [`index_in_current`] convert
//! between the original and the current numbering.

use std::collections::HashSet;

use tracing::debug;

use seqgen_core::{CoreError, Sequence, SequenceBuilder, TypeId};

use crate::checks::Check;
use crate::error::ExecError;
use crate::executable::{ExecutableSequence, ExecutionContext};
use crate::visitor::ExecutionVisitor;

/// Indices whose variable no later statement and no check reads.
pub fn compute_unused_indices(seq: &Sequence, checks: &[Check]) -> Vec<usize> {
    let mentioned: HashSet<usize> = checks.iter().flat_map(Check::vars).collect();
    (0..seq.len()).filter(|&i| !seq.is_used(i) && !mentioned.contains(&i)).collect()
}

/// `seq` without statement `idx`; later inputs are renumbered.
pub fn remove_statement(seq: &Sequence, idx: usize) -> Result<Sequence, CoreError> {
    let mut builder = SequenceBuilder::from_sequence(seq);
    builder.remove(idx)?;
    builder.freeze()
}

/// `seq` restricted to the statements in `keep`. Fails if a kept statement
/// reads a dropped one.
pub fn retain_statements(seq: &Sequence, keep: &[usize]) -> Result<Sequence, CoreError> {
    let mut builder = SequenceBuilder::from_sequence(seq);
    for idx in (0..seq.len()).rev() {
        if !keep.contains(&idx) {
            builder.remove(idx)?;
        }
    }
    builder.freeze()
}

/// Maps an index of the current sequence to the original one, given the
/// sorted original indices removed so far.
pub fn compute_index_in_original(current: usize, removed: &[usize]) -> usize {
    let mut original = current;
    for &r in removed {
        if r <= original {
            original += 1;
        } else {
            break;
        }
    }
    original
}

/// Maps an original index to the current sequence; `None` if it was removed.
pub fn index_in_current(original: usize, removed: &[usize]) -> Option<usize> {
    if removed.binary_search(&original).is_ok() {
        return None;
    }
    Some(original - removed.iter().take_while(|&&r| r < original).count())
}

/// A minimised failing sequence.
#[derive(Debug, Clone)]
pub struct SimplifyResult {
    pub sequence: Sequence,
    /// The simplified sequence after its last execution.
    pub executable: ExecutableSequence,
    /// Original indices of the deleted statements, ascending.
    pub removed: Vec<usize>,
    /// Failure index in the simplified sequence.
    pub failure_index: usize,
    /// Number of re-executions performed.
    pub executions: usize,
}

struct State {
    eseq: ExecutableSequence,
    removed: Vec<usize>,
}

pub struct Simplifier<'a, 'v> {
    ctx: ExecutionContext<'a>,
    visitor: &'v mut dyn ExecutionVisitor,
    executions: usize,
}

impl<'a, 'v> Simplifier<'a, 'v> {
    /// `visitor` must classify the same way as the run that found the failure.
    pub fn new(ctx: ExecutionContext<'a>, visitor: &'v mut dyn ExecutionVisitor) -> Self {
        Simplifier { ctx, visitor, executions: 0 }
    }

    /// Minimises `failing`, which must have been executed. A sequence
    /// without failure is returned unchanged.
    pub fn simplify(&mut self, failing: &ExecutableSequence) -> Result<SimplifyResult, ExecError> {
        let Some(target) = failing.failure_index() else {
            return Ok(SimplifyResult {
                sequence: failing.sequence().clone(),
                executable: failing.clone(),
                removed: Vec::new(),
                failure_index: 0,
                executions: 0,
            });
        };
        let mut state = State { eseq: failing.clone(), removed: Vec::new() };
        let mut unremovable: HashSet<usize> = HashSet::new();
        loop {
            self.remove_redundant(&mut state, target, &mut unremovable)?;
            if !self.rewire(&mut state, target)? {
                break;
            }
        }

        let failure_index = index_in_current(target, &state.removed).unwrap_or(target);
        debug!(
            original = failing.len(),
            simplified = state.eseq.len(),
            executions = self.executions,
            "simplified failing sequence"
        );
        Ok(SimplifyResult {
            sequence: state.eseq.sequence().clone(),
            executable: state.eseq,
            removed: state.removed,
            failure_index,
            executions: self.executions,
        })
    }

    /// Runs `seq` and keeps it when it fails at `target` in original numbering.
    fn same_failure(
        &mut self,
        seq: Sequence,
        removed: &[usize],
        target: usize,
    ) -> Result<Option<ExecutableSequence>, ExecError> {
        let mut eseq = ExecutableSequence::new(seq);
        eseq.execute(&self.ctx, &mut *self.visitor)?;
        self.executions += 1;
        Ok(match eseq.failure_index() {
            Some(f) if compute_index_in_original(f, removed) == target => Some(eseq),
            _ => None,
        })
    }

    fn remove_redundant(
        &mut self,
        state: &mut State,
        target: usize,
        unremovable: &mut HashSet<usize>,
    ) -> Result<(), ExecError> {
        'outer: loop {
            let unused = compute_unused_indices(state.eseq.sequence(), state.eseq.checks());
            for &cur in unused.iter().rev() {
                let original = compute_index_in_original(cur, &state.removed);
                if unremovable.contains(&original) {
                    continue;
                }
                let candidate = remove_statement(state.eseq.sequence(), cur)?;
                let mut removed = state.removed.clone();
                let at = removed.partition_point(|&r| r < original);
                removed.insert(at, original);
                match self.same_failure(candidate, &removed, target)? {
                    Some(eseq) => {
                        debug!(statement = original, "removed redundant statement");
                        *state = State { eseq, removed };
                        continue 'outer;
                    }
                    None => {
                        unremovable.insert(original);
                    }
                }
            }
            return Ok(());
        }
    }

    /// Tries one rewiring; `true` if one was accepted.
    ///
    /// An input reading variable `v` is only redirected to some `j < v`, not
    /// to any variable before the statement. Every accepted rewiring lowers
    /// an input index, so the rewiring loop terminates.
    fn rewire(&mut self, state: &mut State, target: usize) -> Result<bool, ExecError> {
        let seq = state.eseq.sequence().clone();
        for cur in (0..seq.len()).rev() {
            let Some(kind) = seq.kind(cur) else {
                continue;
            };
            let declared = kind.input_types().to_vec();
            let inputs = seq.inputs(cur).to_vec();
            for (pos, &var) in inputs.iter().enumerate() {
                for j in 0..var {
                    let Some(ty) = seq.kind(j).map(|k| k.output_type()) else {
                        continue;
                    };
                    if ty == TypeId::VOID || !self.ctx.types.is_assignable(declared[pos], ty) {
                        continue;
                    }
                    let mut builder = SequenceBuilder::from_sequence(&seq);
                    builder.set_input(cur, pos, j)?;
                    let candidate = builder.freeze()?;
                    if let Some(eseq) = self.same_failure(candidate, &state.removed, target)? {
                        debug!(statement = cur, position = pos, from = var, to = j, "rewired input");
                        state.eseq = eseq;
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_mapping_round_trips() {
        let removed = [1, 2, 5];
        // original: 0 1 2 3 4 5 6  ->  current: 0 _ _ 1 2 _ 3
        assert_eq!(compute_index_in_original(0, &removed), 0);
        assert_eq!(compute_index_in_original(1, &removed), 3);
        assert_eq!(compute_index_in_original(2, &removed), 4);
        assert_eq!(compute_index_in_original(3, &removed), 6);
        for original in [0, 3, 4, 6] {
            let cur = index_in_current(original, &removed).unwrap();
            assert_eq!(compute_index_in_original(cur, &removed), original);
        }
        assert_eq!(index_in_current(2, &removed), None);
    }

    #[test]
    fn empty_removed_is_identity() {
        assert_eq!(compute_index_in_original(4, &[]), 4);
        assert_eq!(index_in_current(4, &[]), Some(4));
    }
}
