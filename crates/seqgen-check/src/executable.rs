//! A sequence together with the outcome of running it once.

use seqgen_core::{Sequence, StatementKind, TypeRegistry, Value};
use tracing::trace;

use crate::checks::{Check, CheckKind};
use crate::condition::SpecificationCollection;
use crate::error::ExecError;
use crate::executor::{ExecutionOutcome, Executor};
use crate::visitor::ExecutionVisitor;

/// Everything a sequence needs in order to run.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub types: &'a TypeRegistry,
    pub executor: Executor,
    pub specs: Option<&'a SpecificationCollection<'a>>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(types: &'a TypeRegistry, executor: Executor) -> Self {
        ExecutionContext { types, executor, specs: None }
    }

    pub fn with_specifications(mut self, specs: &'a SpecificationCollection<'a>) -> Self {
        self.specs = Some(specs);
        self
    }
}

/// A [`Sequence`] plus one outcome per statement and the checks recorded
/// while it ran.
///
/// Execution happens exactly once. Re-running a modified sequence means
/// building a new `ExecutableSequence`.
#[derive(Debug, Clone)]
pub struct ExecutableSequence {
    sequence: Sequence,
    outcomes: Vec<ExecutionOutcome>,
    checks: Vec<Check>,
    executed: bool,
    invalid: bool,
}

impl ExecutableSequence {
    pub fn new(sequence: Sequence) -> Self {
        let outcomes = vec![ExecutionOutcome::NotExecuted; sequence.len()];
        ExecutableSequence { sequence, outcomes, checks: Vec::new(), executed: false, invalid: false }
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Runs every statement in order until one does not return normally.
    ///
    /// For each statement: the visitors' `visit_before`, then the prestate
    /// check of its specification (an invalid call stops the sequence
    /// before the call), the call itself, the post-condition or
    /// expected-exception check, and finally `visit_after`.
    pub fn execute(&mut self, ctx: &ExecutionContext<'_>, visitor: &mut dyn ExecutionVisitor) -> Result<(), ExecError> {
        if self.executed {
            return Err(ExecError::AlreadyExecuted);
        }
        self.executed = true;
        visitor.initialize(self);

        for i in 0..self.sequence.len() {
            visitor.visit_before(self, i);
            let stmt = self.sequence.statements()[i].clone();
            let inputs = self.input_values(i);

            let table = match (ctx.specs, stmt.kind.operation()) {
                (Some(specs), Some(op)) => match specs.executable_specification(op)? {
                    Some(spec) => Some(spec.check_prestate(&inputs)?),
                    None => None,
                },
                _ => None,
            };
            if let (Some(table), Some(op)) = (&table, stmt.kind.operation()) {
                if table.is_invalid_call() {
                    trace!(statement = i, operation = %op.descriptor(), "invalid call");
                    let description = table.invalid_description(&op.descriptor());
                    self.checks.push(Check::new(i, CheckKind::InvalidValue { description }, true));
                    self.invalid = true;
                    break;
                }
            }

            let outcome = ctx.executor.execute(&stmt.kind, &inputs)?;
            if let Some(table) = &table {
                if let Some(check) = table.check(i, &inputs, &stmt.inputs, &outcome, ctx.types)? {
                    self.checks.push(check);
                }
            }
            let normal = outcome.is_normal();
            self.outcomes[i] = outcome;
            visitor.visit_after(self, i);
            if !normal {
                break;
            }
        }
        Ok(())
    }

    /// Values of the variables statement `i` reads. Only meaningful once the
    /// inputs have executed; anything else reads as `null`.
    pub fn input_values(&self, i: usize) -> Vec<Value> {
        self.sequence
            .inputs(i)
            .iter()
            .map(|&v| self.value(v).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn outcome(&self, i: usize) -> Option<&ExecutionOutcome> {
        self.outcomes.get(i)
    }

    pub fn outcomes(&self) -> &[ExecutionOutcome] {
        &self.outcomes
    }

    /// The value statement `i` produced, when it returned normally.
    pub fn value(&self, i: usize) -> Option<&Value> {
        self.outcomes.get(i).and_then(ExecutionOutcome::value)
    }

    pub fn kind(&self, i: usize) -> Option<&StatementKind> {
        self.sequence.kind(i)
    }

    pub fn add_check(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn checks_at(&self, i: usize) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(move |c| c.index == i)
    }

    pub fn has_expected_exception_at(&self, i: usize) -> bool {
        self.checks_at(i).any(|c| matches!(c.kind, CheckKind::ExpectedException { .. }))
    }

    pub fn has_failure(&self) -> bool {
        self.checks.iter().any(Check::is_failure)
    }

    /// Index of the earliest failing check.
    pub fn failure_index(&self) -> Option<usize> {
        self.checks.iter().filter(|c| c.is_failure()).map(|c| c.index).min()
    }

    pub fn failing_checks(&self) -> Vec<&Check> {
        self.checks.iter().filter(|c| c.is_failure()).collect()
    }

    /// A precondition did not hold and the sequence stopped there.
    pub fn has_invalid_behavior(&self) -> bool {
        self.invalid
    }

    pub fn has_non_executed_statements(&self) -> bool {
        self.outcomes.iter().any(|o| matches!(o, ExecutionOutcome::NotExecuted))
    }

    /// Every statement ran and returned normally.
    pub fn is_normal_execution(&self) -> bool {
        self.executed && self.outcomes.iter().all(ExecutionOutcome::is_normal)
    }

    pub fn timed_out(&self) -> bool {
        self.outcomes.iter().any(|o| matches!(o, ExecutionOutcome::Timeout))
    }

    /// The last statement's outcome is exceptional; everything before it
    /// returned normally.
    pub fn ends_with_exception(&self) -> bool {
        match self.outcomes.split_last() {
            Some((last, rest)) => last.is_exceptional() && rest.iter().all(ExecutionOutcome::is_normal),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::DummyVisitor;
    use seqgen_core::{OperationRegistry, SequenceBuilder, Thrown, TypeId};
    use std::sync::Arc;

    fn registry() -> (TypeRegistry, OperationRegistry) {
        let mut types = TypeRegistry::new();
        let util = types.register_class("test.Util", &[]).unwrap();
        let mut ops = OperationRegistry::new();
        ops.static_method(&types, util, "fail", &[TypeId::INT], TypeId::INT, |args| {
            match seqgen_core::operation::arg_int(args, 0)? {
                0 => Err(Thrown::illegal_state("zero").into()),
                v => Ok(Value::Int(v)),
            }
        })
        .unwrap();
        (types, ops)
    }

    fn sequence(ops: &OperationRegistry, first: i32) -> Sequence {
        let fail = Arc::new(StatementKind::call(ops.iter().next().unwrap().clone()));
        let mut b = SequenceBuilder::new();
        b.push(Arc::new(StatementKind::literal(TypeId::INT, Value::Int(first))), &[]);
        b.push(fail.clone(), &[0]);
        b.push(fail, &[1]);
        b.freeze().unwrap()
    }

    #[test]
    fn stops_at_first_exception() {
        let (types, ops) = registry();
        let ctx = ExecutionContext::new(&types, Executor::inline());
        let mut es = ExecutableSequence::new(sequence(&ops, 0));
        es.execute(&ctx, &mut DummyVisitor).unwrap();
        assert!(es.outcome(0).unwrap().is_normal());
        assert!(es.outcome(1).unwrap().is_exceptional());
        assert!(matches!(es.outcome(2), Some(ExecutionOutcome::NotExecuted)));
        assert!(es.has_non_executed_statements());
        assert!(!es.is_normal_execution());
        assert!(!es.has_failure());
        assert_eq!(es.failure_index(), None);
    }

    #[test]
    fn executes_exactly_once() {
        let (types, ops) = registry();
        let ctx = ExecutionContext::new(&types, Executor::inline());
        let mut es = ExecutableSequence::new(sequence(&ops, 4));
        es.execute(&ctx, &mut DummyVisitor).unwrap();
        assert!(es.is_normal_execution());
        assert_eq!(es.value(2), Some(&Value::Int(4)));
        assert!(matches!(es.execute(&ctx, &mut DummyVisitor), Err(ExecError::AlreadyExecuted)));
    }
}
