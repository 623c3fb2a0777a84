//! Error detection: unexpected exceptions and violated object contracts.

use std::sync::Arc;

use tracing::debug;

use seqgen_core::{Thrown, TypeId, TypeRegistry, Value};

use crate::checks::{Check, CheckKind};
use crate::contracts::{default_contracts, ObjectContract};
use crate::executable::ExecutableSequence;
use crate::executor::ExecutionOutcome;

use super::ExecutionVisitor;

/// Applies object contracts to the values a sequence produced.
///
/// Runs after the last statement executed (or after every statement when
/// `check_every_statement` is set). A statement that throws
/// `java.lang.Error`, or a `NullPointerException` although none of its
/// inputs was `null`, is a failure unless a specification expected it.
/// After a normal return every contract is tried on every tuple of live
/// objects whose runtime types fit; the first violation is recorded.
#[derive(Debug, Clone)]
pub struct ContractCheckingVisitor<'a> {
    types: &'a TypeRegistry,
    contracts: Vec<Arc<dyn ObjectContract>>,
    check_every_statement: bool,
}

/// A value eligible for contract checking.
struct Candidate {
    var: usize,
    value: Value,
    ty: TypeId,
}

impl<'a> ContractCheckingVisitor<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        Self::with_contracts(types, default_contracts())
    }

    pub fn with_contracts(types: &'a TypeRegistry, contracts: Vec<Arc<dyn ObjectContract>>) -> Self {
        ContractCheckingVisitor { types, contracts, check_every_statement: false }
    }

    pub fn check_every_statement(mut self, yes: bool) -> Self {
        self.check_every_statement = yes;
        self
    }

    fn reveals_error(&self, eseq: &ExecutableSequence, index: usize, thrown: &Thrown) -> bool {
        if thrown.is_instance_of(self.types, TypeId::ERROR) {
            return true;
        }
        thrown.type_name == Thrown::NULL_POINTER && !eseq.input_values(index).iter().any(Value::is_null)
    }

    /// Non-null objects produced by statements `0..=index`, one per identity.
    fn candidates(&self, eseq: &ExecutableSequence, index: usize) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        for var in 0..=index {
            let Some(value) = eseq.value(var) else {
                continue;
            };
            if value.is_null() || value.is_primitive_or_string() {
                continue;
            }
            let Some(ty) = value.runtime_type(self.types) else {
                continue;
            };
            if out.iter().any(|c| c.value.identical(value)) {
                continue;
            }
            out.push(Candidate { var, value: value.clone(), ty });
        }
        out
    }

    /// Tuples of `arity` candidates of one runtime type, with repetition.
    fn tuples<'c>(group: &[&'c Candidate], arity: usize) -> Vec<Vec<&'c Candidate>> {
        let mut tuples: Vec<Vec<&Candidate>> = vec![Vec::new()];
        for _ in 0..arity {
            tuples = tuples
                .into_iter()
                .flat_map(|prefix| {
                    group.iter().map(move |c| {
                        let mut t = prefix.clone();
                        t.push(*c);
                        t
                    })
                })
                .collect();
        }
        tuples
    }

    /// The first contract violation among `candidates`, if any.
    fn first_violation(&self, candidates: &[Candidate]) -> Option<(Arc<dyn ObjectContract>, Vec<usize>)> {
        for contract in &self.contracts {
            let input_types = contract.input_types();
            let mut groups: Vec<Vec<&Candidate>> = Vec::new();
            if contract.arity() == 1 {
                groups.push(candidates.iter().collect());
            } else {
                for c in candidates {
                    match groups.iter_mut().find(|g| g[0].ty == c.ty) {
                        Some(g) => g.push(c),
                        None => groups.push(vec![c]),
                    }
                }
            }
            for group in &groups {
                for tuple in Self::tuples(group, contract.arity()) {
                    let fits = tuple.iter().zip(&input_types).all(|(c, t)| self.types.is_assignable(*t, c.ty));
                    if !fits {
                        continue;
                    }
                    let values: Vec<Value> = tuple.iter().map(|c| c.value.clone()).collect();
                    let violated = match contract.evaluate(&values) {
                        Ok(holds) => !holds,
                        Err(_) => contract.eval_exception_means_failure(),
                    };
                    if violated {
                        return Some((Arc::clone(contract), tuple.iter().map(|c| c.var).collect()));
                    }
                }
            }
        }
        None
    }
}

impl ExecutionVisitor for ContractCheckingVisitor<'_> {
    fn visit_after(&mut self, eseq: &mut ExecutableSequence, index: usize) {
        let stops_here = !eseq.outcome(index).is_some_and(ExecutionOutcome::is_normal);
        if !self.check_every_statement && !stops_here && index + 1 != eseq.len() {
            return;
        }
        // One failure per sequence is enough.
        if eseq.has_failure() {
            return;
        }
        match eseq.outcome(index).cloned() {
            Some(ExecutionOutcome::Exceptional(thrown)) => {
                if eseq.has_expected_exception_at(index) || !self.reveals_error(eseq, index, &thrown) {
                    return;
                }
                debug!(statement = index, %thrown, "unexpected exception");
                eseq.add_check(Check::new(index, CheckKind::UnexpectedException { thrown }, false));
            }
            Some(ExecutionOutcome::Normal(_)) => {
                let candidates = self.candidates(eseq, index);
                if let Some((contract, vars)) = self.first_violation(&candidates) {
                    debug!(statement = index, contract = contract.name(), ?vars, "contract violated");
                    eseq.add_check(Check::object(index, contract, vars, false));
                }
            }
            _ => {}
        }
    }
}
