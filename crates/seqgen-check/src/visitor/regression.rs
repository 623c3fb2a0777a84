//! Regression capture: record what a passing sequence observed.

use std::sync::Arc;

use tracing::warn;

use seqgen_core::value::looks_like_object_to_string;
use seqgen_core::{OperationRegistry, StatementKind, TypeId, TypeRegistry, Value};

use crate::checks::{Check, CheckKind};
use crate::contracts::{EnumValue, IsNotNull, IsNull, ObjectContract, ObserverEqArray, ObserverEqValue, PrimValue};
use crate::executable::ExecutableSequence;
use crate::executor::{ExecutionOutcome, Executor};

use super::ExecutionVisitor;

/// After the last statement of a sequence without failures, asserts the
/// value of every variable worth asserting, plus the results of the
/// observer methods of each object. A sequence whose last statement threw
/// gets an expected-exception check for the thrown type instead.
pub struct RegressionCaptureVisitor<'a> {
    types: &'a TypeRegistry,
    ops: &'a OperationRegistry,
    executor: Executor,
    string_max_len: usize,
}

impl<'a> RegressionCaptureVisitor<'a> {
    pub fn new(types: &'a TypeRegistry, ops: &'a OperationRegistry, executor: Executor) -> Self {
        RegressionCaptureVisitor { types, ops, executor, string_max_len: 1000 }
    }

    pub fn string_max_len(mut self, len: usize) -> Self {
        self.string_max_len = len;
        self
    }

    /// Whether a string is stable and short enough to assert on.
    fn capturable_string(&self, value: &Value) -> bool {
        match value.as_str() {
            Some(s) => s.len() <= self.string_max_len && !looks_like_object_to_string(s),
            None => true,
        }
    }

    /// Contract asserting `value` itself, for the variable produced by `kind`.
    fn value_contract(&self, kind: &StatementKind, value: &Value) -> Option<Arc<dyn ObjectContract>> {
        match value {
            Value::Null => Some(Arc::new(IsNull)),
            Value::Enum(e) => Some(Arc::new(EnumValue::new(e.clone()))),
            v if v.is_primitive_or_string() => {
                if !self.capturable_string(v) {
                    return None;
                }
                PrimValue::new(v.clone()).map(|c| Arc::new(c) as Arc<dyn ObjectContract>)
            }
            // A constructed object is never null; asserting it adds nothing.
            _ if matches!(kind, StatementKind::Constructor(_)) => None,
            _ => Some(Arc::new(IsNotNull)),
        }
    }

    /// Observer results for one object.
    fn observer_contracts(&self, value: &Value) -> Vec<Arc<dyn ObjectContract>> {
        let Some(ty) = value.runtime_type(self.types) else {
            return Vec::new();
        };
        let mut out: Vec<Arc<dyn ObjectContract>> = Vec::new();
        for op in self.ops.iter() {
            if !op.observer || !op.has_receiver() || op.input_types.len() != 1 {
                continue;
            }
            if !self.types.is_assignable(op.input_types[0], ty) {
                continue;
            }
            let kind = StatementKind::call(Arc::clone(op));
            let outcome = match self.executor.execute(&kind, std::slice::from_ref(value)) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(observer = %op.descriptor(), error = %e, "observer could not be executed");
                    continue;
                }
            };
            let ExecutionOutcome::Normal(result) = outcome else {
                continue;
            };
            let contract: Option<Arc<dyn ObjectContract>> = match &result {
                Value::Array(array) => {
                    let element = self.types.name_of(array.element).to_string();
                    ObserverEqArray::new(Arc::clone(op), &element, array.items.to_vec())
                        .map(|c| Arc::new(c) as Arc<dyn ObjectContract>)
                }
                Value::Object(_) => None,
                v if self.capturable_string(v) => {
                    ObserverEqValue::new(Arc::clone(op), v.clone()).map(|c| Arc::new(c) as Arc<dyn ObjectContract>)
                }
                _ => None,
            };
            out.extend(contract);
        }
        out
    }
}

fn is_uninteresting_call(kind: &StatementKind) -> bool {
    kind.operation().is_some_and(|op| matches!(op.name(), "toString" | "hashCode"))
}

impl ExecutionVisitor for RegressionCaptureVisitor<'_> {
    fn visit_after(&mut self, eseq: &mut ExecutableSequence, index: usize) {
        if index + 1 != eseq.len() || eseq.has_failure() || eseq.has_invalid_behavior() {
            return;
        }
        match eseq.outcome(index).cloned() {
            Some(ExecutionOutcome::Exceptional(thrown)) => {
                if !eseq.has_expected_exception_at(index) {
                    let kind = CheckKind::ExpectedException {
                        thrown: Some(thrown.type_name.clone()),
                        candidates: Vec::new(),
                        comment: String::new(),
                    };
                    eseq.add_check(Check::new(index, kind, true));
                }
            }
            Some(ExecutionOutcome::Normal(_)) => {
                let mut seen: Vec<Value> = Vec::new();
                let mut checks = Vec::new();
                for var in 0..=index {
                    let (Some(kind), Some(value)) = (eseq.kind(var), eseq.value(var)) else {
                        continue;
                    };
                    if kind.is_literal() || kind.output_type() == TypeId::VOID || is_uninteresting_call(kind) {
                        continue;
                    }
                    let is_object = matches!(value, Value::Object(_) | Value::Array(_));
                    if is_object && seen.iter().any(|s| s.identical(value)) {
                        continue;
                    }
                    if let Some(contract) = self.value_contract(kind, value) {
                        checks.push(Check::object(index, contract, vec![var], true));
                    }
                    if is_object {
                        seen.push(value.clone());
                        for contract in self.observer_contracts(value) {
                            checks.push(Check::object(index, contract, vec![var], true));
                        }
                    }
                }
                for check in checks {
                    eseq.add_check(check);
                }
            }
            _ => {}
        }
    }
}
