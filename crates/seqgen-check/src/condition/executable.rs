//! Compiled specifications and the outcome table they produce per call.

use std::rc::Rc;

use tracing::warn;

use seqgen_core::{OperationRegistry, TypeId, TypeRegistry, Value};

use crate::checks::{Check, CheckKind, PostConditionClause};
use crate::error::ConditionError;
use crate::executor::ExecutionOutcome;

use super::expr::{Node, Parser};

/// How the condition system reacts to broken conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionOptions {
    /// A condition that throws evaluates to false instead of failing.
    pub ignore_exception: bool,
    /// A condition that does not compile is dropped instead of failing.
    pub ignore_compilation_error: bool,
}

impl From<&crate::config::GenConfig> for ConditionOptions {
    fn from(cfg: &crate::config::GenConfig) -> Self {
        ConditionOptions {
            ignore_exception: cfg.ignore_condition_exception,
            ignore_compilation_error: cfg.ignore_condition_compilation_error,
        }
    }
}

/// A boolean expression over `x0..xN`, compiled and ready to evaluate.
#[derive(Debug, Clone)]
pub struct ExecutableBooleanExpression {
    contract_source: String,
    comment: String,
    compiled: Node,
    ignore_exception: bool,
}

impl ExecutableBooleanExpression {
    /// Compiles `contract_source` with `xK` typed as `vars[K]`. The error is
    /// the compiler's reason.
    pub fn compile(
        contract_source: &str,
        comment: &str,
        types: &TypeRegistry,
        ops: &OperationRegistry,
        vars: &[TypeId],
        ignore_exception: bool,
    ) -> Result<Self, String> {
        let compiled = Parser::compile(contract_source, types, ops, vars)?;
        Ok(ExecutableBooleanExpression {
            contract_source: contract_source.to_string(),
            comment: comment.to_string(),
            compiled,
            ignore_exception,
        })
    }

    pub fn contract_source(&self) -> &str {
        &self.contract_source
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn check(&self, values: &[Value]) -> Result<bool, ConditionError> {
        let result = self.compiled.eval(values).and_then(|v| {
            v.as_bool().ok_or_else(|| seqgen_core::Thrown::class_cast("condition did not produce a boolean"))
        });
        match result {
            Ok(b) => Ok(b),
            Err(thrown) if self.ignore_exception => {
                warn!(condition = %self.contract_source, %thrown, "condition threw, treating as false");
                Ok(false)
            }
            Err(thrown) => Err(ConditionError::Evaluate { text: self.contract_source.clone(), thrown }),
        }
    }
}

/// Guard plus the property it enables.
#[derive(Debug, Clone)]
pub struct ExecutablePostcondition {
    pub guard: ExecutableBooleanExpression,
    pub property: ExecutableBooleanExpression,
}

/// Guard plus the exception it demands.
#[derive(Debug, Clone)]
pub struct ExecutableThrowsCondition {
    pub guard: ExecutableBooleanExpression,
    pub exception_type: TypeId,
    pub exception_name: String,
    pub comment: String,
}

/// One translated [`OperationSpecification`](super::OperationSpecification).
#[derive(Debug, Clone, Default)]
pub struct TranslatedSpecification {
    pub preconditions: Vec<ExecutableBooleanExpression>,
    pub postconditions: Vec<Rc<ExecutablePostcondition>>,
    pub throws: Vec<Rc<ExecutableThrowsCondition>>,
}

impl TranslatedSpecification {
    /// Identity for deduplication: the translated source of every clause.
    fn key(&self) -> Vec<&str> {
        let mut key: Vec<&str> = self.preconditions.iter().map(|p| p.contract_source()).collect();
        key.push("|");
        for post in &self.postconditions {
            key.push(post.guard.contract_source());
            key.push(post.property.contract_source());
        }
        key.push("|");
        for t in &self.throws {
            key.push(t.guard.contract_source());
            key.push(&t.exception_name);
        }
        key
    }

    pub fn is_empty(&self) -> bool {
        self.preconditions.is_empty() && self.postconditions.is_empty() && self.throws.is_empty()
    }
}

/// All specifications that apply to one operation, including those
/// inherited from overridden methods.
#[derive(Debug, Clone, Default)]
pub struct ExecutableSpecification {
    members: Vec<TranslatedSpecification>,
}

impl ExecutableSpecification {
    pub fn new(members: Vec<TranslatedSpecification>) -> Self {
        let mut spec = ExecutableSpecification::default();
        for m in members {
            spec.push(m);
        }
        spec
    }

    fn push(&mut self, member: TranslatedSpecification) {
        if member.is_empty() || self.members.iter().any(|m| m.key() == member.key()) {
            return;
        }
        self.members.push(member);
    }

    /// Adds the members of `other` that are not already present.
    pub fn merge(&mut self, other: &ExecutableSpecification) {
        for m in &other.members {
            self.push(m.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Evaluates every guard against the call's inputs (receiver first).
    pub fn check_prestate(&self, inputs: &[Value]) -> Result<ExpectedOutcomeTable, ConditionError> {
        let mut table = ExpectedOutcomeTable::default();
        for member in &self.members {
            table.has_specification = true;
            let mut satisfied = true;
            for pre in &member.preconditions {
                if !pre.check(inputs)? {
                    satisfied = false;
                    break;
                }
            }
            if satisfied {
                table.guard_satisfied = true;
                for post in &member.postconditions {
                    if post.guard.check(inputs)? {
                        table.post_conditions.push(post.clone());
                    }
                }
            }
            for t in &member.throws {
                if t.guard.check(inputs)? {
                    table.throws.push(t.clone());
                }
            }
        }
        Ok(table)
    }
}

/// What the specifications expect of one particular call.
#[derive(Debug, Clone, Default)]
pub struct ExpectedOutcomeTable {
    has_specification: bool,
    guard_satisfied: bool,
    post_conditions: Vec<Rc<ExecutablePostcondition>>,
    throws: Vec<Rc<ExecutableThrowsCondition>>,
}

impl ExpectedOutcomeTable {
    /// No specification's preconditions hold and no exception is expected.
    pub fn is_invalid_call(&self) -> bool {
        self.has_specification && !self.guard_satisfied && self.throws.is_empty()
    }

    pub fn post_conditions(&self) -> &[Rc<ExecutablePostcondition>] {
        &self.post_conditions
    }

    pub fn throws_candidates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for t in &self.throws {
            if !names.contains(&t.exception_name.as_str()) {
                names.push(&t.exception_name);
            }
        }
        names
    }

    pub fn has_expected_exception(&self) -> bool {
        !self.throws.is_empty()
    }

    pub fn has_post_conditions(&self) -> bool {
        !self.post_conditions.is_empty()
    }

    /// Description of the preconditions that did not hold.
    pub fn invalid_description(&self, descriptor: &str) -> String {
        format!("precondition of {descriptor} does not hold")
    }

    /// The check for statement `index` given its outcome.
    ///
    /// With throws candidates the statement must throw one of them; a normal
    /// return fails. Otherwise post-conditions are evaluated over the inputs
    /// followed by the result. An exception nobody expected yields no check
    /// here; contract checking decides whether it is an error.
    pub fn check(
        &self,
        index: usize,
        inputs: &[Value],
        input_vars: &[usize],
        outcome: &ExecutionOutcome,
        types: &TypeRegistry,
    ) -> Result<Option<Check>, ConditionError> {
        if self.has_expected_exception() {
            let candidates: Vec<String> = self.throws_candidates().into_iter().map(str::to_string).collect();
            let comment = self
                .throws
                .iter()
                .map(|t| t.comment.as_str())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join("; ");
            let (thrown, passed) = match outcome {
                ExecutionOutcome::Exceptional(t) => {
                    let passed = self.throws.iter().any(|c| t.is_instance_of(types, c.exception_type));
                    (Some(t.type_name.clone()), passed)
                }
                ExecutionOutcome::Normal(_) => (None, false),
                ExecutionOutcome::NotExecuted | ExecutionOutcome::Timeout => return Ok(None),
            };
            let kind = CheckKind::ExpectedException { thrown, candidates, comment };
            return Ok(Some(Check::new(index, kind, passed)));
        }

        let ExecutionOutcome::Normal(result) = outcome else {
            return Ok(None);
        };
        if !self.has_post_conditions() {
            return Ok(None);
        }
        let mut values = inputs.to_vec();
        values.push(result.clone());
        let mut passed = true;
        let mut conditions = Vec::new();
        for post in &self.post_conditions {
            if !post.property.check(&values)? {
                passed = false;
            }
            conditions.push(PostConditionClause {
                comment: post.property.comment().to_string(),
                code: post.property.contract_source().to_string(),
            });
        }
        let mut vars = input_vars.to_vec();
        vars.push(index);
        Ok(Some(Check::new(index, CheckKind::PostCondition { conditions, vars }, passed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(text: &str, vars: &[TypeId]) -> ExecutableBooleanExpression {
        let types = TypeRegistry::new();
        let ops = OperationRegistry::new();
        ExecutableBooleanExpression::compile(text, text, &types, &ops, vars, false).unwrap()
    }

    fn member(pre: &[&str], posts: &[(&str, &str)], throws: &[(&str, TypeId, &str)]) -> TranslatedSpecification {
        let ints = [TypeId::INT];
        let ints_and_result = [TypeId::INT, TypeId::INT];
        TranslatedSpecification {
            preconditions: pre.iter().map(|p| expr(p, &ints)).collect(),
            postconditions: posts
                .iter()
                .map(|(g, p)| Rc::new(ExecutablePostcondition { guard: expr(g, &ints), property: expr(p, &ints_and_result) }))
                .collect(),
            throws: throws
                .iter()
                .map(|(g, ty, name)| {
                    Rc::new(ExecutableThrowsCondition {
                        guard: expr(g, &ints),
                        exception_type: *ty,
                        exception_name: name.to_string(),
                        comment: String::new(),
                    })
                })
                .collect(),
        }
    }

    #[test]
    fn failed_precondition_is_an_invalid_call() {
        let spec = ExecutableSpecification::new(vec![member(&["x0 > 0"], &[("true", "x1 == x0")], &[])]);
        let table = spec.check_prestate(&[Value::Int(-1)]).unwrap();
        assert!(table.is_invalid_call());
        assert!(!table.has_post_conditions());
        assert!(!table.has_expected_exception());
        let table = spec.check_prestate(&[Value::Int(1)]).unwrap();
        assert!(!table.is_invalid_call());
        assert!(table.has_post_conditions());
    }

    #[test]
    fn no_specification_is_never_invalid() {
        let table = ExecutableSpecification::default().check_prestate(&[]).unwrap();
        assert!(!table.is_invalid_call());
    }

    #[test]
    fn throws_candidates_are_collected_from_every_satisfied_guard() {
        let spec = ExecutableSpecification::new(vec![member(
            &[],
            &[],
            &[
                ("x0 < 0", TypeId::ILLEGAL_STATE, "java.lang.IllegalStateException"),
                ("x0 < 10", TypeId::ILLEGAL_ARGUMENT, "java.lang.IllegalArgumentException"),
            ],
        )]);
        let table = spec.check_prestate(&[Value::Int(-1)]).unwrap();
        assert_eq!(
            table.throws_candidates(),
            vec!["java.lang.IllegalStateException", "java.lang.IllegalArgumentException"]
        );
        let types = TypeRegistry::new();
        let thrown = ExecutionOutcome::Exceptional(seqgen_core::Thrown::illegal_state("negative"));
        let check = table.check(3, &[Value::Int(-1)], &[1], &thrown, &types).unwrap().unwrap();
        assert!(check.passed);
        let normal = ExecutionOutcome::Normal(Value::Null);
        assert!(!table.check(3, &[Value::Int(-1)], &[1], &normal, &types).unwrap().unwrap().passed);

        let table = spec.check_prestate(&[Value::Int(20)]).unwrap();
        assert!(!table.has_expected_exception());
    }

    #[test]
    fn post_condition_check_binds_result_last() {
        let spec = ExecutableSpecification::new(vec![member(&[], &[("x0 > 0", "x1 == x0 * 2")], &[])]);
        let types = TypeRegistry::new();
        let table = spec.check_prestate(&[Value::Int(3)]).unwrap();
        let ok = table.check(2, &[Value::Int(3)], &[0], &ExecutionOutcome::Normal(Value::Int(6)), &types).unwrap().unwrap();
        assert!(ok.passed);
        assert_eq!(ok.vars(), vec![0, 2]);
        let bad = table.check(2, &[Value::Int(3)], &[0], &ExecutionOutcome::Normal(Value::Int(7)), &types).unwrap().unwrap();
        assert!(bad.is_failure());
    }

    #[test]
    fn merge_drops_duplicates() {
        let mut a = ExecutableSpecification::new(vec![member(&["x0 > 0"], &[], &[])]);
        let b = ExecutableSpecification::new(vec![member(&["x0 > 0"], &[], &[]), member(&["x0 < 9"], &[], &[])]);
        a.merge(&b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn evaluation_exceptions_are_fatal_unless_ignored() {
        let types = TypeRegistry::new();
        let ops = OperationRegistry::new();
        let strict = ExecutableBooleanExpression::compile("10 / x0 > 1", "", &types, &ops, &[TypeId::INT], false).unwrap();
        assert!(matches!(strict.check(&[Value::Int(0)]), Err(ConditionError::Evaluate { .. })));
        let lenient = ExecutableBooleanExpression::compile("10 / x0 > 1", "", &types, &ops, &[TypeId::INT], true).unwrap();
        assert!(!lenient.check(&[Value::Int(0)]).unwrap());
    }
}
