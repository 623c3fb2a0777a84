//! Mutable working form of a sequence.
//!
//! The simplifier deletes statements and rewires inputs; it does so on a
//! [`SequenceBuilder`] and then [`freeze`](SequenceBuilder::freeze)s the
//! result back into an immutable [`Sequence`].

use std::sync::Arc;

use crate::error::CoreError;
use crate::operation::StatementKind;
use crate::sequence::{Sequence, Statement};

#[derive(Debug, Clone, Default)]
pub struct SequenceBuilder {
    statements: Vec<Statement>,
}

impl SequenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sequence(seq: &Sequence) -> Self {
        SequenceBuilder { statements: seq.statements().to_vec() }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statement(&self, idx: usize) -> Option<&Statement> {
        self.statements.get(idx)
    }

    /// Appends a statement without validation; `freeze` checks it.
    pub fn push(&mut self, kind: Arc<StatementKind>, inputs: &[usize]) -> usize {
        self.statements.push(Statement::new(kind, inputs));
        self.statements.len() - 1
    }

    /// Deletes statement `idx`. Later statements that read variables above
    /// `idx` are renumbered. Fails if any later statement reads `idx`.
    pub fn remove(&mut self, idx: usize) -> Result<(), CoreError> {
        if idx >= self.statements.len() {
            return Err(CoreError::IndexOutOfRange { index: idx, len: self.statements.len() });
        }
        if let Some(user) = (idx + 1..self.statements.len()).find(|&j| self.statements[j].inputs.contains(&idx)) {
            return Err(CoreError::VariableInUse { index: idx, used_by: user });
        }
        self.statements.remove(idx);
        for stmt in &mut self.statements[idx..] {
            for input in stmt.inputs.iter_mut() {
                if *input > idx {
                    *input -= 1;
                }
            }
        }
        Ok(())
    }

    /// Makes input `position` of statement `stmt` read variable `var`.
    pub fn set_input(&mut self, stmt: usize, position: usize, var: usize) -> Result<(), CoreError> {
        let len = self.statements.len();
        let statement = self
            .statements
            .get_mut(stmt)
            .ok_or(CoreError::IndexOutOfRange { index: stmt, len })?;
        if var >= stmt {
            return Err(CoreError::ForwardReference { statement: stmt, input: var });
        }
        let arity = statement.inputs.len();
        let slot = statement.inputs.get_mut(position).ok_or(CoreError::IndexOutOfRange {
            index: position,
            len: arity,
        })?;
        *slot = var;
        Ok(())
    }

    /// Validates and converts back to an immutable sequence.
    pub fn freeze(self) -> Result<Sequence, CoreError> {
        Sequence::from_statements(self.statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::arg_int;
    use crate::registry::OperationRegistry;
    use crate::type_id::{TypeId, TypeRegistry};
    use crate::value::Value;

    fn negate_kind() -> Arc<StatementKind> {
        let mut types = TypeRegistry::new();
        let util = types.register_class("demo.MathUtil", &[]).unwrap();
        let mut ops = OperationRegistry::new();
        let neg = ops
            .static_method(&types, util, "neg", &[TypeId::INT], TypeId::INT, |args| {
                Ok(Value::Int(arg_int(args, 0)?.wrapping_neg()))
            })
            .unwrap();
        Arc::new(StatementKind::call(neg))
    }

    fn int(v: i32) -> Arc<StatementKind> {
        Arc::new(StatementKind::literal(TypeId::INT, Value::Int(v)))
    }

    #[test]
    fn remove_renumbers_later_inputs() {
        let neg = negate_kind();
        let mut b = SequenceBuilder::new();
        b.push(int(1), &[]);
        b.push(int(2), &[]);
        b.push(Arc::clone(&neg), &[1]);
        b.remove(0).unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b.statement(1).unwrap().inputs.as_slice(), &[0]);
        let seq = b.freeze().unwrap();
        assert_eq!(seq.inputs(1), &[0]);
    }

    #[test]
    fn remove_refuses_used_variables() {
        let neg = negate_kind();
        let mut b = SequenceBuilder::new();
        b.push(int(1), &[]);
        b.push(neg, &[0]);
        assert!(matches!(b.remove(0), Err(CoreError::VariableInUse { index: 0, used_by: 1 })));
        assert!(matches!(b.remove(5), Err(CoreError::IndexOutOfRange { .. })));
    }

    #[test]
    fn set_input_checks_forward_references() {
        let neg = negate_kind();
        let mut b = SequenceBuilder::new();
        b.push(int(1), &[]);
        b.push(int(2), &[]);
        b.push(neg, &[1]);
        b.set_input(2, 0, 0).unwrap();
        assert!(b.set_input(2, 0, 2).is_err());
        assert!(b.set_input(2, 3, 0).is_err());
        assert_eq!(b.freeze().unwrap().inputs(2), &[0]);
    }
}
