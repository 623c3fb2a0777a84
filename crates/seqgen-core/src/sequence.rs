//! Immutable call sequences.
//!
//! A [`Sequence`] is an ordered list of [`Statement`]s; statement `i`
//! produces variable `i` and may only read variables `0..i`. Sequences are
//! never mutated: [`Sequence::extend`] returns a new sequence sharing the
//! statement kinds of the old one, and the mutable working form lives in
//! [`SequenceBuilder`](crate::builder::SequenceBuilder).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::CoreError;
use crate::operation::StatementKind;
use crate::type_id::{TypeId, TypeRegistry};

/// The output of statement `index`. Identity is positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable {
    pub index: usize,
    pub ty: TypeId,
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{}", self.index)
    }
}

/// One statement: a kind plus the indices of the variables it reads.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: Arc<StatementKind>,
    pub inputs: SmallVec<[usize; 4]>,
}

impl Statement {
    pub fn new(kind: Arc<StatementKind>, inputs: &[usize]) -> Self {
        Statement { kind, inputs: SmallVec::from_slice(inputs) }
    }

    /// Stable textual key used for fingerprinting.
    fn key(&self) -> String {
        let kind = match self.kind.as_ref() {
            StatementKind::Literal(lit) => format!(
                "lit {} {}",
                lit.ty.0,
                lit.value.to_literal().unwrap_or_default()
            ),
            StatementKind::Constructor(op) | StatementKind::Method(op) => format!("call {}", op.descriptor()),
            StatementKind::ArrayDecl(decl) => format!("array {} {}", decl.element.0, decl.length()),
        };
        let inputs: Vec<String> = self.inputs.iter().map(|i| i.to_string()).collect();
        format!("{kind} <- {}", inputs.join(" "))
    }
}

/// An immutable sequence of statements.
#[derive(Clone)]
pub struct Sequence {
    statements: Vec<Statement>,
    fingerprint: blake3::Hash,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequence {
    pub fn new() -> Self {
        Sequence::from_unchecked(Vec::new())
    }

    fn from_unchecked(statements: Vec<Statement>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for stmt in &statements {
            hasher.update(stmt.key().as_bytes());
            hasher.update(b"\n");
        }
        Sequence { statements, fingerprint: hasher.finalize() }
    }

    /// Builds a sequence from raw statements, checking arity and the
    /// forward-reference invariant.
    pub fn from_statements(statements: Vec<Statement>) -> Result<Self, CoreError> {
        for (idx, stmt) in statements.iter().enumerate() {
            if stmt.inputs.len() != stmt.kind.arity() {
                return Err(CoreError::ArityMismatch {
                    what: format!("statement {idx}"),
                    expected: stmt.kind.arity(),
                    actual: stmt.inputs.len(),
                });
            }
            if let Some(&input) = stmt.inputs.iter().find(|&&input| input >= idx) {
                return Err(CoreError::ForwardReference { statement: idx, input });
            }
        }
        Ok(Sequence::from_unchecked(statements))
    }

    /// Appends a statement reading the given existing variables.
    ///
    /// Rejects wrong arity, references to variables not yet defined, and
    /// inputs whose type is not assignable to the declared input type.
    pub fn extend(
        &self,
        kind: Arc<StatementKind>,
        inputs: &[usize],
        types: &TypeRegistry,
    ) -> Result<Sequence, CoreError> {
        let idx = self.statements.len();
        if inputs.len() != kind.arity() {
            return Err(CoreError::ArityMismatch {
                what: kind.describe(types),
                expected: kind.arity(),
                actual: inputs.len(),
            });
        }
        for (pos, (&input, &declared)) in inputs.iter().zip(kind.input_types()).enumerate() {
            let Some(source) = self.statements.get(input) else {
                return Err(CoreError::ForwardReference { statement: idx, input });
            };
            let actual = source.kind.output_type();
            if !types.is_assignable(declared, actual) {
                return Err(CoreError::IncompatibleInput {
                    what: kind.describe(types),
                    position: pos,
                    expected: types.name_of(declared).to_string(),
                    actual: types.name_of(actual).to_string(),
                });
            }
        }
        if let StatementKind::Literal(lit) = kind.as_ref() {
            check_literal(types, lit.ty, &lit.value)?;
        }
        let mut statements = self.statements.clone();
        statements.push(Statement::new(kind, inputs));
        Ok(Sequence::from_unchecked(statements))
    }

    /// Joins sequences end to end, shifting the input indices of each part.
    pub fn concatenate(parts: &[Sequence]) -> Sequence {
        let total = parts.iter().map(Sequence::len).sum();
        let mut statements = Vec::with_capacity(total);
        for part in parts {
            let offset = statements.len();
            for stmt in &part.statements {
                statements.push(Statement {
                    kind: Arc::clone(&stmt.kind),
                    inputs: stmt.inputs.iter().map(|i| i + offset).collect(),
                });
            }
        }
        Sequence::from_unchecked(statements)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statement(&self, idx: usize) -> Option<&Statement> {
        self.statements.get(idx)
    }

    pub fn kind(&self, idx: usize) -> Option<&StatementKind> {
        self.statements.get(idx).map(|s| s.kind.as_ref())
    }

    pub fn inputs(&self, idx: usize) -> &[usize] {
        self.statements.get(idx).map(|s| s.inputs.as_slice()).unwrap_or(&[])
    }

    pub fn variable(&self, idx: usize) -> Option<Variable> {
        self.statements
            .get(idx)
            .map(|s| Variable { index: idx, ty: s.kind.output_type() })
    }

    pub fn last_variable(&self) -> Option<Variable> {
        self.len().checked_sub(1).and_then(|idx| self.variable(idx))
    }

    pub fn input_variables(&self, idx: usize) -> Vec<Variable> {
        self.inputs(idx).iter().filter_map(|&i| self.variable(i)).collect()
    }

    /// Whether some later statement reads variable `idx`.
    pub fn is_used(&self, idx: usize) -> bool {
        self.statements[idx.saturating_add(1).min(self.len())..]
            .iter()
            .any(|s| s.inputs.contains(&idx))
    }

    /// Indices of variables whose type is assignable to `ty`.
    pub fn variables_assignable_to(&self, types: &TypeRegistry, ty: TypeId) -> Vec<usize> {
        self.statements
            .iter()
            .enumerate()
            .filter(|(_, s)| types.is_assignable(ty, s.kind.output_type()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Hex content fingerprint; equal sequences have equal fingerprints.
    pub fn fingerprint(&self) -> String {
        self.fingerprint.to_hex().to_string()
    }
}

fn check_literal(types: &TypeRegistry, ty: TypeId, value: &crate::value::Value) -> Result<(), CoreError> {
    let ok = match value.runtime_type(types) {
        None => value.is_null() && !types.is_primitive(ty),
        Some(actual) => actual == ty || (ty == TypeId::OBJECT && value.is_primitive_or_string()),
    };
    if ok {
        Ok(())
    } else {
        Err(CoreError::LiteralType {
            value: value.to_literal().unwrap_or_else(|| value.kind_name().to_string()),
            ty: types.name_of(ty).to_string(),
        })
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for Sequence {}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.as_bytes().hash(state);
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for stmt in &self.statements {
            list.entry(&stmt.key());
        }
        list.finish()
    }
}
