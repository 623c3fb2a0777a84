//! Core error types for seqgen-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! registration mistakes and malformed sequences. None of these describe
//! behaviour of the code under test; those are values (see
//! [`Thrown`](crate::value::Thrown)).

use thiserror::Error;

use crate::type_id::TypeId;

/// Core errors produced by the seqgen-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Attempting to register a type name that already exists in the registry.
    #[error("duplicate type name: '{name}'")]
    DuplicateTypeName { name: String },

    /// A TypeId was not found in the type registry.
    #[error("type not found: TypeId({id})", id = id.0)]
    UnknownTypeId { id: TypeId },

    /// A type name did not resolve.
    #[error("unknown type name: '{name}'")]
    UnknownTypeName { name: String },

    #[error("'{name}' is not a subtype of java.lang.Throwable")]
    NotThrowable { name: String },

    /// An operation with the same descriptor was registered twice.
    #[error("duplicate operation: {descriptor}")]
    DuplicateOperation { descriptor: String },

    #[error("unknown operation: {descriptor}")]
    UnknownOperation { descriptor: String },

    /// A statement input does not refer to an earlier statement.
    #[error("statement {statement} reads var{input}, which is not defined before it")]
    ForwardReference { statement: usize, input: usize },

    #[error("{what} expects {expected} inputs, got {actual}")]
    ArityMismatch { what: String, expected: usize, actual: usize },

    /// An input variable's type cannot be assigned to the declared input type.
    #[error("input {position} of {what}: {actual} is not assignable to {expected}")]
    IncompatibleInput {
        what: String,
        position: usize,
        expected: String,
        actual: String,
    },

    /// Removing a statement whose output is still read by a later statement.
    #[error("var{index} is still used by statement {used_by}")]
    VariableInUse { index: usize, used_by: usize },

    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A literal value does not fit its declared type.
    #[error("literal {value} does not have type {ty}")]
    LiteralType { value: String, ty: String },

    /// Malformed text form of a sequence.
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}
