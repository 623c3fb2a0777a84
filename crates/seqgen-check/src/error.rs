//! Error types for execution and the condition system.
//!
//! Nothing here describes behaviour of the code under test: exceptions it
//! throws, time-outs and violated contracts are recorded as outcomes and
//! checks. These enums cover harness bugs and malformed input, and are
//! fatal to the sequence (or specification) that raised them.

use std::path::PathBuf;

use seqgen_core::{CoreError, Thrown};
use thiserror::Error;

/// Internal errors raised while executing a sequence.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{what} expects {expected} input values, got {actual}")]
    ArityMismatch { what: String, expected: usize, actual: usize },

    /// The invoker refused its arguments. Indicates a bad registration, the
    /// counterpart of a reflective access failure.
    #[error("invoker for {descriptor} rejected its arguments: {reason}")]
    IllegalArgument { descriptor: String, reason: String },

    #[error("sequence has already been executed")]
    AlreadyExecuted,

    #[error("failed to start executor thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Errors reading, compiling or evaluating operation specifications.
#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("failed to read specification file {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed specification JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation a specification names is not registered.
    #[error("no registered operation matches {signature}")]
    UnknownOperation { signature: String },

    /// Receiver, parameter and result names of a specification collide.
    #[error("identifier names of {signature} conflict")]
    NameConflict { signature: String },

    /// Guard or property text did not compile.
    #[error("condition '{text}' of {signature} does not compile: {reason}")]
    Compile { signature: String, text: String, reason: String },

    /// Evaluating a compiled condition threw.
    #[error("condition '{text}' threw {thrown}")]
    Evaluate { text: String, thrown: Thrown },
}
