//! Codegen error types.

use std::path::PathBuf;

/// Errors raised while rendering or writing test sources.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The package name is not a dotted sequence of Java identifiers.
    #[error("invalid package name '{0}'")]
    InvalidPackage(String),

    /// The test class name is not a Java identifier.
    #[error("invalid class name '{0}'")]
    InvalidClassName(String),

    /// A statement or check refers to a variable the sequence does not have.
    #[error("statement {statement} refers to unknown variable {var}")]
    UnknownVariable { statement: usize, var: usize },

    /// A literal value has no Java source form.
    #[error("value of statement {statement} has no source form")]
    UnrenderableLiteral { statement: usize },

    #[error("failed to write {path}: {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
