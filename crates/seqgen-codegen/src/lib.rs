//! Java source emission for generated sequences.
//!
//! This crate turns executed sequences and their checks into JUnit 4 test
//! classes.
//!
//! # Modules
//!
//! - [`error`] -- Error types for rendering and writing
//! - [`renamer`] -- Variable names derived from declared types
//! - [`printer`] -- One sequence as the body of a test method
//! - [`junit`] -- Test classes and the suite that lists them

pub mod error;
pub mod junit;
pub mod printer;
pub mod renamer;

pub use error::CodegenError;
pub use junit::write_tests;
pub use printer::SequencePrinter;
pub use renamer::VariableRenamer;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options controlling where and how test classes are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JUnitOptions {
    /// Root directory for sources; the package adds subdirectories.
    pub output_dir: PathBuf,

    /// Package of the generated classes. `None` means the default package.
    pub package: Option<String>,

    /// Name of the suite class; test classes append a file number.
    pub class_name: String,

    /// Upper bound on test methods per class.
    pub tests_per_file: usize,

    /// Initial value of each class's `debug` flag, which prints the name
    /// of every test as it starts.
    pub debug: bool,
}

impl Default for JUnitOptions {
    fn default() -> Self {
        JUnitOptions {
            output_dir: PathBuf::from("./generated-tests/"),
            package: None,
            class_name: "RegressionTest".to_string(),
            tests_per_file: 500,
            debug: false,
        }
    }
}

/// Result of writing one suite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteResult {
    /// Every test class followed by the suite class.
    pub files: Vec<PathBuf>,

    /// Files whose content changed and were rewritten.
    pub written: usize,

    /// Files left in place because their content was already current.
    pub unchanged: usize,

    /// Number of test methods.
    pub tests: usize,

    /// Time taken for rendering and writing in milliseconds.
    pub write_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_junit_options() {
        let opts = JUnitOptions::default();
        assert_eq!(opts.output_dir, PathBuf::from("./generated-tests/"));
        assert!(opts.package.is_none());
        assert_eq!(opts.class_name, "RegressionTest");
        assert_eq!(opts.tests_per_file, 500);
        assert!(!opts.debug);
    }

    #[test]
    fn junit_options_serde_roundtrip() {
        let opts = JUnitOptions {
            output_dir: PathBuf::from("/tmp/out"),
            package: Some("demo.tests".to_string()),
            class_name: "ErrorTest".to_string(),
            tests_per_file: 10,
            debug: true,
        };
        let json = serde_json::to_string(&opts).unwrap();
        let back: JUnitOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output_dir, opts.output_dir);
        assert_eq!(back.package, opts.package);
        assert_eq!(back.class_name, opts.class_name);
        assert_eq!(back.tests_per_file, 10);
        assert!(back.debug);
    }
}
