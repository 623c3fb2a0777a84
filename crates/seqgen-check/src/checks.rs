//! Verdicts attached to the statements of an executed sequence.

use std::fmt;
use std::sync::Arc;

use seqgen_core::Thrown;

use crate::contracts::ObjectContract;

/// A contract applied to specific variables.
#[derive(Debug, Clone)]
pub struct ObjectCheck {
    pub contract: Arc<dyn ObjectContract>,
    /// Variable indices bound to `x0..xN`, in order.
    pub vars: Vec<usize>,
}

/// One post-condition that applied to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostConditionClause {
    pub comment: String,
    /// Boolean expression over `x0..xN`.
    pub code: String,
}

#[derive(Debug, Clone)]
pub enum CheckKind {
    /// The statement threw and was expected to. For regression capture
    /// `candidates` is empty.
    ExpectedException {
        /// The thrown type, or `None` when the call returned normally.
        thrown: Option<String>,
        candidates: Vec<String>,
        comment: String,
    },
    /// The statement threw an exception that reveals an error.
    UnexpectedException { thrown: Thrown },
    Object(ObjectCheck),
    /// Post-conditions evaluated after the call; `vars` binds `x0..xN` to
    /// the inputs followed by the result.
    PostCondition { conditions: Vec<PostConditionClause>, vars: Vec<usize> },
    /// A precondition did not hold, so the statement was not executed.
    InvalidValue { description: String },
}

/// A verdict at statement `index`.
#[derive(Debug, Clone)]
pub struct Check {
    pub index: usize,
    pub kind: CheckKind,
    pub passed: bool,
}

impl Check {
    pub fn new(index: usize, kind: CheckKind, passed: bool) -> Self {
        Check { index, kind, passed }
    }

    pub fn object(index: usize, contract: Arc<dyn ObjectContract>, vars: Vec<usize>, passed: bool) -> Self {
        Check::new(index, CheckKind::Object(ObjectCheck { contract, vars }), passed)
    }

    pub fn is_failure(&self) -> bool {
        !self.passed
    }

    /// Variables this check mentions. Statements producing them cannot be
    /// removed without changing the check.
    pub fn vars(&self) -> Vec<usize> {
        match &self.kind {
            CheckKind::Object(oc) => oc.vars.clone(),
            CheckKind::PostCondition { vars, .. } => vars.clone(),
            CheckKind::ExpectedException { .. }
            | CheckKind::UnexpectedException { .. }
            | CheckKind::InvalidValue { .. } => vec![self.index],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            CheckKind::ExpectedException { .. } => "expected-exception",
            CheckKind::UnexpectedException { .. } => "unexpected-exception",
            CheckKind::Object(_) => "object",
            CheckKind::PostCondition { .. } => "post-condition",
            CheckKind::InvalidValue { .. } => "invalid-value",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed { "pass" } else { "FAIL" };
        write!(f, "[{verdict}] statement {}: ", self.index)?;
        match &self.kind {
            CheckKind::ExpectedException { thrown, candidates, .. } => match thrown {
                Some(t) => write!(f, "threw {t}, expected one of [{}]", candidates.join(", ")),
                None => write!(f, "returned normally, expected one of [{}]", candidates.join(", ")),
            },
            CheckKind::UnexpectedException { thrown } => write!(f, "unexpected {thrown}"),
            CheckKind::Object(oc) => {
                let vars: Vec<String> = oc.vars.iter().map(|v| format!("var{v}")).collect();
                write!(f, "{} on {}", oc.contract.name(), vars.join(", "))
            }
            CheckKind::PostCondition { conditions, .. } => {
                let comments: Vec<&str> = conditions.iter().map(|c| c.comment.as_str()).collect();
                write!(f, "post-conditions [{}]", comments.join("; "))
            }
            CheckKind::InvalidValue { description } => write!(f, "invalid call: {description}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::EqualsReflexive;

    #[test]
    fn vars_and_display() {
        let c = Check::object(4, Arc::new(EqualsReflexive), vec![1], false);
        assert!(c.is_failure());
        assert_eq!(c.vars(), vec![1]);
        assert_eq!(c.to_string(), "[FAIL] statement 4: equals-reflexive on var1");
        let e = Check::new(
            2,
            CheckKind::ExpectedException { thrown: None, candidates: vec!["java.lang.IllegalStateException".into()], comment: String::new() },
            false,
        );
        assert_eq!(e.vars(), vec![2]);
        assert_eq!(e.kind_name(), "expected-exception");
    }
}
