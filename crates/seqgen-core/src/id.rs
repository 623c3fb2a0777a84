//! Stable ID newtypes.
//!
//! Distinct newtype wrappers so that an operation index cannot be confused
//! with a statement index inside a sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of an operation in its [`OperationRegistry`](crate::registry::OperationRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub u32);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for OperationId {
    fn from(idx: usize) -> Self {
        OperationId(idx as u32)
    }
}

impl From<OperationId> for usize {
    fn from(id: OperationId) -> Self {
        id.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_id_usize_roundtrip() {
        let id = OperationId::from(42usize);
        assert_eq!(id.0, 42);
        let back: usize = id.into();
        assert_eq!(back, 42);
        assert_eq!(id.to_string(), "42");
    }
}
