//! Object contracts: checkable properties over one or more runtime values.
//!
//! Universal contracts (the `equals`/`hashCode`/`compareTo` laws and a few
//! others) are stateless and apply to any tuple of values whose runtime
//! types fit [`ObjectContract::input_types`]. Regression contracts are built
//! from an observed value and assert that the same value is seen again.
//!
//! Every contract renders as a self-contained assertion over the
//! placeholders `x0..xN`; [`localize_contract_code`] substitutes the real
//! variable names.

pub mod compare;
pub mod equals;
pub mod misc;
pub mod regression;

use std::fmt;
use std::sync::Arc;

use seqgen_core::{Thrown, TypeId, Value};

use crate::condition::replace::NameReplacementMap;

pub use compare::{CompareToAntiSymmetric, CompareToEquals, CompareToReflexive, CompareToSubs, CompareToTransitive};
pub use equals::{EqualsHashcode, EqualsReflexive, EqualsSymmetric, EqualsToNullRetFalse, EqualsTransitive};
pub use misc::{IsNotNull, IsNull, SizeToArrayLength, ToStringReturnsNormally};
pub use regression::{EnumValue, ObserverEqArray, ObserverEqValue, PrimValue};

/// A property of `arity` runtime values.
pub trait ObjectContract: fmt::Debug + Send + Sync {
    /// Short identifier, e.g. `equals-reflexive`.
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    /// The type each input must be assignable to; `arity` entries.
    fn input_types(&self) -> Vec<TypeId>;

    /// `Ok(true)` when the property holds. Callers pass exactly `arity`
    /// values.
    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown>;

    /// Whether an exception thrown by `evaluate` counts as a violation.
    fn eval_exception_means_failure(&self) -> bool;

    /// An assertion statement over `x0..xN`.
    fn to_code_string(&self) -> String;
}

/// The universal contracts, in the order they are tried.
pub fn default_contracts() -> Vec<Arc<dyn ObjectContract>> {
    vec![
        Arc::new(EqualsReflexive),
        Arc::new(EqualsToNullRetFalse),
        Arc::new(EqualsSymmetric),
        Arc::new(EqualsHashcode),
        Arc::new(EqualsTransitive),
        Arc::new(CompareToReflexive),
        Arc::new(CompareToAntiSymmetric),
        Arc::new(CompareToEquals),
        Arc::new(CompareToSubs),
        Arc::new(CompareToTransitive),
        Arc::new(SizeToArrayLength),
        Arc::new(ToStringReturnsNormally),
    ]
}

/// Replaces the whole-word placeholders `x0..xN` in `code` with `names`.
pub fn localize_contract_code(code: &str, names: &[String]) -> String {
    let mut map = NameReplacementMap::new();
    for (i, name) in names.iter().enumerate() {
        map.add(&format!("x{i}"), name);
    }
    map.replace_names(code)
}

/// `Integer.signum`.
pub(crate) fn signum(v: i32) -> i32 {
    v.signum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localize_substitutes_whole_words_only() {
        let names = vec!["money1".to_string(), "money2".to_string()];
        let code = "org.junit.Assert.assertTrue(x0.equals(x1) == x1.equals(x0) && x10 == null);";
        assert_eq!(
            localize_contract_code(code, &names),
            "org.junit.Assert.assertTrue(money1.equals(money2) == money2.equals(money1) && x10 == null);"
        );
    }

    #[test]
    fn every_default_contract_declares_consistent_arity() {
        for c in default_contracts() {
            assert_eq!(c.input_types().len(), c.arity(), "{}", c.name());
            for i in 0..c.arity() {
                assert!(c.to_code_string().contains(&format!("x{i}")), "{}", c.name());
            }
        }
    }
}
