//! The `equals`/`hashCode` laws.

use seqgen_core::{Thrown, TypeId, Value};

use super::ObjectContract;

/// `x0.equals(x0)`.
#[derive(Debug, Clone, Copy)]
pub struct EqualsReflexive;

impl ObjectContract for EqualsReflexive {
    fn name(&self) -> &str {
        "equals-reflexive"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        values[0].java_equals(&values[0])
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: equals-reflexive on x0.\", x0.equals(x0));".to_string()
    }
}

/// `!x0.equals(null)`.
#[derive(Debug, Clone, Copy)]
pub struct EqualsToNullRetFalse;

impl ObjectContract for EqualsToNullRetFalse {
    fn name(&self) -> &str {
        "equals-to-null"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok(!values[0].java_equals(&Value::Null)?)
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertFalse(\"Contract failed: equals-to-null on x0.\", x0.equals(null));".to_string()
    }
}

/// `x0.equals(x1)` implies `x1.equals(x0)`.
#[derive(Debug, Clone, Copy)]
pub struct EqualsSymmetric;

impl ObjectContract for EqualsSymmetric {
    fn name(&self) -> &str {
        "equals-symmetric"
    }

    fn arity(&self) -> usize {
        2
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT, TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok(!values[0].java_equals(&values[1])? || values[1].java_equals(&values[0])?)
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: equals-symmetric on x0 and x1.\", \
         !x0.equals(x1) || x1.equals(x0));"
            .to_string()
    }
}

/// Equal objects have equal hash codes.
#[derive(Debug, Clone, Copy)]
pub struct EqualsHashcode;

impl ObjectContract for EqualsHashcode {
    fn name(&self) -> &str {
        "equals-hashcode"
    }

    fn arity(&self) -> usize {
        2
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT, TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        if values[0].java_equals(&values[1])? {
            Ok(values[0].java_hash_code()? == values[1].java_hash_code()?)
        } else {
            Ok(true)
        }
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: equals-hashcode on x0 and x1.\", \
         !x0.equals(x1) || x0.hashCode() == x1.hashCode());"
            .to_string()
    }
}

/// `x0.equals(x1) && x1.equals(x2)` implies `x0.equals(x2)`.
#[derive(Debug, Clone, Copy)]
pub struct EqualsTransitive;

impl ObjectContract for EqualsTransitive {
    fn name(&self) -> &str {
        "equals-transitive"
    }

    fn arity(&self) -> usize {
        3
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT; 3]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        if values[0].java_equals(&values[1])? && values[1].java_equals(&values[2])? {
            values[0].java_equals(&values[2])
        } else {
            Ok(true)
        }
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: equals-transitive on x0, x1 and x2.\", \
         !(x0.equals(x1) && x1.equals(x2)) || x0.equals(x2));"
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgen_core::Instance;
    use std::any::Any;

    /// Equal by `id`, but never equal to itself when `broken`.
    #[derive(Debug)]
    struct Item {
        id: i32,
        broken: bool,
        hash: Option<i32>,
    }

    impl Instance for Item {
        fn class_name(&self) -> &str {
            "demo.Item"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn equals(&self, other: &Value) -> Option<Result<bool, Thrown>> {
            if self.broken {
                return Some(Ok(false));
            }
            Some(Ok(other.downcast_ref::<Item>().is_some_and(|o| o.id == self.id)))
        }

        fn hash_code(&self) -> Option<Result<i32, Thrown>> {
            self.hash.map(Ok)
        }
    }

    fn item(id: i32, hash: Option<i32>) -> Value {
        Value::object(Item { id, broken: false, hash })
    }

    #[test]
    fn reflexive_detects_broken_equals() {
        assert!(EqualsReflexive.evaluate(&[item(1, Some(1))]).unwrap());
        let broken = Value::object(Item { id: 1, broken: true, hash: None });
        assert!(!EqualsReflexive.evaluate(&[broken]).unwrap());
    }

    #[test]
    fn hashcode_must_agree_with_equals() {
        assert!(EqualsHashcode.evaluate(&[item(1, Some(7)), item(1, Some(7))]).unwrap());
        assert!(!EqualsHashcode.evaluate(&[item(1, Some(7)), item(1, Some(8))]).unwrap());
        // Unequal objects may share or differ in hash codes.
        assert!(EqualsHashcode.evaluate(&[item(1, Some(7)), item(2, Some(8))]).unwrap());
    }

    #[test]
    fn symmetric_transitive_and_null() {
        let (a, b, c) = (item(1, None), item(1, None), item(1, None));
        assert!(EqualsSymmetric.evaluate(&[a.clone(), b.clone()]).unwrap());
        assert!(EqualsTransitive.evaluate(&[a.clone(), b, c]).unwrap());
        assert!(EqualsToNullRetFalse.evaluate(&[a]).unwrap());
    }
}
