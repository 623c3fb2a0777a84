//! The `compareTo` laws. All apply to `java.lang.Comparable` values only.

use seqgen_core::{Thrown, TypeId, Value};

use super::{signum, ObjectContract};

fn compare(a: &Value, b: &Value) -> Result<i32, Thrown> {
    match a.java_compare_to(b) {
        Some(result) => result,
        None => Err(Thrown::class_cast(format!("{} is not comparable", a.kind_name()))),
    }
}

/// `x0.compareTo(x0) == 0`.
#[derive(Debug, Clone, Copy)]
pub struct CompareToReflexive;

impl ObjectContract for CompareToReflexive {
    fn name(&self) -> &str {
        "compareTo-reflexive"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::COMPARABLE]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok(compare(&values[0], &values[0])? == 0)
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: compareTo-reflexive on x0.\", x0.compareTo(x0) == 0);"
            .to_string()
    }
}

/// `sgn(x0.compareTo(x1)) == -sgn(x1.compareTo(x0))`.
#[derive(Debug, Clone, Copy)]
pub struct CompareToAntiSymmetric;

impl ObjectContract for CompareToAntiSymmetric {
    fn name(&self) -> &str {
        "compareTo-anti-symmetric"
    }

    fn arity(&self) -> usize {
        2
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::COMPARABLE, TypeId::COMPARABLE]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        let ab = signum(compare(&values[0], &values[1])?);
        let ba = signum(compare(&values[1], &values[0])?);
        Ok(ab == -ba)
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: compareTo-anti-symmetric on x0 and x1.\", \
         Integer.signum(x0.compareTo(x1)) == -Integer.signum(x1.compareTo(x0)));"
            .to_string()
    }
}

/// `(x0.compareTo(x1) == 0) == x0.equals(x1)`.
#[derive(Debug, Clone, Copy)]
pub struct CompareToEquals;

impl ObjectContract for CompareToEquals {
    fn name(&self) -> &str {
        "compareTo-equals"
    }

    fn arity(&self) -> usize {
        2
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::COMPARABLE, TypeId::COMPARABLE]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok((compare(&values[0], &values[1])? == 0) == values[0].java_equals(&values[1])?)
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: compareTo-equals on x0 and x1.\", \
         (x0.compareTo(x1) == 0) == x0.equals(x1));"
            .to_string()
    }
}

/// `x0.compareTo(x1) == 0` implies `sgn(x0.compareTo(x2)) == sgn(x1.compareTo(x2))`.
#[derive(Debug, Clone, Copy)]
pub struct CompareToSubs;

impl ObjectContract for CompareToSubs {
    fn name(&self) -> &str {
        "compareTo-substitutes"
    }

    fn arity(&self) -> usize {
        3
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::COMPARABLE; 3]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        if compare(&values[0], &values[1])? != 0 {
            return Ok(true);
        }
        Ok(signum(compare(&values[0], &values[2])?) == signum(compare(&values[1], &values[2])?))
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: compareTo-substitutes on x0, x1 and x2.\", \
         x0.compareTo(x1) != 0 || Integer.signum(x0.compareTo(x2)) == Integer.signum(x1.compareTo(x2)));"
            .to_string()
    }
}

/// `x0 > x1 && x1 > x2` implies `x0 > x2`.
#[derive(Debug, Clone, Copy)]
pub struct CompareToTransitive;

impl ObjectContract for CompareToTransitive {
    fn name(&self) -> &str {
        "compareTo-transitive"
    }

    fn arity(&self) -> usize {
        3
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::COMPARABLE; 3]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        if compare(&values[0], &values[1])? > 0 && compare(&values[1], &values[2])? > 0 {
            Ok(compare(&values[0], &values[2])? > 0)
        } else {
            Ok(true)
        }
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: compareTo-transitive on x0, x1 and x2.\", \
         !(x0.compareTo(x1) > 0 && x1.compareTo(x2) > 0) || x0.compareTo(x2) > 0);"
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laws_hold_for_strings() {
        let (a, b, c) = (Value::string("a"), Value::string("b"), Value::string("c"));
        assert!(CompareToReflexive.evaluate(&[a.clone()]).unwrap());
        assert!(CompareToAntiSymmetric.evaluate(&[a.clone(), b.clone()]).unwrap());
        assert!(CompareToEquals.evaluate(&[a.clone(), Value::string("a")]).unwrap());
        assert!(CompareToSubs.evaluate(&[a.clone(), Value::string("a"), c.clone()]).unwrap());
        assert!(CompareToTransitive.evaluate(&[c, b, a]).unwrap());
    }

    #[test]
    fn non_comparable_values_throw() {
        let arr = Value::Array(seqgen_core::ArrayValue { element: TypeId::INT, items: Vec::new().into() });
        let err = CompareToReflexive.evaluate(&[arr]).unwrap_err();
        assert_eq!(err.type_name, Thrown::CLASS_CAST);
        assert!(CompareToReflexive.eval_exception_means_failure());
    }
}
