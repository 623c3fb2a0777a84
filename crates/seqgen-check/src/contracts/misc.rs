//! Collection, `toString` and nullness contracts.

use seqgen_core::{Thrown, TypeId, Value};

use super::ObjectContract;

/// `x0.size() == x0.toArray().length` for collections.
#[derive(Debug, Clone, Copy)]
pub struct SizeToArrayLength;

impl ObjectContract for SizeToArrayLength {
    fn name(&self) -> &str {
        "size-toArray-length"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::COLLECTION]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        let Some(coll) = values[0].as_collection() else {
            return Err(Thrown::class_cast(format!("{} is not a collection", values[0].kind_name())));
        };
        Ok(coll.size()? as usize == coll.to_array()?.len())
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertTrue(\"Contract failed: size-toArray-length on x0.\", \
         x0.size() == x0.toArray().length);"
            .to_string()
    }
}

/// `x0.toString()` returns without throwing.
#[derive(Debug, Clone, Copy)]
pub struct ToStringReturnsNormally;

impl ObjectContract for ToStringReturnsNormally {
    fn name(&self) -> &str {
        "toString-returns-normally"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        values[0].java_to_string().map(|_| true)
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code_string(&self) -> String {
        "// Contract failed: toString-returns-normally on x0.\nx0.toString();".to_string()
    }
}

/// `x0 != null`.
#[derive(Debug, Clone, Copy)]
pub struct IsNotNull;

impl ObjectContract for IsNotNull {
    fn name(&self) -> &str {
        "is-not-null"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok(!values[0].is_null())
    }

    fn eval_exception_means_failure(&self) -> bool {
        false
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertNotNull(x0);".to_string()
    }
}

/// `x0 == null`.
#[derive(Debug, Clone, Copy)]
pub struct IsNull;

impl ObjectContract for IsNull {
    fn name(&self) -> &str {
        "is-null"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok(values[0].is_null())
    }

    fn eval_exception_means_failure(&self) -> bool {
        false
    }

    fn to_code_string(&self) -> String {
        "org.junit.Assert.assertNull(x0);".to_string()
    }
}
