//! A small library of classes under test, registered for generation.
//!
//! Several classes carry deliberate bugs so that generation has something
//! to find:
//!
//! * `ClassWithConditions.category` returns `FOUR` where its specification
//!   says `THREE`;
//! * `Money.hashCode` is identity-based although `equals` compares fields;
//! * `Counter.add` fails an assertion on negative input.

pub mod classes;
pub mod conditions;

use seqgen_core::{CoreError, OperationRegistry, TypeRegistry};

/// Specifications of `ClassWithConditions`, in the JSON interchange format.
pub const SPECS_JSON: &str = include_str!("../specs/class_with_conditions.json");

/// Registers every demo class and its operations.
pub fn build() -> Result<(TypeRegistry, OperationRegistry), CoreError> {
    let mut types = TypeRegistry::new();
    let mut ops = OperationRegistry::new();
    conditions::register(&mut types, &mut ops)?;
    classes::register(&mut types, &mut ops)?;
    Ok((types, ops))
}

/// Only `ClassWithConditions` and its `Range` enum.
pub fn build_conditions_only() -> Result<(TypeRegistry, OperationRegistry), CoreError> {
    let mut types = TypeRegistry::new();
    let mut ops = OperationRegistry::new();
    conditions::register(&mut types, &mut ops)?;
    Ok((types, ops))
}
