//! `demo.ClassWithConditions`: a value holder whose `category` method is
//! described by the specifications in [`SPECS_JSON`](crate::SPECS_JSON).

use std::any::Any;
use std::sync::Arc;

use seqgen_core::operation::{arg_int, arg_object};
use seqgen_core::{CoreError, EnumConstant, OperationRegistry, Thrown, TypeId, TypeRegistry, Value};

pub const CLASS: &str = "demo.ClassWithConditions";
pub const RANGE: &str = "demo.ClassWithConditions.Range";
const RANGE_CONSTANTS: [&str; 4] = ["ONE", "TWO", "THREE", "FOUR"];

#[derive(Debug)]
pub struct ClassWithConditions {
    value: i32,
}

impl ClassWithConditions {
    pub fn new(value: i32) -> Self {
        ClassWithConditions { value }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Which multiple of `self.value` the argument falls below.
    ///
    /// The third range is reported as `FOUR`.
    pub fn category(&self, value: i32) -> Result<usize, Thrown> {
        let base = i64::from(self.value);
        let v = i64::from(value);
        if v >= 4 * base {
            return Err(Thrown::illegal_argument(format!("{value} is at least 4*{}", self.value)));
        }
        Ok(if v < base {
            0
        } else if v < 2 * base {
            1
        } else {
            3
        })
    }
}

impl seqgen_core::Instance for ClassWithConditions {
    fn class_name(&self) -> &str {
        CLASS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The `Range` constant with the given ordinal.
pub fn range(ordinal: usize) -> Value {
    Value::Enum(EnumConstant {
        type_name: Arc::from(RANGE),
        name: Arc::from(RANGE_CONSTANTS[ordinal]),
        ordinal: ordinal as u32,
    })
}

pub(crate) fn register(types: &mut TypeRegistry, ops: &mut OperationRegistry) -> Result<(), CoreError> {
    let class = types.register_class(CLASS, &[])?;
    let range_ty = types.register_enum(RANGE, &RANGE_CONSTANTS)?;

    ops.constructor(types, class, &[TypeId::INT], |args| {
        Ok(Value::object(ClassWithConditions::new(arg_int(args, 0)?)))
    })?;
    ops.observer(types, class, "getValue", TypeId::INT, |args| {
        Ok(Value::Int(arg_object::<ClassWithConditions>(args, 0)?.value()))
    })?;
    ops.method(types, class, "category", &[TypeId::INT], range_ty, |args| {
        let receiver = arg_object::<ClassWithConditions>(args, 0)?;
        Ok(range(receiver.category(arg_int(args, 1)?)?))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_has_the_third_range_wrong() {
        let c = ClassWithConditions::new(5);
        assert_eq!(c.category(1).unwrap(), 0);
        assert_eq!(c.category(6).unwrap(), 1);
        assert_eq!(c.category(11).unwrap(), 3);
        assert_eq!(c.category(16).unwrap(), 3);
        assert_eq!(c.category(21).unwrap_err().type_name, Thrown::ILLEGAL_ARGUMENT);
    }

    #[test]
    fn enum_path_resolves() {
        let mut types = TypeRegistry::new();
        let mut ops = OperationRegistry::new();
        register(&mut types, &mut ops).unwrap();
        assert!(types.resolve("ClassWithConditions.Range").is_some());
        assert_eq!(range(2).runtime_type(&types), types.get_by_name(RANGE));
    }
}
