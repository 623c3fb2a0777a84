//! Regression contracts: "this is the value that was observed".
//!
//! They pass by construction when first recorded; their code is what makes
//! a regression test fail once the behaviour of the code under test drifts.

use std::sync::Arc;

use seqgen_core::{EnumConstant, InvokeError, Operation, Thrown, TypeId, Value};

use super::ObjectContract;

/// Assertion that `expr` equals the literal value `lit`.
fn value_assertion(expr: &str, value: &Value, lit: &str) -> String {
    match value {
        Value::Null => format!("org.junit.Assert.assertNull({expr});"),
        Value::Str(_) => {
            format!("org.junit.Assert.assertEquals(\"'\" + {expr} + \"' != '\" + {lit} + \"'\", {expr}, {lit});")
        }
        Value::Double(v) if v.is_nan() => format!("org.junit.Assert.assertTrue(Double.isNaN({expr}));"),
        Value::Float(v) if v.is_nan() => format!("org.junit.Assert.assertTrue(Float.isNaN({expr}));"),
        Value::Enum(_) => {
            format!("org.junit.Assert.assertTrue(\"'\" + {expr} + \"' != '\" + {lit} + \"'\", {expr}.equals({lit}));")
        }
        _ => format!("org.junit.Assert.assertTrue(\"'\" + {expr} + \"' != '\" + {lit} + \"'\", {expr} == {lit});"),
    }
}

fn invoke_observer(observer: &Operation, receiver: &Value) -> Result<Value, Thrown> {
    if receiver.is_null() {
        return Err(Thrown::null_pointer());
    }
    observer.invoke(std::slice::from_ref(receiver)).map_err(|e| match e {
        InvokeError::Thrown(t) => t,
        InvokeError::IllegalArgument(reason) => Thrown::illegal_argument(reason),
    })
}

/// `x0.name()` or `x0.field`.
fn observer_call(observer: &Operation) -> String {
    if observer.kind.is_field() {
        format!("x0.{}", observer.name())
    } else {
        format!("x0.{}()", observer.name())
    }
}

/// A primitive or string variable holds the observed value.
#[derive(Debug, Clone)]
pub struct PrimValue {
    value: Value,
    literal: String,
}

impl PrimValue {
    /// `None` unless `value` is a primitive or a string.
    pub fn new(value: Value) -> Option<Self> {
        if !value.is_primitive_or_string() {
            return None;
        }
        let literal = value.to_literal()?;
        Some(PrimValue { value, literal })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl ObjectContract for PrimValue {
    fn name(&self) -> &str {
        "primitive-value"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok(values[0] == self.value)
    }

    fn eval_exception_means_failure(&self) -> bool {
        false
    }

    fn to_code_string(&self) -> String {
        value_assertion("x0", &self.value, &self.literal)
    }
}

/// An enum variable holds the observed constant.
#[derive(Debug, Clone)]
pub struct EnumValue {
    value: EnumConstant,
}

impl EnumValue {
    pub fn new(value: EnumConstant) -> Self {
        EnumValue { value }
    }
}

impl ObjectContract for EnumValue {
    fn name(&self) -> &str {
        "enum-value"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![TypeId::OBJECT]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok(matches!(&values[0], Value::Enum(e) if *e == self.value))
    }

    fn eval_exception_means_failure(&self) -> bool {
        false
    }

    fn to_code_string(&self) -> String {
        let lit = format!("{}.{}", self.value.type_name, self.value.name);
        value_assertion("x0", &Value::Enum(self.value.clone()), &lit)
    }
}

/// An observer method of `x0` returns the observed primitive, string, enum
/// constant or `null`.
#[derive(Debug, Clone)]
pub struct ObserverEqValue {
    observer: Arc<Operation>,
    value: Value,
    literal: String,
}

impl ObserverEqValue {
    pub fn new(observer: Arc<Operation>, value: Value) -> Option<Self> {
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            return None;
        }
        let literal = value.to_literal()?;
        Some(ObserverEqValue { observer, value, literal })
    }

    pub fn observer(&self) -> &Arc<Operation> {
        &self.observer
    }
}

impl ObjectContract for ObserverEqValue {
    fn name(&self) -> &str {
        "observer-value"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![self.observer.input_types[0]]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        Ok(invoke_observer(&self.observer, &values[0])? == self.value)
    }

    fn eval_exception_means_failure(&self) -> bool {
        false
    }

    fn to_code_string(&self) -> String {
        value_assertion(&observer_call(&self.observer), &self.value, &self.literal)
    }
}

/// An observer method of `x0` returns an array with the observed elements.
#[derive(Debug, Clone)]
pub struct ObserverEqArray {
    observer: Arc<Operation>,
    element_name: String,
    items: Vec<Value>,
    literals: Vec<String>,
}

impl ObserverEqArray {
    /// `None` when some element has no literal form.
    pub fn new(observer: Arc<Operation>, element_name: &str, items: Vec<Value>) -> Option<Self> {
        let literals = items.iter().map(Value::to_literal).collect::<Option<Vec<_>>>()?;
        Some(ObserverEqArray { observer, element_name: element_name.to_string(), items, literals })
    }
}

impl ObjectContract for ObserverEqArray {
    fn name(&self) -> &str {
        "observer-array"
    }

    fn arity(&self) -> usize {
        1
    }

    fn input_types(&self) -> Vec<TypeId> {
        vec![self.observer.input_types[0]]
    }

    fn evaluate(&self, values: &[Value]) -> Result<bool, Thrown> {
        match invoke_observer(&self.observer, &values[0])? {
            Value::Array(a) => Ok(a.items.len() == self.items.len() && a.items.iter().zip(&self.items).all(|(x, y)| x == y)),
            _ => Ok(false),
        }
    }

    fn eval_exception_means_failure(&self) -> bool {
        false
    }

    fn to_code_string(&self) -> String {
        let delta = match self.element_name.as_str() {
            "double" => ", 0.0",
            "float" => ", 0.0f",
            _ => "",
        };
        format!(
            "org.junit.Assert.assertArrayEquals({}, new {}[] {{ {} }}{delta});",
            observer_call(&self.observer),
            self.element_name,
            self.literals.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgen_core::operation::arg_object;
    use seqgen_core::{Instance, OperationRegistry, TypeRegistry};
    use std::any::Any;

    #[derive(Debug)]
    struct Point {
        x: i32,
    }

    impl Instance for Point {
        fn class_name(&self) -> &str {
            "demo.Point"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn get_x() -> Arc<Operation> {
        let mut types = TypeRegistry::new();
        let point = types.register_class("demo.Point", &[]).unwrap();
        let mut ops = OperationRegistry::new();
        ops.observer(&types, point, "getX", TypeId::INT, |args| Ok(Value::Int(arg_object::<Point>(args, 0)?.x)))
            .unwrap()
    }

    #[test]
    fn prim_value_code_and_evaluation() {
        let c = PrimValue::new(Value::Int(-3)).unwrap();
        assert_eq!(
            c.to_code_string(),
            "org.junit.Assert.assertTrue(\"'\" + x0 + \"' != '\" + (-3) + \"'\", x0 == (-3));"
        );
        assert!(c.evaluate(&[Value::Int(-3)]).unwrap());
        assert!(!c.evaluate(&[Value::Int(3)]).unwrap());
        let s = PrimValue::new(Value::string("x0")).unwrap();
        assert!(s.to_code_string().starts_with("org.junit.Assert.assertEquals("));
        assert!(PrimValue::new(Value::Null).is_none());
    }

    #[test]
    fn observer_value_calls_the_observer() {
        let c = ObserverEqValue::new(get_x(), Value::Int(4)).unwrap();
        assert!(c.evaluate(&[Value::object(Point { x: 4 })]).unwrap());
        assert!(!c.evaluate(&[Value::object(Point { x: 5 })]).unwrap());
        assert!(c.to_code_string().contains("x0.getX() == 4"));
        assert_eq!(c.evaluate(&[Value::Null]).unwrap_err().type_name, Thrown::NULL_POINTER);
    }

    #[test]
    fn enum_value_renders_qualified_constant() {
        let c = EnumValue::new(EnumConstant { type_name: "demo.Color".into(), name: "RED".into(), ordinal: 0 });
        assert!(c.to_code_string().contains("x0.equals(demo.Color.RED)"));
    }

    #[test]
    fn observer_array_uses_assert_array_equals() {
        let c = ObserverEqArray::new(get_x(), "double", vec![Value::Double(1.5)]).unwrap();
        assert_eq!(
            c.to_code_string(),
            "org.junit.Assert.assertArrayEquals(x0.getX(), new double[] { 1.5d }, 0.0);"
        );
    }
}
