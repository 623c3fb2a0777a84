//! Operations of the classes under test and the statement kinds built on them.
//!
//! An [`Operation`] is one entry of the registration table that stands in for
//! reflection: a descriptor (class, name, parameter types), its declared
//! input/output types, and a closure that performs the call. A
//! [`StatementKind`] is what one statement of a sequence does: declare a
//! literal, call an operation, or build an array.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::OperationId;
use crate::type_id::{TypeId, TypeRegistry};
use crate::value::{Thrown, Value};

/// Name used for constructors in descriptors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Declaring class, name and parameter type names of a constructor or method.
///
/// This is the key used by specification files; constructors carry the
/// class name as their `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationSignature {
    pub classname: String,
    pub name: String,
    #[serde(rename = "parameterTypes", default)]
    pub parameter_types: Vec<String>,
}

impl OperationSignature {
    pub fn constructor(classname: &str, parameter_types: &[&str]) -> Self {
        OperationSignature {
            classname: classname.to_string(),
            name: classname.to_string(),
            parameter_types: parameter_types.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn method(classname: &str, name: &str, parameter_types: &[&str]) -> Self {
        OperationSignature {
            classname: classname.to_string(),
            name: name.to_string(),
            parameter_types: parameter_types.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == self.classname || self.name == CONSTRUCTOR_NAME
    }

    pub fn is_valid(&self) -> bool {
        !self.classname.is_empty() && !self.name.is_empty()
    }

    /// `demo.Point.<init>(int,int)` / `demo.Point.getX()`.
    pub fn descriptor(&self) -> String {
        let name = if self.is_constructor() { CONSTRUCTOR_NAME } else { &self.name };
        format!("{}.{}({})", self.classname, name, self.parameter_types.join(","))
    }
}

impl fmt::Display for OperationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Constructor,
    /// Instance method; input 0 is the receiver.
    Method,
    StaticMethod,
    /// Instance field read; input 0 is the receiver.
    FieldGet,
    StaticFieldGet,
}

impl OperationKind {
    pub fn has_receiver(self) -> bool {
        matches!(self, OperationKind::Method | OperationKind::FieldGet)
    }

    pub fn is_field(self) -> bool {
        matches!(self, OperationKind::FieldGet | OperationKind::StaticFieldGet)
    }
}

/// Why an invocation did not produce a value.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The code under test threw; this is an execution outcome.
    #[error("{0}")]
    Thrown(Thrown),
    /// The invoker was handed arguments it cannot use. This is a harness bug,
    /// the equivalent of a reflective `IllegalArgumentException`.
    #[error("illegal argument to invoker: {0}")]
    IllegalArgument(String),
}

impl From<Thrown> for InvokeError {
    fn from(thrown: Thrown) -> Self {
        InvokeError::Thrown(thrown)
    }
}

/// The closure that performs a call. Receives receiver-first arguments.
pub type Invoker = Arc<dyn Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync>;

/// A callable member of a class under test.
#[derive(Clone)]
pub struct Operation {
    pub id: OperationId,
    pub signature: OperationSignature,
    pub kind: OperationKind,
    pub declaring_type: TypeId,
    /// Declared input types, receiver first for instance members.
    pub input_types: Vec<TypeId>,
    pub output_type: TypeId,
    /// Side-effect-free and cheap; regression capture may call it.
    pub observer: bool,
    invoker: Invoker,
}

impl Operation {
    pub fn new(
        signature: OperationSignature,
        kind: OperationKind,
        declaring_type: TypeId,
        input_types: Vec<TypeId>,
        output_type: TypeId,
        invoker: Invoker,
    ) -> Self {
        Operation {
            id: OperationId(0),
            signature,
            kind,
            declaring_type,
            input_types,
            output_type,
            observer: false,
            invoker,
        }
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, InvokeError> {
        (self.invoker)(args)
    }

    pub fn invoker(&self) -> Invoker {
        Arc::clone(&self.invoker)
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == OperationKind::Constructor
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, OperationKind::StaticMethod | OperationKind::StaticFieldGet)
    }

    pub fn has_receiver(&self) -> bool {
        self.kind.has_receiver()
    }

    pub fn is_void(&self) -> bool {
        self.output_type == TypeId::VOID
    }

    /// Key used by the registry and by the parseable sequence form. Fields
    /// have no parameter list.
    pub fn descriptor(&self) -> String {
        if self.kind.is_field() {
            format!("{}.{}", self.signature.classname, self.signature.name)
        } else {
            self.signature.descriptor()
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor())
            .field("kind", &self.kind)
            .field("input_types", &self.input_types)
            .field("output_type", &self.output_type)
            .field("observer", &self.observer)
            .finish()
    }
}

/// A literal declaration: `int i0 = 3;`, `String s = null;`, `Color c = Color.RED;`.
#[derive(Debug, Clone)]
pub struct Literal {
    pub ty: TypeId,
    pub value: Value,
}

/// `T[] a = new T[] { in0, in1, ... };`
#[derive(Debug, Clone)]
pub struct ArrayDecl {
    pub element: TypeId,
    pub array_type: TypeId,
    /// `length` copies of `element`.
    pub input_types: Vec<TypeId>,
}

impl ArrayDecl {
    pub fn new(types: &mut TypeRegistry, element: TypeId, length: usize) -> Result<Self, crate::error::CoreError> {
        let array_type = types.array_of(element)?;
        Ok(ArrayDecl { element, array_type, input_types: vec![element; length] })
    }

    pub fn length(&self) -> usize {
        self.input_types.len()
    }
}

/// What one statement of a sequence does.
#[derive(Debug, Clone)]
pub enum StatementKind {
    Literal(Literal),
    Constructor(Arc<Operation>),
    /// Instance/static method call or field read.
    Method(Arc<Operation>),
    ArrayDecl(ArrayDecl),
}

impl StatementKind {
    /// Wraps an operation in the matching statement kind.
    pub fn call(op: Arc<Operation>) -> Self {
        if op.is_constructor() {
            StatementKind::Constructor(op)
        } else {
            StatementKind::Method(op)
        }
    }

    pub fn literal(ty: TypeId, value: Value) -> Self {
        StatementKind::Literal(Literal { ty, value })
    }

    pub fn output_type(&self) -> TypeId {
        match self {
            StatementKind::Literal(lit) => lit.ty,
            StatementKind::Constructor(op) | StatementKind::Method(op) => op.output_type,
            StatementKind::ArrayDecl(decl) => decl.array_type,
        }
    }

    pub fn input_types(&self) -> &[TypeId] {
        match self {
            StatementKind::Literal(_) => &[],
            StatementKind::Constructor(op) | StatementKind::Method(op) => &op.input_types,
            StatementKind::ArrayDecl(decl) => &decl.input_types,
        }
    }

    pub fn arity(&self) -> usize {
        self.input_types().len()
    }

    pub fn operation(&self) -> Option<&Arc<Operation>> {
        match self {
            StatementKind::Constructor(op) | StatementKind::Method(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, StatementKind::Literal(_))
    }

    /// Instance method or field read: input 0 must be non-null.
    pub fn has_receiver(&self) -> bool {
        matches!(self, StatementKind::Method(op) if op.has_receiver())
    }

    /// Human-readable one-liner used in logs and error messages.
    pub fn describe(&self, types: &TypeRegistry) -> String {
        match self {
            StatementKind::Literal(lit) => format!(
                "{} = {}",
                types.name_of(lit.ty),
                lit.value.to_literal().unwrap_or_else(|| "?".into())
            ),
            StatementKind::Constructor(op) | StatementKind::Method(op) => op.descriptor(),
            StatementKind::ArrayDecl(decl) => {
                format!("new {}[{}]", types.name_of(decl.element), decl.length())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Argument extraction for invoker closures
// ---------------------------------------------------------------------------

pub fn arg(args: &[Value], i: usize) -> Result<&Value, InvokeError> {
    args.get(i)
        .ok_or_else(|| InvokeError::IllegalArgument(format!("missing argument {i}")))
}

pub fn arg_bool(args: &[Value], i: usize) -> Result<bool, InvokeError> {
    let v = arg(args, i)?;
    v.as_bool()
        .ok_or_else(|| InvokeError::IllegalArgument(format!("argument {i}: expected boolean, got {}", v.kind_name())))
}

/// Integral argument, narrowed to `int`.
pub fn arg_int(args: &[Value], i: usize) -> Result<i32, InvokeError> {
    let v = arg(args, i)?;
    match v {
        Value::Int(x) => Ok(*x),
        Value::Byte(_) | Value::Short(_) | Value::Char(_) => Ok(v.as_i64().unwrap_or_default() as i32),
        _ => Err(InvokeError::IllegalArgument(format!("argument {i}: expected int, got {}", v.kind_name()))),
    }
}

pub fn arg_long(args: &[Value], i: usize) -> Result<i64, InvokeError> {
    let v = arg(args, i)?;
    v.as_i64()
        .ok_or_else(|| InvokeError::IllegalArgument(format!("argument {i}: expected long, got {}", v.kind_name())))
}

pub fn arg_double(args: &[Value], i: usize) -> Result<f64, InvokeError> {
    let v = arg(args, i)?;
    v.as_f64()
        .ok_or_else(|| InvokeError::IllegalArgument(format!("argument {i}: expected double, got {}", v.kind_name())))
}

/// String argument; `None` for `null`.
pub fn arg_str(args: &[Value], i: usize) -> Result<Option<&str>, InvokeError> {
    match arg(args, i)? {
        Value::Null => Ok(None),
        Value::Str(s) => Ok(Some(s)),
        other => Err(InvokeError::IllegalArgument(format!(
            "argument {i}: expected java.lang.String, got {}",
            other.kind_name()
        ))),
    }
}

/// Object argument downcast to `T`. Dereferencing `null` throws a
/// `NullPointerException`, as the Java callee would.
pub fn arg_object<T: 'static>(args: &[Value], i: usize) -> Result<&T, InvokeError> {
    let v = arg(args, i)?;
    if v.is_null() {
        return Err(InvokeError::Thrown(Thrown::null_pointer()));
    }
    v.downcast_ref::<T>().ok_or_else(|| {
        InvokeError::IllegalArgument(format!(
            "argument {i}: expected {}, got {}",
            std::any::type_name::<T>(),
            v.kind_name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_descriptor_and_constructor_detection() {
        let ctor = OperationSignature::constructor("demo.Point", &["int", "int"]);
        assert!(ctor.is_constructor());
        assert_eq!(ctor.descriptor(), "demo.Point.<init>(int,int)");
        let m = OperationSignature::method("demo.Point", "getX", &[]);
        assert!(!m.is_constructor());
        assert_eq!(m.descriptor(), "demo.Point.getX()");
    }

    #[test]
    fn signature_json_uses_camel_case_parameter_types() {
        let sig = OperationSignature::method("demo.C", "category", &["int"]);
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.contains("\"parameterTypes\":[\"int\"]"));
        let back: OperationSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn argument_helpers_distinguish_null_and_bad_types() {
        let args = [Value::Int(4), Value::Null, Value::string("s")];
        assert_eq!(arg_int(&args, 0).unwrap(), 4);
        assert_eq!(arg_long(&args, 0).unwrap(), 4);
        assert!(matches!(arg_int(&args, 2), Err(InvokeError::IllegalArgument(_))));
        assert_eq!(arg_str(&args, 1).unwrap(), None);
        assert_eq!(arg_str(&args, 2).unwrap(), Some("s"));
        assert!(matches!(arg_object::<String>(&args, 1), Err(InvokeError::Thrown(_))));
        assert!(matches!(arg_int(&args, 7), Err(InvokeError::IllegalArgument(_))));
    }
}
