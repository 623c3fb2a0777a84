//! Runtime values produced and consumed by executed statements.
//!
//! [`Value`] mirrors the Java value space: `null`, boxed primitives,
//! strings, enum constants, arrays and objects. Objects under test are
//! `Arc<dyn Instance>`; identity is pointer identity. The `java_*` methods
//! implement the `equals`/`hashCode`/`toString`/`compareTo` protocol that
//! the object contracts and condition expressions are written against.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::type_id::{TypeId, TypeRegistry};

/// An exception raised by code under test (or by the value protocol itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thrown {
    /// Fully-qualified exception class name.
    pub type_name: String,
    pub message: Option<String>,
}

impl Thrown {
    pub const NULL_POINTER: &'static str = "java.lang.NullPointerException";
    pub const ILLEGAL_ARGUMENT: &'static str = "java.lang.IllegalArgumentException";
    pub const ILLEGAL_STATE: &'static str = "java.lang.IllegalStateException";
    pub const CLASS_CAST: &'static str = "java.lang.ClassCastException";
    pub const ARITHMETIC: &'static str = "java.lang.ArithmeticException";
    pub const INDEX_OUT_OF_BOUNDS: &'static str = "java.lang.IndexOutOfBoundsException";
    pub const UNSUPPORTED_OPERATION: &'static str = "java.lang.UnsupportedOperationException";
    pub const ERROR: &'static str = "java.lang.Error";

    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Thrown { type_name: type_name.into(), message: Some(message.into()) }
    }

    pub fn bare(type_name: impl Into<String>) -> Self {
        Thrown { type_name: type_name.into(), message: None }
    }

    pub fn null_pointer() -> Self {
        Thrown::bare(Self::NULL_POINTER)
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Thrown::new(Self::ILLEGAL_ARGUMENT, message)
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Thrown::new(Self::ILLEGAL_STATE, message)
    }

    pub fn class_cast(message: impl Into<String>) -> Self {
        Thrown::new(Self::CLASS_CAST, message)
    }

    /// Resolves the exception class in `types`.
    pub fn type_id(&self, types: &TypeRegistry) -> Option<TypeId> {
        types.get_by_name(&self.type_name)
    }

    /// Whether this exception is an instance of `expected` (by subtyping).
    pub fn is_instance_of(&self, types: &TypeRegistry, expected: TypeId) -> bool {
        match self.type_id(types) {
            Some(id) => types.is_subtype(id, expected),
            None => types.name_of(expected) == self.type_name,
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.type_name, msg),
            None => f.write_str(&self.type_name),
        }
    }
}

/// A read-only view of a `java.util.Collection`.
pub trait CollectionView {
    fn size(&self) -> Result<i32, Thrown>;
    fn to_array(&self) -> Result<Vec<Value>, Thrown>;
}

/// An object of a class under test.
///
/// Each protocol method returns `None` when the class does not override the
/// corresponding `java.lang.Object` method, in which case identity-based
/// defaults apply. Mutable state must use interior mutability so that
/// calls like `x.equals(x)` never alias a `&mut`.
pub trait Instance: fmt::Debug + Send + Sync + 'static {
    /// Fully-qualified name of the runtime class, as registered in the
    /// [`TypeRegistry`].
    fn class_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn equals(&self, _other: &Value) -> Option<Result<bool, Thrown>> {
        None
    }

    fn hash_code(&self) -> Option<Result<i32, Thrown>> {
        None
    }

    fn to_java_string(&self) -> Option<Result<String, Thrown>> {
        None
    }

    /// `None` when the class is not `Comparable`.
    fn compare_to(&self, _other: &Value) -> Option<Result<i32, Thrown>> {
        None
    }

    fn as_collection(&self) -> Option<&dyn CollectionView> {
        None
    }
}

/// An enum constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumConstant {
    pub type_name: Arc<str>,
    pub name: Arc<str>,
    pub ordinal: u32,
}

/// An array value: element type plus shared, identity-bearing storage.
#[derive(Debug, Clone)]
pub struct ArrayValue {
    pub element: TypeId,
    pub items: Arc<[Value]>,
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Arc<str>),
    Enum(EnumConstant),
    Array(ArrayValue),
    Object(Arc<dyn Instance>),
}

impl Value {
    pub fn object<T: Instance>(instance: T) -> Value {
        Value::Object(Arc::new(instance))
    }

    pub fn string(s: impl Into<Arc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boxed primitive (not `null`, not a string).
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Boolean(_)
                | Value::Char(_)
                | Value::Byte(_)
                | Value::Short(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Float(_)
                | Value::Double(_)
        )
    }

    pub fn is_primitive_or_string(&self) -> bool {
        self.is_primitive() || matches!(self, Value::Str(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral value widened to `i64` (byte, short, char, int, long).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Char(c) => Some(*c as u32 as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Object(o) => o.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The runtime type of this value, `None` for `null` or an unregistered class.
    pub fn runtime_type(&self, types: &TypeRegistry) -> Option<TypeId> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(TypeId::BOOLEAN),
            Value::Char(_) => Some(TypeId::CHAR),
            Value::Byte(_) => Some(TypeId::BYTE),
            Value::Short(_) => Some(TypeId::SHORT),
            Value::Int(_) => Some(TypeId::INT),
            Value::Long(_) => Some(TypeId::LONG),
            Value::Float(_) => Some(TypeId::FLOAT),
            Value::Double(_) => Some(TypeId::DOUBLE),
            Value::Str(_) => Some(TypeId::STRING),
            Value::Enum(e) => types.get_by_name(&e.type_name),
            Value::Array(a) => types.find_array(a.element),
            Value::Object(o) => types.get_by_name(o.class_name()),
        }
    }

    /// Java reference/primitive `==`.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(&a.items, &b.items),
            _ => self == other,
        }
    }

    /// `this.equals(other)`.
    pub fn java_equals(&self, other: &Value) -> Result<bool, Thrown> {
        match self {
            Value::Null => Err(Thrown::null_pointer()),
            Value::Object(o) => match o.equals(other) {
                Some(result) => result,
                None => Ok(self.identical(other)),
            },
            Value::Array(_) => Ok(self.identical(other)),
            _ => Ok(self == other),
        }
    }

    /// `this.hashCode()`.
    pub fn java_hash_code(&self) -> Result<i32, Thrown> {
        Ok(match self {
            Value::Null => return Err(Thrown::null_pointer()),
            Value::Boolean(b) => {
                if *b {
                    1231
                } else {
                    1237
                }
            }
            Value::Char(c) => *c as u32 as i32,
            Value::Byte(v) => *v as i32,
            Value::Short(v) => *v as i32,
            Value::Int(v) => *v,
            Value::Long(v) => (*v ^ ((*v as u64) >> 32) as i64) as i32,
            Value::Float(v) => float_bits(*v) as i32,
            Value::Double(v) => {
                let bits = double_bits(*v);
                (bits ^ (bits >> 32)) as i32
            }
            Value::Str(s) => string_hash(s),
            Value::Enum(e) => string_hash(&e.type_name) ^ string_hash(&e.name),
            Value::Array(a) => identity_hash(Arc::as_ptr(&a.items) as *const ()),
            Value::Object(o) => match o.hash_code() {
                Some(result) => return result,
                None => identity_hash(Arc::as_ptr(o) as *const ()),
            },
        })
    }

    /// `String.valueOf(this)`; a null value renders as `"null"`.
    pub fn java_to_string(&self) -> Result<String, Thrown> {
        Ok(match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::Short(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => java_float_string(*v),
            Value::Double(v) => java_float_string(*v),
            Value::Str(s) => s.to_string(),
            Value::Enum(e) => e.name.to_string(),
            Value::Array(a) => {
                let hash = identity_hash(Arc::as_ptr(&a.items) as *const ());
                format!("[Ljava.lang.Object;@{:x}", hash as u32)
            }
            Value::Object(o) => match o.to_java_string() {
                Some(result) => return result,
                None => {
                    let hash = identity_hash(Arc::as_ptr(o) as *const ());
                    format!("{}@{:x}", o.class_name(), hash as u32)
                }
            },
        })
    }

    /// `((Comparable) this).compareTo(other)`, or `None` when this value is
    /// not comparable.
    pub fn java_compare_to(&self, other: &Value) -> Option<Result<i32, Thrown>> {
        if let Value::Object(o) = self {
            return o.compare_to(other);
        }
        if matches!(self, Value::Array(_)) {
            return None;
        }
        if self.is_null() || other.is_null() {
            return Some(Err(Thrown::null_pointer()));
        }
        let ordering = match (self, other) {
            (Value::Str(a), Value::Str(b)) => return Some(Ok(java_string_compare(a, b))),
            (Value::Enum(a), Value::Enum(b)) if a.type_name == b.type_name => {
                return Some(Ok(a.ordinal as i32 - b.ordinal as i32))
            }
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Byte(a), Value::Byte(b)) => a.cmp(b),
            (Value::Short(a), Value::Short(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Long(a), Value::Long(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            _ => {
                return Some(Err(Thrown::class_cast(format!(
                    "{} cannot be compared to {}",
                    self.kind_name(),
                    other.kind_name()
                ))))
            }
        };
        Some(Ok(match ordering {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }))
    }

    pub fn as_collection(&self) -> Option<&dyn CollectionView> {
        match self {
            Value::Object(o) => o.as_collection(),
            _ => None,
        }
    }

    /// Short name of the value's kind, for messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Char(_) => "char",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "java.lang.String",
            Value::Enum(e) => &e.type_name,
            Value::Array(_) => "array",
            Value::Object(o) => o.class_name(),
        }
    }

    /// Source literal for primitives, strings, `null` and enum constants.
    pub fn to_literal(&self) -> Option<String> {
        Some(match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Char(c) => format!("'{}'", escape_char(*c, '\'')),
            Value::Byte(v) => format!("(byte){}", parenthesize_negative(v.to_string())),
            Value::Short(v) => format!("(short){}", parenthesize_negative(v.to_string())),
            Value::Int(v) => parenthesize_negative(v.to_string()),
            Value::Long(v) => parenthesize_negative(format!("{v}L")),
            Value::Float(v) => {
                if v.is_nan() {
                    "Float.NaN".to_string()
                } else if v.is_infinite() {
                    (if *v > 0.0 { "Float.POSITIVE_INFINITY" } else { "Float.NEGATIVE_INFINITY" }).to_string()
                } else {
                    parenthesize_negative(format!("{}f", java_float_string(*v)))
                }
            }
            Value::Double(v) => {
                if v.is_nan() {
                    "Double.NaN".to_string()
                } else if v.is_infinite() {
                    (if *v > 0.0 { "Double.POSITIVE_INFINITY" } else { "Double.NEGATIVE_INFINITY" }).to_string()
                } else {
                    parenthesize_negative(format!("{}d", java_float_string(*v)))
                }
            }
            Value::Str(s) => format!("\"{}\"", s.chars().map(|c| escape_char(c, '"')).collect::<String>()),
            Value::Enum(e) => format!("{}.{}", e.type_name, e.name),
            Value::Array(_) | Value::Object(_) => return None,
        })
    }
}

/// Structural equality: boxed-primitive `equals`, string contents, enum
/// constant identity, and pointer identity for arrays and objects.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (Value::Double(a), Value::Double(b)) => double_bits(*a) == double_bits(*b),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a.type_name == b.type_name && a.name == b.name,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(&a.items, &b.items),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Whether `s` looks like the default `Object.toString()` output
/// (`Class@1b6d3586`), which is not stable across runs.
pub fn looks_like_object_to_string(s: &str) -> bool {
    match s.rfind('@') {
        Some(pos) if pos > 0 && pos + 1 < s.len() => {
            s[pos + 1..].chars().all(|c| c.is_ascii_hexdigit())
        }
        _ => false,
    }
}

// Canonical NaN, like Float.floatToIntBits.
fn float_bits(v: f32) -> u32 {
    if v.is_nan() {
        0x7fc0_0000
    } else {
        v.to_bits()
    }
}

fn double_bits(v: f64) -> u64 {
    if v.is_nan() {
        0x7ff8_0000_0000_0000
    } else {
        v.to_bits()
    }
}

fn string_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

fn identity_hash(ptr: *const ()) -> i32 {
    let addr = ptr as usize as u64;
    ((addr >> 4) ^ (addr >> 36)) as i32
}

fn java_string_compare(a: &str, b: &str) -> i32 {
    let mut left = a.encode_utf16();
    let mut right = b.encode_utf16();
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) if x != y => return x as i32 - y as i32,
            (Some(_), Some(_)) => continue,
            (Some(_), None) => return 1,
            (None, Some(_)) => return -1,
            (None, None) => return 0,
        }
    }
}

/// Renders a floating-point number the way `Double.toString` does for the
/// common cases: `1.0`, `0.25`, `1.0E10`, `NaN`, `Infinity`.
fn java_float_string<T>(v: T) -> String
where
    T: Into<f64> + Copy + fmt::Display + fmt::UpperExp,
{
    let wide: f64 = v.into();
    if wide.is_nan() {
        return "NaN".to_string();
    }
    if wide.is_infinite() {
        return if wide > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = wide.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let s = format!("{v}");
        if s.contains('.') {
            s
        } else {
            format!("{s}.0")
        }
    } else {
        let s = format!("{v:E}");
        match s.split_once('E') {
            Some((mantissa, exp)) if !mantissa.contains('.') => format!("{mantissa}.0E{exp}"),
            _ => s,
        }
    }
}

fn parenthesize_negative(s: String) -> String {
    if s.starts_with('-') {
        format!("({s})")
    } else {
        s
    }
}

fn escape_char(c: char, quote: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\\' => "\\\\".to_string(),
        c if c == quote => format!("\\{c}"),
        c if (c as u32) < 0x20 || (c as u32) > 0x7e => format!("\\u{:04x}", c as u32),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain;

    impl Instance for Plain {
        fn class_name(&self) -> &str {
            "demo.Plain"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn boxed_equality_is_per_kind() {
        assert!(Value::Int(3).java_equals(&Value::Int(3)).unwrap());
        assert!(!Value::Int(3).java_equals(&Value::Long(3)).unwrap());
        assert!(Value::Double(f64::NAN).java_equals(&Value::Double(f64::NAN)).unwrap());
        assert!(!Value::Double(0.0).java_equals(&Value::Double(-0.0)).unwrap());
        assert!(!Value::Int(1).java_equals(&Value::Null).unwrap());
    }

    #[test]
    fn null_receiver_throws_npe() {
        let err = Value::Null.java_equals(&Value::Int(1)).unwrap_err();
        assert_eq!(err.type_name, Thrown::NULL_POINTER);
        assert!(Value::Null.java_hash_code().is_err());
        assert_eq!(Value::Null.java_to_string().unwrap(), "null");
    }

    #[test]
    fn objects_default_to_identity() {
        let a = Value::object(Plain);
        let b = Value::object(Plain);
        assert!(a.java_equals(&a.clone()).unwrap());
        assert!(!a.java_equals(&b).unwrap());
        assert_eq!(a.java_hash_code().unwrap(), a.clone().java_hash_code().unwrap());
        assert!(looks_like_object_to_string(&a.java_to_string().unwrap()));
        assert!(a.java_compare_to(&b).is_none());
    }

    #[test]
    fn string_hash_matches_java() {
        assert_eq!(Value::string("").java_hash_code().unwrap(), 0);
        assert_eq!(Value::string("a").java_hash_code().unwrap(), 97);
        assert_eq!(Value::string("hello").java_hash_code().unwrap(), 99162322);
    }

    #[test]
    fn compare_to_on_strings_and_mismatches() {
        assert!(Value::string("a").java_compare_to(&Value::string("b")).unwrap().unwrap() < 0);
        assert_eq!(Value::Int(4).java_compare_to(&Value::Int(4)).unwrap().unwrap(), 0);
        let err = Value::Int(1).java_compare_to(&Value::string("x")).unwrap().unwrap_err();
        assert_eq!(err.type_name, Thrown::CLASS_CAST);
        let err = Value::Int(1).java_compare_to(&Value::Null).unwrap().unwrap_err();
        assert_eq!(err.type_name, Thrown::NULL_POINTER);
    }

    #[test]
    fn literals_render_as_source() {
        assert_eq!(Value::Int(-3).to_literal().unwrap(), "(-3)");
        assert_eq!(Value::Long(7).to_literal().unwrap(), "7L");
        assert_eq!(Value::Double(1.0).to_literal().unwrap(), "1.0d");
        assert_eq!(Value::Float(0.5).to_literal().unwrap(), "0.5f");
        assert_eq!(Value::Byte(2).to_literal().unwrap(), "(byte)2");
        assert_eq!(Value::Char('\'').to_literal().unwrap(), "'\\''");
        assert_eq!(Value::string("a\"b\n").to_literal().unwrap(), "\"a\\\"b\\n\"");
        assert_eq!(Value::Double(f64::NAN).to_literal().unwrap(), "Double.NaN");
        assert!(Value::object(Plain).to_literal().is_none());
    }

    #[test]
    fn double_to_string_follows_java_format() {
        assert_eq!(Value::Double(1.0).java_to_string().unwrap(), "1.0");
        assert_eq!(Value::Double(0.25).java_to_string().unwrap(), "0.25");
        assert_eq!(Value::Double(1e10).java_to_string().unwrap(), "1.0E10");
        assert_eq!(Value::Double(f64::INFINITY).java_to_string().unwrap(), "Infinity");
    }

    #[test]
    fn object_to_string_detection() {
        assert!(looks_like_object_to_string("demo.Point@1b6d3586"));
        assert!(!looks_like_object_to_string("user@example"));
        assert!(!looks_like_object_to_string("@abc"));
        assert!(!looks_like_object_to_string("plain"));
    }
}
