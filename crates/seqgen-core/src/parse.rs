//! Line-oriented text form of a sequence.
//!
//! ```text
//! var0 = literal int 5
//! var1 = call demo.ClassWithConditions.<init>(int) : var0
//! var2 = literal int 21
//! var3 = call demo.ClassWithConditions.category(int) : var1 var2
//! var4 = array int 2 : var0 var2
//! ```
//!
//! Literal bodies are `<type> <value>` where strings and chars are JSON
//! string literals, enum constants are bare constant names, and `null` is
//! the null reference. The form round-trips through
//! [`Sequence::parse`] given the same registries.

use std::sync::Arc;

use crate::error::CoreError;
use crate::operation::{ArrayDecl, StatementKind};
use crate::registry::OperationRegistry;
use crate::sequence::{Sequence, Statement};
use crate::type_id::{TypeId, TypeRegistry};
use crate::types::{PrimitiveType, TypeKind};
use crate::value::{EnumConstant, Value};

impl Sequence {
    pub fn to_parseable_string(&self, types: &TypeRegistry) -> String {
        let mut out = String::new();
        for (idx, stmt) in self.statements().iter().enumerate() {
            let body = match stmt.kind.as_ref() {
                StatementKind::Literal(lit) => {
                    format!("literal {} {}", types.name_of(lit.ty), encode_literal(&lit.value))
                }
                StatementKind::Constructor(op) | StatementKind::Method(op) => format!("call {}", op.descriptor()),
                StatementKind::ArrayDecl(decl) => {
                    format!("array {} {}", types.name_of(decl.element), decl.length())
                }
            };
            out.push_str(&format!("var{idx} = {body}"));
            if !stmt.inputs.is_empty() {
                let inputs: Vec<String> = stmt.inputs.iter().map(|i| format!("var{i}")).collect();
                out.push_str(" : ");
                out.push_str(&inputs.join(" "));
            }
            out.push('\n');
        }
        out
    }

    /// Parses the text form. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str, types: &TypeRegistry, ops: &OperationRegistry) -> Result<Sequence, CoreError> {
        let mut statements = Vec::new();
        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let err = |reason: String| CoreError::Parse { line: line_no + 1, reason };

            let (lhs, rhs) = line
                .split_once(" = ")
                .ok_or_else(|| err("expected 'varN = ...'".into()))?;
            let expected = format!("var{}", statements.len());
            if lhs.trim() != expected {
                return Err(err(format!("expected {expected}, found {}", lhs.trim())));
            }

            let (keyword, body) = rhs.split_once(' ').ok_or_else(|| err("missing statement body".into()))?;
            let stmt = match keyword {
                "literal" => {
                    let (type_name, value_text) = body
                        .split_once(' ')
                        .ok_or_else(|| err("literal needs a type and a value".into()))?;
                    let ty = types
                        .get_by_name(type_name)
                        .ok_or_else(|| err(format!("unknown type {type_name}")))?;
                    let value = decode_literal(types, ty, value_text).map_err(err)?;
                    Statement::new(Arc::new(StatementKind::literal(ty, value)), &[])
                }
                "call" => {
                    let (descriptor, inputs) = split_inputs(body).map_err(err)?;
                    let op = ops.by_descriptor(descriptor).ok_or_else(|| err(format!("unknown operation {descriptor}")))?;
                    Statement::new(Arc::new(StatementKind::call(Arc::clone(op))), &inputs)
                }
                "array" => {
                    let (head, inputs) = split_inputs(body).map_err(err)?;
                    let (elem_name, len_text) = head
                        .split_once(' ')
                        .ok_or_else(|| err("array needs an element type and a length".into()))?;
                    let element = types
                        .get_by_name(elem_name)
                        .ok_or_else(|| err(format!("unknown type {elem_name}")))?;
                    let array_type = types
                        .find_array(element)
                        .ok_or_else(|| err(format!("array type {elem_name}[] is not registered")))?;
                    let length: usize = len_text.parse().map_err(|_| err(format!("bad array length {len_text}")))?;
                    let decl = ArrayDecl { element, array_type, input_types: vec![element; length] };
                    Statement::new(Arc::new(StatementKind::ArrayDecl(decl)), &inputs)
                }
                other => return Err(err(format!("unknown statement keyword {other}"))),
            };
            statements.push(stmt);
        }
        Sequence::from_statements(statements)
    }
}

fn split_inputs(body: &str) -> Result<(&str, Vec<usize>), String> {
    let Some((head, tail)) = body.split_once(" : ") else {
        return Ok((body.trim(), Vec::new()));
    };
    let inputs = tail
        .split_whitespace()
        .map(|tok| {
            tok.strip_prefix("var")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| format!("bad variable reference {tok}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((head.trim(), inputs))
}

fn encode_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Char(c) => serde_json::to_string(&c.to_string()).unwrap_or_default(),
        Value::Str(s) => serde_json::to_string(s.as_ref()).unwrap_or_default(),
        Value::Float(v) => format!("{v:?}"),
        Value::Double(v) => format!("{v:?}"),
        Value::Enum(e) => e.name.to_string(),
        other => other.java_to_string().unwrap_or_default(),
    }
}

fn decode_literal(types: &TypeRegistry, ty: TypeId, text: &str) -> Result<Value, String> {
    let bad = || format!("cannot read {text} as {}", types.name_of(ty));
    if text == "null" && !types.is_primitive(ty) {
        return Ok(Value::Null);
    }
    if ty == TypeId::STRING {
        let s: String = serde_json::from_str(text).map_err(|_| bad())?;
        return Ok(Value::string(s));
    }
    if let Some(p) = types.primitive(ty) {
        return Ok(match p {
            PrimitiveType::Boolean => Value::Boolean(text.parse().map_err(|_| bad())?),
            PrimitiveType::Char => {
                let s: String = serde_json::from_str(text).map_err(|_| bad())?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => return Err(bad()),
                }
            }
            PrimitiveType::Byte => Value::Byte(text.parse().map_err(|_| bad())?),
            PrimitiveType::Short => Value::Short(text.parse().map_err(|_| bad())?),
            PrimitiveType::Int => Value::Int(text.parse().map_err(|_| bad())?),
            PrimitiveType::Long => Value::Long(text.parse().map_err(|_| bad())?),
            PrimitiveType::Float => Value::Float(text.parse().map_err(|_| bad())?),
            PrimitiveType::Double => Value::Double(text.parse().map_err(|_| bad())?),
        });
    }
    match types.get(ty).map(|t| &t.kind) {
        Some(TypeKind::Enum { constants }) => {
            let ordinal = constants.iter().position(|c| c == text).ok_or_else(bad)?;
            Ok(Value::Enum(EnumConstant {
                type_name: types.name_of(ty).into(),
                name: text.into(),
                ordinal: ordinal as u32,
            }))
        }
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::arg_int;

    fn registries() -> (TypeRegistry, OperationRegistry) {
        let mut types = TypeRegistry::new();
        let util = types.register_class("demo.MathUtil", &[]).unwrap();
        types.register_enum("demo.Color", &["RED", "GREEN"]).unwrap();
        types.array_of(TypeId::INT).unwrap();
        let mut ops = OperationRegistry::new();
        ops.static_method(&types, util, "add", &[TypeId::INT, TypeId::INT], TypeId::INT, |args| {
            Ok(Value::Int(arg_int(args, 0)? + arg_int(args, 1)?))
        })
        .unwrap();
        (types, ops)
    }

    #[test]
    fn parses_every_statement_kind() {
        let (types, ops) = registries();
        let text = "\
# comment
var0 = literal int -4
var1 = literal java.lang.String \"a : b\"
var2 = literal demo.Color GREEN
var3 = call demo.MathUtil.add(int,int) : var0 var0
var4 = array int 2 : var0 var3
var5 = literal java.lang.String null
var6 = literal char \"x\"
var7 = literal double NaN
";
        let seq = Sequence::parse(text, &types, &ops).unwrap();
        assert_eq!(seq.len(), 8);
        assert_eq!(seq.inputs(3), &[0, 0]);
        assert_eq!(seq.inputs(4), &[0, 3]);
        match seq.kind(2).unwrap() {
            StatementKind::Literal(lit) => match &lit.value {
                Value::Enum(e) => assert_eq!((e.name.as_ref(), e.ordinal), ("GREEN", 1)),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
        match seq.kind(1).unwrap() {
            StatementKind::Literal(lit) => assert_eq!(lit.value.as_str(), Some("a : b")),
            other => panic!("unexpected {other:?}"),
        }
        let again = Sequence::parse(&seq.to_parseable_string(&types), &types, &ops).unwrap();
        assert_eq!(again, seq);
    }

    #[test]
    fn reports_line_numbers() {
        let (types, ops) = registries();
        let err = Sequence::parse("var0 = literal int 1\nvar1 = call demo.Nope.x()", &types, &ops).unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 2, .. }));
        let err = Sequence::parse("var3 = literal int 1", &types, &ops).unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 1, .. }));
        let err = Sequence::parse("var0 = literal int x", &types, &ops).unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_forward_references() {
        let (types, ops) = registries();
        let text = "var0 = literal int 1\nvar1 = call demo.MathUtil.add(int,int) : var0 var1\n";
        assert!(matches!(
            Sequence::parse(text, &types, &ops),
            Err(CoreError::ForwardReference { statement: 1, input: 1 })
        ));
    }
}
