//! Evaluation of compiled condition trees.
//!
//! Arithmetic follows Java: `int` and `long` wrap on overflow, integer
//! division or remainder by zero throws `ArithmeticException`, and a call
//! through a `null` receiver throws `NullPointerException`. Anything the
//! code under test throws propagates as a [`Thrown`].

use seqgen_core::{InvokeError, Thrown, Value};

use super::expr::{ArithOp, Builtin, CmpOp, Node, NumKind};

fn division_by_zero() -> Thrown {
    Thrown::new(Thrown::ARITHMETIC, "/ by zero")
}

fn mismatch(what: &str, value: &Value) -> Thrown {
    Thrown::class_cast(format!("{what}: unexpected {}", value.kind_name()))
}

/// Converts `value` to the promoted numeric domain.
fn to_num(kind: NumKind, value: &Value) -> Result<Value, Thrown> {
    let converted = match kind {
        NumKind::Int => value.as_i64().map(|v| Value::Int(v as i32)),
        NumKind::Long => value.as_i64().map(Value::Long),
        NumKind::Float => value.as_f64().map(|v| Value::Float(v as f32)),
        NumKind::Double => value.as_f64().map(Value::Double),
    };
    match (converted, value) {
        (Some(v), _) => Ok(v),
        (None, Value::Null) => Err(Thrown::null_pointer()),
        (None, other) => Err(mismatch("numeric operand", other)),
    }
}

macro_rules! int_arith {
    ($op:expr, $a:expr, $b:expr) => {
        match $op {
            ArithOp::Add => $a.wrapping_add($b),
            ArithOp::Sub => $a.wrapping_sub($b),
            ArithOp::Mul => $a.wrapping_mul($b),
            ArithOp::Div => {
                if $b == 0 {
                    return Err(division_by_zero());
                }
                $a.wrapping_div($b)
            }
            ArithOp::Rem => {
                if $b == 0 {
                    return Err(division_by_zero());
                }
                $a.wrapping_rem($b)
            }
        }
    };
}

macro_rules! float_arith {
    ($op:expr, $a:expr, $b:expr) => {
        match $op {
            ArithOp::Add => $a + $b,
            ArithOp::Sub => $a - $b,
            ArithOp::Mul => $a * $b,
            ArithOp::Div => $a / $b,
            ArithOp::Rem => $a % $b,
        }
    };
}

fn arith(op: ArithOp, kind: NumKind, lhs: &Value, rhs: &Value) -> Result<Value, Thrown> {
    Ok(match (to_num(kind, lhs)?, to_num(kind, rhs)?) {
        (Value::Int(a), Value::Int(b)) => Value::Int(int_arith!(op, a, b)),
        (Value::Long(a), Value::Long(b)) => Value::Long(int_arith!(op, a, b)),
        (Value::Float(a), Value::Float(b)) => Value::Float(float_arith!(op, a, b)),
        (Value::Double(a), Value::Double(b)) => Value::Double(float_arith!(op, a, b)),
        (a, _) => return Err(mismatch("arithmetic", &a)),
    })
}

/// Numeric comparison; any comparison involving NaN is false.
fn compare(op: CmpOp, kind: NumKind, lhs: &Value, rhs: &Value) -> Result<bool, Thrown> {
    let ordering = match (to_num(kind, lhs)?, to_num(kind, rhs)?) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(&b)),
        (Value::Long(a), Value::Long(b)) => Some(a.cmp(&b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(&b),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(&b),
        (a, _) => return Err(mismatch("comparison", &a)),
    };
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::Ge => ordering.is_ge(),
    })
}

fn numeric_eq(kind: NumKind, lhs: &Value, rhs: &Value) -> Result<bool, Thrown> {
    Ok(match (to_num(kind, lhs)?, to_num(kind, rhs)?) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Long(a), Value::Long(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Double(a), Value::Double(b)) => a == b,
        (a, _) => return Err(mismatch("equality", &a)),
    })
}

fn truth(value: Value) -> Result<bool, Thrown> {
    match value {
        Value::Boolean(b) => Ok(b),
        Value::Null => Err(Thrown::null_pointer()),
        other => Err(mismatch("boolean operand", &other)),
    }
}

fn builtin(method: Builtin, receiver: &Value, args: &[Value]) -> Result<Value, Thrown> {
    if receiver.is_null() {
        return Err(Thrown::null_pointer());
    }
    let arg = || args.first().cloned().unwrap_or(Value::Null);
    Ok(match method {
        Builtin::Equals => Value::Boolean(receiver.java_equals(&arg())?),
        Builtin::HashCode => Value::Int(receiver.java_hash_code()?),
        Builtin::ToString => Value::string(receiver.java_to_string()?),
        Builtin::CompareTo => match receiver.java_compare_to(&arg()) {
            Some(result) => Value::Int(result?),
            None => return Err(Thrown::class_cast(format!("{} is not comparable", receiver.kind_name()))),
        },
        Builtin::StringLength => match receiver {
            Value::Str(s) => Value::Int(s.encode_utf16().count() as i32),
            other => return Err(mismatch("length()", other)),
        },
        Builtin::IsEmpty => match receiver {
            Value::Str(s) => Value::Boolean(s.is_empty()),
            other => match other.as_collection() {
                Some(c) => Value::Boolean(c.size()? == 0),
                None => return Err(mismatch("isEmpty()", other)),
            },
        },
        Builtin::Size => match receiver.as_collection() {
            Some(c) => Value::Int(c.size()?),
            None => return Err(mismatch("size()", receiver)),
        },
        Builtin::ArrayLength => match receiver {
            Value::Array(a) => Value::Int(a.items.len() as i32),
            other => return Err(mismatch("length", other)),
        },
        Builtin::EnumName => match receiver {
            Value::Enum(e) => Value::string(e.name.clone()),
            other => return Err(mismatch("name()", other)),
        },
        Builtin::EnumOrdinal => match receiver {
            Value::Enum(e) => Value::Int(e.ordinal as i32),
            other => return Err(mismatch("ordinal()", other)),
        },
    })
}

impl Node {
    /// Evaluates this tree with `x0..xN` bound to `vars`.
    pub(crate) fn eval(&self, vars: &[Value]) -> Result<Value, Thrown> {
        match self {
            Node::Const(v) => Ok(v.clone()),
            Node::Var(i) => vars
                .get(*i)
                .cloned()
                .ok_or_else(|| Thrown::illegal_argument(format!("no value bound to x{i}"))),
            Node::Not(inner) => Ok(Value::Boolean(!truth(inner.eval(vars)?)?)),
            Node::Neg(kind, inner) => {
                let zero = Value::Int(0);
                arith(ArithOp::Sub, *kind, &zero, &inner.eval(vars)?)
            }
            Node::Arith(op, kind, lhs, rhs) => arith(*op, *kind, &lhs.eval(vars)?, &rhs.eval(vars)?),
            Node::Concat(lhs, rhs) => {
                let mut s = lhs.eval(vars)?.java_to_string()?;
                s.push_str(&rhs.eval(vars)?.java_to_string()?);
                Ok(Value::string(s))
            }
            Node::Compare(op, kind, lhs, rhs) => {
                Ok(Value::Boolean(compare(*op, *kind, &lhs.eval(vars)?, &rhs.eval(vars)?)?))
            }
            Node::Eq { negated, numeric, lhs, rhs } => {
                let (a, b) = (lhs.eval(vars)?, rhs.eval(vars)?);
                let equal = match numeric {
                    Some(kind) => numeric_eq(*kind, &a, &b)?,
                    None => a.identical(&b),
                };
                Ok(Value::Boolean(equal != *negated))
            }
            Node::And(lhs, rhs) => Ok(Value::Boolean(truth(lhs.eval(vars)?)? && truth(rhs.eval(vars)?)?)),
            Node::Or(lhs, rhs) => Ok(Value::Boolean(truth(lhs.eval(vars)?)? || truth(rhs.eval(vars)?)?)),
            Node::Cond(cond, then, other) => {
                if truth(cond.eval(vars)?)? {
                    then.eval(vars)
                } else {
                    other.eval(vars)
                }
            }
            Node::Invoke { op, args } => {
                let values = args.iter().map(|a| a.eval(vars)).collect::<Result<Vec<_>, _>>()?;
                if op.has_receiver() && values.first().is_some_and(Value::is_null) {
                    return Err(Thrown::null_pointer());
                }
                op.invoke(&values).map_err(|e| match e {
                    InvokeError::Thrown(t) => t,
                    InvokeError::IllegalArgument(reason) => Thrown::illegal_argument(reason),
                })
            }
            Node::Builtin { method, receiver, args } => {
                let recv = receiver.eval(vars)?;
                let values = args.iter().map(|a| a.eval(vars)).collect::<Result<Vec<_>, _>>()?;
                builtin(*method, &recv, &values)
            }
        }
    }
}
