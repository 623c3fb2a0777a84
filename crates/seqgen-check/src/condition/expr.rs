//! Compiler for condition expressions.
//!
//! Guard and property text is a Java boolean expression over the positional
//! names `x0..xN`. It is tokenized, parsed by recursive descent and
//! statically typed against the [`TypeRegistry`]; method calls resolve at
//! compile time to registered operations or to the built-in object protocol.
//! Unknown names, methods and ill-typed operands are compile errors.

use std::sync::Arc;

use seqgen_core::{
    EnumConstant, Operation, OperationKind, OperationRegistry, PrimitiveType, TypeId, TypeKind, TypeRegistry, Value,
};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Char(char),
    Punct(&'static str),
    Eof,
}

const PUNCTS: [&str; 20] = [
    "&&", "||", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "!", "(", ")", ",", ".", "?", ":",
];

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    'outer: while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }
        if c.is_ascii_digit() {
            let (token, end) = number(&chars, i)?;
            tokens.push(token);
            i = end;
            continue;
        }
        if c == '"' {
            let (s, end) = quoted(&chars, i)?;
            tokens.push(Token::Str(s));
            i = end;
            continue;
        }
        if c == '\'' {
            let (s, end) = quoted(&chars, i)?;
            let mut it = s.chars();
            match (it.next(), it.next()) {
                (Some(ch), None) => tokens.push(Token::Char(ch)),
                _ => return Err(format!("bad character literal '{s}'")),
            }
            i = end;
            continue;
        }
        for p in PUNCTS {
            let len = p.chars().count();
            if i + len <= chars.len() && chars[i..i + len].iter().copied().eq(p.chars()) {
                tokens.push(Token::Punct(p));
                i += len;
                continue 'outer;
            }
        }
        return Err(format!("unexpected character '{c}'"));
    }
    tokens.push(Token::Eof);
    Ok(tokens)
}

fn number(chars: &[char], start: usize) -> Result<(Token, usize), String> {
    let mut i = start;
    let mut is_float = false;
    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        // `1.equals` is not a number followed by a call; only digits may follow the dot.
        if chars[i] == '.' {
            if is_float || !chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                break;
            }
            is_float = true;
        }
        i += 1;
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        is_float = true;
        i += 1;
        if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
            i += 1;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    let body: String = chars[start..i].iter().collect();
    let bad = || format!("bad numeric literal {body}");
    let suffix = chars.get(i).copied();
    let token = match suffix {
        Some('L') | Some('l') if !is_float => {
            i += 1;
            Token::Long(body.parse().map_err(|_| bad())?)
        }
        Some('f') | Some('F') => {
            i += 1;
            Token::Float(body.parse().map_err(|_| bad())?)
        }
        Some('d') | Some('D') => {
            i += 1;
            Token::Double(body.parse().map_err(|_| bad())?)
        }
        _ if is_float => Token::Double(body.parse().map_err(|_| bad())?),
        _ => {
            let v: i64 = body.parse().map_err(|_| bad())?;
            // 2147483648 is only legal as the operand of unary minus.
            if v > i32::MAX as i64 + 1 {
                return Err(format!("integer literal {body} out of range"));
            }
            Token::Int(v)
        }
    };
    if chars.get(i).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
        return Err(bad());
    }
    Ok((token, i))
}

/// Reads a quoted literal with Java escapes; returns its contents and the
/// index past the closing quote.
fn quoted(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let esc = chars.get(i + 1).copied().ok_or("unterminated escape")?;
                out.push(match esc {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    '0' => '\0',
                    'u' => {
                        let hex: String = chars.get(i + 2..i + 6).ok_or("short unicode escape")?.iter().collect();
                        let code = u32::from_str_radix(&hex, 16).map_err(|_| format!("bad unicode escape {hex}"))?;
                        i += 4;
                        char::from_u32(code).ok_or("bad unicode escape")?
                    }
                    other => other,
                });
                i += 2;
            }
            c if c == quote => return Ok((out, i + 1)),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err("unterminated literal".to_string())
}

// ---------------------------------------------------------------------------
// Typed syntax tree
// ---------------------------------------------------------------------------

/// Primitive arithmetic domain after binary numeric promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumKind {
    Int,
    Long,
    Float,
    Double,
}

impl NumKind {
    fn type_id(self) -> TypeId {
        match self {
            NumKind::Int => TypeId::INT,
            NumKind::Long => TypeId::LONG,
            NumKind::Float => TypeId::FLOAT,
            NumKind::Double => TypeId::DOUBLE,
        }
    }

    fn of(p: PrimitiveType) -> Option<NumKind> {
        match p {
            PrimitiveType::Boolean => None,
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char | PrimitiveType::Int => Some(NumKind::Int),
            PrimitiveType::Long => Some(NumKind::Long),
            PrimitiveType::Float => Some(NumKind::Float),
            PrimitiveType::Double => Some(NumKind::Double),
        }
    }

    fn promote(a: NumKind, b: NumKind) -> NumKind {
        use NumKind::*;
        match (a, b) {
            (Double, _) | (_, Double) => Double,
            (Float, _) | (_, Float) => Float,
            (Long, _) | (_, Long) => Long,
            _ => Int,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

/// Methods every value understands without registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Equals,
    HashCode,
    ToString,
    CompareTo,
    StringLength,
    IsEmpty,
    Size,
    ArrayLength,
    EnumName,
    EnumOrdinal,
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Const(Value),
    Var(usize),
    Not(Box<Node>),
    Neg(NumKind, Box<Node>),
    Arith(ArithOp, NumKind, Box<Node>, Box<Node>),
    Concat(Box<Node>, Box<Node>),
    Compare(CmpOp, NumKind, Box<Node>, Box<Node>),
    /// `==` / `!=`; numeric operands compare by value, others by identity.
    Eq { negated: bool, numeric: Option<NumKind>, lhs: Box<Node>, rhs: Box<Node> },
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Cond(Box<Node>, Box<Node>, Box<Node>),
    /// Registered operation; receiver first.
    Invoke { op: Arc<Operation>, args: Vec<Node> },
    Builtin { method: Builtin, receiver: Box<Node>, args: Vec<Node> },
}

/// Static type of an expression; `null` is assignable to any reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ty {
    Null,
    Of(TypeId),
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

pub(crate) struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    types: &'a TypeRegistry,
    ops: &'a OperationRegistry,
    vars: &'a [TypeId],
}

type Typed = (Node, Ty);

impl<'a> Parser<'a> {
    /// Compiles `text` to a boolean-valued tree over `vars.len()` variables.
    pub(crate) fn compile(
        text: &str,
        types: &'a TypeRegistry,
        ops: &'a OperationRegistry,
        vars: &'a [TypeId],
    ) -> Result<Node, String> {
        let mut parser = Parser { tokens: tokenize(text)?, pos: 0, types, ops, vars };
        let (node, ty) = parser.conditional()?;
        if parser.peek() != &Token::Eof {
            return Err(format!("unexpected {} after expression", parser.describe_next()));
        }
        if ty != Ty::Of(TypeId::BOOLEAN) {
            return Err(format!("condition has type {}, expected boolean", parser.type_name(ty)));
        }
        Ok(node)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, p: &str) -> bool {
        if matches!(self.peek(), Token::Punct(q) if *q == p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, p: &str) -> Result<(), String> {
        if self.eat(p) {
            Ok(())
        } else {
            Err(format!("expected '{p}', found {}", self.describe_next()))
        }
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Token::Ident(s) => format!("'{s}'"),
            Token::Punct(p) => format!("'{p}'"),
            Token::Eof => "end of input".to_string(),
            other => format!("{other:?}"),
        }
    }

    fn type_name(&self, ty: Ty) -> String {
        match ty {
            Ty::Null => "null".to_string(),
            Ty::Of(id) => self.types.name_of(id).to_string(),
        }
    }

    fn num_kind(&self, ty: Ty) -> Option<NumKind> {
        match ty {
            Ty::Of(id) => self.types.primitive(id).and_then(NumKind::of),
            Ty::Null => None,
        }
    }

    fn is_boolean(ty: Ty) -> bool {
        ty == Ty::Of(TypeId::BOOLEAN)
    }

    fn is_reference(&self, ty: Ty) -> bool {
        match ty {
            Ty::Null => true,
            Ty::Of(id) => self.types.get(id).is_some_and(|t| t.is_reference()),
        }
    }

    fn conditional(&mut self) -> Result<Typed, String> {
        let cond = self.or()?;
        if !self.eat("?") {
            return Ok(cond);
        }
        if !Self::is_boolean(cond.1) {
            return Err("condition of '?:' must be boolean".to_string());
        }
        let then = self.conditional()?;
        self.expect(":")?;
        let other = self.conditional()?;
        let ty = match (then.1, other.1) {
            (a, b) if a == b => a,
            (Ty::Null, b) if self.is_reference(b) => b,
            (a, Ty::Null) if self.is_reference(a) => a,
            (a, b) => match (self.num_kind(a), self.num_kind(b)) {
                (Some(x), Some(y)) => Ty::Of(NumKind::promote(x, y).type_id()),
                _ => Ty::Of(TypeId::OBJECT),
            },
        };
        Ok((Node::Cond(Box::new(cond.0), Box::new(then.0), Box::new(other.0)), ty))
    }

    fn or(&mut self) -> Result<Typed, String> {
        let mut lhs = self.and()?;
        while self.eat("||") {
            let rhs = self.and()?;
            self.require_boolean("||", &lhs, &rhs)?;
            lhs = (Node::Or(Box::new(lhs.0), Box::new(rhs.0)), Ty::Of(TypeId::BOOLEAN));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Typed, String> {
        let mut lhs = self.equality()?;
        while self.eat("&&") {
            let rhs = self.equality()?;
            self.require_boolean("&&", &lhs, &rhs)?;
            lhs = (Node::And(Box::new(lhs.0), Box::new(rhs.0)), Ty::Of(TypeId::BOOLEAN));
        }
        Ok(lhs)
    }

    fn require_boolean(&self, op: &str, lhs: &Typed, rhs: &Typed) -> Result<(), String> {
        if Self::is_boolean(lhs.1) && Self::is_boolean(rhs.1) {
            Ok(())
        } else {
            Err(format!(
                "bad operand types for '{op}': {} and {}",
                self.type_name(lhs.1),
                self.type_name(rhs.1)
            ))
        }
    }

    fn equality(&mut self) -> Result<Typed, String> {
        let mut lhs = self.relational()?;
        loop {
            let negated = if self.eat("==") {
                false
            } else if self.eat("!=") {
                true
            } else {
                return Ok(lhs);
            };
            let rhs = self.relational()?;
            let numeric = match (self.num_kind(lhs.1), self.num_kind(rhs.1)) {
                (Some(a), Some(b)) => Some(NumKind::promote(a, b)),
                _ => {
                    let both_bool = Self::is_boolean(lhs.1) && Self::is_boolean(rhs.1);
                    let both_ref = self.is_reference(lhs.1) && self.is_reference(rhs.1);
                    if !both_bool && !both_ref {
                        return Err(format!(
                            "incomparable types: {} and {}",
                            self.type_name(lhs.1),
                            self.type_name(rhs.1)
                        ));
                    }
                    None
                }
            };
            lhs = (
                Node::Eq { negated, numeric, lhs: Box::new(lhs.0), rhs: Box::new(rhs.0) },
                Ty::Of(TypeId::BOOLEAN),
            );
        }
    }

    fn relational(&mut self) -> Result<Typed, String> {
        let mut lhs = self.additive()?;
        loop {
            let op = if self.eat("<") {
                CmpOp::Lt
            } else if self.eat("<=") {
                CmpOp::Le
            } else if self.eat(">") {
                CmpOp::Gt
            } else if self.eat(">=") {
                CmpOp::Ge
            } else {
                return Ok(lhs);
            };
            let rhs = self.additive()?;
            let kind = self.numeric_operands(&lhs, &rhs)?;
            lhs = (Node::Compare(op, kind, Box::new(lhs.0), Box::new(rhs.0)), Ty::Of(TypeId::BOOLEAN));
        }
    }

    fn numeric_operands(&self, lhs: &Typed, rhs: &Typed) -> Result<NumKind, String> {
        match (self.num_kind(lhs.1), self.num_kind(rhs.1)) {
            (Some(a), Some(b)) => Ok(NumKind::promote(a, b)),
            _ => Err(format!(
                "bad operand types: {} and {} are not both numeric",
                self.type_name(lhs.1),
                self.type_name(rhs.1)
            )),
        }
    }

    fn additive(&mut self) -> Result<Typed, String> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = if self.eat("+") {
                ArithOp::Add
            } else if self.eat("-") {
                ArithOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.multiplicative()?;
            let is_string = |t: Ty| t == Ty::Of(TypeId::STRING);
            if op == ArithOp::Add && (is_string(lhs.1) || is_string(rhs.1)) {
                lhs = (Node::Concat(Box::new(lhs.0), Box::new(rhs.0)), Ty::Of(TypeId::STRING));
                continue;
            }
            let kind = self.numeric_operands(&lhs, &rhs)?;
            lhs = (Node::Arith(op, kind, Box::new(lhs.0), Box::new(rhs.0)), Ty::Of(kind.type_id()));
        }
    }

    fn multiplicative(&mut self) -> Result<Typed, String> {
        let mut lhs = self.unary()?;
        loop {
            let op = if self.eat("*") {
                ArithOp::Mul
            } else if self.eat("/") {
                ArithOp::Div
            } else if self.eat("%") {
                ArithOp::Rem
            } else {
                return Ok(lhs);
            };
            let rhs = self.unary()?;
            let kind = self.numeric_operands(&lhs, &rhs)?;
            lhs = (Node::Arith(op, kind, Box::new(lhs.0), Box::new(rhs.0)), Ty::Of(kind.type_id()));
        }
    }

    fn unary(&mut self) -> Result<Typed, String> {
        if self.eat("!") {
            let (node, ty) = self.unary()?;
            if !Self::is_boolean(ty) {
                return Err(format!("bad operand type for '!': {}", self.type_name(ty)));
            }
            return Ok((Node::Not(Box::new(node)), ty));
        }
        if self.eat("-") {
            // Fold negative literals so that -2147483648 stays an int.
            match self.peek().clone() {
                Token::Int(v) => {
                    self.pos += 1;
                    return self.postfix((Node::Const(Value::Int((-v) as i32)), Ty::Of(TypeId::INT)));
                }
                Token::Long(v) => {
                    self.pos += 1;
                    return self.postfix((Node::Const(Value::Long(v.wrapping_neg())), Ty::Of(TypeId::LONG)));
                }
                _ => {}
            }
            let (node, ty) = self.unary()?;
            let kind = self
                .num_kind(ty)
                .ok_or_else(|| format!("bad operand type for '-': {}", self.type_name(ty)))?;
            return Ok((Node::Neg(kind, Box::new(node)), Ty::Of(kind.type_id())));
        }
        let primary = self.primary()?;
        self.postfix(primary)
    }

    fn primary(&mut self) -> Result<Typed, String> {
        match self.advance() {
            Token::Int(v) => {
                let v = i32::try_from(v).map_err(|_| format!("integer literal {v} out of range"))?;
                Ok((Node::Const(Value::Int(v)), Ty::Of(TypeId::INT)))
            }
            Token::Long(v) => Ok((Node::Const(Value::Long(v)), Ty::Of(TypeId::LONG))),
            Token::Float(v) => Ok((Node::Const(Value::Float(v)), Ty::Of(TypeId::FLOAT))),
            Token::Double(v) => Ok((Node::Const(Value::Double(v)), Ty::Of(TypeId::DOUBLE))),
            Token::Str(s) => Ok((Node::Const(Value::string(s)), Ty::Of(TypeId::STRING))),
            Token::Char(c) => Ok((Node::Const(Value::Char(c)), Ty::Of(TypeId::CHAR))),
            Token::Punct("(") => {
                let inner = self.conditional()?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Ident(name) => self.name(name),
            Token::Eof => Err("unexpected end of input".to_string()),
            Token::Punct(p) => Err(format!("unexpected '{p}'")),
        }
    }

    fn name(&mut self, first: String) -> Result<Typed, String> {
        match first.as_str() {
            "true" => return Ok((Node::Const(Value::Boolean(true)), Ty::Of(TypeId::BOOLEAN))),
            "false" => return Ok((Node::Const(Value::Boolean(false)), Ty::Of(TypeId::BOOLEAN))),
            "null" => return Ok((Node::Const(Value::Null), Ty::Null)),
            _ => {}
        }
        if let Some(idx) = first.strip_prefix('x').and_then(|n| n.parse::<usize>().ok()) {
            if let Some(&ty) = self.vars.get(idx) {
                return Ok((Node::Var(idx), Ty::Of(ty)));
            }
        }

        // A dotted path starting with a type name: `pkg.Type.CONST`, `Type.method(...)`.
        let mut segments = vec![first];
        while matches!(self.peek(), Token::Punct(".")) {
            let Token::Ident(next) = self.peek_at(1).clone() else {
                break;
            };
            segments.push(next);
            self.pos += 2;
        }
        let call_follows = matches!(self.peek(), Token::Punct("("));

        for split in (1..segments.len()).rev() {
            let Some(class) = self.types.resolve(&segments[..split].join(".")) else {
                continue;
            };
            let rest = &segments[split..];
            let last_is_call = call_follows && rest.len() == 1;
            let mut current = self.static_member(class, &rest[0], last_is_call)?;
            for (k, member) in rest.iter().enumerate().skip(1) {
                let args = if call_follows && k == rest.len() - 1 { Some(self.arguments()?) } else { None };
                current = self.member(current, member, args)?;
            }
            return Ok(current);
        }
        Err(format!("cannot resolve symbol '{}'", segments.join(".")))
    }

    fn static_member(&mut self, class: TypeId, name: &str, is_call: bool) -> Result<Typed, String> {
        let class_name = self.types.name_of(class).to_string();
        if is_call {
            let args = self.arguments()?;
            let op = self
                .ops
                .find_static_member(class, name, args.len())
                .filter(|op| op.kind == OperationKind::StaticMethod)
                .cloned()
                .ok_or_else(|| format!("no static method {class_name}.{name} taking {} arguments", args.len()))?;
            self.check_arguments(&op, &op.input_types, &args)?;
            let ty = op.output_type;
            let args = args.into_iter().map(|(n, _)| n).collect();
            return Ok((Node::Invoke { op, args }, Ty::Of(ty)));
        }
        if let Some(constants) = self.types.enum_constants(class) {
            if let Some(ordinal) = constants.iter().position(|c| c == name) {
                let constant = EnumConstant { type_name: class_name.as_str().into(), name: name.into(), ordinal: ordinal as u32 };
                return Ok((Node::Const(Value::Enum(constant)), Ty::Of(class)));
            }
        }
        let op = self
            .ops
            .find_static_member(class, name, 0)
            .filter(|op| op.kind == OperationKind::StaticFieldGet)
            .cloned()
            .ok_or_else(|| format!("cannot resolve symbol {class_name}.{name}"))?;
        let ty = op.output_type;
        Ok((Node::Invoke { op, args: Vec::new() }, Ty::Of(ty)))
    }

    fn arguments(&mut self) -> Result<Vec<Typed>, String> {
        self.expect("(")?;
        let mut args = Vec::new();
        if self.eat(")") {
            return Ok(args);
        }
        loop {
            args.push(self.conditional()?);
            if self.eat(")") {
                return Ok(args);
            }
            self.expect(",")?;
        }
    }

    fn postfix(&mut self, mut current: Typed) -> Result<Typed, String> {
        while matches!(self.peek(), Token::Punct(".")) {
            let Token::Ident(name) = self.peek_at(1).clone() else {
                return Err(format!("expected member name after '.', found {:?}", self.peek_at(1)));
            };
            self.pos += 2;
            let args = if matches!(self.peek(), Token::Punct("(")) { Some(self.arguments()?) } else { None };
            current = self.member(current, &name, args)?;
        }
        Ok(current)
    }

    fn check_arguments(&self, op: &Operation, params: &[TypeId], args: &[Typed]) -> Result<(), String> {
        for (i, (param, (_, ty))) in params.iter().zip(args).enumerate() {
            let ok = match ty {
                Ty::Null => !self.types.is_primitive(*param),
                Ty::Of(t) => self.types.is_assignable(*param, *t),
            };
            if !ok {
                return Err(format!(
                    "argument {i} of {}: {} is not assignable to {}",
                    op.descriptor(),
                    self.type_name(*ty),
                    self.types.name_of(*param)
                ));
            }
        }
        Ok(())
    }

    /// `recv.name` (field or array length) or `recv.name(args)`.
    fn member(&mut self, recv: Typed, name: &str, args: Option<Vec<Typed>>) -> Result<Typed, String> {
        let (recv_node, recv_ty) = recv;
        let Ty::Of(recv_id) = recv_ty else {
            return Err(format!("cannot dereference null to access '{name}'"));
        };
        if self.types.is_primitive(recv_id) {
            return Err(format!("cannot access '{name}' on primitive type {}", self.types.name_of(recv_id)));
        }
        let recv_name = self.types.name_of(recv_id).to_string();

        let Some(args) = args else {
            if name == "length" {
                if let Some(TypeKind::Array { .. }) = self.types.get(recv_id).map(|t| &t.kind) {
                    return Ok(self.builtin(Builtin::ArrayLength, recv_node, Vec::new(), TypeId::INT));
                }
            }
            let op = self
                .ops
                .find_instance_member(self.types, recv_id, name, 0)
                .filter(|op| op.kind == OperationKind::FieldGet)
                .cloned()
                .ok_or_else(|| format!("no field {name} in {recv_name}"))?;
            let ty = op.output_type;
            return Ok((Node::Invoke { op, args: vec![recv_node] }, Ty::Of(ty)));
        };

        if let Some(op) = self
            .ops
            .find_instance_member(self.types, recv_id, name, args.len())
            .filter(|op| op.kind == OperationKind::Method)
            .cloned()
        {
            self.check_arguments(&op, &op.input_types[1..], &args)?;
            let ty = op.output_type;
            let mut nodes = vec![recv_node];
            nodes.extend(args.into_iter().map(|(n, _)| n));
            return Ok((Node::Invoke { op, args: nodes }, Ty::Of(ty)));
        }

        let kind = self.types.get(recv_id).map(|t| t.kind.clone());
        let is_enum = matches!(kind, Some(TypeKind::Enum { .. }));
        let is_collection = self.types.is_assignable(TypeId::COLLECTION, recv_id);
        let (method, ty) = match (name, args.len()) {
            ("equals", 1) => (Builtin::Equals, TypeId::BOOLEAN),
            ("hashCode", 0) => (Builtin::HashCode, TypeId::INT),
            ("toString", 0) => (Builtin::ToString, TypeId::STRING),
            ("compareTo", 1) if self.types.is_assignable(TypeId::COMPARABLE, recv_id) => {
                (Builtin::CompareTo, TypeId::INT)
            }
            ("length", 0) if recv_id == TypeId::STRING => (Builtin::StringLength, TypeId::INT),
            ("isEmpty", 0) if recv_id == TypeId::STRING || is_collection => (Builtin::IsEmpty, TypeId::BOOLEAN),
            ("size", 0) if is_collection => (Builtin::Size, TypeId::INT),
            ("name", 0) if is_enum => (Builtin::EnumName, TypeId::STRING),
            ("ordinal", 0) if is_enum => (Builtin::EnumOrdinal, TypeId::INT),
            _ => {
                return Err(format!("no method {name} taking {} arguments in {recv_name}", args.len()));
            }
        };
        let args = args.into_iter().map(|(n, _)| n).collect();
        Ok(self.builtin(method, recv_node, args, ty))
    }

    fn builtin(&self, method: Builtin, receiver: Node, args: Vec<Node>, ty: TypeId) -> Typed {
        (Node::Builtin { method, receiver: Box::new(receiver), args }, Ty::Of(ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_literals_and_operators() {
        let toks = tokenize("x0.f(1, 2L, 1.5, 2f, \"a\\\"b\", 'c') >= -3 && !x1").unwrap();
        assert!(toks.contains(&Token::Long(2)));
        assert!(toks.contains(&Token::Double(1.5)));
        assert!(toks.contains(&Token::Float(2.0)));
        assert!(toks.contains(&Token::Str("a\"b".into())));
        assert!(toks.contains(&Token::Char('c')));
        assert!(toks.contains(&Token::Punct(">=")));
        assert!(toks.contains(&Token::Punct("&&")));
        assert_eq!(toks.last(), Some(&Token::Eof));
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(tokenize("x0 # 1").is_err());
        assert!(tokenize("\"open").is_err());
        assert!(tokenize("12abc").is_err());
    }

    #[test]
    fn type_errors_are_compile_errors() {
        let types = TypeRegistry::new();
        let ops = OperationRegistry::new();
        let vars = [TypeId::INT, TypeId::STRING];
        assert!(Parser::compile("x0 > 0", &types, &ops, &vars).is_ok());
        assert!(Parser::compile("x0 + 1", &types, &ops, &vars).unwrap_err().contains("expected boolean"));
        assert!(Parser::compile("x1 > 0", &types, &ops, &vars).is_err());
        assert!(Parser::compile("x0 && true", &types, &ops, &vars).is_err());
        assert!(Parser::compile("x2 == 0", &types, &ops, &vars).unwrap_err().contains("cannot resolve"));
        assert!(Parser::compile("x1.frobnicate()", &types, &ops, &vars).is_err());
        assert!(Parser::compile("x1.length() == 3", &types, &ops, &vars).is_ok());
        assert!(Parser::compile("x0.hashCode() == 0", &types, &ops, &vars).is_err());
        assert!(Parser::compile("(x0 > 1", &types, &ops, &vars).is_err());
    }
}
