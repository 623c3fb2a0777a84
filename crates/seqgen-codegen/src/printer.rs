//! Renders an executed sequence as the body of a Java test method.
//!
//! Each statement becomes one declaration or call. The checks recorded at a
//! statement are emitted right after it, except expected-exception checks,
//! which wrap the statement in a `try`/`catch`.

use seqgen_check::contracts::localize_contract_code;
use seqgen_check::{Check, CheckKind, ExecutableSequence};
use seqgen_core::{OperationKind, Statement, StatementKind, TypeId, TypeRegistry};

use crate::error::CodegenError;
use crate::renamer::VariableRenamer;

const INDENT: &str = "    ";

/// Escapes `s` for use inside a Java string literal.
pub fn java_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Prints executed sequences against one type registry.
pub struct SequencePrinter<'a> {
    types: &'a TypeRegistry,
}

impl<'a> SequencePrinter<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        SequencePrinter { types }
    }

    /// The method body for `eseq`, one source line per entry, unindented.
    pub fn print(&self, eseq: &ExecutableSequence) -> Result<Vec<String>, CodegenError> {
        let seq = eseq.sequence();
        let names = VariableRenamer::rename(self.types, seq);
        let mut lines = Vec::new();

        for (index, stmt) in seq.statements().iter().enumerate() {
            let code = self.statement(seq.statements(), &names, index, stmt)?;
            let checks: Vec<&Check> = eseq.checks_at(index).collect();

            match checks.iter().find(|c| matches!(c.kind, CheckKind::ExpectedException { .. })) {
                Some(expected) => self.expected_exception(&mut lines, &code, expected),
                None => lines.push(code),
            }
            for check in checks {
                self.check(&mut lines, &names, check)?;
            }
        }
        Ok(lines)
    }

    fn type_name(&self, ty: TypeId) -> &str {
        self.types.name_of(ty)
    }

    /// Whether a variable of type `actual` must be cast to be passed where
    /// `declared` is expected.
    fn needs_cast(&self, declared: TypeId, actual: TypeId) -> bool {
        declared != actual && (self.types.is_primitive(declared) || !self.types.is_subtype(actual, declared))
    }

    /// The expression passing input `position` of `stmt`.
    fn input(
        &self,
        statements: &[Statement],
        names: &[Option<String>],
        index: usize,
        stmt: &Statement,
        position: usize,
    ) -> Result<String, CodegenError> {
        let var = stmt.inputs[position];
        let name = names
            .get(var)
            .and_then(|n| n.as_deref())
            .ok_or(CodegenError::UnknownVariable { statement: index, var })?;
        let declared = stmt.kind.input_types()[position];
        let actual = statements[var].kind.output_type();
        if !self.needs_cast(declared, actual) {
            return Ok(name.to_string());
        }
        let cast = format!("({}){name}", self.type_name(declared));
        // A cast receiver needs its own parentheses before the dot.
        if position == 0 && stmt.kind.has_receiver() {
            Ok(format!("({cast})"))
        } else {
            Ok(cast)
        }
    }

    fn statement(
        &self,
        statements: &[Statement],
        names: &[Option<String>],
        index: usize,
        stmt: &Statement,
    ) -> Result<String, CodegenError> {
        let args = (0..stmt.inputs.len())
            .map(|p| self.input(statements, names, index, stmt, p))
            .collect::<Result<Vec<_>, _>>()?;

        let output = stmt.kind.output_type();
        let lhs = match names.get(index).and_then(|n| n.as_deref()) {
            Some(name) => format!("{} {name} = ", self.type_name(output)),
            None => String::new(),
        };

        let rhs = match stmt.kind.as_ref() {
            StatementKind::Literal(lit) => {
                lit.value.to_literal().ok_or(CodegenError::UnrenderableLiteral { statement: index })?
            }
            StatementKind::Constructor(op) => {
                format!("new {}({})", self.type_name(op.declaring_type), args.join(", "))
            }
            StatementKind::Method(op) => {
                let class = self.type_name(op.declaring_type);
                match op.kind {
                    OperationKind::Method | OperationKind::FieldGet => {
                        let (receiver, rest) =
                            args.split_first().ok_or(CodegenError::UnknownVariable { statement: index, var: 0 })?;
                        if op.kind == OperationKind::FieldGet {
                            format!("{receiver}.{}", op.name())
                        } else {
                            format!("{receiver}.{}({})", op.name(), rest.join(", "))
                        }
                    }
                    OperationKind::StaticFieldGet => format!("{class}.{}", op.name()),
                    OperationKind::StaticMethod | OperationKind::Constructor => {
                        format!("{class}.{}({})", op.name(), args.join(", "))
                    }
                }
            }
            StatementKind::ArrayDecl(decl) => {
                if args.is_empty() {
                    format!("new {}[] {{}}", self.type_name(decl.element))
                } else {
                    format!("new {}[] {{ {} }}", self.type_name(decl.element), args.join(", "))
                }
            }
        };
        Ok(format!("{lhs}{rhs};"))
    }

    fn expected_exception(&self, lines: &mut Vec<String>, code: &str, check: &Check) {
        let CheckKind::ExpectedException { thrown, candidates, comment } = &check.kind else {
            return;
        };
        let expected: Vec<String> = if candidates.is_empty() {
            thrown.iter().cloned().collect()
        } else {
            candidates.clone()
        };
        let description = match expected.as_slice() {
            [] => "java.lang.Throwable".to_string(),
            [one] => one.clone(),
            many => many.join(" or "),
        };
        let mut message = format!("Expected exception of type {description}");
        if !comment.is_empty() {
            message.push_str("; ");
            message.push_str(comment);
        }

        lines.push("try {".to_string());
        lines.push(format!("{INDENT}{code}"));
        lines.push(format!("{INDENT}org.junit.Assert.fail({});", java_string(&message)));
        match expected.as_slice() {
            [] | [_] => {
                let caught = expected.first().map(String::as_str).unwrap_or("java.lang.Throwable");
                lines.push(format!("}} catch ({caught} e) {{"));
                lines.push(format!("{INDENT}// Expected exception."));
            }
            many => {
                let test = many.iter().map(|t| format!("e instanceof {t}")).collect::<Vec<_>>().join(" || ");
                lines.push("} catch (java.lang.Throwable e) {".to_string());
                lines.push(format!("{INDENT}if (!({test})) {{"));
                lines.push(format!(
                    "{INDENT}{INDENT}org.junit.Assert.fail({} + e.getClass().getName());",
                    java_string(&format!("Expected exception of type {description}, got "))
                ));
                lines.push(format!("{INDENT}}}"));
            }
        }
        lines.push("}".to_string());
    }

    fn check(&self, lines: &mut Vec<String>, names: &[Option<String>], check: &Check) -> Result<(), CodegenError> {
        let localize = |code: &str, vars: &[usize]| -> Result<String, CodegenError> {
            let var_names = vars
                .iter()
                .map(|&var| match names.get(var) {
                    Some(Some(name)) => Ok(name.clone()),
                    // The result of a void call.
                    Some(None) if var == check.index => Ok("null".to_string()),
                    _ => Err(CodegenError::UnknownVariable { statement: check.index, var }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(localize_contract_code(code, &var_names))
        };

        match &check.kind {
            CheckKind::ExpectedException { .. } => {}
            CheckKind::UnexpectedException { thrown } => {
                lines.push(format!(
                    "// During test generation this statement threw an exception of type {} in error",
                    thrown.type_name
                ));
            }
            CheckKind::Object(oc) => {
                if !check.passed {
                    lines.push(format!("// Checks the contract: {}", oc.contract.name()));
                }
                lines.push(localize(&oc.contract.to_code_string(), &oc.vars)?);
            }
            CheckKind::PostCondition { conditions, vars } => {
                for clause in conditions {
                    lines.push(format!("// Checks the post-condition: {}", clause.comment));
                    lines.push(format!(
                        "org.junit.Assert.assertTrue( {},{});",
                        java_string(&format!("Post-condition: {}", clause.comment)),
                        localize(&clause.code, vars)?
                    ));
                }
            }
            CheckKind::InvalidValue { description } => {
                lines.push(format!("// Invalid call: {description}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_strings_are_escaped() {
        assert_eq!(java_string("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(java_string("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn casts_only_where_needed() {
        let mut types = TypeRegistry::new();
        let money = types.register_class("demo.Money", &[]).unwrap();
        let p = SequencePrinter::new(&types);
        assert!(!p.needs_cast(TypeId::OBJECT, money));
        assert!(!p.needs_cast(TypeId::INT, TypeId::INT));
        assert!(p.needs_cast(TypeId::LONG, TypeId::INT));
        assert!(p.needs_cast(money, TypeId::OBJECT));
        assert!(p.needs_cast(TypeId::INT, TypeId::OBJECT));
    }
}
