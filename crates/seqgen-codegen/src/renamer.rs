//! Display names for the variables of a sequence.
//!
//! A name is a base derived from the variable's declared type plus a
//! counter kept per base: `int` variables become `i0, i1, ...`, `String`
//! variables `str0, ...` and a class `demo.Money` gives `money0, ...`.
//! Names carry no positional meaning.

use std::collections::HashMap;

use seqgen_core::{PrimitiveType, Sequence, TypeId, TypeKind, TypeRegistry};

/// Whether `s` is a valid Java identifier base.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The name base for values of type `ty`.
pub fn base_name(types: &TypeRegistry, ty: TypeId) -> String {
    if ty == TypeId::STRING {
        return "str".to_string();
    }
    if ty == TypeId::OBJECT {
        return "obj".to_string();
    }
    let Some(def) = types.get(ty) else {
        return "obj".to_string();
    };
    match &def.kind {
        TypeKind::Primitive(p) => match p {
            PrimitiveType::Int => "i",
            PrimitiveType::Long => "l",
            PrimitiveType::Char => "c",
            PrimitiveType::Boolean => "b",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "s",
            PrimitiveType::Float => "f",
            PrimitiveType::Double => "d",
        }
        .to_string(),
        TypeKind::Array { element } => format!("{}_array", base_name(types, *element)),
        _ => {
            let simple = def.simple_name();
            let mut chars = simple.chars();
            let base = match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
                None => "obj".to_string(),
            };
            if is_identifier(&base) {
                base
            } else {
                "obj".to_string()
            }
        }
    }
}

/// Assigns names to the variables of one sequence.
#[derive(Debug, Default)]
pub struct VariableRenamer {
    counters: HashMap<String, usize>,
}

impl VariableRenamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next name for a value of type `ty`.
    pub fn fresh(&mut self, types: &TypeRegistry, ty: TypeId) -> String {
        let base = base_name(types, ty);
        let counter = self.counters.entry(base.clone()).or_insert(0);
        let name = format!("{base}{counter}");
        *counter += 1;
        name
    }

    /// One name per statement of `seq`; `None` for statements producing
    /// `void`, which consume no counter.
    pub fn rename(types: &TypeRegistry, seq: &Sequence) -> Vec<Option<String>> {
        let mut renamer = VariableRenamer::new();
        seq.statements()
            .iter()
            .map(|stmt| {
                let ty = stmt.kind.output_type();
                (ty != TypeId::VOID).then(|| renamer.fresh(types, ty))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bases_follow_types() {
        let mut types = TypeRegistry::new();
        let money = types.register_class("demo.Money", &[]).unwrap();
        let range = types.register_enum("demo.ClassWithConditions.Range", &["ONE"]).unwrap();
        let ints = types.array_of(TypeId::INT).unwrap();
        let strings = types.array_of(TypeId::STRING).unwrap();
        assert_eq!(base_name(&types, TypeId::INT), "i");
        assert_eq!(base_name(&types, TypeId::BYTE), "byte");
        assert_eq!(base_name(&types, TypeId::STRING), "str");
        assert_eq!(base_name(&types, TypeId::OBJECT), "obj");
        assert_eq!(base_name(&types, money), "money");
        assert_eq!(base_name(&types, range), "range");
        assert_eq!(base_name(&types, ints), "i_array");
        assert_eq!(base_name(&types, strings), "str_array");
    }

    #[test]
    fn identifier_bases() {
        assert!(is_identifier("money"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a$b"));
        assert!(!is_identifier("\u{e9}t\u{e9}"));
    }

    #[test]
    fn counters_are_per_base() {
        let types = TypeRegistry::new();
        let mut r = VariableRenamer::new();
        assert_eq!(r.fresh(&types, TypeId::INT), "i0");
        assert_eq!(r.fresh(&types, TypeId::STRING), "str0");
        assert_eq!(r.fresh(&types, TypeId::INT), "i1");
        assert_eq!(r.fresh(&types, TypeId::LONG), "l0");
    }
}
