//! The type model of the code under test.
//!
//! Types follow the Java object model: eight primitives, `void`, reference
//! types (classes, interfaces, enums) and arrays. Every reference type other
//! than `java.lang.Object` has at least one supertype edge in the
//! [`TypeRegistry`](crate::type_id::TypeRegistry) hierarchy graph.

use serde::{Deserialize, Serialize};

use crate::type_id::TypeId;

/// The eight primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Char,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    /// The source-level keyword for this primitive.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Char => "char",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        PrimitiveType::ALL.into_iter().find(|p| p.name() == name)
    }

    /// The pre-registered [`TypeId`] of this primitive.
    pub fn type_id(self) -> TypeId {
        match self {
            PrimitiveType::Boolean => TypeId::BOOLEAN,
            PrimitiveType::Char => TypeId::CHAR,
            PrimitiveType::Byte => TypeId::BYTE,
            PrimitiveType::Short => TypeId::SHORT,
            PrimitiveType::Int => TypeId::INT,
            PrimitiveType::Long => TypeId::LONG,
            PrimitiveType::Float => TypeId::FLOAT,
            PrimitiveType::Double => TypeId::DOUBLE,
        }
    }

    /// Whether a value of this type can be assigned to `target` without a cast.
    ///
    /// Identity plus the widening primitive conversions:
    /// byte → short → int → long → float → double, and char → int.
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short => matches!(target, Int | Long | Float | Double),
            Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean => false,
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveType::Boolean)
    }
}

/// What kind of type a registered name denotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Primitive(PrimitiveType),
    Void,
    /// A concrete or abstract class (including `java.lang.Object`,
    /// `java.lang.String` and the throwables).
    Class,
    Interface,
    /// An enum with its constants in declaration (ordinal) order.
    Enum { constants: Vec<String> },
    Array { element: TypeId },
}

/// A registered type: its fully-qualified name and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDef {
    /// The name without its package, keeping enclosing classes:
    /// `demo.ClassWithConditions.Range` → `Range`.
    pub fn simple_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(pos) => &self.name[pos + 1..],
            None => &self.name,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self.kind, TypeKind::Primitive(_) | TypeKind::Void)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_follows_java_rules() {
        assert!(PrimitiveType::Byte.widens_to(PrimitiveType::Int));
        assert!(PrimitiveType::Char.widens_to(PrimitiveType::Long));
        assert!(PrimitiveType::Int.widens_to(PrimitiveType::Double));
        assert!(!PrimitiveType::Int.widens_to(PrimitiveType::Short));
        assert!(!PrimitiveType::Short.widens_to(PrimitiveType::Char));
        assert!(!PrimitiveType::Boolean.widens_to(PrimitiveType::Int));
        assert!(PrimitiveType::Boolean.widens_to(PrimitiveType::Boolean));
    }

    #[test]
    fn primitive_names_round_trip() {
        for p in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(p.name()), Some(p));
        }
        assert_eq!(PrimitiveType::from_name("String"), None);
    }

    #[test]
    fn simple_name_keeps_last_segment() {
        let def = TypeDef {
            name: "demo.ClassWithConditions.Range".into(),
            kind: TypeKind::Enum { constants: vec![] },
        };
        assert_eq!(def.simple_name(), "Range");
        let def = TypeDef { name: "int".into(), kind: TypeKind::Primitive(PrimitiveType::Int) };
        assert_eq!(def.simple_name(), "int");
    }
}
