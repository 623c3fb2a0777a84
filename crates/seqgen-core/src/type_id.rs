//! TypeId and TypeRegistry for the classes under test.
//!
//! Every type has a unique [`TypeId`] providing O(1) identity comparison.
//! The [`TypeRegistry`] owns the type definitions and the subtype graph,
//! pre-registering the Java built-ins every generated test relies on.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{PrimitiveType, TypeDef, TypeKind};

/// Unique identifier for a type in the type registry.
///
/// The inner value is an index into the [`TypeRegistry`]'s type vector and
/// doubles as the node index in its hierarchy graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Pre-registered TypeId constants for built-in types.
impl TypeId {
    pub const OBJECT: TypeId = TypeId(0);
    pub const BOOLEAN: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const BYTE: TypeId = TypeId(3);
    pub const SHORT: TypeId = TypeId(4);
    pub const INT: TypeId = TypeId(5);
    pub const LONG: TypeId = TypeId(6);
    pub const FLOAT: TypeId = TypeId(7);
    pub const DOUBLE: TypeId = TypeId(8);
    pub const STRING: TypeId = TypeId(9);
    pub const VOID: TypeId = TypeId(10);
    pub const COMPARABLE: TypeId = TypeId(11);
    pub const COLLECTION: TypeId = TypeId(12);
    pub const THROWABLE: TypeId = TypeId(13);
    pub const EXCEPTION: TypeId = TypeId(14);
    pub const RUNTIME_EXCEPTION: TypeId = TypeId(15);
    pub const ERROR: TypeId = TypeId(16);
    pub const ILLEGAL_ARGUMENT: TypeId = TypeId(17);
    pub const ILLEGAL_STATE: TypeId = TypeId(18);
    pub const NULL_POINTER: TypeId = TypeId(19);
    pub const INDEX_OUT_OF_BOUNDS: TypeId = TypeId(20);
    pub const ARITHMETIC: TypeId = TypeId(21);
    pub const UNSUPPORTED_OPERATION: TypeId = TypeId(22);
    pub const CLASS_CAST: TypeId = TypeId(23);
    pub const ASSERTION_ERROR: TypeId = TypeId(24);

    fn node(self) -> NodeIndex<u32> {
        NodeIndex::new(self.0 as usize)
    }
}

/// Registry of all types known to a generation session.
///
/// Subtyping is stored as a directed graph with an edge from each type to
/// each of its direct supertypes; `is_subtype` is reachability.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// Types indexed by TypeId.0
    types: Vec<TypeDef>,
    names: HashMap<String, TypeId>,
    hierarchy: DiGraph<TypeId, ()>,
    /// Element type -> array type.
    arrays: HashMap<TypeId, TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    const BUILTIN_COUNT: u32 = 25;

    /// Creates a registry with `java.lang.Object`, the primitives, `String`,
    /// `void`, `Comparable`, `Collection` and the common throwables.
    pub fn new() -> Self {
        let mut reg = TypeRegistry {
            types: Vec::new(),
            names: HashMap::new(),
            hierarchy: DiGraph::new(),
            arrays: HashMap::new(),
        };

        let class = |name: &str| TypeDef { name: name.to_string(), kind: TypeKind::Class };
        reg.push(class("java.lang.Object"));
        for p in PrimitiveType::ALL {
            reg.push(TypeDef { name: p.name().to_string(), kind: TypeKind::Primitive(p) });
        }
        reg.push(class("java.lang.String"));
        reg.push(TypeDef { name: "void".into(), kind: TypeKind::Void });
        reg.push(TypeDef { name: "java.lang.Comparable".into(), kind: TypeKind::Interface });
        reg.push(TypeDef { name: "java.util.Collection".into(), kind: TypeKind::Interface });

        let throwables: [(&str, TypeId); 12] = [
            ("java.lang.Throwable", TypeId::OBJECT),
            ("java.lang.Exception", TypeId::THROWABLE),
            ("java.lang.RuntimeException", TypeId::EXCEPTION),
            ("java.lang.Error", TypeId::THROWABLE),
            ("java.lang.IllegalArgumentException", TypeId::RUNTIME_EXCEPTION),
            ("java.lang.IllegalStateException", TypeId::RUNTIME_EXCEPTION),
            ("java.lang.NullPointerException", TypeId::RUNTIME_EXCEPTION),
            ("java.lang.IndexOutOfBoundsException", TypeId::RUNTIME_EXCEPTION),
            ("java.lang.ArithmeticException", TypeId::RUNTIME_EXCEPTION),
            ("java.lang.UnsupportedOperationException", TypeId::RUNTIME_EXCEPTION),
            ("java.lang.ClassCastException", TypeId::RUNTIME_EXCEPTION),
            ("java.lang.AssertionError", TypeId::ERROR),
        ];
        for (name, parent) in throwables {
            let id = reg.push(class(name));
            reg.add_supertype(id, parent);
        }

        reg.add_supertype(TypeId::STRING, TypeId::OBJECT);
        reg.add_supertype(TypeId::STRING, TypeId::COMPARABLE);
        reg.add_supertype(TypeId::COMPARABLE, TypeId::OBJECT);
        reg.add_supertype(TypeId::COLLECTION, TypeId::OBJECT);

        debug_assert_eq!(reg.types.len() as u32, Self::BUILTIN_COUNT);
        reg
    }

    fn push(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.names.insert(def.name.clone(), id);
        self.types.push(def);
        let node = self.hierarchy.add_node(id);
        debug_assert_eq!(node.index(), id.0 as usize);
        id
    }

    fn add_supertype(&mut self, sub: TypeId, sup: TypeId) {
        self.hierarchy.update_edge(sub.node(), sup.node(), ());
    }

    fn register_named(&mut self, def: TypeDef, supertypes: &[TypeId]) -> Result<TypeId, CoreError> {
        if self.names.contains_key(&def.name) {
            return Err(CoreError::DuplicateTypeName { name: def.name });
        }
        for sup in supertypes {
            self.check_id(*sup)?;
        }
        let id = self.push(def);
        if supertypes.is_empty() {
            self.add_supertype(id, TypeId::OBJECT);
        }
        for sup in supertypes {
            self.add_supertype(id, *sup);
        }
        Ok(id)
    }

    fn check_id(&self, id: TypeId) -> Result<(), CoreError> {
        if (id.0 as usize) < self.types.len() {
            Ok(())
        } else {
            Err(CoreError::UnknownTypeId { id })
        }
    }

    /// Registers a class. With no supertypes the class extends `java.lang.Object`.
    pub fn register_class(&mut self, name: &str, supertypes: &[TypeId]) -> Result<TypeId, CoreError> {
        self.register_named(TypeDef { name: name.to_string(), kind: TypeKind::Class }, supertypes)
    }

    pub fn register_interface(&mut self, name: &str, supertypes: &[TypeId]) -> Result<TypeId, CoreError> {
        self.register_named(TypeDef { name: name.to_string(), kind: TypeKind::Interface }, supertypes)
    }

    /// Registers an enum; enums are `Comparable` by ordinal.
    pub fn register_enum(&mut self, name: &str, constants: &[&str]) -> Result<TypeId, CoreError> {
        let def = TypeDef {
            name: name.to_string(),
            kind: TypeKind::Enum { constants: constants.iter().map(|c| c.to_string()).collect() },
        };
        self.register_named(def, &[TypeId::OBJECT, TypeId::COMPARABLE])
    }

    /// Registers a throwable class below `parent`.
    pub fn register_exception(&mut self, name: &str, parent: TypeId) -> Result<TypeId, CoreError> {
        if !self.is_subtype(parent, TypeId::THROWABLE) {
            return Err(CoreError::NotThrowable { name: self.name_of(parent).to_string() });
        }
        self.register_class(name, &[parent])
    }

    /// Returns the array type with the given element type, registering it on
    /// first use.
    pub fn array_of(&mut self, element: TypeId) -> Result<TypeId, CoreError> {
        self.check_id(element)?;
        if let Some(id) = self.arrays.get(&element) {
            return Ok(*id);
        }
        let name = format!("{}[]", self.name_of(element));
        let id = self.push(TypeDef { name, kind: TypeKind::Array { element } });
        self.add_supertype(id, TypeId::OBJECT);
        self.arrays.insert(element, id);
        Ok(id)
    }

    /// The array type for `element`, if one was registered.
    pub fn find_array(&self, element: TypeId) -> Option<TypeId> {
        self.arrays.get(&element).copied()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.0 as usize)
    }

    /// The fully-qualified name of `id`.
    pub fn name_of(&self, id: TypeId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("<unknown type>")
    }

    pub fn get_by_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Resolves a type name as written in source: an exact fully-qualified
    /// name, a nested-class name using `$`, or a dotted suffix that matches
    /// exactly one registered name (`ClassWithConditions.Range`).
    pub fn resolve(&self, name: &str) -> Option<TypeId> {
        let name = name.replace('$', ".");
        if let Some(id) = self.get_by_name(&name) {
            return Some(id);
        }
        let suffix = format!(".{name}");
        let mut found = self.types.iter().enumerate().filter(|(_, t)| t.name.ends_with(&suffix));
        match (found.next(), found.next()) {
            (Some((idx, _)), None) => Some(TypeId(idx as u32)),
            _ => None,
        }
    }

    pub fn primitive(&self, id: TypeId) -> Option<PrimitiveType> {
        match self.get(id)?.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_primitive(&self, id: TypeId) -> bool {
        self.primitive(id).is_some()
    }

    /// Primitive or `java.lang.String`.
    pub fn is_primitive_or_string(&self, id: TypeId) -> bool {
        id == TypeId::STRING || self.is_primitive(id)
    }

    pub fn enum_constants(&self, id: TypeId) -> Option<&[String]> {
        match &self.get(id)?.kind {
            TypeKind::Enum { constants } => Some(constants),
            _ => None,
        }
    }

    pub fn array_element(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id)?.kind {
            TypeKind::Array { element } => Some(element),
            _ => None,
        }
    }

    /// Reflexive, transitive subtype relation over the hierarchy graph.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        if self.get(sub).is_none() || self.get(sup).is_none() {
            return false;
        }
        has_path_connecting(&self.hierarchy, sub.node(), sup.node(), None)
    }

    /// Whether a value of static type `source` may be passed where `target`
    /// is declared.
    pub fn is_assignable(&self, target: TypeId, source: TypeId) -> bool {
        if target == source {
            return true;
        }
        let (Some(t), Some(s)) = (self.get(target), self.get(source)) else {
            return false;
        };
        match (&t.kind, &s.kind) {
            (_, TypeKind::Void) | (TypeKind::Void, _) => false,
            (TypeKind::Primitive(tp), TypeKind::Primitive(sp)) => sp.widens_to(*tp),
            (TypeKind::Primitive(_), _) => false,
            // Boxing conversion.
            (_, TypeKind::Primitive(_)) => target == TypeId::OBJECT,
            (TypeKind::Array { element: te }, TypeKind::Array { element: se }) => {
                !self.is_primitive(*te) && !self.is_primitive(*se) && self.is_assignable(*te, *se)
            }
            _ => self.is_subtype(source, target),
        }
    }

    pub fn is_throwable(&self, id: TypeId) -> bool {
        self.is_subtype(id, TypeId::THROWABLE)
    }

    /// Direct supertypes of `id`.
    pub fn supertypes(&self, id: TypeId) -> Vec<TypeId> {
        if self.get(id).is_none() {
            return Vec::new();
        }
        self.hierarchy.neighbors(id.node()).map(|n| TypeId(n.index() as u32)).collect()
    }

    /// All registered type ids, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_preregistered() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.len(), 25);
        assert_eq!(reg.get_by_name("int"), Some(TypeId::INT));
        assert_eq!(reg.get_by_name("java.lang.String"), Some(TypeId::STRING));
        assert_eq!(reg.get_by_name("java.lang.AssertionError"), Some(TypeId::ASSERTION_ERROR));
        assert_eq!(reg.name_of(TypeId::ILLEGAL_ARGUMENT), "java.lang.IllegalArgumentException");
    }

    #[test]
    fn exception_hierarchy_is_connected() {
        let reg = TypeRegistry::new();
        assert!(reg.is_subtype(TypeId::ILLEGAL_ARGUMENT, TypeId::RUNTIME_EXCEPTION));
        assert!(reg.is_subtype(TypeId::ILLEGAL_ARGUMENT, TypeId::THROWABLE));
        assert!(reg.is_subtype(TypeId::ASSERTION_ERROR, TypeId::ERROR));
        assert!(!reg.is_subtype(TypeId::ASSERTION_ERROR, TypeId::EXCEPTION));
        assert!(reg.is_throwable(TypeId::NULL_POINTER));
        assert!(!reg.is_throwable(TypeId::STRING));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut reg = TypeRegistry::new();
        reg.register_class("demo.Point", &[]).unwrap();
        let err = reg.register_class("demo.Point", &[]).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTypeName { .. }));
    }

    #[test]
    fn assignability_covers_widening_boxing_and_subtyping() {
        let mut reg = TypeRegistry::new();
        let shape = reg.register_interface("demo.Shape", &[]).unwrap();
        let square = reg.register_class("demo.Square", &[TypeId::OBJECT, shape]).unwrap();

        assert!(reg.is_assignable(TypeId::LONG, TypeId::INT));
        assert!(!reg.is_assignable(TypeId::INT, TypeId::LONG));
        assert!(reg.is_assignable(TypeId::OBJECT, TypeId::INT));
        assert!(!reg.is_assignable(TypeId::STRING, TypeId::INT));
        assert!(reg.is_assignable(shape, square));
        assert!(!reg.is_assignable(square, shape));
        assert!(reg.is_assignable(TypeId::OBJECT, square));
        assert!(reg.is_assignable(TypeId::COMPARABLE, TypeId::STRING));
        assert!(!reg.is_assignable(TypeId::OBJECT, TypeId::VOID));
    }

    #[test]
    fn arrays_are_covariant_over_references() {
        let mut reg = TypeRegistry::new();
        let strings = reg.array_of(TypeId::STRING).unwrap();
        let objects = reg.array_of(TypeId::OBJECT).unwrap();
        let ints = reg.array_of(TypeId::INT).unwrap();
        assert_eq!(reg.array_of(TypeId::STRING).unwrap(), strings);
        assert_eq!(reg.name_of(strings), "java.lang.String[]");
        assert!(reg.is_assignable(objects, strings));
        assert!(!reg.is_assignable(objects, ints));
        assert!(reg.is_assignable(TypeId::OBJECT, ints));
    }

    #[test]
    fn enums_are_comparable_and_resolve_by_suffix() {
        let mut reg = TypeRegistry::new();
        let range = reg
            .register_enum("demo.ClassWithConditions.Range", &["ONE", "TWO"])
            .unwrap();
        assert!(reg.is_subtype(range, TypeId::COMPARABLE));
        assert_eq!(reg.resolve("ClassWithConditions.Range"), Some(range));
        assert_eq!(reg.resolve("demo.ClassWithConditions$Range"), Some(range));
        assert_eq!(reg.enum_constants(range).unwrap(), ["ONE", "TWO"]);
        assert_eq!(reg.resolve("Missing"), None);
    }

    #[test]
    fn register_exception_requires_throwable_parent() {
        let mut reg = TypeRegistry::new();
        let custom = reg.register_exception("demo.BadnessException", TypeId::RUNTIME_EXCEPTION).unwrap();
        assert!(reg.is_subtype(custom, TypeId::EXCEPTION));
        assert!(reg.register_exception("demo.NotAnException", TypeId::STRING).is_err());
    }
}
