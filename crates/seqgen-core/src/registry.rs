//! The operation registration table.
//!
//! Stands in for reflective discovery: classes under test register their
//! constructors, methods and field readers together with the closures that
//! perform them. Operations keep insertion order so that generation with a
//! fixed seed is reproducible.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::id::OperationId;
use crate::operation::{InvokeError, Operation, OperationKind, OperationSignature};
use crate::type_id::{TypeId, TypeRegistry};
use crate::value::Value;

/// All operations available to a generation session.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    /// Descriptor -> operation, insertion-ordered; position is the OperationId.
    ops: IndexMap<String, Arc<Operation>>,
    by_signature: HashMap<OperationSignature, OperationId>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation, assigning its [`OperationId`].
    pub fn register(&mut self, mut op: Operation) -> Result<Arc<Operation>, CoreError> {
        let descriptor = op.descriptor();
        if self.ops.contains_key(&descriptor) {
            return Err(CoreError::DuplicateOperation { descriptor });
        }
        let id = OperationId::from(self.ops.len());
        op.id = id;
        if !op.kind.is_field() {
            self.by_signature.insert(op.signature.clone(), id);
        }
        let op = Arc::new(op);
        self.ops.insert(descriptor, Arc::clone(&op));
        Ok(op)
    }

    pub fn constructor<F>(
        &mut self,
        types: &TypeRegistry,
        class: TypeId,
        params: &[TypeId],
        f: F,
    ) -> Result<Arc<Operation>, CoreError>
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        let classname = class_name(types, class)?;
        let signature = OperationSignature {
            classname: classname.clone(),
            name: classname,
            parameter_types: type_names(types, params)?,
        };
        self.register(Operation::new(
            signature,
            OperationKind::Constructor,
            class,
            params.to_vec(),
            class,
            Arc::new(f),
        ))
    }

    /// Registers an instance method; the receiver is prepended to `params`.
    pub fn method<F>(
        &mut self,
        types: &TypeRegistry,
        class: TypeId,
        name: &str,
        params: &[TypeId],
        returns: TypeId,
        f: F,
    ) -> Result<Arc<Operation>, CoreError>
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        let signature = OperationSignature {
            classname: class_name(types, class)?,
            name: name.to_string(),
            parameter_types: type_names(types, params)?,
        };
        let mut inputs = Vec::with_capacity(params.len() + 1);
        inputs.push(class);
        inputs.extend_from_slice(params);
        self.register(Operation::new(signature, OperationKind::Method, class, inputs, returns, Arc::new(f)))
    }

    /// Registers a zero-argument, side-effect-free instance method.
    pub fn observer<F>(
        &mut self,
        types: &TypeRegistry,
        class: TypeId,
        name: &str,
        returns: TypeId,
        f: F,
    ) -> Result<Arc<Operation>, CoreError>
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        let signature = OperationSignature {
            classname: class_name(types, class)?,
            name: name.to_string(),
            parameter_types: Vec::new(),
        };
        let mut op = Operation::new(signature, OperationKind::Method, class, vec![class], returns, Arc::new(f));
        op.observer = true;
        self.register(op)
    }

    pub fn static_method<F>(
        &mut self,
        types: &TypeRegistry,
        class: TypeId,
        name: &str,
        params: &[TypeId],
        returns: TypeId,
        f: F,
    ) -> Result<Arc<Operation>, CoreError>
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        let signature = OperationSignature {
            classname: class_name(types, class)?,
            name: name.to_string(),
            parameter_types: type_names(types, params)?,
        };
        self.register(Operation::new(
            signature,
            OperationKind::StaticMethod,
            class,
            params.to_vec(),
            returns,
            Arc::new(f),
        ))
    }

    /// Registers a public instance field read.
    pub fn field_getter<F>(
        &mut self,
        types: &TypeRegistry,
        class: TypeId,
        field: &str,
        ty: TypeId,
        f: F,
    ) -> Result<Arc<Operation>, CoreError>
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        let signature = OperationSignature {
            classname: class_name(types, class)?,
            name: field.to_string(),
            parameter_types: Vec::new(),
        };
        let mut op = Operation::new(signature, OperationKind::FieldGet, class, vec![class], ty, Arc::new(f));
        op.observer = true;
        self.register(op)
    }

    pub fn get(&self, id: OperationId) -> Option<&Arc<Operation>> {
        self.ops.get_index(usize::from(id)).map(|(_, op)| op)
    }

    pub fn by_descriptor(&self, descriptor: &str) -> Option<&Arc<Operation>> {
        self.ops.get(descriptor)
    }

    pub fn by_signature(&self, signature: &OperationSignature) -> Option<&Arc<Operation>> {
        // Constructors may be written with `<init>` or the class name.
        let id = self.by_signature.get(signature).or_else(|| {
            if signature.is_constructor() {
                let mut canonical = signature.clone();
                canonical.name = canonical.classname.clone();
                self.by_signature.get(&canonical)
            } else {
                None
            }
        })?;
        self.get(*id)
    }

    /// Instance methods and fields named `name` with `arg_count` explicit
    /// arguments whose receiver type accepts `receiver`.
    pub fn find_instance_member(
        &self,
        types: &TypeRegistry,
        receiver: TypeId,
        name: &str,
        arg_count: usize,
    ) -> Option<&Arc<Operation>> {
        self.ops.values().find(|op| {
            op.has_receiver()
                && op.name() == name
                && op.input_types.len() == arg_count + 1
                && types.is_assignable(op.input_types[0], receiver)
        })
    }

    /// Static members of `class` named `name` taking `arg_count` arguments.
    pub fn find_static_member(&self, class: TypeId, name: &str, arg_count: usize) -> Option<&Arc<Operation>> {
        self.ops.values().find(|op| {
            op.is_static() && op.declaring_type == class && op.name() == name && op.input_types.len() == arg_count
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Operation>> {
        self.ops.values()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

fn class_name(types: &TypeRegistry, class: TypeId) -> Result<String, CoreError> {
    types
        .get(class)
        .map(|t| t.name.clone())
        .ok_or(CoreError::UnknownTypeId { id: class })
}

fn type_names(types: &TypeRegistry, ids: &[TypeId]) -> Result<Vec<String>, CoreError> {
    ids.iter().map(|id| class_name(types, *id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::arg_int;

    fn setup() -> (TypeRegistry, OperationRegistry, TypeId) {
        let mut types = TypeRegistry::new();
        let util = types.register_class("demo.MathUtil", &[]).unwrap();
        let ops = OperationRegistry::new();
        (types, ops, util)
    }

    #[test]
    fn registration_assigns_sequential_ids() {
        let (types, mut ops, util) = setup();
        let a = ops
            .static_method(&types, util, "abs", &[TypeId::INT], TypeId::INT, |args| {
                Ok(Value::Int(arg_int(args, 0)?.wrapping_abs()))
            })
            .unwrap();
        let b = ops
            .static_method(&types, util, "neg", &[TypeId::INT], TypeId::INT, |args| {
                Ok(Value::Int(arg_int(args, 0)?.wrapping_neg()))
            })
            .unwrap();
        assert_eq!(a.id, OperationId(0));
        assert_eq!(b.id, OperationId(1));
        assert_eq!(ops.len(), 2);
        assert!(ops.by_descriptor("demo.MathUtil.abs(int)").is_some());
        let sig = OperationSignature::method("demo.MathUtil", "neg", &["int"]);
        assert_eq!(ops.by_signature(&sig).unwrap().id, b.id);
        assert!(matches!(
            ops.by_descriptor("demo.MathUtil.neg(int)").unwrap().invoke(&[Value::Int(3)]),
            Ok(Value::Int(-3))
        ));
    }

    #[test]
    fn duplicate_descriptor_is_rejected() {
        let (types, mut ops, util) = setup();
        ops.static_method(&types, util, "zero", &[], TypeId::INT, |_| Ok(Value::Int(0))).unwrap();
        let err = ops
            .static_method(&types, util, "zero", &[], TypeId::INT, |_| Ok(Value::Int(0)))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateOperation { .. }));
    }

    #[test]
    fn constructors_resolve_by_class_name_or_init() {
        let (types, mut ops, util) = setup();
        ops.constructor(&types, util, &[], |_| Ok(Value::Null)).unwrap();
        let by_class = OperationSignature::constructor("demo.MathUtil", &[]);
        let by_init = OperationSignature::method("demo.MathUtil", "<init>", &[]);
        assert!(ops.by_signature(&by_class).is_some());
        assert!(ops.by_signature(&by_init).is_some());
    }

    #[test]
    fn instance_members_match_subtype_receivers() {
        let mut types = TypeRegistry::new();
        let base = types.register_class("demo.Base", &[]).unwrap();
        let derived = types.register_class("demo.Derived", &[base]).unwrap();
        let mut ops = OperationRegistry::new();
        ops.observer(&types, base, "size", TypeId::INT, |_| Ok(Value::Int(0))).unwrap();
        assert!(ops.find_instance_member(&types, derived, "size", 0).is_some());
        assert!(ops.find_instance_member(&types, derived, "size", 1).is_none());
        assert!(ops.find_instance_member(&types, TypeId::STRING, "size", 0).is_none());
    }
}
