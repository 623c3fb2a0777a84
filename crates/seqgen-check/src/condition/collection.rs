//! The specifications of a generation session, keyed by operation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use seqgen_core::{Operation, OperationId, OperationRegistry, OperationSignature, TypeRegistry};

use crate::error::ConditionError;

use super::executable::{ConditionOptions, ExecutableSpecification};
use super::specification::{read_specifications, OperationSpecification};
use super::translator::SpecificationTranslator;

/// Specifications by signature, with compiled forms cached per operation.
///
/// A method also inherits the specifications of the methods it overrides:
/// those with the same name and parameter types declared on one of its
/// supertypes.
pub struct SpecificationCollection<'a> {
    types: &'a TypeRegistry,
    ops: &'a OperationRegistry,
    specs: IndexMap<OperationSignature, Vec<OperationSpecification>>,
    cache: RefCell<HashMap<OperationId, Option<Rc<ExecutableSpecification>>>>,
    options: ConditionOptions,
}

/// Constructors are keyed by `name == classname`.
fn canonical(signature: &OperationSignature) -> OperationSignature {
    let mut sig = signature.clone();
    if sig.is_constructor() {
        sig.name = sig.classname.clone();
    }
    sig
}

impl<'a> SpecificationCollection<'a> {
    pub fn new(
        types: &'a TypeRegistry,
        ops: &'a OperationRegistry,
        specifications: Vec<OperationSpecification>,
        options: ConditionOptions,
    ) -> Result<Self, ConditionError> {
        let mut specs: IndexMap<OperationSignature, Vec<OperationSpecification>> = IndexMap::new();
        for spec in specifications {
            let key = canonical(&spec.operation);
            if ops.by_signature(&key).is_none() {
                let err = ConditionError::UnknownOperation { signature: key.descriptor() };
                if options.ignore_compilation_error {
                    warn!(error = %err, "ignoring specification");
                    continue;
                }
                return Err(err);
            }
            specs.entry(key).or_default().push(spec);
        }
        debug!(operations = specs.len(), "loaded specifications");
        Ok(SpecificationCollection { types, ops, specs, cache: RefCell::new(HashMap::new()), options })
    }

    /// Reads and merges every file in `paths`.
    pub fn from_files<P: AsRef<Path>>(
        types: &'a TypeRegistry,
        ops: &'a OperationRegistry,
        paths: &[P],
        options: ConditionOptions,
    ) -> Result<Self, ConditionError> {
        let mut all = Vec::new();
        for path in paths {
            all.extend(read_specifications(path.as_ref())?);
        }
        Self::new(types, ops, all, options)
    }

    pub fn empty(types: &'a TypeRegistry, ops: &'a OperationRegistry) -> Self {
        SpecificationCollection {
            types,
            ops,
            specs: IndexMap::new(),
            cache: RefCell::new(HashMap::new()),
            options: ConditionOptions::default(),
        }
    }

    /// Number of operations that carry specifications.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn signatures(&self) -> impl Iterator<Item = &OperationSignature> {
        self.specs.keys()
    }

    /// Specifications declared on overridden methods of `op`'s supertypes.
    fn inherited(&self, op: &Operation) -> Vec<&OperationSpecification> {
        if !op.has_receiver() {
            return Vec::new();
        }
        let own = canonical(&op.signature);
        self.specs
            .iter()
            .filter(|(sig, _)| {
                **sig != own
                    && sig.name == own.name
                    && sig.parameter_types == own.parameter_types
                    && self
                        .types
                        .resolve(&sig.classname)
                        .is_some_and(|parent| self.types.is_subtype(op.declaring_type, parent))
            })
            .flat_map(|(_, list)| list.iter())
            .collect()
    }

    /// The compiled specification of `op`, or `None` when nothing applies.
    pub fn executable_specification(&self, op: &Operation) -> Result<Option<Rc<ExecutableSpecification>>, ConditionError> {
        if let Some(cached) = self.cache.borrow().get(&op.id) {
            return Ok(cached.clone());
        }

        let own = self.specs.get(&canonical(&op.signature)).map(|v| v.iter().collect::<Vec<_>>()).unwrap_or_default();
        let mut members = Vec::new();
        for spec in own.into_iter().chain(self.inherited(op)) {
            let translator = match SpecificationTranslator::new(self.types, self.ops, op, spec, self.options) {
                Ok(t) => t,
                Err(e @ ConditionError::NameConflict { .. }) => {
                    warn!(error = %e, "skipping specification");
                    continue;
                }
                Err(e) => return Err(e),
            };
            members.push(translator.translate(spec)?);
        }
        let compiled = ExecutableSpecification::new(members);
        let entry = (!compiled.is_empty()).then(|| Rc::new(compiled));
        self.cache.borrow_mut().insert(op.id, entry.clone());
        Ok(entry)
    }

    /// Compiles every specification, reporting the first error. Returns the
    /// number of operations with at least one compiled condition.
    pub fn compile_all(&self) -> Result<usize, ConditionError> {
        let mut count = 0;
        for sig in self.specs.keys() {
            let Some(op) = self.ops.by_signature(sig) else {
                continue;
            };
            if self.executable_specification(op)?.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }
}
