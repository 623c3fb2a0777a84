//! Turns serialized specifications into compiled conditions.

use tracing::{debug, warn};

use seqgen_core::{Operation, OperationRegistry, TypeId, TypeRegistry};

use crate::error::ConditionError;

use super::executable::{
    ConditionOptions, ExecutableBooleanExpression, ExecutablePostcondition, ExecutableThrowsCondition,
    TranslatedSpecification,
};
use super::replace::NameReplacementMap;
use super::specification::OperationSpecification;

/// Translates the conditions of one operation.
///
/// Source names are rewritten to positional placeholders: the receiver of
/// an instance method is `x0`, parameters follow in order, and the result
/// comes last. Guards see only the inputs; properties also see the result.
pub struct SpecificationTranslator<'a> {
    types: &'a TypeRegistry,
    ops: &'a OperationRegistry,
    operation: &'a Operation,
    replacements: NameReplacementMap,
    pre_types: Vec<TypeId>,
    post_types: Vec<TypeId>,
    options: ConditionOptions,
}

impl<'a> SpecificationTranslator<'a> {
    pub fn new(
        types: &'a TypeRegistry,
        ops: &'a OperationRegistry,
        operation: &'a Operation,
        spec: &OperationSpecification,
        options: ConditionOptions,
    ) -> Result<Self, ConditionError> {
        let ids = &spec.identifiers;
        if ids.has_name_conflict() {
            return Err(ConditionError::NameConflict { signature: operation.descriptor() });
        }
        let offset = usize::from(operation.has_receiver());
        let explicit = operation.input_types.len() - offset;
        if !ids.parameters.is_empty() && ids.parameters.len() != explicit {
            return Err(ConditionError::Compile {
                signature: operation.descriptor(),
                text: ids.parameters.join(", "),
                reason: format!("expected {explicit} parameter names, found {}", ids.parameters.len()),
            });
        }

        let mut replacements = NameReplacementMap::new();
        if operation.has_receiver() {
            replacements.add(&ids.receiver_name, "x0");
        }
        for (i, name) in ids.parameters.iter().enumerate() {
            replacements.add(name, &format!("x{}", i + offset));
        }
        let pre_types = operation.input_types.clone();
        let mut post_types = pre_types.clone();
        if !operation.is_void() {
            replacements.add(&ids.return_name, &format!("x{}", pre_types.len()));
            post_types.push(operation.output_type);
        }

        let translator =
            SpecificationTranslator { types, ops, operation, replacements, pre_types, post_types, options };
        debug!(
            operation = %operation.descriptor(),
            pre = %translator.declaration(spec, false),
            post = %translator.declaration(spec, true),
            "translating specification"
        );
        Ok(translator)
    }

    /// Source-level parameter list the conditions are written against, e.g.
    /// `(demo.Counter receiver, int delta)`.
    pub fn declaration(&self, spec: &OperationSpecification, with_result: bool) -> String {
        let ids = &spec.identifiers;
        let mut names: Vec<&str> = Vec::new();
        if self.operation.has_receiver() {
            names.push(&ids.receiver_name);
        }
        for (i, _) in self.pre_types.iter().enumerate().skip(names.len()) {
            let k = i - usize::from(self.operation.has_receiver());
            names.push(ids.parameters.get(k).map(String::as_str).unwrap_or("_"));
        }
        if with_result && !self.operation.is_void() {
            names.push(&ids.return_name);
        }
        let types = if with_result { &self.post_types } else { &self.pre_types };
        let parts: Vec<String> =
            types.iter().zip(names).map(|(ty, name)| format!("{} {name}", self.types.name_of(*ty))).collect();
        format!("({})", parts.join(", "))
    }

    fn compile(&self, text: &str, comment: &str, vars: &[TypeId]) -> Result<ExecutableBooleanExpression, ConditionError> {
        let source = self.replacements.replace_names(text);
        ExecutableBooleanExpression::compile(&source, comment, self.types, self.ops, vars, self.options.ignore_exception)
            .map_err(|reason| ConditionError::Compile {
                signature: self.operation.descriptor(),
                text: text.to_string(),
                reason,
            })
    }

    /// Keeps a clause, drops it with a warning, or fails, per the options.
    fn admit<T>(&self, clause: Result<T, ConditionError>, out: &mut Vec<T>) -> Result<(), ConditionError> {
        match clause {
            Ok(c) => out.push(c),
            Err(e) if self.options.ignore_compilation_error => warn!(error = %e, "dropping condition"),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    pub fn translate(&self, spec: &OperationSpecification) -> Result<TranslatedSpecification, ConditionError> {
        let mut out = TranslatedSpecification::default();
        for pre in &spec.pre {
            let comment = if pre.description.is_empty() { &pre.guard.description } else { &pre.description };
            let clause = self.compile(&pre.guard.condition_text, comment, &self.pre_types);
            self.admit(clause, &mut out.preconditions)?;
        }
        for post in &spec.post {
            let comment = if post.description.is_empty() { &post.property.description } else { &post.description };
            let clause = self.compile(&post.guard.condition_text, &post.guard.description, &self.pre_types).and_then(
                |guard| {
                    let property = self.compile(&post.property.condition_text, comment, &self.post_types)?;
                    Ok(std::rc::Rc::new(ExecutablePostcondition { guard, property }))
                },
            );
            self.admit(clause, &mut out.postconditions)?;
        }
        for throws in &spec.throws {
            let clause = self.compile(&throws.guard.condition_text, &throws.guard.description, &self.pre_types).and_then(
                |guard| {
                    let exception_type = self
                        .types
                        .resolve(&throws.exception_type_name)
                        .filter(|t| self.types.is_throwable(*t))
                        .ok_or_else(|| ConditionError::Compile {
                            signature: self.operation.descriptor(),
                            text: throws.exception_type_name.clone(),
                            reason: "not a registered exception type".to_string(),
                        })?;
                    Ok(std::rc::Rc::new(ExecutableThrowsCondition {
                        guard,
                        exception_type,
                        exception_name: self.types.name_of(exception_type).to_string(),
                        comment: throws.description.clone(),
                    }))
                },
            );
            self.admit(clause, &mut out.throws)?;
        }
        Ok(out)
    }
}
