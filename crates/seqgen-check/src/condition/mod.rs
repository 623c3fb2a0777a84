//! Operation specifications: JSON pre/post/throws conditions compiled into
//! checks on individual calls.
//!
//! Condition text is rewritten to positional placeholders by
//! [`SpecificationTranslator`], compiled by a small Java-expression compiler
//! against the registration table, and evaluated on every call whose
//! operation carries a specification.

pub mod collection;
mod eval;
pub mod executable;
mod expr;
pub mod replace;
pub mod specification;
pub mod translator;

pub use collection::SpecificationCollection;
pub use executable::{
    ConditionOptions, ExecutableBooleanExpression, ExecutablePostcondition, ExecutableSpecification,
    ExecutableThrowsCondition, ExpectedOutcomeTable, TranslatedSpecification,
};
pub use replace::NameReplacementMap;
pub use specification::{
    parse_specifications, read_specifications, write_specifications, Guard, Identifiers, OperationSpecification,
    Postcondition, Precondition, Property, ThrowsCondition,
};
pub use translator::SpecificationTranslator;
