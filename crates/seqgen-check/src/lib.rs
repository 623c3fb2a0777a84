//! Execution, classification and generation of method-call sequences.
//!
//! [`executable::ExecutableSequence`] runs a [`seqgen_core::Sequence`]
//! through the [`executor::Executor`], consulting operation specifications
//! ([`condition`]) before and after each call and letting visitors attach
//! [`checks::Check`]s. [`generator::ForwardGenerator`] builds sequences at
//! random from the results of earlier ones and [`simplify`] minimises the
//! ones that fail.

pub mod checks;
pub mod condition;
pub mod config;
pub mod contracts;
pub mod error;
pub mod executable;
pub mod executor;
pub mod generator;
pub mod simplify;
pub mod visitor;

pub use checks::{Check, CheckKind, ObjectCheck, PostConditionClause};
pub use condition::{ConditionOptions, ExpectedOutcomeTable, SpecificationCollection};
pub use config::GenConfig;
pub use contracts::{default_contracts, ObjectContract};
pub use error::{ConditionError, ExecError};
pub use executable::{ExecutableSequence, ExecutionContext};
pub use executor::{ExecutionOutcome, Executor};
pub use generator::{FailingSequence, ForwardGenerator, GenStats, GenerationResult};
pub use simplify::{Simplifier, SimplifyResult};
pub use visitor::{ContractCheckingVisitor, DummyVisitor, ExecutionVisitor, MultiVisitor, RegressionCaptureVisitor};
