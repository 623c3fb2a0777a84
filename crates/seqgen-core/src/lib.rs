pub mod types;
pub mod type_id;
pub mod id;
pub mod error;
pub mod value;
pub mod operation;
pub mod registry;
pub mod sequence;
pub mod builder;
pub mod parse;

// Re-export commonly used types
pub use types::{PrimitiveType, TypeDef, TypeKind};
pub use type_id::{TypeId, TypeRegistry};
pub use id::OperationId;
pub use error::CoreError;
pub use value::{ArrayValue, CollectionView, EnumConstant, Instance, Thrown, Value};
pub use operation::{
    ArrayDecl, InvokeError, Invoker, Literal, Operation, OperationKind, OperationSignature, StatementKind,
};
pub use registry::OperationRegistry;
pub use sequence::{Sequence, Statement, Variable};
pub use builder::SequenceBuilder;
