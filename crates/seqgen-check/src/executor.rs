//! Runs one statement against concrete input values.
//!
//! Calls go through the operation's invoker closure. With a timeout the
//! invoker runs on a fresh worker thread and the caller waits on a bounded
//! channel; a call that does not answer in time is reported as
//! [`ExecutionOutcome::Timeout`] and its thread is abandoned. A panic in the
//! code under test becomes a thrown `java.lang.Error`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError};
use tracing::{debug, warn};

use seqgen_core::{ArrayValue, InvokeError, Operation, StatementKind, Thrown, Value};

use crate::error::ExecError;

/// What happened when a statement ran.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Normal(Value),
    Exceptional(Thrown),
    /// An earlier statement stopped the sequence.
    NotExecuted,
    /// The call did not return within the timeout.
    Timeout,
}

impl ExecutionOutcome {
    pub fn is_normal(&self) -> bool {
        matches!(self, ExecutionOutcome::Normal(_))
    }

    pub fn is_exceptional(&self) -> bool {
        matches!(self, ExecutionOutcome::Exceptional(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ExecutionOutcome::Normal(v) => Some(v),
            _ => None,
        }
    }

    pub fn thrown(&self) -> Option<&Thrown> {
        match self {
            ExecutionOutcome::Exceptional(t) => Some(t),
            _ => None,
        }
    }

    /// Same outcome kind, and equal values (by [`Value`]'s structural
    /// equality for primitives and strings) or equal exception types.
    pub fn same_verdict(&self, other: &ExecutionOutcome) -> bool {
        match (self, other) {
            (ExecutionOutcome::Normal(a), ExecutionOutcome::Normal(b)) => {
                if a.is_primitive_or_string() || a.is_null() {
                    a == b
                } else {
                    a.kind_name() == b.kind_name()
                }
            }
            (ExecutionOutcome::Exceptional(a), ExecutionOutcome::Exceptional(b)) => a.type_name == b.type_name,
            (ExecutionOutcome::NotExecuted, ExecutionOutcome::NotExecuted) => true,
            (ExecutionOutcome::Timeout, ExecutionOutcome::Timeout) => true,
            _ => false,
        }
    }
}

/// Executes statement kinds, optionally under a timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Executor { timeout }
    }

    /// Runs every call on the calling thread.
    pub fn inline() -> Self {
        Executor { timeout: None }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn execute(&self, kind: &StatementKind, inputs: &[Value]) -> Result<ExecutionOutcome, ExecError> {
        if inputs.len() != kind.arity() {
            return Err(ExecError::ArityMismatch {
                what: match kind.operation() {
                    Some(op) => op.descriptor(),
                    None => "statement".to_string(),
                },
                expected: kind.arity(),
                actual: inputs.len(),
            });
        }
        match kind {
            StatementKind::Literal(lit) => Ok(ExecutionOutcome::Normal(lit.value.clone())),
            StatementKind::ArrayDecl(decl) => Ok(ExecutionOutcome::Normal(Value::Array(ArrayValue {
                element: decl.element,
                items: inputs.to_vec().into(),
            }))),
            StatementKind::Constructor(op) | StatementKind::Method(op) => {
                if kind.has_receiver() && inputs[0].is_null() {
                    return Ok(ExecutionOutcome::Exceptional(Thrown::null_pointer()));
                }
                self.call(op, inputs)
            }
        }
    }

    fn call(&self, op: &Arc<Operation>, inputs: &[Value]) -> Result<ExecutionOutcome, ExecError> {
        let Some(timeout) = self.timeout else {
            let result = panic::catch_unwind(AssertUnwindSafe(|| op.invoke(inputs)));
            return into_outcome(op, result);
        };

        let invoker = op.invoker();
        let args = inputs.to_vec();
        let (tx, rx) = channel::bounded(1);
        thread::Builder::new()
            .name(format!("seqgen-exec-{}", op.name()))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| invoker(&args)));
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(result);
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => into_outcome(op, result),
            Err(RecvTimeoutError::Timeout) => {
                warn!(operation = %op.descriptor(), ?timeout, "call timed out, abandoning worker");
                Ok(ExecutionOutcome::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Ok(ExecutionOutcome::Exceptional(Thrown::new(
                Thrown::ERROR,
                "executor thread exited without a result",
            ))),
        }
    }
}

fn into_outcome(
    op: &Operation,
    result: Result<Result<Value, InvokeError>, Box<dyn Any + Send>>,
) -> Result<ExecutionOutcome, ExecError> {
    match result {
        Ok(Ok(value)) => Ok(ExecutionOutcome::Normal(value)),
        Ok(Err(InvokeError::Thrown(thrown))) => Ok(ExecutionOutcome::Exceptional(thrown)),
        Ok(Err(InvokeError::IllegalArgument(reason))) => Err(ExecError::IllegalArgument {
            descriptor: op.descriptor(),
            reason,
        }),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            debug!(operation = %op.descriptor(), %message, "call panicked");
            Ok(ExecutionOutcome::Exceptional(Thrown::new(Thrown::ERROR, message)))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in code under test".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgen_core::operation::arg_int;
    use seqgen_core::{OperationRegistry, TypeId, TypeRegistry};

    fn ops() -> (TypeRegistry, OperationRegistry) {
        let mut types = TypeRegistry::new();
        let util = types.register_class("demo.Util", &[]).unwrap();
        let mut ops = OperationRegistry::new();
        ops.static_method(&types, util, "half", &[TypeId::INT], TypeId::INT, |args| {
            let v = arg_int(args, 0)?;
            if v % 2 != 0 {
                return Err(Thrown::illegal_argument("odd").into());
            }
            Ok(Value::Int(v / 2))
        })
        .unwrap();
        ops.static_method(&types, util, "sleep", &[TypeId::INT], TypeId::VOID, |args| {
            thread::sleep(Duration::from_millis(arg_int(args, 0)? as u64));
            Ok(Value::Null)
        })
        .unwrap();
        ops.static_method(&types, util, "explode", &[], TypeId::VOID, |_| panic!("boom"))
            .unwrap();
        ops.static_method(&types, util, "confused", &[], TypeId::VOID, |_| {
            Err(InvokeError::IllegalArgument("wrong receiver".into()))
        })
        .unwrap();
        (types, ops)
    }

    fn kind(ops: &OperationRegistry, descriptor: &str) -> StatementKind {
        StatementKind::call(Arc::clone(ops.by_descriptor(descriptor).unwrap()))
    }

    #[test]
    fn normal_and_exceptional_returns() {
        let (_, ops) = ops();
        let half = kind(&ops, "demo.Util.half(int)");
        for exec in [Executor::inline(), Executor::new(Some(Duration::from_secs(5)))] {
            assert!(matches!(exec.execute(&half, &[Value::Int(8)]).unwrap(), ExecutionOutcome::Normal(Value::Int(4))));
            let out = exec.execute(&half, &[Value::Int(3)]).unwrap();
            assert_eq!(out.thrown().unwrap().type_name, Thrown::ILLEGAL_ARGUMENT);
        }
    }

    #[test]
    fn timeout_is_an_outcome() {
        let (_, ops) = ops();
        let sleep = kind(&ops, "demo.Util.sleep(int)");
        let exec = Executor::new(Some(Duration::from_millis(20)));
        assert!(matches!(exec.execute(&sleep, &[Value::Int(2000)]).unwrap(), ExecutionOutcome::Timeout));
        assert!(exec.execute(&sleep, &[Value::Int(0)]).unwrap().is_normal());
    }

    #[test]
    fn panic_becomes_error() {
        let (_, ops) = ops();
        let explode = kind(&ops, "demo.Util.explode()");
        let out = Executor::inline().execute(&explode, &[]).unwrap();
        let thrown = out.thrown().unwrap();
        assert_eq!(thrown.type_name, Thrown::ERROR);
        assert_eq!(thrown.message.as_deref(), Some("boom"));
    }

    #[test]
    fn harness_errors_are_fatal() {
        let (_, ops) = ops();
        let confused = kind(&ops, "demo.Util.confused()");
        assert!(matches!(
            Executor::inline().execute(&confused, &[]),
            Err(ExecError::IllegalArgument { .. })
        ));
        let half = kind(&ops, "demo.Util.half(int)");
        assert!(matches!(
            Executor::inline().execute(&half, &[]),
            Err(ExecError::ArityMismatch { expected: 1, actual: 0, .. })
        ));
    }

    #[test]
    fn literals_and_arrays_run_inline() {
        let lit = StatementKind::literal(TypeId::INT, Value::Int(3));
        assert!(matches!(Executor::default().execute(&lit, &[]).unwrap(), ExecutionOutcome::Normal(Value::Int(3))));
        let mut types = TypeRegistry::new();
        let decl = seqgen_core::ArrayDecl::new(&mut types, TypeId::INT, 2).unwrap();
        let out = Executor::default()
            .execute(&StatementKind::ArrayDecl(decl), &[Value::Int(1), Value::Int(2)])
            .unwrap();
        match out {
            ExecutionOutcome::Normal(Value::Array(a)) => assert_eq!(a.items.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
