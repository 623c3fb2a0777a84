//! Feedback-directed forward generation.
//!
//! Each step picks a random operation, draws an input for every parameter
//! from the [`ComponentPool`] (or reuses a variable already in the
//! sequence being built), appends the call and executes the result. The
//! outcome decides where the sequence goes:
//!
//! * a failing check: reported as an error-revealing sequence, simplified
//!   first when enabled;
//! * invalid behaviour or a timeout: dropped;
//! * an exception: kept as a regression test, not reused as input;
//! * a normal run: kept as a regression test and added to the pool, with any
//!   new primitive result added as a literal seed.
//!
//! Reproducibility: given the same seed, registries and configuration, the
//! same sequences are generated in the same order.

pub mod pool;
pub mod random;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use seqgen_core::{Operation, OperationRegistry, Sequence, StatementKind, TypeId, Value};

use crate::config::GenConfig;
use crate::error::ExecError;
use crate::executable::{ExecutableSequence, ExecutionContext};
use crate::simplify::{Simplifier, SimplifyResult};
use crate::visitor::{ContractCheckingVisitor, MultiVisitor, RegressionCaptureVisitor};

pub use pool::ComponentPool;
pub use random::{random_value, seed_literals};

/// Chance of drawing a fresh random literal for a primitive input instead
/// of a pooled one.
const FRESH_LITERAL_RATIO: f64 = 0.1;

/// Counters of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenStats {
    /// Generation steps attempted.
    pub steps: usize,
    /// Candidate sequences executed.
    pub executed: usize,
    pub duplicates: usize,
    pub oversize: usize,
    /// Steps abandoned because some input type had no candidate.
    pub missing_inputs: usize,
    pub invalid: usize,
    pub timeouts: usize,
    pub exceptional: usize,
    pub failures: usize,
    pub regression: usize,
    pub pool_size: usize,
    /// Statements deleted by the simplifier, over all failures.
    pub simplified_away: usize,
    pub elapsed_ms: u64,
}

/// An error-revealing sequence.
#[derive(Debug, Clone)]
pub struct FailingSequence {
    /// The sequence as generated and executed.
    pub original: ExecutableSequence,
    pub simplified: Option<SimplifyResult>,
}

impl FailingSequence {
    /// The sequence to report: the simplified one when there is one.
    pub fn reported(&self) -> &ExecutableSequence {
        match &self.simplified {
            Some(result) => &result.executable,
            None => &self.original,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationResult {
    pub regression: Vec<ExecutableSequence>,
    pub failures: Vec<FailingSequence>,
    pub stats: GenStats,
}

pub struct ForwardGenerator<'a> {
    ctx: ExecutionContext<'a>,
    ops: &'a OperationRegistry,
    config: GenConfig,
    operations: Vec<Arc<Operation>>,
    pool: ComponentPool,
    seen: HashSet<Sequence>,
    rng: ChaCha8Rng,
}

impl<'a> ForwardGenerator<'a> {
    /// A generator over every registered operation, with a pool seeded from
    /// [`seed_literals`].
    pub fn new(ctx: ExecutionContext<'a>, ops: &'a OperationRegistry, config: GenConfig) -> Result<Self, ExecError> {
        let pool = ComponentPool::with_literals(ctx.types, seed_literals(ctx.types))?;
        Ok(ForwardGenerator {
            ctx,
            ops,
            operations: ops.iter().cloned().collect(),
            pool,
            seen: HashSet::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    pub fn pool(&self) -> &ComponentPool {
        &self.pool
    }

    fn visitor(&self) -> MultiVisitor<'a> {
        MultiVisitor::new()
            .with(ContractCheckingVisitor::new(self.ctx.types).check_every_statement(self.config.check_every_statement))
            .with(
                RegressionCaptureVisitor::new(self.ctx.types, self.ops, self.ctx.executor)
                    .string_max_len(self.config.string_max_len),
            )
    }

    /// Runs until `input_limit` steps or `time_limit` is reached.
    pub fn generate(&mut self) -> Result<GenerationResult, ExecError> {
        let start = Instant::now();
        let mut result = GenerationResult::default();
        if self.operations.is_empty() {
            return Ok(result);
        }
        let time_limit = self.config.time_limit();

        while result.stats.steps < self.config.input_limit {
            if time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                debug!(steps = result.stats.steps, "time limit reached");
                break;
            }
            result.stats.steps += 1;
            let Some(seq) = self.next_candidate(&mut result.stats)? else {
                continue;
            };
            self.run(seq, &mut result)?;
        }

        result.stats.pool_size = self.pool.len();
        result.stats.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            steps = result.stats.steps,
            regression = result.stats.regression,
            failures = result.stats.failures,
            invalid = result.stats.invalid,
            "generation finished"
        );
        Ok(result)
    }

    /// Builds the next sequence to execute, or `None` if this step yields
    /// nothing new.
    fn next_candidate(&mut self, stats: &mut GenStats) -> Result<Option<Sequence>, ExecError> {
        let Some(op) = self.operations.choose(&mut self.rng).cloned() else {
            return Ok(None);
        };
        let types = self.ctx.types;
        let mut prefix = Sequence::new();
        let mut inputs = Vec::with_capacity(op.input_types.len());

        for (pos, &ty) in op.input_types.iter().enumerate() {
            let receiver = pos == 0 && op.has_receiver();

            if self.rng.gen_bool(self.config.alias_ratio.clamp(0.0, 1.0)) {
                let reusable: Vec<usize> = prefix
                    .variables_assignable_to(types, ty)
                    .into_iter()
                    .filter(|&v| !(receiver && is_null_literal(&prefix, v)))
                    .collect();
                if let Some(&var) = reusable.choose(&mut self.rng) {
                    inputs.push(var);
                    continue;
                }
            }

            let part = if !receiver && !types.is_primitive(ty) && self.rng.gen_bool(self.config.null_ratio.clamp(0.0, 1.0)) {
                Some(Sequence::new().extend(Arc::new(StatementKind::literal(ty, Value::Null)), &[], types)?)
            } else if types.is_primitive_or_string(ty) && self.rng.gen_bool(FRESH_LITERAL_RATIO) {
                match random_value(types, ty, &mut self.rng) {
                    Some(value) => Some(Sequence::new().extend(Arc::new(StatementKind::literal(ty, value)), &[], types)?),
                    None => None,
                }
            } else {
                self.pool.pick(types, ty, &mut self.rng).cloned()
            };
            let Some(part) = part else {
                stats.missing_inputs += 1;
                debug!(operation = %op.descriptor(), position = pos, "no input of the required type");
                return Ok(None);
            };
            prefix = Sequence::concatenate(&[prefix, part]);
            inputs.push(prefix.len() - 1);
        }

        let seq = prefix.extend(Arc::new(StatementKind::call(op)), &inputs, types)?;
        if seq.len() > self.config.max_size {
            stats.oversize += 1;
            return Ok(None);
        }
        if !self.seen.insert(seq.clone()) {
            stats.duplicates += 1;
            return Ok(None);
        }
        Ok(Some(seq))
    }

    fn run(&mut self, seq: Sequence, result: &mut GenerationResult) -> Result<(), ExecError> {
        let stats = &mut result.stats;
        let mut eseq = ExecutableSequence::new(seq);
        eseq.execute(&self.ctx, &mut self.visitor())?;
        stats.executed += 1;

        if eseq.has_failure() {
            stats.failures += 1;
            debug!(statements = eseq.len(), "error-revealing sequence");
            let simplified = if self.config.simplify {
                let mut visitor = self.visitor();
                let simplified = Simplifier::new(self.ctx, &mut visitor).simplify(&eseq)?;
                stats.simplified_away += simplified.removed.len();
                Some(simplified)
            } else {
                None
            };
            result.failures.push(FailingSequence { original: eseq, simplified });
            return Ok(());
        }
        if eseq.has_invalid_behavior() {
            stats.invalid += 1;
            return Ok(());
        }
        if eseq.timed_out() {
            stats.timeouts += 1;
            return Ok(());
        }
        if !eseq.is_normal_execution() {
            stats.exceptional += 1;
            stats.regression += 1;
            result.regression.push(eseq);
            return Ok(());
        }

        let last = eseq.len() - 1;
        if let (Some(kind), Some(value)) = (eseq.kind(last), eseq.value(last)) {
            if value.is_primitive_or_string() && kind.output_type() != TypeId::VOID {
                let ty = value.runtime_type(self.ctx.types).unwrap_or(kind.output_type());
                let fits = value.as_str().map_or(true, |s| s.len() <= self.config.string_max_len);
                if fits {
                    self.pool.add_literal(self.ctx.types, ty, value.clone())?;
                }
            }
        }
        self.pool.add(eseq.sequence().clone());
        stats.regression += 1;
        result.regression.push(eseq);
        Ok(())
    }
}

fn is_null_literal(seq: &Sequence, var: usize) -> bool {
    matches!(seq.kind(var), Some(StatementKind::Literal(lit)) if lit.value.is_null())
}
