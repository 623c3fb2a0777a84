//! Hooks run around each statement of an executing sequence.
//!
//! Visitors classify outcomes by attaching [`Check`](crate::checks::Check)s
//! to the [`ExecutableSequence`]: contract checking looks for errors,
//! regression capture records what was observed.

pub mod contract_checking;
pub mod regression;

pub use contract_checking::ContractCheckingVisitor;
pub use regression::RegressionCaptureVisitor;

use crate::executable::ExecutableSequence;

pub trait ExecutionVisitor {
    /// Called once before the first statement.
    fn initialize(&mut self, _eseq: &mut ExecutableSequence) {}

    fn visit_before(&mut self, _eseq: &mut ExecutableSequence, _index: usize) {}

    /// Called after statement `index` ran and its specification checks were
    /// recorded.
    fn visit_after(&mut self, eseq: &mut ExecutableSequence, index: usize);
}

/// Runs its visitors in order.
#[derive(Default)]
pub struct MultiVisitor<'v> {
    visitors: Vec<Box<dyn ExecutionVisitor + 'v>>,
}

impl<'v> MultiVisitor<'v> {
    pub fn new() -> Self {
        MultiVisitor { visitors: Vec::new() }
    }

    pub fn with(mut self, visitor: impl ExecutionVisitor + 'v) -> Self {
        self.visitors.push(Box::new(visitor));
        self
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl ExecutionVisitor for MultiVisitor<'_> {
    fn initialize(&mut self, eseq: &mut ExecutableSequence) {
        for v in &mut self.visitors {
            v.initialize(eseq);
        }
    }

    fn visit_before(&mut self, eseq: &mut ExecutableSequence, index: usize) {
        for v in &mut self.visitors {
            v.visit_before(eseq, index);
        }
    }

    fn visit_after(&mut self, eseq: &mut ExecutableSequence, index: usize) {
        for v in &mut self.visitors {
            v.visit_after(eseq, index);
        }
    }
}

/// Records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyVisitor;

impl ExecutionVisitor for DummyVisitor {
    fn visit_after(&mut self, _eseq: &mut ExecutableSequence, _index: usize) {}
}
