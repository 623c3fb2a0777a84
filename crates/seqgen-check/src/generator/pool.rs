//! Sequences available as inputs, indexed by the type they produce.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use seqgen_core::{CoreError, Sequence, StatementKind, TypeId, TypeRegistry, Value};

/// Component sequences keyed by the output type of their last statement.
///
/// Insertion order is kept so that a seeded run picks the same components.
#[derive(Debug, Default)]
pub struct ComponentPool {
    by_type: IndexMap<TypeId, Vec<Sequence>>,
    members: HashSet<Sequence>,
}

impl ComponentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool holding one literal sequence per value.
    pub fn with_literals(
        types: &TypeRegistry,
        literals: impl IntoIterator<Item = (TypeId, Value)>,
    ) -> Result<Self, CoreError> {
        let mut pool = Self::new();
        for (ty, value) in literals {
            pool.add_literal(types, ty, value)?;
        }
        Ok(pool)
    }

    /// Adds `seq`; `false` if it is empty, produces `void` or is already in
    /// the pool.
    pub fn add(&mut self, seq: Sequence) -> bool {
        let Some(ty) = seq.statements().last().map(|s| s.kind.output_type()) else {
            return false;
        };
        if ty == TypeId::VOID || self.members.contains(&seq) {
            return false;
        }
        self.members.insert(seq.clone());
        self.by_type.entry(ty).or_default().push(seq);
        true
    }

    pub fn add_literal(&mut self, types: &TypeRegistry, ty: TypeId, value: Value) -> Result<bool, CoreError> {
        let seq = Sequence::new().extend(Arc::new(StatementKind::literal(ty, value)), &[], types)?;
        Ok(self.add(seq))
    }

    pub fn contains(&self, seq: &Sequence) -> bool {
        self.members.contains(seq)
    }

    /// Sequences whose last variable can be passed where `ty` is declared.
    pub fn candidates(&self, types: &TypeRegistry, ty: TypeId) -> Vec<&Sequence> {
        self.by_type
            .iter()
            .filter(|(produced, _)| types.is_assignable(ty, **produced))
            .flat_map(|(_, seqs)| seqs.iter())
            .collect()
    }

    /// A uniformly chosen candidate for `ty`.
    pub fn pick(&self, types: &TypeRegistry, ty: TypeId, rng: &mut ChaCha8Rng) -> Option<&Sequence> {
        let candidates = self.candidates(types, ty);
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn candidates_follow_assignability() {
        let types = TypeRegistry::new();
        let pool = ComponentPool::with_literals(
            &types,
            [
                (TypeId::INT, Value::Int(1)),
                (TypeId::STRING, Value::string("a")),
                (TypeId::LONG, Value::Long(2)),
            ],
        )
        .unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.candidates(&types, TypeId::STRING).len(), 1);
        // Primitives box to Object.
        assert_eq!(pool.candidates(&types, TypeId::OBJECT).len(), 3);
        // int widens to long.
        assert_eq!(pool.candidates(&types, TypeId::LONG).len(), 2);
        assert!(pool.candidates(&types, TypeId::BOOLEAN).is_empty());
    }

    #[test]
    fn duplicates_are_not_added() {
        let types = TypeRegistry::new();
        let mut pool = ComponentPool::new();
        assert!(pool.add_literal(&types, TypeId::INT, Value::Int(3)).unwrap());
        assert!(!pool.add_literal(&types, TypeId::INT, Value::Int(3)).unwrap());
        assert_eq!(pool.len(), 1);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(pool.pick(&types, TypeId::INT, &mut rng).is_some());
        assert!(pool.add_literal(&types, TypeId::INT, Value::string("x")).is_err());
    }
}
