//! Seed literals and random primitive values.
//!
//! Reproducibility: every random choice goes through the generator's
//! `ChaCha8Rng`, so the same seed yields the same values.

use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use seqgen_core::{EnumConstant, PrimitiveType, TypeId, TypeRegistry, Value};

/// Literals every pool starts with: a few boundary values per primitive
/// type and `String`, and every constant of every registered enum.
pub fn seed_literals(types: &TypeRegistry) -> Vec<(TypeId, Value)> {
    let mut out = vec![
        (TypeId::BOOLEAN, Value::Boolean(true)),
        (TypeId::BOOLEAN, Value::Boolean(false)),
        (TypeId::CHAR, Value::Char('a')),
        (TypeId::BYTE, Value::Byte(0)),
        (TypeId::BYTE, Value::Byte(-1)),
        (TypeId::SHORT, Value::Short(0)),
        (TypeId::SHORT, Value::Short(1)),
        (TypeId::LONG, Value::Long(0)),
        (TypeId::LONG, Value::Long(-1)),
        (TypeId::FLOAT, Value::Float(0.0)),
        (TypeId::DOUBLE, Value::Double(0.0)),
        (TypeId::DOUBLE, Value::Double(1.0)),
        (TypeId::STRING, Value::string("")),
        (TypeId::STRING, Value::string("hi!")),
    ];
    out.extend([-1, 0, 1, 10, 100].map(|v| (TypeId::INT, Value::Int(v))));

    for id in types.ids() {
        let Some(constants) = types.enum_constants(id) else {
            continue;
        };
        let type_name: Arc<str> = Arc::from(types.name_of(id));
        for (ordinal, name) in constants.iter().enumerate() {
            let constant = EnumConstant {
                type_name: Arc::clone(&type_name),
                name: Arc::from(name.as_str()),
                ordinal: ordinal as u32,
            };
            out.push((id, Value::Enum(constant)));
        }
    }
    out
}

/// A random value of primitive or `String` type `ty`, `None` for other types.
///
/// Boundary values (0, 1, -1, MIN, MAX) are weighted into the mix.
pub fn random_value(types: &TypeRegistry, ty: TypeId, rng: &mut ChaCha8Rng) -> Option<Value> {
    if ty == TypeId::STRING {
        let len = rng.gen_range(0..8);
        let s: String = (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
        return Some(Value::string(s));
    }
    let boundary = rng.gen_ratio(3, 10);
    let value = match types.primitive(ty)? {
        PrimitiveType::Boolean => Value::Boolean(rng.gen_bool(0.5)),
        PrimitiveType::Char => Value::Char(rng.gen_range(' '..='~')),
        PrimitiveType::Byte if boundary => Value::Byte(pick(rng, &[0, 1, -1, i8::MIN, i8::MAX])),
        PrimitiveType::Byte => Value::Byte(rng.gen()),
        PrimitiveType::Short if boundary => Value::Short(pick(rng, &[0, 1, -1, i16::MIN, i16::MAX])),
        PrimitiveType::Short => Value::Short(rng.gen()),
        PrimitiveType::Int if boundary => Value::Int(pick(rng, &[0, 1, -1, i32::MIN, i32::MAX])),
        // Small magnitudes hit interesting branches far more often.
        PrimitiveType::Int => Value::Int(rng.gen_range(-100..=100)),
        PrimitiveType::Long if boundary => Value::Long(pick(rng, &[0, 1, -1, i64::MIN, i64::MAX])),
        PrimitiveType::Long => Value::Long(rng.gen_range(-1000..=1000)),
        PrimitiveType::Float if boundary => Value::Float(pick(rng, &[0.0, -0.0, 1.0, -1.0])),
        PrimitiveType::Float => Value::Float(rng.gen_range(-1e6f32..1e6f32)),
        PrimitiveType::Double if boundary => Value::Double(pick(rng, &[0.0, -0.0, 1.0, -1.0])),
        PrimitiveType::Double => Value::Double(rng.gen_range(-1e12f64..1e12f64)),
    };
    Some(value)
}

fn pick<T: Copy>(rng: &mut ChaCha8Rng, values: &[T]) -> T {
    values[rng.gen_range(0..values.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn seeds_cover_enum_constants() {
        let mut types = TypeRegistry::new();
        let color = types.register_enum("test.Color", &["RED", "GREEN"]).unwrap();
        let seeds = seed_literals(&types);
        let names: Vec<_> = seeds
            .iter()
            .filter(|(ty, _)| *ty == color)
            .map(|(_, v)| v.to_literal().unwrap_or_default())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(seeds.iter().any(|(ty, v)| *ty == TypeId::INT && *v == Value::Int(0)));
    }

    #[test]
    fn same_seed_same_values() {
        let types = TypeRegistry::new();
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        for ty in [TypeId::INT, TypeId::LONG, TypeId::STRING, TypeId::DOUBLE, TypeId::CHAR] {
            assert_eq!(random_value(&types, ty, &mut a), random_value(&types, ty, &mut b));
        }
    }

    #[test]
    fn no_value_for_reference_types() {
        let types = TypeRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(random_value(&types, TypeId::OBJECT, &mut rng), None);
    }
}
