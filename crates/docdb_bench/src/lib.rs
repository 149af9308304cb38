//! Benchmark utilities.

#![warn(missing_docs)]

use docdb_core::{ReadOnlyArray, ReadOnlyDictionary, Value};
use rand::Rng;

/// Generate a random scalar value.
pub fn random_scalar<R: Rng>(rng: &mut R) -> Value {
    match rng.gen_range(0..4) {
        0 => Value::Bool(rng.gen()),
        1 => Value::Integer(rng.gen()),
        2 => Value::Float(rng.gen_range(-1.0e6..1.0e6)),
        _ => Value::String(format!("value-{}", rng.gen::<u32>())),
    }
}

/// Generate a flat document body with `fields` scalar fields.
pub fn flat_body(fields: usize) -> ReadOnlyDictionary {
    let mut rng = rand::thread_rng();
    (0..fields)
        .map(|i| (format!("field_{i}"), random_scalar(&mut rng)))
        .collect()
}

/// Generate a body nested `depth` levels deep, `width` keys per level,
/// with an array of `width` scalars at every level.
pub fn nested_body(depth: usize, width: usize) -> ReadOnlyDictionary {
    let mut rng = rand::thread_rng();
    nested(&mut rng, depth, width)
}

fn nested<R: Rng>(rng: &mut R, depth: usize, width: usize) -> ReadOnlyDictionary {
    let mut entries: Vec<(String, Value)> = (0..width)
        .map(|i| {
            let value = if depth == 0 {
                random_scalar(rng)
            } else {
                Value::Dictionary(nested(rng, depth - 1, width))
            };
            (format!("key_{i}"), value)
        })
        .collect();
    let items: ReadOnlyArray = (0..width).map(|_| random_scalar(rng)).collect();
    entries.push(("items".to_string(), Value::Array(items)));
    ReadOnlyDictionary::from_entries(entries)
}

/// Generate `count` document identifiers.
pub fn generate_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("doc-{i:06}")).collect()
}
