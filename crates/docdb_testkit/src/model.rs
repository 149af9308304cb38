//! Reference model for mutable array edits.
//!
//! [`ArrayModel`] applies the same operations as a [`MutableArray`] to a
//! plain `Vec<Value>`, so the two can be compared after any sequence.

use docdb_core::{CoreError, CoreResult, MutableArray, Value};

/// One array edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayOp {
    /// Replace the element at `index`.
    Set {
        /// Target index.
        index: usize,
        /// New element.
        value: Value,
    },
    /// Insert before `index` (`index == count` appends).
    Insert {
        /// Target index.
        index: usize,
        /// New element.
        value: Value,
    },
    /// Append at the end.
    Append {
        /// New element.
        value: Value,
    },
    /// Remove the element at `index`.
    Remove {
        /// Target index.
        index: usize,
    },
}

impl ArrayOp {
    /// Applies this edit to a mutable array.
    ///
    /// # Errors
    ///
    /// Returns the array's error, e.g. [`CoreError::IndexOutOfRange`].
    pub fn apply(&self, array: &MutableArray) -> CoreResult<()> {
        match self {
            ArrayOp::Set { index, value } => array.set(*index, value.clone()),
            ArrayOp::Insert { index, value } => array.insert(*index, value.clone()),
            ArrayOp::Append { value } => array.append(value.clone()),
            ArrayOp::Remove { index } => array.remove(*index).map(drop),
        }
    }
}

/// A `Vec`-backed model of an array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayModel {
    values: Vec<Value>,
}

impl ArrayModel {
    /// Creates a model holding `values`.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Applies an edit with the same bounds rules as [`MutableArray`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] for an out-of-bounds index.
    pub fn apply(&mut self, op: &ArrayOp) -> CoreResult<()> {
        let count = self.values.len();
        match op {
            ArrayOp::Set { index, value } => {
                let slot = self
                    .values
                    .get_mut(*index)
                    .ok_or_else(|| CoreError::index_out_of_range(*index, count))?;
                *slot = value.clone();
            }
            ArrayOp::Insert { index, value } => {
                if *index > count {
                    return Err(CoreError::index_out_of_range(*index, count));
                }
                self.values.insert(*index, value.clone());
            }
            ArrayOp::Append { value } => self.values.push(value.clone()),
            ArrayOp::Remove { index } => {
                if *index >= count {
                    return Err(CoreError::index_out_of_range(*index, count));
                }
                self.values.remove(*index);
            }
        }
        Ok(())
    }

    /// The modelled elements.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdb_core::ReadOnlyArray;

    #[test]
    fn model_matches_index_shift_example() {
        let start: Vec<Value> = ["a", "b", "c"].into_iter().map(Value::from).collect();
        let mut model = ArrayModel::new(start.clone());
        let array = ReadOnlyArray::from_values(start).to_mutable();

        let ops = [
            ArrayOp::Insert { index: 1, value: Value::from("x") },
            ArrayOp::Remove { index: 2 },
        ];
        for op in &ops {
            model.apply(op).unwrap();
            op.apply(&array).unwrap();
        }

        let expected: Vec<Value> = ["a", "x", "c"].into_iter().map(Value::from).collect();
        assert_eq!(model.values(), expected.as_slice());
        assert_eq!(array.to_read_only().iter().cloned().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn model_rejects_like_the_array() {
        let mut model = ArrayModel::default();
        let array = MutableArray::new();
        let op = ArrayOp::Remove { index: 0 };
        assert!(model.apply(&op).is_err());
        assert!(matches!(
            op.apply(&array),
            Err(CoreError::IndexOutOfRange { index: 0, count: 0 })
        ));
    }
}
