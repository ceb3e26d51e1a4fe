//! # Seeded Train/Test Splitting
//!
//! One shuffled permutation plus a cut point partitions any number of
//! parallel sequences the same way.

use oorandom::Rand64;
use tracing::debug;

use crate::error::{AnnoprepError, Result};

/// Seeded source of row permutations.
///
/// Successive calls draw from the same generator, so a fixed seed and a
/// fixed call sequence always give the same partitions.
pub struct Splitter {
    rng: Rand64,
}

impl Splitter {
    /// Creates a splitter seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rand64::new(u128::from(seed)),
        }
    }

    /// Returns a uniformly shuffled permutation of `0..len` (Fisher-Yates).
    ///
    /// Written out over `Rand64` since oorandom has no slice shuffle; the
    /// `rand` shuffle's stream may change between releases, this one doesn't.
    pub fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        for i in (1..len).rev() {
            let j = self.rng.rand_range(0..(i as u64 + 1)) as usize;
            indices.swap(i, j);
        }
        indices
    }

    /// Shuffles `0..len` and cuts at `floor(len * (1 - test_size))`.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::InvalidSplit` unless `0 < test_size < 1`.
    pub fn partition(&mut self, len: usize, test_size: f64) -> Result<Partition> {
        validate_test_size(test_size)?;

        let indices = self.permutation(len);
        let cut = ((len as f64) * (1.0 - test_size)).floor() as usize;
        debug!(len, cut, test_size, "partitioned rows");

        Ok(Partition { indices, cut })
    }
}

/// A shuffled row order and the position where the test part begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    indices: Vec<usize>,
    cut: usize,
}

impl Partition {
    /// Number of rows partitioned.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if no rows were partitioned.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Row indices of the train part, in shuffled order.
    pub fn train_indices(&self) -> &[usize] {
        &self.indices[..self.cut]
    }

    /// Row indices of the test part, in shuffled order.
    pub fn test_indices(&self) -> &[usize] {
        &self.indices[self.cut..]
    }

    /// Splits `rows` into (train, test) following this partition.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::InvalidSplit` if `rows` does not have the
    /// partitioned length.
    pub fn apply<T: Clone>(&self, rows: &[T]) -> Result<(Vec<T>, Vec<T>)> {
        if rows.len() != self.len() {
            return Err(AnnoprepError::InvalidSplit(
                "All arrays must have the same length".into(),
            ));
        }
        let pick = |idx: &[usize]| idx.iter().map(|&i| rows[i].clone()).collect::<Vec<T>>();
        Ok((pick(self.train_indices()), pick(self.test_indices())))
    }
}

/// Splits several parallel sequences with one shared permutation.
///
/// Returns one `(train, test)` pair per input sequence, in input order.
///
/// # Errors
///
/// Returns `AnnoprepError::InvalidSplit` if no sequence is given, if
/// `test_size` is not strictly between 0 and 1, or if the sequences differ
/// in length.
pub fn train_test_split<T: Clone>(
    sequences: &[&[T]],
    test_size: f64,
    splitter: &mut Splitter,
) -> Result<Vec<(Vec<T>, Vec<T>)>> {
    let first = sequences
        .first()
        .ok_or_else(|| AnnoprepError::InvalidSplit("At least one array required as input".into()))?;
    validate_test_size(test_size)?;

    let len = first.len();
    if sequences.iter().any(|s| s.len() != len) {
        return Err(AnnoprepError::InvalidSplit(
            "All arrays must have the same length".into(),
        ));
    }

    let partition = splitter.partition(len, test_size)?;
    sequences.iter().map(|s| partition.apply(s)).collect()
}

fn validate_test_size(test_size: f64) -> Result<()> {
    if test_size > 0.0 && test_size < 1.0 {
        Ok(())
    } else {
        Err(AnnoprepError::InvalidSplit(
            "test_size must be between 0 and 1".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn permutation_is_complete() {
        let mut splitter = Splitter::new(7);
        let perm = splitter.permutation(100);
        let set: BTreeSet<usize> = perm.iter().copied().collect();
        assert_eq!(set, (0..100).collect::<BTreeSet<usize>>());
        assert_ne!(perm, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_partition() {
        let a = Splitter::new(1314).partition(50, 0.2).unwrap();
        let b = Splitter::new(1314).partition(50, 0.2).unwrap();
        assert_eq!(a, b);

        let c = Splitter::new(1315).partition(50, 0.2).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn cut_point_floors() {
        let mut splitter = Splitter::new(1);
        let cases = [(10, 0.2, 8), (8, 0.125, 7), (7, 0.125, 6), (3, 0.5, 1), (0, 0.2, 0)];
        for (len, test_size, train) in cases {
            let p = splitter.partition(len, test_size).unwrap();
            assert_eq!(p.train_indices().len(), train, "len={len} test_size={test_size}");
            assert_eq!(p.test_indices().len(), len - train);
        }
    }

    #[test]
    fn parts_are_disjoint_and_cover_all_rows() {
        let p = Splitter::new(3).partition(37, 0.3).unwrap();
        let train: BTreeSet<usize> = p.train_indices().iter().copied().collect();
        let test: BTreeSet<usize> = p.test_indices().iter().copied().collect();

        assert!(train.is_disjoint(&test));
        assert_eq!(train.union(&test).count(), 37);
    }

    #[test]
    fn parallel_sequences_stay_aligned() {
        let ids: Vec<u32> = (0..20).collect();
        let names: Vec<u32> = ids.iter().map(|i| i * 10).collect();

        let mut splitter = Splitter::new(42);
        let parts = train_test_split(&[&ids[..], &names[..]], 0.25, &mut splitter).unwrap();

        assert_eq!(parts.len(), 2);
        let (ids_train, ids_test) = &parts[0];
        let (names_train, names_test) = &parts[1];
        assert_eq!(ids_train.len(), 15);
        assert_eq!(ids_test.len(), 5);
        for (id, name) in ids_train.iter().zip(names_train).chain(ids_test.iter().zip(names_test)) {
            assert_eq!(id * 10, *name);
        }
    }

    #[test]
    fn rejects_bad_arguments() {
        let mut splitter = Splitter::new(0);
        let rows = [1, 2, 3];
        let short = [1, 2];

        let err = train_test_split::<i32>(&[], 0.2, &mut splitter).unwrap_err();
        assert!(err.to_string().contains("At least one array"));

        for bad in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(train_test_split(&[&rows[..]], bad, &mut splitter).is_err());
        }

        let err = train_test_split(&[&rows[..], &short[..]], 0.2, &mut splitter).unwrap_err();
        assert!(err.to_string().contains("same length"));
    }

    #[test]
    fn apply_checks_length() {
        let p = Splitter::new(0).partition(4, 0.5).unwrap();
        assert!(p.apply(&[1, 2, 3]).is_err());
        let (train, test) = p.apply(&["a", "b", "c", "d"]).unwrap();
        assert_eq!(train.len() + test.len(), 4);
    }
}
