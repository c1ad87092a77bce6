//! Expansion of wildcard patterns into concrete indices and output offsets.
//!
//! A pattern is an [`Index`] whose entries may be wildcards, paired with a
//! `ranges` sequence giving the number of values each wildcard takes. Free
//! wildcards each contribute one dimension to the output, in index order;
//! [`SUM_ALL`][crate::SUM_ALL] wildcards are expanded without contributing a
//! dimension, so every value they take maps to the same output cell.
//!
//! For example, the pattern `{IDX_X, SUM_ALL, IDX_Y}` with ranges `[2, 3, 4]`
//! gives a `2 × 4` output whose cell `[x, y]` (at row-major offset `4x + y`)
//! collects the three indices `{x, 0, y}`, `{x, 1, y}`, `{x, 2, y}`.

use crate::index::{ Index, IndexKind };

/// Force `ranges[n] = 1` wherever `pattern[n]` is concrete.
///
/// *Panics* if `ranges` is shorter than `pattern`.
pub fn ensure_compliant_ranges(pattern: &Index, ranges: &mut [usize]) {
    pattern.iter().zip(ranges.iter_mut())
        .filter(|(p, _)| **p >= 0)
        .for_each(|(_, r)| { *r = 1; });
}

/// Return the output shape of a pattern: one entry per free wildcard, in index
/// order.
///
/// [`SUM_ALL`][crate::SUM_ALL] and [`SPIN`][crate::SPIN] entries contribute no
/// dimension.
pub fn loop_ranges(pattern: &Index, ranges: &[usize]) -> Vec<usize> {
    pattern.iter().zip(ranges)
        .filter(|(p, _)| IndexKind::of(**p) == IndexKind::Free)
        .map(|(_, r)| *r)
        .collect()
}

/// Lazy, restartable sequence of `(index, offset)` pairs produced by
/// expanding a pattern.
///
/// The first wildcard varies fastest. Offsets are row-major over the free
/// wildcards, i.e. they address an array shaped like [`loop_ranges`].
/// [`SPIN`][crate::SPIN] entries are never expanded and appear unchanged in
/// the produced indices; spin-resolved quantities substitute them
/// separately.
#[derive(Clone, Debug)]
pub struct PatternExpansion {
    pattern: Index,
    // (position, range, stride); stride is 0 for summed positions
    wildcards: Vec<(usize, usize, usize)>,
    counters: Vec<usize>,
    done: bool,
}

impl PatternExpansion {
    /// Create a new expansion.
    ///
    /// *Panics* if `ranges` is shorter than `pattern`.
    pub fn new(pattern: &Index, ranges: &[usize]) -> Self {
        let mut wildcards: Vec<(usize, usize, usize)> = Vec::new();
        let mut stride: usize = 1;
        for (n, p) in pattern.iter().enumerate().rev() {
            match IndexKind::of(*p) {
                IndexKind::Free => {
                    wildcards.push((n, ranges[n], stride));
                    stride *= ranges[n];
                },
                IndexKind::SumAll => { wildcards.push((n, ranges[n], 0)); },
                IndexKind::Spin | IndexKind::Concrete(_) => { },
            }
        }
        wildcards.reverse();
        let counters = vec![0; wildcards.len()];
        let mut expansion = Self {
            pattern: pattern.clone(),
            wildcards,
            counters,
            done: false,
        };
        expansion.reset();
        expansion
    }

    /// Rewind to the first pair.
    pub fn reset(&mut self) {
        self.counters.iter_mut().for_each(|c| { *c = 0; });
        self.done = self.wildcards.iter().any(|(_, range, _)| *range == 0);
    }

    /// Return the total number of pairs in the sequence.
    pub fn num_indices(&self) -> usize {
        self.wildcards.iter().map(|(_, range, _)| *range).product()
    }

    fn step(&mut self) {
        for (counter, (_, range, _))
            in self.counters.iter_mut().zip(&self.wildcards)
        {
            *counter += 1;
            if *counter < *range { return; }
            *counter = 0;
        }
        self.done = true;
    }
}

impl Iterator for PatternExpansion {
    type Item = (Index, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done { return None; }
        let mut index = self.pattern.clone();
        let mut offset: usize = 0;
        for (counter, (n, _, stride))
            in self.counters.iter().zip(&self.wildcards)
        {
            index[*n] = *counter as i32;
            offset += *counter * *stride;
        }
        self.step();
        Some((index, offset))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::{ IDX_X, IDX_Y, SPIN, SUM_ALL };

    // direct recursive formulation, used as a reference
    fn expand_recursive(
        mut pattern: Index,
        ranges: &[usize],
        mut offset: usize,
        multiplier: usize,
        out: &mut Vec<(Index, usize)>,
    ) {
        let Some(p) = pattern.iter().rposition(|v| *v < 0 && *v != SPIN)
            else {
                out.push((pattern, offset));
                return;
            };
        let is_sum = pattern[p] == SUM_ALL;
        let next_multiplier
            = if is_sum { multiplier } else { multiplier * ranges[p] };
        for n in 0..ranges[p] {
            pattern[p] = n as i32;
            expand_recursive(pattern.clone(), ranges, offset, next_multiplier, out);
            if !is_sum { offset += multiplier; }
        }
    }

    fn check_against_recursive(pattern: Index, ranges: Vec<usize>) {
        let mut expected = Vec::new();
        expand_recursive(pattern.clone(), &ranges, 0, 1, &mut expected);
        let got: Vec<(Index, usize)>
            = PatternExpansion::new(&pattern, &ranges).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn compliant_ranges() {
        let pattern = Index::from([3, IDX_X, SUM_ALL]);
        let mut ranges = vec![7, 4, 5];
        ensure_compliant_ranges(&pattern, &mut ranges);
        assert_eq!(ranges, vec![1, 4, 5]);
        assert_eq!(loop_ranges(&pattern, &ranges), vec![4]);
    }

    #[test]
    fn spin_contributes_no_dimension() {
        let pattern = Index::from([IDX_X, SPIN, IDX_Y]);
        assert_eq!(loop_ranges(&pattern, &[2, 2, 3]), vec![2, 3]);
    }

    #[test]
    fn concrete_pattern_is_single_index() {
        let got: Vec<(Index, usize)>
            = PatternExpansion::new(&[1, 2].into(), &[1, 1]).collect();
        assert_eq!(got, vec![(Index::from([1, 2]), 0)]);
    }

    #[test]
    fn sum_all_collapses_offsets() {
        let pattern = Index::from([SUM_ALL, IDX_X]);
        let ranges = [5, 3];
        assert_eq!(loop_ranges(&pattern, &ranges), vec![3]);
        let expansion = PatternExpansion::new(&pattern, &ranges);
        assert_eq!(expansion.num_indices(), 15);
        let mut per_cell = [0; 3];
        for (index, offset) in expansion {
            assert_eq!(index[1] as usize, offset);
            per_cell[offset] += 1;
        }
        assert_eq!(per_cell, [5, 5, 5]);
    }

    #[test]
    fn row_major_offsets() {
        let pattern = Index::from([IDX_X, 0, IDX_Y]);
        for (index, offset) in PatternExpansion::new(&pattern, &[2, 1, 4]) {
            assert_eq!(offset, 4 * index[0] as usize + index[2] as usize);
        }
    }

    #[test]
    fn matches_recursive_formulation() {
        check_against_recursive([IDX_X, SUM_ALL, IDX_Y].into(), vec![2, 3, 4]);
        check_against_recursive([SUM_ALL, 1, IDX_X, SUM_ALL].into(), vec![2, 1, 3, 2]);
        check_against_recursive([IDX_X, IDX_Y, -9].into(), vec![3, 2, 2]);
        check_against_recursive([4, 2].into(), vec![1, 1]);
        check_against_recursive(Index::default(), vec![]);
    }

    #[test]
    fn zero_range_is_empty() {
        let expansion = PatternExpansion::new(&[IDX_X, IDX_Y].into(), &[3, 0]);
        assert_eq!(expansion.count(), 0);
    }

    #[test]
    fn restartable() {
        let mut expansion = PatternExpansion::new(&[IDX_X].into(), &[3]);
        let first: Vec<usize> = expansion.by_ref().map(|(_, o)| o).collect();
        assert!(expansion.next().is_none());
        expansion.reset();
        let second: Vec<usize> = expansion.map(|(_, o)| o).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(first, second);
    }
}
