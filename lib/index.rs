//! Physical indices: variable-length integer tuples identifying degrees of
//! freedom (site, orbital, spin, ...).
//!
//! Non-negative entries are concrete. Negative entries are wildcards used in
//! extraction patterns; see [`IndexKind`].

use std::{
    fmt,
    ops::{ Deref, DerefMut },
};
use itertools::Itertools;

/// Wildcard summed over internally; contributes no output dimension.
pub const SUM_ALL: i32 = -1;
/// Free wildcard conventionally used for the first spatial coordinate.
pub const IDX_X: i32 = -2;
/// Free wildcard conventionally used for the second spatial coordinate.
pub const IDX_Y: i32 = -3;
/// Free wildcard conventionally used for the third spatial coordinate.
pub const IDX_Z: i32 = -4;
/// Marks the spin position for spin-resolved quantities.
pub const SPIN: i32 = -5;

/// Classification of a single index entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// A fixed, non-negative value.
    Concrete(usize),
    /// [`SUM_ALL`]: every value maps to the same output cell.
    SumAll,
    /// [`SPIN`]: resolved explicitly by spin-resolved quantities.
    Spin,
    /// Any other negative value: contributes one output dimension.
    Free,
}

impl IndexKind {
    /// Classify a raw index entry.
    pub fn of(value: i32) -> Self {
        match value {
            v if v >= 0 => Self::Concrete(v as usize),
            SUM_ALL => Self::SumAll,
            SPIN => Self::Spin,
            _ => Self::Free,
        }
    }

    /// Return `true` for every kind except [`Self::Concrete`].
    pub fn is_wildcard(self) -> bool { !matches!(self, Self::Concrete(_)) }
}

/// A physical index.
///
/// Indices are ordered lexicographically, so a prefix sorts before any of its
/// extensions: `[0] < [0, 0] < [0, 1] < [1]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Index(Vec<i32>);

impl Index {
    /// Create a new index from its entries.
    pub fn new(entries: Vec<i32>) -> Self { Self(entries) }

    /// Return the entries as a slice.
    pub fn as_slice(&self) -> &[i32] { &self.0 }

    /// Classify the `n`-th entry, if it exists.
    pub fn kind(&self, n: usize) -> Option<IndexKind> {
        self.0.get(n).copied().map(IndexKind::of)
    }

    /// Return `true` if no entry is a wildcard.
    pub fn is_concrete(&self) -> bool { self.0.iter().all(|v| *v >= 0) }

    /// Return the position of the first [`SPIN`] marker.
    pub fn spin_position(&self) -> Option<usize> {
        self.0.iter().position(|v| *v == SPIN)
    }

    /// Return a copy of `self` with the `n`-th entry replaced.
    ///
    /// *Panics* if `n` is out of bounds.
    pub fn with(&self, n: usize, value: i32) -> Self {
        let mut new = self.clone();
        new.0[n] = value;
        new
    }

    /// Return `true` if `prefix` matches the leading entries of `self`.
    pub fn starts_with(&self, prefix: &Index) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl Deref for Index {
    type Target = Vec<i32>;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl DerefMut for Index {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.0 }
}

impl AsRef<[i32]> for Index {
    fn as_ref(&self) -> &[i32] { &self.0 }
}

impl From<Vec<i32>> for Index {
    fn from(entries: Vec<i32>) -> Self { Self(entries) }
}

impl From<&[i32]> for Index {
    fn from(entries: &[i32]) -> Self { Self(entries.to_vec()) }
}

impl<const N: usize> From<[i32; N]> for Index {
    fn from(entries: [i32; N]) -> Self { Self(entries.to_vec()) }
}

impl FromIterator<i32> for Index {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = i32>
    {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}
