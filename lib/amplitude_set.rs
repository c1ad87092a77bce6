//! Storage of a model's hopping amplitudes, its basis, and the sparse matrix
//! snapshot handed to eigenstate solvers.

use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    amplitude::HoppingAmplitude,
    index::Index,
    tb_assert,
    tree::{ AmplitudeCursor, AmplitudeTree },
};

/// Sparse matrix in coordinate format: three parallel sequences of equal
/// length, one entry per distinct (row, column) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct CooMatrix {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub values: Vec<C64>,
}

impl CooMatrix {
    /// Return the number of stored entries.
    pub fn len(&self) -> usize { self.values.len() }

    /// Return `true` if there are no stored entries.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Expand into a dense `n × n` matrix.
    ///
    /// *Panics* if an entry lies outside the matrix.
    pub fn to_dense(&self, n: usize) -> nd::Array2<C64> {
        let mut H: nd::Array2<C64> = nd::Array2::zeros((n, n));
        self.rows.iter().zip(&self.cols).zip(&self.values)
            .for_each(|((i, j), v)| { H[[*i, *j]] += *v; });
        H
    }
}

/// Flat interchange form of an [`AmplitudeSet`].
///
/// Row `k` of `table` holds the `from` index of the `k`-th amplitude in its
/// first `max_index_len` columns and the `to` index in the rest, both
/// left-aligned and padded with `-1`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tabulation {
    pub amplitudes: nd::Array1<C64>,
    pub table: nd::Array2<i32>,
    pub max_index_len: usize,
}

/// A collection of [`HoppingAmplitude`]s together with the basis they span.
///
/// The set goes through three stages:
/// 1. amplitudes are [added][Self::add];
/// 2. [`Self::construct`] sorts the amplitudes and fixes the basis, after which
///    no more amplitudes may be added;
/// 3. a [COO snapshot][Self::construct_coo] is built from the sorted
///    amplitudes. Since amplitude values may still change (see
///    [`Amplitude::Callback`][crate::Amplitude::Callback]), the snapshot can be
///    [rebuilt][Self::reconstruct_coo]; it is never updated in place.
#[derive(Clone, Debug, Default)]
pub struct AmplitudeSet {
    tree: AmplitudeTree,
    sorted: bool,
    coo: Option<CooMatrix>,
}

impl AmplitudeSet {
    /// Create a new, empty set.
    pub fn new() -> Self { Self::default() }

    /// Add an amplitude.
    ///
    /// *Panics* if the set has already been constructed.
    pub fn add(&mut self, ha: HoppingAmplitude) {
        tb_assert!(
            !self.sorted,
            "AmplitudeSet::add()",
            "The basis has already been constructed.",
            "Add all amplitudes before calling AmplitudeSet::construct().",
        );
        self.tree.insert(ha);
    }

    /// Add an amplitude together with its
    /// [Hermitian conjugate][HoppingAmplitude::hermitian_conjugate].
    pub fn add_with_hc(&mut self, ha: HoppingAmplitude) {
        let hc = ha.hermitian_conjugate();
        self.add(ha);
        self.add(hc);
    }

    /// Sort the amplitudes and assign every distinct index a basis position.
    ///
    /// Calling this more than once has no further effect.
    pub fn construct(&mut self) {
        if self.sorted { return; }
        self.tree.sort();
        self.sorted = true;
    }

    /// Return `true` if [`Self::construct`] has been called.
    pub fn is_sorted(&self) -> bool { self.sorted }

    /// Return the number of stored amplitudes.
    pub fn len(&self) -> usize { self.tree.len() }

    /// Return `true` if no amplitudes are stored.
    pub fn is_empty(&self) -> bool { self.tree.is_empty() }

    /// Return the number of basis elements.
    ///
    /// This is zero until the set is constructed.
    pub fn basis_size(&self) -> usize { self.tree.basis_size() }

    /// Return all basis elements ordered by basis position.
    pub fn basis(&self) -> &[Index] { self.tree.basis() }

    /// Return the basis position of `index`, or `None` if `index` is not part
    /// of the basis.
    ///
    /// *Panics* if the set has not been constructed.
    pub fn basis_index(&self, index: &Index) -> Option<usize> {
        tb_assert!(
            self.sorted,
            "AmplitudeSet::basis_index()",
            "The basis has not been constructed.",
            "Call AmplitudeSet::construct() first.",
        );
        self.tree.basis_index(index)
    }

    /// Return a cursor over all amplitudes.
    pub fn cursor(&self) -> AmplitudeCursor<'_> { self.tree.cursor() }

    /// Return a cursor over all amplitudes whose `from` index starts with
    /// `subspace`.
    pub fn cursor_at(&self, subspace: &Index) -> AmplitudeCursor<'_> {
        self.tree.cursor_at(subspace)
    }

    // (from, to) basis positions of an amplitude in a sorted tree
    fn positions(&self, ha: &HoppingAmplitude) -> (usize, usize) {
        let from = self.tree.basis_index(&ha.from)
            .expect("AmplitudeSet: stored index without basis position");
        let to = self.tree.basis_index(&ha.to)
            .expect("AmplitudeSet: stored index without basis position");
        (from, to)
    }

    /// Build the COO snapshot of the Hamiltonian.
    ///
    /// The sorted amplitudes are walked in (`from`, `to`) basis order, which is
    /// column-major with respect to `H[to, from]`. Each entry is therefore
    /// stored Hermitian-conjugated: the `from` position becomes the row, the
    /// `to` position the column, and the value is conjugated. Amplitudes
    /// sharing the same pair of positions are summed into a single entry.
    ///
    /// *Panics* if the set has not been constructed or a snapshot already
    /// exists.
    pub fn construct_coo(&mut self) {
        tb_assert!(
            self.sorted,
            "AmplitudeSet::construct_coo()",
            "Amplitudes not sorted.",
            "Call AmplitudeSet::construct() first.",
        );
        tb_assert!(
            self.coo.is_none(),
            "AmplitudeSet::construct_coo()",
            "Hamiltonian on COO format already constructed.",
            "Call AmplitudeSet::destruct_coo() or \
            AmplitudeSet::reconstruct_coo() instead.",
        );

        // count
        let mut num_elements: usize = 0;
        let mut current_col: Option<usize> = None;
        let mut current_row: Option<usize> = None;
        for ha in self.tree.cursor() {
            let (col, row) = self.positions(ha);
            if current_col.map_or(true, |c| col > c) {
                current_col = Some(col);
                current_row = None;
            }
            if current_row.map_or(true, |r| row > r) {
                current_row = Some(row);
                num_elements += 1;
            }
        }

        // fill
        let mut rows: Vec<usize> = Vec::with_capacity(num_elements);
        let mut cols: Vec<usize> = Vec::with_capacity(num_elements);
        let mut values: Vec<C64> = Vec::with_capacity(num_elements);
        current_col = None;
        current_row = None;
        for ha in self.tree.cursor() {
            let (col, row) = self.positions(ha);
            let amplitude = ha.value();
            if current_col.map_or(true, |c| col > c) {
                current_col = Some(col);
                current_row = None;
            }
            if current_row.map_or(true, |r| row > r) {
                current_row = Some(row);
                // conjugate transpose; see above
                rows.push(col);
                cols.push(row);
                values.push(amplitude.conj());
            } else if let Some(last) = values.last_mut() {
                *last += amplitude.conj();
            }
        }
        debug!(
            "constructed COO snapshot with {} matrix elements for basis size {}",
            values.len(),
            self.basis_size(),
        );
        self.coo = Some(CooMatrix { rows, cols, values });
    }

    /// Release the COO snapshot, if any.
    pub fn destruct_coo(&mut self) { self.coo = None; }

    /// Rebuild the COO snapshot from the current amplitude values.
    ///
    /// Does nothing if no snapshot currently exists.
    pub fn reconstruct_coo(&mut self) {
        if self.coo.is_some() {
            self.destruct_coo();
            self.construct_coo();
        }
    }

    /// Return the COO snapshot, if one exists.
    pub fn coo(&self) -> Option<&CooMatrix> { self.coo.as_ref() }

    /// Return the number of entries in the COO snapshot.
    ///
    /// *Panics* if no snapshot exists.
    pub fn num_matrix_elements(&self) -> usize {
        tb_assert!(
            self.coo.is_some(),
            "AmplitudeSet::num_matrix_elements()",
            "COO format not constructed.",
            "Call AmplitudeSet::construct_coo() first.",
        );
        self.coo.as_ref().map_or(0, CooMatrix::len)
    }

    /// Export all amplitudes in [flat form][Tabulation], in traversal order.
    pub fn tabulate(&self) -> Tabulation {
        let max_index_len: usize
            = self.tree.cursor()
            .map(|ha| ha.max_index_len())
            .max()
            .unwrap_or(0);
        let n = self.tree.len();
        let mut table: nd::Array2<i32>
            = nd::Array2::from_elem((n, 2 * max_index_len), -1);
        let mut amplitudes: nd::Array1<C64> = nd::Array1::zeros(n);
        for (k, ha) in self.tree.cursor().enumerate() {
            let mut row = table.row_mut(k);
            ha.from.iter().enumerate()
                .for_each(|(j, v)| { row[j] = *v; });
            ha.to.iter().enumerate()
                .for_each(|(j, v)| { row[max_index_len + j] = *v; });
            amplitudes[k] = ha.value();
        }
        Tabulation { amplitudes, table, max_index_len }
    }
}
