//! Interface to eigenstate solvers.
//!
//! Solving the Hamiltonian is not the business of this crate; property
//! extraction only needs the finished eigenvalues and eigenvectors through the
//! [`EigenSolver`] trait. [`EigenSystem`] wraps the usual dense output of a
//! diagonalization routine, and with the `lapack` feature enabled,
//! `DiagonalizationSolver` produces one directly.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::{
    amplitude_set::AmplitudeSet,
    error::SolverError,
    index::Index,
    model::{ Model, ModelParams },
    statistics::Statistics,
};

/// Finished eigenstates of a model, as consumed by the
/// [`PropertyExtractor`][crate::PropertyExtractor].
pub trait EigenSolver {
    /// Number of basis elements, which is also the number of eigenstates.
    fn basis_size(&self) -> usize;

    /// Energy of the `n`-th eigenstate.
    fn eigenvalue(&self, n: usize) -> f64;

    /// Amplitude of the `n`-th eigenstate on a basis element.
    fn amplitude(&self, n: usize, index: &Index) -> C64;

    fn chemical_potential(&self) -> f64;

    fn temperature(&self) -> f64;

    fn statistics(&self) -> Statistics;

    /// Return all eigenvalues.
    fn eigenvalues(&self) -> nd::Array1<f64> {
        (0..self.basis_size()).map(|n| self.eigenvalue(n)).collect()
    }

    /// Return the occupation of the `n`-th eigenstate.
    fn occupation(&self, n: usize) -> f64 {
        self.statistics().occupation(
            self.eigenvalue(n),
            self.chemical_potential(),
            self.temperature(),
        )
    }
}

/// Eigenvalues and eigenvectors of a constructed [`AmplitudeSet`].
///
/// Eigenvectors are stored as the columns of a square matrix whose rows are
/// indexed by basis position.
#[derive(Clone, Debug)]
pub struct EigenSystem<'a> {
    amplitudes: &'a AmplitudeSet,
    params: ModelParams,
    E: nd::Array1<f64>,
    V: nd::Array2<C64>,
}

impl<'a> EigenSystem<'a> {
    /// Create a new `EigenSystem`, checking that all shapes agree with the
    /// basis of `amplitudes`.
    pub fn new(
        amplitudes: &'a AmplitudeSet,
        params: ModelParams,
        E: nd::Array1<f64>,
        V: nd::Array2<C64>,
    ) -> Result<Self, SolverError>
    {
        if !amplitudes.is_sorted() { return Err(SolverError::NotConstructed); }
        let n = amplitudes.basis_size();
        if E.len() != n {
            return Err(SolverError::EigenvalueCount { expected: n, got: E.len() });
        }
        if V.dim() != (n, n) {
            let (rows, cols) = V.dim();
            return Err(SolverError::EigenvectorShape { expected: n, rows, cols });
        }
        Ok(Self { amplitudes, params, E, V })
    }

    /// Create a new `EigenSystem` for a [`Model`].
    pub fn from_model(model: &'a Model, E: nd::Array1<f64>, V: nd::Array2<C64>)
        -> Result<Self, SolverError>
    {
        Self::new(model.amplitudes(), model.params, E, V)
    }

    /// Return the `n`-th eigenvector.
    pub fn eigenvector(&self, n: usize) -> nd::ArrayView1<'_, C64> {
        self.V.column(n)
    }

    /// Return the amplitude set whose basis indexes the eigenvectors.
    pub fn amplitudes(&self) -> &'a AmplitudeSet { self.amplitudes }

    pub fn params(&self) -> &ModelParams { &self.params }
}

impl<'a> EigenSolver for EigenSystem<'a> {
    fn basis_size(&self) -> usize { self.E.len() }

    fn eigenvalue(&self, n: usize) -> f64 { self.E[n] }

    /// Indices outside the basis have zero amplitude.
    fn amplitude(&self, n: usize, index: &Index) -> C64 {
        self.amplitudes.basis_index(index)
            .map(|i| self.V[[i, n]])
            .unwrap_or_else(C64::zero)
    }

    fn chemical_potential(&self) -> f64 { self.params.chemical_potential }

    fn temperature(&self) -> f64 { self.params.temperature }

    fn statistics(&self) -> Statistics { self.params.statistics }

    fn eigenvalues(&self) -> nd::Array1<f64> { self.E.clone() }
}

/// Dense diagonalization of a model's COO snapshot.
#[cfg(feature = "lapack")]
#[derive(Copy, Clone, Debug, Default)]
pub struct DiagonalizationSolver;

#[cfg(feature = "lapack")]
impl DiagonalizationSolver {
    /// Diagonalize the Hamiltonian of a constructed model.
    ///
    /// The model's COO snapshot is used if it exists; otherwise a temporary
    /// one is built.
    ///
    /// *Panics* if the underlying LAPACK routine fails.
    pub fn run(model: &Model) -> Result<EigenSystem<'_>, SolverError> {
        use ndarray_linalg::{ EighInto, UPLO };
        use tracing::info;

        if !model.is_constructed() { return Err(SolverError::NotConstructed); }
        let n = model.basis_size();
        let H: nd::Array2<C64>
            = match model.amplitudes().coo() {
                Some(coo) => coo.to_dense(n),
                None => {
                    let mut amplitudes = model.amplitudes().clone();
                    amplitudes.construct_coo();
                    amplitudes.coo()
                        .map(|coo| coo.to_dense(n))
                        .unwrap_or_else(|| nd::Array2::zeros((n, n)))
                },
            };
        info!("diagonalizing {n} x {n} Hamiltonian");
        let (E, V)
            = match H.eigh_into(UPLO::Lower) {
                Ok((E, V)) => (E, V),
                Err(err) => panic!("unexpected diagonalization error: {}", err),
            };
        EigenSystem::from_model(model, E, V)
    }
}
