#![allow(non_snake_case)]

//! Sparse, index-keyed storage of tight-binding Hamiltonians and extraction of
//! physical properties from their eigenstates.
//!
//! The typical workflow is
//! 1. insert [`HoppingAmplitude`]s into a [`Model`] (or a bare
//!    [`AmplitudeSet`]),
//! 2. [`construct`][Model::construct] the model to fix the basis,
//! 3. build the [COO snapshot][AmplitudeSet::construct_coo] and hand it to an
//!    eigenstate solver,
//! 4. wrap the solver's output in anything implementing [`EigenSolver`] and
//!    pass it to a [`PropertyExtractor`].

pub mod error;
pub mod index;
pub mod amplitude;
pub mod tree;
pub mod amplitude_set;
pub mod statistics;
pub mod model;
pub mod solver;
pub mod pattern;
pub mod properties;
pub mod extractor;
pub mod pool;

pub use error::{ ConfigError, ExtractError, SolverError };
pub use index::{ Index, IndexKind, SUM_ALL, IDX_X, IDX_Y, IDX_Z, SPIN };
pub use amplitude::{ Amplitude, HoppingAmplitude };
pub use tree::{ AmplitudeCursor, AmplitudeTree };
pub use amplitude_set::{ AmplitudeSet, CooMatrix, Tabulation };
pub use statistics::Statistics;
pub use model::{ Model, ModelParams };
pub use solver::{ EigenSolver, EigenSystem };
#[cfg(feature = "lapack")]
pub use solver::DiagonalizationSolver;
pub use pattern::PatternExpansion;
pub use properties::{
    Density,
    Dos,
    EigenValues,
    EnergyWindow,
    Ldos,
    Magnetization,
    SpinPolarizedLdos,
};
pub use extractor::PropertyExtractor;
pub use pool::{ DeviceGuard, DevicePool };
