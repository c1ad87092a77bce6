//! Hopping amplitudes: weighted directed edges of the Hamiltonian graph.

use std::{ fmt, sync::Arc };
use num_complex::Complex64 as C64;
use crate::index::Index;

/// Signature of a lazily evaluated amplitude.
///
/// The function is passed the `to` and `from` indices of the amplitude, in
/// that order. It must be shareable across threads so that a constructed
/// model can be read from several workers at once.
pub type AmplitudeFn = Arc<dyn Fn(&Index, &Index) -> C64 + Send + Sync>;

/// Value of a [`HoppingAmplitude`].
#[derive(Clone)]
pub enum Amplitude {
    /// A fixed value.
    Value(C64),
    /// A function evaluated every time the value is read.
    ///
    /// Values produced this way may change between reads, which is the only
    /// way amplitudes change after
    /// [`AmplitudeSet::construct`][crate::AmplitudeSet::construct]; see
    /// [`AmplitudeSet::reconstruct_coo`][crate::AmplitudeSet::reconstruct_coo].
    Callback(AmplitudeFn),
}

impl fmt::Debug for Amplitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(a) => f.debug_tuple("Value").field(a).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<C64> for Amplitude {
    fn from(a: C64) -> Self { Self::Value(a) }
}

impl From<f64> for Amplitude {
    fn from(a: f64) -> Self { Self::Value(C64::from(a)) }
}

/// A single contribution `amplitude · c†(to) c(from)` to the Hamiltonian.
///
/// Amplitudes are stored keyed by their `from` index.
#[derive(Clone, Debug)]
pub struct HoppingAmplitude {
    pub amplitude: Amplitude,
    pub to: Index,
    pub from: Index,
}

impl HoppingAmplitude {
    /// Create a new `HoppingAmplitude` from a value or callback, the index
    /// hopped to, and the index hopped from.
    pub fn new<A, I, J>(amplitude: A, to: I, from: J) -> Self
    where
        A: Into<Amplitude>,
        I: Into<Index>,
        J: Into<Index>,
    {
        Self { amplitude: amplitude.into(), to: to.into(), from: from.into() }
    }

    /// Create a new `HoppingAmplitude` whose value is computed on demand.
    pub fn with_callback<F, I, J>(f: F, to: I, from: J) -> Self
    where
        F: Fn(&Index, &Index) -> C64 + Send + Sync + 'static,
        I: Into<Index>,
        J: Into<Index>,
    {
        Self {
            amplitude: Amplitude::Callback(Arc::new(f)),
            to: to.into(),
            from: from.into(),
        }
    }

    /// Return the current value of the amplitude.
    pub fn value(&self) -> C64 {
        match &self.amplitude {
            Amplitude::Value(a) => *a,
            Amplitude::Callback(f) => f(&self.to, &self.from),
        }
    }

    /// Return the Hermitian conjugate: `to` and `from` are swapped and fixed
    /// values are conjugated.
    ///
    /// Callbacks are shared with the original and will be called with the
    /// swapped indices, so they are responsible for returning the conjugate
    /// themselves.
    pub fn hermitian_conjugate(&self) -> Self {
        let amplitude
            = match &self.amplitude {
                Amplitude::Value(a) => Amplitude::Value(a.conj()),
                Amplitude::Callback(f) => Amplitude::Callback(Arc::clone(f)),
            };
        Self { amplitude, to: self.from.clone(), from: self.to.clone() }
    }

    /// Return the length of the longer of the two indices.
    pub fn max_index_len(&self) -> usize { self.to.len().max(self.from.len()) }
}
