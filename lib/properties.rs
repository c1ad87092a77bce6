//! Output tensors produced by the [`PropertyExtractor`][crate::PropertyExtractor].
//!
//! Every pattern-driven property is stored as a row-major [`nd::ArrayD`]
//! whose leading axes are the pattern's [loop ranges][crate::pattern::loop_ranges]
//! and whose trailing axes (if any) hold the per-cell block: an energy axis of
//! length `resolution` for the local densities of states, and a `2 × 2` spin
//! block for the spin-resolved quantities.

use ndarray as nd;
use num_complex::Complex64 as C64;

/// Energy interval `[lower, upper)` divided into `resolution` equal bins.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnergyWindow {
    pub lower: f64,
    pub upper: f64,
    pub resolution: usize,
}

impl EnergyWindow {
    /// Create a new `EnergyWindow`.
    pub fn new(lower: f64, upper: f64, resolution: usize) -> Self {
        Self { lower, upper, resolution }
    }

    /// Return `true` if the window is non-empty and has at least one bin.
    pub fn is_valid(&self) -> bool {
        self.upper > self.lower && self.resolution > 0
    }

    /// Width of a single bin.
    pub fn step(&self) -> f64 {
        (self.upper - self.lower) / self.resolution as f64
    }

    /// Return `true` if `energy` lies in `[lower, upper)`.
    pub fn contains(&self, energy: f64) -> bool {
        (self.lower..self.upper).contains(&energy)
    }

    /// Return the bin of `energy`, or `None` if it falls outside the window.
    pub fn bin(&self, energy: f64) -> Option<usize> {
        if !self.contains(energy) { return None; }
        let e = ((energy - self.lower) / self.step()).floor() as usize;
        (e < self.resolution).then_some(e)
    }

    /// Return the bin of `energy`, or `None` if it falls outside the window.
    ///
    /// Unlike [`Self::bin`], a bin index pushed past the last bin by rounding
    /// is clamped to the last bin.
    pub fn bin_clamped(&self, energy: f64) -> Option<usize> {
        if !self.contains(energy) { return None; }
        let e = ((energy - self.lower) / self.step()).floor() as usize;
        Some(e.min(self.resolution - 1))
    }

    /// Return the lower edge of every bin.
    pub fn energies(&self) -> nd::Array1<f64> {
        (0..self.resolution)
            .map(|k| self.lower + k as f64 * self.step())
            .collect()
    }
}

/// Eigenvalues of a solved model, in the order given by the solver.
#[derive(Clone, Debug, PartialEq)]
pub struct EigenValues {
    pub data: nd::Array1<f64>,
}

impl EigenValues {
    pub fn len(&self) -> usize { self.data.len() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

/// Occupation-weighted particle density.
///
/// Shape: loop ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct Density {
    pub data: nd::ArrayD<f64>,
}

impl Density {
    /// Return the loop ranges of the pattern this density was computed for.
    pub fn ranges(&self) -> &[usize] { self.data.shape() }

    /// Return the number of loop dimensions.
    pub fn dimensions(&self) -> usize { self.data.ndim() }

    /// Return the density at a point of the loop ranges.
    pub fn get(&self, point: &[usize]) -> Option<f64> {
        self.data.get(point).copied()
    }
}

/// Spin-resolved density matrix `⟨c†(σ) c(σ')⟩`.
///
/// Shape: loop ranges `× 2 × 2`, the last two axes being `σ` and `σ'`
/// (0 = up, 1 = down).
#[derive(Clone, Debug, PartialEq)]
pub struct Magnetization {
    pub data: nd::ArrayD<C64>,
}

impl Magnetization {
    /// Return the loop ranges of the pattern this was computed for.
    pub fn ranges(&self) -> &[usize] {
        let shape = self.data.shape();
        &shape[..shape.len() - 2]
    }

    pub fn dimensions(&self) -> usize { self.data.ndim() - 2 }

    /// Return the `2 × 2` spin matrix at a point of the loop ranges.
    pub fn get(&self, point: &[usize]) -> Option<nd::ArrayView2<'_, C64>> {
        if point.len() != self.dimensions() { return None; }
        let mut view = self.data.view();
        for k in point.iter() {
            if *k >= view.shape()[0] { return None; }
            view = view.index_axis_move(nd::Axis(0), *k);
        }
        view.into_dimensionality::<nd::Ix2>().ok()
    }
}

/// Density of states over an [`EnergyWindow`].
#[derive(Clone, Debug, PartialEq)]
pub struct Dos {
    pub window: EnergyWindow,
    pub data: nd::Array1<f64>,
}

impl Dos {
    pub fn lower_bound(&self) -> f64 { self.window.lower }

    pub fn upper_bound(&self) -> f64 { self.window.upper }

    pub fn resolution(&self) -> usize { self.window.resolution }
}

/// Local density of states.
///
/// Shape: loop ranges `× resolution`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ldos {
    pub window: EnergyWindow,
    pub data: nd::ArrayD<f64>,
}

impl Ldos {
    /// Return the loop ranges of the pattern this was computed for.
    pub fn ranges(&self) -> &[usize] {
        let shape = self.data.shape();
        &shape[..shape.len() - 1]
    }

    pub fn dimensions(&self) -> usize { self.data.ndim() - 1 }
}

/// Spin-resolved local density of states.
///
/// Shape: loop ranges `× resolution × 2 × 2`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinPolarizedLdos {
    pub window: EnergyWindow,
    pub data: nd::ArrayD<C64>,
}

impl SpinPolarizedLdos {
    /// Return the loop ranges of the pattern this was computed for.
    pub fn ranges(&self) -> &[usize] {
        let shape = self.data.shape();
        &shape[..shape.len() - 3]
    }

    pub fn dimensions(&self) -> usize { self.data.ndim() - 3 }
}
