//! Per-quantity accumulation contexts.
//!
//! Each context carries exactly the configuration its quantity needs and
//! accumulates the contribution of every eigenstate at one concrete index into
//! that index's output block.

use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::{
    index::Index,
    properties::EnergyWindow,
    solver::EigenSolver,
};

/// A quantity computed by expanding a pattern.
pub trait Quantity {
    /// Element type of the output tensor.
    type Elem: Copy + Zero;

    /// Shape of the block accumulated for each output cell.
    fn block_shape(&self) -> Vec<usize>;

    /// Number of elements in each block.
    fn block_size(&self) -> usize { self.block_shape().iter().product() }

    /// Add the contributions of all eigenstates at `index` to `block`.
    fn accumulate<S>(&self, solver: &S, index: &Index, block: &mut [Self::Elem])
    where S: EigenSolver;
}

/// Occupation-weighted density `Σₙ f(Eₙ) |uₙ|²`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DensityContext;

impl Quantity for DensityContext {
    type Elem = f64;

    fn block_shape(&self) -> Vec<usize> { vec![] }

    fn accumulate<S>(&self, solver: &S, index: &Index, block: &mut [f64])
    where S: EigenSolver
    {
        for n in 0..solver.basis_size() {
            let weight = solver.occupation(n);
            let u = solver.amplitude(n, index);
            block[0] += u.norm_sqr() * weight;
        }
    }
}

// amplitudes of the n-th eigenstate with the spin entry set to up and down
fn spin_pair<S>(solver: &S, n: usize, up: &Index, down: &Index) -> (C64, C64)
where S: EigenSolver
{
    (solver.amplitude(n, up), solver.amplitude(n, down))
}

// add the 2x2 block conj(u_a) u_b, a, b in {up, down}
fn add_spin_block(block: &mut [C64], u_u: C64, u_d: C64, weight: f64) {
    block[0] += u_u.conj() * u_u * weight;
    block[1] += u_u.conj() * u_d * weight;
    block[2] += u_d.conj() * u_u * weight;
    block[3] += u_d.conj() * u_d * weight;
}

/// Occupation-weighted spin density matrix.
#[derive(Copy, Clone, Debug)]
pub struct MagnetizationContext {
    pub spin_position: usize,
}

impl Quantity for MagnetizationContext {
    type Elem = C64;

    fn block_shape(&self) -> Vec<usize> { vec![2, 2] }

    fn accumulate<S>(&self, solver: &S, index: &Index, block: &mut [C64])
    where S: EigenSolver
    {
        let up = index.with(self.spin_position, 0);
        let down = index.with(self.spin_position, 1);
        for n in 0..solver.basis_size() {
            let weight = solver.occupation(n);
            let (u_u, u_d) = spin_pair(solver, n, &up, &down);
            add_spin_block(block, u_u, u_d, weight);
        }
    }
}

/// Local density of states: `|uₙ|²` binned by `Eₙ`.
#[derive(Copy, Clone, Debug)]
pub struct LdosContext {
    pub window: EnergyWindow,
}

impl Quantity for LdosContext {
    type Elem = f64;

    fn block_shape(&self) -> Vec<usize> { vec![self.window.resolution] }

    fn accumulate<S>(&self, solver: &S, index: &Index, block: &mut [f64])
    where S: EigenSolver
    {
        for n in 0..solver.basis_size() {
            let Some(e) = self.window.bin_clamped(solver.eigenvalue(n))
                else { continue; };
            let u = solver.amplitude(n, index);
            block[e] += u.norm_sqr();
        }
    }
}

/// Spin-resolved local density of states.
#[derive(Copy, Clone, Debug)]
pub struct SpinPolarizedLdosContext {
    pub window: EnergyWindow,
    pub spin_position: usize,
}

impl Quantity for SpinPolarizedLdosContext {
    type Elem = C64;

    fn block_shape(&self) -> Vec<usize> { vec![self.window.resolution, 2, 2] }

    fn accumulate<S>(&self, solver: &S, index: &Index, block: &mut [C64])
    where S: EigenSolver
    {
        let up = index.with(self.spin_position, 0);
        let down = index.with(self.spin_position, 1);
        for n in 0..solver.basis_size() {
            let Some(e) = self.window.bin_clamped(solver.eigenvalue(n))
                else { continue; };
            let (u_u, u_d) = spin_pair(solver, n, &up, &down);
            add_spin_block(&mut block[4 * e..4 * e + 4], u_u, u_d, 1.0);
        }
    }
}
