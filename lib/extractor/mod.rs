//! Computation of physical properties from the eigenstates of a model.
//!
//! Every pattern-driven quantity follows the same steps: validate the pattern
//! (so that errors surface before anything is allocated), force the ranges of
//! concrete positions to 1, allocate a zeroed row-major tensor shaped like the
//! loop ranges followed by the quantity's block shape, and then walk a
//! [`PatternExpansion`], accumulating each concrete index into the block at
//! its output offset.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use tracing::{ debug, error };
use crate::{
    error::ExtractError,
    index::Index,
    pattern::{ ensure_compliant_ranges, loop_ranges, PatternExpansion },
    properties::{
        Density,
        Dos,
        EigenValues,
        EnergyWindow,
        Ldos,
        Magnetization,
        SpinPolarizedLdos,
    },
    solver::EigenSolver,
};

pub mod quantities;
use quantities::{
    DensityContext,
    LdosContext,
    MagnetizationContext,
    Quantity,
    SpinPolarizedLdosContext,
};

// log a rejected request before handing the error back
fn reject<T>(err: ExtractError) -> Result<T, ExtractError> {
    error!("{}", err);
    Err(err)
}

fn check_ranges(operation: &'static str, pattern: &Index, ranges: &[usize])
    -> Result<(), ExtractError>
{
    if pattern.len() != ranges.len() {
        return reject(ExtractError::RangeMismatch {
            operation,
            pattern: pattern.len(),
            ranges: ranges.len(),
        });
    }
    Ok(())
}

fn check_no_spin(operation: &'static str, pattern: &Index)
    -> Result<(), ExtractError>
{
    if let Some(position) = pattern.spin_position() {
        return reject(ExtractError::UnexpectedSpinIndex {
            operation,
            position,
            pattern: pattern.to_string(),
        });
    }
    Ok(())
}

// replace the spin marker by 0 with range 1; spin is resolved inside each
// output block instead
fn take_spin(operation: &'static str, pattern: &mut Index, ranges: &mut [usize])
    -> Result<usize, ExtractError>
{
    let Some(position) = pattern.spin_position()
        else {
            return reject(ExtractError::MissingSpinIndex {
                operation,
                pattern: pattern.to_string(),
            });
        };
    pattern[position] = 0;
    ranges[position] = 1;
    Ok(position)
}

fn check_window(
    operation: &'static str,
    lower: f64,
    upper: f64,
    resolution: usize,
) -> Result<EnergyWindow, ExtractError>
{
    let window = EnergyWindow::new(lower, upper, resolution);
    if !window.is_valid() {
        return reject(ExtractError::InvalidWindow {
            operation,
            lower,
            upper,
            resolution,
        });
    }
    Ok(window)
}

/// Computes observables from anything implementing [`EigenSolver`].
///
/// Patterns are [`Index`]es that may contain wildcards:
/// - free wildcards ([`IDX_X`][crate::IDX_X], [`IDX_Y`][crate::IDX_Y], ...,
///   or any other negative value without a special meaning) each add one axis
///   to the output, with length given by the matching entry of `ranges`;
/// - [`SUM_ALL`][crate::SUM_ALL] entries are summed over `0..ranges[n]`;
/// - a single [`SPIN`][crate::SPIN] entry marks the spin position for the
///   spin-resolved quantities, and is an error anywhere else.
///
/// The ranges of concrete pattern entries are ignored.
#[derive(Copy, Clone, Debug)]
pub struct PropertyExtractor<'s, S>
where S: EigenSolver
{
    solver: &'s S,
}

impl<'s, S> PropertyExtractor<'s, S>
where S: EigenSolver
{
    /// Create a new `PropertyExtractor`.
    pub fn new(solver: &'s S) -> Self { Self { solver } }

    /// Return a reference to the underlying solver.
    pub fn solver(&self) -> &'s S { self.solver }

    // expand `pattern` over `ranges` and accumulate `quantity` into a fresh
    // tensor; the pattern must already be validated
    fn calculate<Q>(&self, quantity: &Q, pattern: &Index, ranges: &[usize])
        -> nd::ArrayD<Q::Elem>
    where Q: Quantity
    {
        let mut ranges: Vec<usize> = ranges.to_vec();
        ensure_compliant_ranges(pattern, &mut ranges);
        let mut shape: Vec<usize> = loop_ranges(pattern, &ranges);
        shape.append(&mut quantity.block_shape());
        let mut data: nd::ArrayD<Q::Elem> = nd::ArrayD::zeros(nd::IxDyn(&shape));

        let block_size = quantity.block_size();
        let expansion = PatternExpansion::new(pattern, &ranges);
        debug!(
            "expanding pattern {} into {} indices, output shape {:?}",
            pattern, expansion.num_indices(), shape,
        );
        let flat: &mut [Q::Elem]
            = data.as_slice_mut()
            .expect("PropertyExtractor::calculate: output tensor must be contiguous");
        for (index, offset) in expansion {
            let block = &mut flat[block_size * offset..block_size * (offset + 1)];
            quantity.accumulate(self.solver, &index, block);
        }
        data
    }

    /// Return the eigenvalues of the solver.
    pub fn eigenvalues(&self) -> EigenValues {
        EigenValues { data: self.solver.eigenvalues() }
    }

    /// Return `Σₙ f(Eₙ) conj(uₙ(to)) uₙ(from)`, the expectation value of
    /// `c†(to) c(from)`.
    pub fn calculate_expectation_value(&self, to: &Index, from: &Index) -> C64 {
        (0..self.solver.basis_size())
            .map(|n| {
                let u_to = self.solver.amplitude(n, to);
                let u_from = self.solver.amplitude(n, from);
                u_to.conj() * u_from * self.solver.occupation(n)
            })
            .fold(C64::zero(), |acc, x| acc + x)
    }

    /// Count eigenvalues in `resolution` equal bins over `[lower, upper)`.
    ///
    /// Eigenvalues outside the window are dropped.
    pub fn calculate_dos(&self, lower: f64, upper: f64, resolution: usize)
        -> Result<Dos, ExtractError>
    {
        let window
            = check_window("PropertyExtractor::calculate_dos", lower, upper, resolution)?;
        let mut data: nd::Array1<f64> = nd::Array1::zeros(resolution);
        (0..self.solver.basis_size())
            .filter_map(|n| window.bin(self.solver.eigenvalue(n)))
            .for_each(|e| { data[e] += 1.0; });
        Ok(Dos { window, data })
    }

    /// Compute the occupation-weighted density `Σₙ f(Eₙ) |uₙ|²` over a
    /// pattern.
    pub fn calculate_density(&self, pattern: &Index, ranges: &[usize])
        -> Result<Density, ExtractError>
    {
        const OP: &str = "PropertyExtractor::calculate_density";
        check_ranges(OP, pattern, ranges)?;
        check_no_spin(OP, pattern)?;
        let data = self.calculate(&DensityContext, pattern, ranges);
        Ok(Density { data })
    }

    /// Compute the occupation-weighted spin density matrix over a pattern.
    ///
    /// The pattern must contain exactly one [`SPIN`][crate::SPIN] entry; each
    /// output cell holds the `2 × 2` matrix `Σₙ f(Eₙ) conj(uₙ(σ)) uₙ(σ')`
    /// where `σ, σ'` substitute 0 (up) and 1 (down) at the spin position.
    pub fn calculate_magnetization(&self, pattern: &Index, ranges: &[usize])
        -> Result<Magnetization, ExtractError>
    {
        const OP: &str = "PropertyExtractor::calculate_magnetization";
        check_ranges(OP, pattern, ranges)?;
        let mut pattern = pattern.clone();
        let mut ranges = ranges.to_vec();
        let spin_position = take_spin(OP, &mut pattern, &mut ranges)?;
        check_no_spin(OP, &pattern)?;
        let context = MagnetizationContext { spin_position };
        let data = self.calculate(&context, &pattern, &ranges);
        Ok(Magnetization { data })
    }

    /// Compute the local density of states over a pattern.
    ///
    /// Each output cell holds `resolution` bins over `[lower, upper)`, bin `e`
    /// collecting `|uₙ|²` for every eigenstate with energy in that bin.
    pub fn calculate_ldos(
        &self,
        pattern: &Index,
        ranges: &[usize],
        lower: f64,
        upper: f64,
        resolution: usize,
    ) -> Result<Ldos, ExtractError>
    {
        const OP: &str = "PropertyExtractor::calculate_ldos";
        check_ranges(OP, pattern, ranges)?;
        check_no_spin(OP, pattern)?;
        let window = check_window(OP, lower, upper, resolution)?;
        let context = LdosContext { window };
        let data = self.calculate(&context, pattern, ranges);
        Ok(Ldos { window, data })
    }

    /// Compute the spin-resolved local density of states over a pattern.
    ///
    /// As for [`Self::calculate_magnetization`], the pattern must contain
    /// exactly one [`SPIN`][crate::SPIN] entry. Each output cell holds
    /// `resolution` bins, each a `2 × 2` matrix `Σₙ conj(uₙ(σ)) uₙ(σ')` over
    /// the eigenstates in that bin.
    pub fn calculate_spin_polarized_ldos(
        &self,
        pattern: &Index,
        ranges: &[usize],
        lower: f64,
        upper: f64,
        resolution: usize,
    ) -> Result<SpinPolarizedLdos, ExtractError>
    {
        const OP: &str = "PropertyExtractor::calculate_spin_polarized_ldos";
        check_ranges(OP, pattern, ranges)?;
        let mut pattern = pattern.clone();
        let mut ranges = ranges.to_vec();
        let spin_position = take_spin(OP, &mut pattern, &mut ranges)?;
        check_no_spin(OP, &pattern)?;
        let window = check_window(OP, lower, upper, resolution)?;
        let context = SpinPolarizedLdosContext { window, spin_position };
        let data = self.calculate(&context, &pattern, &ranges);
        Ok(SpinPolarizedLdos { window, data })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        amplitude::HoppingAmplitude,
        amplitude_set::AmplitudeSet,
        index::{ IDX_X, SPIN, SUM_ALL },
        model::ModelParams,
        solver::EigenSystem,
    };

    const S: f64 = std::f64::consts::FRAC_1_SQRT_2;

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-12 }

    fn cclose(a: C64, b: C64) -> bool { (a - b).norm() < 1e-12 }

    // two sites with two spin states each: basis {0,0}, {0,1}, {1,0}, {1,1}
    fn spin_set() -> AmplitudeSet {
        let mut set = AmplitudeSet::new();
        for site in 0..2 {
            for s in 0..2 {
                set.add(HoppingAmplitude::new(1.0, [site, s], [site, s]));
            }
        }
        set.construct();
        set
    }

    // site 0 spin states are eigenstates; site 1 is split into the
    // symmetric and antisymmetric spin combinations
    fn spin_system(set: &AmplitudeSet, E: nd::Array1<f64>) -> EigenSystem<'_> {
        let z = C64::zero();
        let o = C64::from(1.0);
        let s = C64::from(S);
        let V: nd::Array2<C64> = nd::array![
            [o, z, z,  z],
            [z, o, z,  z],
            [z, z, s,  s],
            [z, z, s, -s],
        ];
        EigenSystem::new(set, ModelParams::default(), E, V).unwrap()
    }

    fn default_system(set: &AmplitudeSet) -> EigenSystem<'_> {
        spin_system(set, nd::array![-1.0, -0.5, -0.2, 1.0])
    }

    #[test]
    fn eigenvalues() {
        let set = spin_set();
        let sys = default_system(&set);
        let ev = PropertyExtractor::new(&sys).eigenvalues();
        assert_eq!(ev.len(), 4);
        assert_eq!(ev.data, nd::array![-1.0, -0.5, -0.2, 1.0]);
    }

    #[test]
    fn dos_counts_states() {
        let set = spin_set();
        let sys = spin_system(&set, nd::array![-2.0, -1.0, 0.0, 1.0]);
        let dos = PropertyExtractor::new(&sys).calculate_dos(-2.0, 2.0, 4).unwrap();
        assert_eq!(dos.data, nd::array![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(dos.resolution(), 4);
    }

    #[test]
    fn dos_drops_out_of_window() {
        let set = spin_set();
        let sys = spin_system(&set, nd::array![-3.0, -1.0, 2.0, 5.0]);
        let dos = PropertyExtractor::new(&sys).calculate_dos(-2.0, 2.0, 2).unwrap();
        assert_eq!(dos.data, nd::array![1.0, 0.0]);
    }

    #[test]
    fn dos_invalid_window() {
        let set = spin_set();
        let sys = default_system(&set);
        let pe = PropertyExtractor::new(&sys);
        assert!(matches!(
            pe.calculate_dos(1.0, -1.0, 10),
            Err(ExtractError::InvalidWindow { .. }),
        ));
        assert!(matches!(
            pe.calculate_dos(-1.0, 1.0, 0),
            Err(ExtractError::InvalidWindow { .. }),
        ));
    }

    #[test]
    fn density_per_site() {
        let set = spin_set();
        let sys = default_system(&set);
        let density = PropertyExtractor::new(&sys)
            .calculate_density(&[IDX_X, SUM_ALL].into(), &[2, 2])
            .unwrap();
        assert_eq!(density.ranges(), &[2]);
        assert!(close(density.get(&[0]).unwrap(), 2.0));
        assert!(close(density.get(&[1]).unwrap(), 1.0));
    }

    #[test]
    fn density_summed_over_sites() {
        let set = spin_set();
        let sys = default_system(&set);
        let density = PropertyExtractor::new(&sys)
            .calculate_density(&[SUM_ALL, IDX_X].into(), &[2, 2])
            .unwrap();
        assert_eq!(density.ranges(), &[2]);
        assert!(close(density.get(&[0]).unwrap(), 1.5));
        assert!(close(density.get(&[1]).unwrap(), 1.5));
        assert!(close(density.data.sum(), 3.0));
    }

    #[test]
    fn density_sums_whole_range() {
        let mut set = AmplitudeSet::new();
        for a in 0..5 {
            for x in 0..3 {
                set.add(HoppingAmplitude::new(-1.0, [a, x], [a, x]));
            }
        }
        set.construct();
        let n = set.basis_size();
        let sys = EigenSystem::new(
            &set,
            ModelParams::default(),
            nd::Array1::from_elem(n, -1.0),
            nd::Array2::eye(n),
        ).unwrap();
        let density = PropertyExtractor::new(&sys)
            .calculate_density(&[SUM_ALL, IDX_X].into(), &[5, 3])
            .unwrap();
        assert_eq!(density.ranges(), &[3]);
        for x in 0..3 {
            assert!(close(density.get(&[x]).unwrap(), 5.0));
        }
    }

    #[test]
    fn density_of_concrete_index() {
        let set = spin_set();
        let sys = default_system(&set);
        let density = PropertyExtractor::new(&sys)
            .calculate_density(&[0, 1].into(), &[7, 7])
            .unwrap();
        assert_eq!(density.dimensions(), 0);
        assert!(close(density.get(&[]).unwrap(), 1.0));
    }

    #[test]
    fn density_rejects_bad_patterns() {
        let set = spin_set();
        let sys = default_system(&set);
        let pe = PropertyExtractor::new(&sys);
        assert_eq!(
            pe.calculate_density(&[IDX_X, SPIN].into(), &[2, 2]).unwrap_err(),
            ExtractError::UnexpectedSpinIndex {
                operation: "PropertyExtractor::calculate_density",
                position: 1,
                pattern: "{-2, -5}".to_string(),
            },
        );
        assert!(matches!(
            pe.calculate_density(&[IDX_X, SUM_ALL].into(), &[2]),
            Err(ExtractError::RangeMismatch { pattern: 2, ranges: 1, .. }),
        ));
    }

    #[test]
    fn magnetization_blocks() {
        let set = spin_set();
        let sys = default_system(&set);
        let mag = PropertyExtractor::new(&sys)
            .calculate_magnetization(&[IDX_X, SPIN].into(), &[2, 2])
            .unwrap();
        assert_eq!(mag.ranges(), &[2]);
        let site0 = mag.get(&[0]).unwrap();
        assert!(cclose(site0[[0, 0]], C64::from(1.0)));
        assert!(cclose(site0[[0, 1]], C64::zero()));
        assert!(cclose(site0[[1, 0]], C64::zero()));
        assert!(cclose(site0[[1, 1]], C64::from(1.0)));
        let site1 = mag.get(&[1]).unwrap();
        site1.iter().for_each(|m| { assert!(cclose(*m, C64::from(0.5))); });
    }

    #[test]
    fn magnetization_requires_spin() {
        let set = spin_set();
        let sys = default_system(&set);
        let pe = PropertyExtractor::new(&sys);
        assert!(matches!(
            pe.calculate_magnetization(&[IDX_X, 0].into(), &[2, 1]),
            Err(ExtractError::MissingSpinIndex { .. }),
        ));
        assert!(matches!(
            pe.calculate_magnetization(&[SPIN, SPIN].into(), &[2, 2]),
            Err(ExtractError::UnexpectedSpinIndex { position: 1, .. }),
        ));
    }

    #[test]
    fn ldos_bins() {
        let set = spin_set();
        let sys = default_system(&set);
        let ldos = PropertyExtractor::new(&sys)
            .calculate_ldos(&[IDX_X, SUM_ALL].into(), &[2, 2], -2.0, 2.0, 4)
            .unwrap();
        assert_eq!(ldos.ranges(), &[2]);
        assert_eq!(ldos.data.shape(), &[2, 4]);
        let expected = [[0.0, 2.0, 0.0, 0.0], [0.0, 1.0, 0.0, 1.0]];
        for (x, row) in expected.iter().enumerate() {
            for (e, value) in row.iter().enumerate() {
                assert!(close(ldos.data[[x, e]], *value));
            }
        }
        assert!(PropertyExtractor::new(&sys)
            .calculate_ldos(&[SPIN].into(), &[2], -2.0, 2.0, 4)
            .is_err());
    }

    #[test]
    fn ldos_clamps_rounding_overshoot() {
        let mut set = AmplitudeSet::new();
        set.add(HoppingAmplitude::new(0.1, [0], [0]));
        set.construct();
        // largest energy strictly below the upper bound; its bin index rounds
        // up to `resolution`
        let e = f64::from_bits(0.1_f64.to_bits() - 1);
        let V: nd::Array2<C64> = nd::Array2::eye(1);
        let sys = EigenSystem::new(&set, ModelParams::default(), nd::array![e], V)
            .unwrap();
        let pe = PropertyExtractor::new(&sys);
        let ldos = pe.calculate_ldos(&[IDX_X].into(), &[1], -1.1, 0.1, 3).unwrap();
        assert_eq!(ldos.data.shape(), &[1, 3]);
        assert_eq!(ldos.data.as_slice().unwrap(), &[0.0, 0.0, 1.0]);
        let dos = pe.calculate_dos(-1.1, 0.1, 3).unwrap();
        assert_eq!(dos.data, nd::array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn spin_polarized_ldos_requires_spin() {
        let set = spin_set();
        let sys = default_system(&set);
        assert!(matches!(
            PropertyExtractor::new(&sys)
                .calculate_spin_polarized_ldos(&[IDX_X, 0].into(), &[2, 1], -2.0, 2.0, 4),
            Err(ExtractError::MissingSpinIndex {
                operation: "PropertyExtractor::calculate_spin_polarized_ldos",
                ..
            }),
        ));
    }

    #[test]
    fn spin_polarized_ldos_bins() {
        let set = spin_set();
        let sys = default_system(&set);
        let sp = PropertyExtractor::new(&sys)
            .calculate_spin_polarized_ldos(&[IDX_X, SPIN].into(), &[2, 2], -2.0, 2.0, 4)
            .unwrap();
        assert_eq!(sp.ranges(), &[2]);
        assert_eq!(sp.data.shape(), &[2, 4, 2, 2]);
        assert!(cclose(sp.data[[0, 1, 0, 0]], C64::from(1.0)));
        assert!(cclose(sp.data[[0, 1, 1, 1]], C64::from(1.0)));
        assert!(cclose(sp.data[[1, 1, 0, 1]], C64::from(0.5)));
        assert!(cclose(sp.data[[1, 3, 0, 0]], C64::from(0.5)));
        assert!(cclose(sp.data[[1, 3, 0, 1]], C64::from(-0.5)));
        assert!(cclose(sp.data[[1, 3, 1, 0]], C64::from(-0.5)));
        assert!(cclose(sp.data[[1, 0, 0, 0]], C64::zero()));
    }

    #[test]
    fn expectation_values() {
        let set = spin_set();
        let sys = default_system(&set);
        let pe = PropertyExtractor::new(&sys);
        assert!(cclose(
            pe.calculate_expectation_value(&[1, 0].into(), &[1, 1].into()),
            C64::from(0.5),
        ));
        assert!(cclose(
            pe.calculate_expectation_value(&[0, 0].into(), &[0, 0].into()),
            C64::from(1.0),
        ));
        assert!(cclose(
            pe.calculate_expectation_value(&[0, 0].into(), &[5, 5].into()),
            C64::zero(),
        ));
    }
}
