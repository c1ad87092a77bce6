//! Quantum statistics used to weight eigenstates by their occupation.
//!
//! Temperatures are measured in units of energy, i.e. `k_B = 1`.

use serde::{ Deserialize, Serialize };
use crate::tb_assert;

/// Occupation statistics of the particles described by a model.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Statistics {
    #[default]
    FermiDirac,
    BoseEinstein,
}

impl Statistics {
    /// Return the occupation of a state with energy `energy`.
    pub fn occupation(self, energy: f64, chemical_potential: f64, temperature: f64)
        -> f64
    {
        match self {
            Self::FermiDirac
                => fermi_dirac(energy, chemical_potential, temperature),
            Self::BoseEinstein
                => bose_einstein(energy, chemical_potential, temperature),
        }
    }
}

/// Fermi-Dirac distribution `1 / (exp((e - mu) / T) + 1)`.
///
/// At zero temperature this is a step function taking the value 1/2 at
/// `e == mu`.
pub fn fermi_dirac(energy: f64, chemical_potential: f64, temperature: f64)
    -> f64
{
    if temperature == 0.0 {
        if energy < chemical_potential {
            1.0
        } else if energy == chemical_potential {
            0.5
        } else {
            0.0
        }
    } else {
        (((energy - chemical_potential) / temperature).exp() + 1.0).recip()
    }
}

/// Bose-Einstein distribution `1 / (exp((e - mu) / T) - 1)`.
///
/// *Panics* at zero temperature, where the distribution is not well behaved.
pub fn bose_einstein(energy: f64, chemical_potential: f64, temperature: f64)
    -> f64
{
    tb_assert!(
        temperature != 0.0,
        "statistics::bose_einstein()",
        "Bose-Einstein distribution not well behaved at T = 0.",
        "Use a non-zero temperature.",
    );
    ((energy - chemical_potential) / temperature).exp_m1().recip()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fermi_dirac_zero_temperature() {
        assert_eq!(fermi_dirac(-1.0, 0.0, 0.0), 1.0);
        assert_eq!(fermi_dirac(0.0, 0.0, 0.0), 0.5);
        assert_eq!(fermi_dirac(1.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn fermi_dirac_finite_temperature() {
        assert!((fermi_dirac(0.3, 0.3, 1.0) - 0.5).abs() < 1e-15);
        let expected = 1.0 / (2.0_f64.exp() + 1.0);
        assert!((fermi_dirac(2.0, 0.0, 1.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn bose_einstein_finite_temperature() {
        let expected = 1.0 / (1.0_f64.exp() - 1.0);
        let w = Statistics::BoseEinstein.occupation(1.5, 0.5, 1.0);
        assert!((w - expected).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "not well behaved")]
    fn bose_einstein_zero_temperature() {
        bose_einstein(1.0, 0.0, 0.0);
    }
}
