//! A tight-binding model: an [`AmplitudeSet`] plus the thermodynamic
//! parameters needed to occupy its eigenstates.

use std::path::Path;
use serde::{ Deserialize, Serialize };
use tracing::info;
use crate::{
    amplitude::HoppingAmplitude,
    amplitude_set::AmplitudeSet,
    error::ConfigError,
    statistics::Statistics,
};

/// Thermodynamic parameters of a model.
///
/// Can be read from TOML; missing keys take their default values:
/// ```toml
/// temperature = 0.0          # units of energy
/// chemical-potential = 0.0
/// statistics = "fermi-dirac" # or "bose-einstein"
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ModelParams {
    pub temperature: f64,
    pub chemical_potential: f64,
    pub statistics: Statistics,
}

impl ModelParams {
    /// Parse parameters from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(s)?;
        params.validate()
    }

    /// Read parameters from a TOML file.
    pub fn from_file<P>(path: P) -> Result<Self, ConfigError>
    where P: AsRef<Path>
    {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.temperature < 0.0 {
            Err(ConfigError::NegativeTemperature(self.temperature))
        } else {
            Ok(self)
        }
    }

    /// Return the occupation of a state at `energy`.
    pub fn occupation(&self, energy: f64) -> f64 {
        self.statistics.occupation(
            energy, self.chemical_potential, self.temperature)
    }
}

/// A collection of hopping amplitudes together with its [`ModelParams`].
#[derive(Clone, Debug, Default)]
pub struct Model {
    amplitudes: AmplitudeSet,
    pub params: ModelParams,
}

impl Model {
    /// Create a new, empty model.
    pub fn new(params: ModelParams) -> Self {
        Self { amplitudes: AmplitudeSet::new(), params }
    }

    /// Add an amplitude.
    pub fn add(&mut self, ha: HoppingAmplitude) -> &mut Self {
        self.amplitudes.add(ha);
        self
    }

    /// Add an amplitude and its Hermitian conjugate.
    pub fn add_with_hc(&mut self, ha: HoppingAmplitude) -> &mut Self {
        self.amplitudes.add_with_hc(ha);
        self
    }

    /// Fix the basis of the model.
    ///
    /// See [`AmplitudeSet::construct`].
    pub fn construct(&mut self) {
        info!("constructing system");
        self.amplitudes.construct();
        info!("basis size: {}", self.amplitudes.basis_size());
    }

    /// Return `true` if the basis has been fixed.
    pub fn is_constructed(&self) -> bool { self.amplitudes.is_sorted() }

    /// Build the COO snapshot of the Hamiltonian.
    ///
    /// See [`AmplitudeSet::construct_coo`].
    pub fn construct_coo(&mut self) { self.amplitudes.construct_coo(); }

    /// Return the number of basis elements.
    pub fn basis_size(&self) -> usize { self.amplitudes.basis_size() }

    /// Return a reference to the underlying amplitudes.
    pub fn amplitudes(&self) -> &AmplitudeSet { &self.amplitudes }

    /// Return a mutable reference to the underlying amplitudes.
    pub fn amplitudes_mut(&mut self) -> &mut AmplitudeSet { &mut self.amplitudes }

    pub fn temperature(&self) -> f64 { self.params.temperature }

    pub fn chemical_potential(&self) -> f64 { self.params.chemical_potential }

    pub fn statistics(&self) -> Statistics { self.params.statistics }
}
