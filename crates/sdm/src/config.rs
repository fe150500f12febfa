//! Run configuration, fixed at construction.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::constants::CCN_THRESHOLD_RADIUS;
use crate::error::{SdmError, SdmResult};
use crate::grid::GridGeometry;

/// Coordinate in which the droplet growth ODE is integrated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XiDefinition {
    /// xi = r
    Id,
    /// xi = ln(r)
    #[default]
    Ln,
    /// xi = r²
    P2,
    /// xi = r³
    P3,
}

impl FromStr for XiDefinition {
    type Err = SdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "ln" => Ok(Self::Ln),
            "p2" => Ok(Self::P2),
            "p3" => Ok(Self::P3),
            other => Err(SdmError::UnsupportedVariant {
                kind: "xi definition",
                name: other.to_string(),
                expected: "id, ln, p2, p3",
            }),
        }
    }
}

/// Explicit single-step ODE scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OdeAlgorithm {
    Euler,
    #[default]
    Rk4,
}

impl FromStr for OdeAlgorithm {
    type Err = SdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euler" => Ok(Self::Euler),
            "rk4" => Ok(Self::Rk4),
            other => Err(SdmError::UnsupportedVariant {
                kind: "ODE algorithm",
                name: other.to_string(),
                expected: "euler, rk4",
            }),
        }
    }
}

/// One lognormal mode of the dry aerosol spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LognormalMode {
    /// Mode mean dry radius (m)
    pub mean_rd: f64,
    /// Geometric standard deviation (dimensionless, > 1)
    pub sdev_rd: f64,
    /// Total concentration of the mode (m⁻³)
    pub n_tot: f64,
}

/// Largest step (s) at which explicit condensation of the default spectrum
/// stays stable with either ODE algorithm.
///
/// Relaxation towards the Köhler equilibrium scales as `1 / rd²`: a 1 µm
/// particle relaxes in about a millisecond, a 1 nm particle a million times
/// faster. Lowering `min_rd` requires shrinking the step accordingly.
pub const STABLE_GROWTH_DT: f64 = 1e-3;

/// Dry aerosol size distribution the population is sampled from.
///
/// The default is a coarse two-mode spectrum between 1 and 10 µm, which
/// condensation integrates stably at [`STABLE_GROWTH_DT`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrySpectrum {
    /// Smallest sampled dry radius (m)
    pub min_rd: f64,
    /// Largest sampled dry radius (m)
    pub max_rd: f64,
    /// Lognormal modes summed into the number density
    pub modes: Vec<LognormalMode>,
}

impl Default for DrySpectrum {
    fn default() -> Self {
        Self {
            min_rd: 1e-6,
            max_rd: 10e-6,
            modes: vec![
                LognormalMode {
                    mean_rd: 1.5e-6,
                    sdev_rd: 1.4,
                    n_tot: 5e6,
                },
                LognormalMode {
                    mean_rd: 4e-6,
                    sdev_rd: 1.5,
                    n_tot: 0.2e6,
                },
            ],
        }
    }
}

/// Droplet processes switched on for the run. Advection always runs.
///
/// Condensation is explicit, so its step must resolve the relaxation time of
/// the smallest droplet; see [`STABLE_GROWTH_DT`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessFlags {
    /// Condensational growth / evaporation
    pub condensation: bool,
    /// Gravitational settling
    pub sedimentation: bool,
    /// Collisional growth; accepted but not implemented
    pub coalescence: bool,
}

impl Default for ProcessFlags {
    fn default() -> Self {
        Self {
            condensation: true,
            sedimentation: true,
            coalescence: false,
        }
    }
}

/// Complete configuration of the droplet engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdmConfig {
    pub grid: GridGeometry,
    /// Mean number of super-droplets per cell
    pub sd_conc_mean: f64,
    pub spectrum: DrySpectrum,
    /// Solubility parameter assigned to every droplet
    pub kappa: f64,
    pub xi: XiDefinition,
    pub advection_algo: OdeAlgorithm,
    pub growth_algo: OdeAlgorithm,
    pub settling_algo: OdeAlgorithm,
    pub processes: ProcessFlags,
    /// Radius above which droplets count towards `n_ccn` (m)
    pub ccn_threshold_radius: f64,
    /// Seed for the initial sampling
    pub seed: u64,
    pub backend: Backend,
}

impl Default for SdmConfig {
    fn default() -> Self {
        Self {
            grid: GridGeometry::new(32, 32, 50.0, 50.0),
            sd_conc_mean: 64.0,
            spectrum: DrySpectrum::default(),
            kappa: 0.61,
            xi: XiDefinition::default(),
            advection_algo: OdeAlgorithm::Rk4,
            growth_algo: OdeAlgorithm::Rk4,
            settling_algo: OdeAlgorithm::Rk4,
            processes: ProcessFlags::default(),
            ccn_threshold_radius: CCN_THRESHOLD_RADIUS,
            seed: 1234,
            backend: Backend::default(),
        }
    }
}

impl SdmConfig {
    /// Reject configurations that cannot produce a valid population.
    pub fn validate(&self) -> SdmResult<()> {
        self.grid.validate()?;

        if !(self.sd_conc_mean.is_finite() && self.sd_conc_mean > 0.0) {
            return invalid(format!("sd_conc_mean must be positive, got {}", self.sd_conc_mean));
        }
        let spectrum = &self.spectrum;
        if !(spectrum.min_rd > 0.0 && spectrum.max_rd.is_finite()) {
            return invalid(format!("min_rd must be positive, got {}", spectrum.min_rd));
        }
        if spectrum.max_rd <= spectrum.min_rd {
            return invalid(format!(
                "max_rd ({}) must exceed min_rd ({})",
                spectrum.max_rd, spectrum.min_rd
            ));
        }
        if spectrum.modes.is_empty() {
            return invalid("dry spectrum needs at least one lognormal mode".to_string());
        }
        for (k, mode) in spectrum.modes.iter().enumerate() {
            if !(mode.mean_rd.is_finite() && mode.mean_rd > 0.0) {
                return invalid(format!("mode {k}: mean_rd must be positive, got {}", mode.mean_rd));
            }
            if !(mode.sdev_rd.is_finite() && mode.sdev_rd > 1.0) {
                return invalid(format!(
                    "mode {k}: geometric standard deviation must exceed 1, got {}",
                    mode.sdev_rd
                ));
            }
            if !(mode.n_tot.is_finite() && mode.n_tot >= 0.0) {
                return invalid(format!("mode {k}: n_tot must be non-negative, got {}", mode.n_tot));
            }
        }
        if !(self.kappa.is_finite() && self.kappa >= 0.0) {
            return invalid(format!("kappa must be non-negative, got {}", self.kappa));
        }
        if !(self.ccn_threshold_radius.is_finite() && self.ccn_threshold_radius > 0.0) {
            return invalid(format!(
                "ccn_threshold_radius must be positive, got {}",
                self.ccn_threshold_radius
            ));
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file.
    pub fn load_json(path: impl AsRef<Path>) -> SdmResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load_yaml(path: impl AsRef<Path>) -> SdmResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> SdmResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Save configuration as YAML.
    pub fn save_yaml(&self, path: impl AsRef<Path>) -> SdmResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

fn invalid(msg: String) -> SdmResult<()> {
    Err(SdmError::InvalidConfig(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        SdmConfig::default().validate().unwrap();
    }

    #[test]
    fn test_variant_names() {
        assert_eq!("p3".parse::<XiDefinition>().unwrap(), XiDefinition::P3);
        assert_eq!("euler".parse::<OdeAlgorithm>().unwrap(), OdeAlgorithm::Euler);
        match "rk45".parse::<OdeAlgorithm>() {
            Err(SdmError::UnsupportedVariant { name, .. }) => assert_eq!(name, "rk45"),
            other => panic!("expected unsupported variant, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_inverted_radius_bounds() {
        let mut config = SdmConfig::default();
        config.spectrum.max_rd = config.spectrum.min_rd / 2.0;
        assert!(matches!(config.validate(), Err(SdmError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unit_geometric_deviation() {
        let mut config = SdmConfig::default();
        config.spectrum.modes[1].sdev_rd = 1.0;
        assert!(matches!(config.validate(), Err(SdmError::InvalidConfig(_))));
    }

    #[test]
    fn test_json_roundtrip_with_partial_input() {
        let json = r#"{
            "grid": { "nx": 8, "ny": 4, "dx": 10.0, "dy": 5.0 },
            "xi": "p2",
            "growth_algo": "euler"
        }"#;
        let config: SdmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.grid.nz, 1);
        assert_eq!(config.grid.dz, 1.0);
        assert_eq!(config.xi, XiDefinition::P2);
        assert_eq!(config.growth_algo, OdeAlgorithm::Euler);
        assert_eq!(config.advection_algo, OdeAlgorithm::Rk4);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_variant_in_yaml_is_parse_error() {
        let yaml = "xi: cube\n";
        let err: SdmError = serde_yaml::from_str::<SdmConfig>(yaml).unwrap_err().into();
        assert!(matches!(err, SdmError::ConfigParse(_)));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = std::env::temp_dir().join(format!("sdm_config_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");

        let mut config = SdmConfig::default();
        config.backend = Backend::Serial;
        config.processes.sedimentation = false;
        config.save_yaml(&path).unwrap();

        let loaded = SdmConfig::load_yaml(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(&dir).ok();
    }
}
