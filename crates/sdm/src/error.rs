//! Error types for the super-droplet engine.
//!
//! Configuration problems are reported before the first step. Numerical
//! domain violations end the run: the engine never clamps droplet state back
//! into range.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdmError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported {kind} variant: {name:?} (expected one of {expected})")]
    UnsupportedVariant {
        kind: &'static str,
        name: String,
        expected: &'static str,
    },

    #[error("inconsistent grid dimensionality: {0}")]
    Dimensionality(String),

    #[error("configuration file error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    ConfigParse(String),

    #[error("field `{name}` has {actual} values, expected {expected}")]
    FieldShape {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("timestep must be positive and finite, got {0}")]
    InvalidTimestep(f64),

    #[error("droplet {droplet} left the domain after advection: ({x}, {y})")]
    OutOfDomain { droplet: usize, x: f64, y: f64 },

    #[error("droplet {droplet} wet volume {rw3:e} dropped below dry volume {rd3:e}")]
    WetBelowDry { droplet: usize, rw3: f64, rd3: f64 },
}

impl From<serde_json::Error> for SdmError {
    fn from(e: serde_json::Error) -> Self {
        Self::ConfigParse(e.to_string())
    }
}

impl From<serde_yaml::Error> for SdmError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::ConfigParse(e.to_string())
    }
}

pub type SdmResult<T> = Result<T, SdmError>;
