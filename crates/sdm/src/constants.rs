//! Physical constants for the droplet microphysics (SI units).
//!
//! ## Gas constants
//!
//! Dry air and water vapour are treated as ideal gases. `EPSILON` is the
//! ratio of their molar masses, used to convert between mixing ratio and
//! partial pressure.

/// Gravity acceleration (m/s^2), acting in the -Y direction
pub const GRAVITY: f64 = 9.81;

// =============================================================================
// GAS PROPERTIES
// =============================================================================

/// Specific gas constant of dry air (J/kg/K)
pub const R_DRY: f64 = 287.04;

/// Specific gas constant of water vapour (J/kg/K)
pub const R_VAPOUR: f64 = 461.5;

/// Specific heat of dry air at constant pressure (J/kg/K)
pub const CP_DRY: f64 = 1005.0;

/// Ratio R_DRY / R_VAPOUR
pub const EPSILON: f64 = R_DRY / R_VAPOUR;

/// Reference pressure for potential temperature (Pa)
pub const P_1000: f64 = 100_000.0;

// =============================================================================
// LIQUID WATER
// =============================================================================

/// Density of liquid water (kg/m³)
pub const WATER_DENSITY: f64 = 1000.0;

/// Surface tension of water against air (N/m)
pub const SURFACE_TENSION: f64 = 0.072;

/// Diffusivity of water vapour in air (m²/s)
pub const VAPOUR_DIFFUSIVITY: f64 = 2.21e-5;

/// Triple point of water (K)
pub const T_0: f64 = 273.15;

// =============================================================================
// DIAGNOSTIC DEFAULTS
// =============================================================================

/// Radius above which a droplet counts as an activated CCN (m)
pub const CCN_THRESHOLD_RADIUS: f64 = 500e-9;
