//! Thermodynamic rate laws consumed by the droplet engine.
//!
//! The Eulerian collaborator owns the thermodynamics; the engine only needs a
//! handful of relations, reached through [`ThermoRateLaws`] once per cell per
//! step. The per-droplet relations (water activity, Kelvin term, kappa-Köhler
//! equilibrium, terminal velocity) are plain functions so the ODE right-hand
//! sides never dispatch dynamically.
//!
//! References:
//! - Petters & Kreidenweis (2007), kappa-Köhler water activity
//! - Khvorostyanov & Curry (2002), terminal velocity of droplets

use thiserror::Error;

use crate::constants::{
    CP_DRY, EPSILON, GRAVITY, P_1000, R_DRY, R_VAPOUR, SURFACE_TENSION, T_0, WATER_DENSITY,
};

/// Relations mapping the Eulerian state of a cell to the ambient quantities
/// the droplet rate laws need.
pub trait ThermoRateLaws: Send + Sync {
    /// Total pressure (Pa) from density times potential temperature and
    /// vapour mixing ratio.
    fn pressure(&self, rhod_th: f64, r: f64) -> f64;

    /// Temperature (K) from potential temperature, pressure and mixing ratio.
    fn temperature(&self, theta: f64, p: f64, r: f64) -> f64;

    /// Saturation vapour pressure over a flat water surface (Pa).
    fn saturation_vapour_pressure(&self, t: f64) -> f64;

    /// Kelvin curvature coefficient A (m), such that the curvature
    /// correction is exp(A / r).
    fn kelvin_coefficient(&self, t: f64) -> f64;

    /// Dynamic viscosity of air (Pa s).
    fn dynamic_viscosity(&self, t: f64) -> f64;

    /// Saturation vapour density (kg/m³).
    fn saturation_vapour_density(&self, t: f64) -> f64 {
        self.saturation_vapour_pressure(t) / (R_VAPOUR * t)
    }
}

/// Ideal-gas thermodynamics with a Magnus fit for saturation and
/// Sutherland's law for viscosity.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardThermo;

impl ThermoRateLaws for StandardThermo {
    fn pressure(&self, rhod_th: f64, r: f64) -> f64 {
        // Dry partial pressure from rhod * theta:
        // p_d = p1000 * (rhod_th * R_d / p1000)^(c_p / c_v)
        let exponent = CP_DRY / (CP_DRY - R_DRY);
        let p_dry = P_1000 * (rhod_th * R_DRY / P_1000).powf(exponent);
        p_dry * (1.0 + r / EPSILON)
    }

    fn temperature(&self, theta: f64, p: f64, r: f64) -> f64 {
        let p_dry = p / (1.0 + r / EPSILON);
        theta * (p_dry / P_1000).powf(R_DRY / CP_DRY)
    }

    fn saturation_vapour_pressure(&self, t: f64) -> f64 {
        611.2 * (17.67 * (t - T_0) / (t - 29.65)).exp()
    }

    fn kelvin_coefficient(&self, t: f64) -> f64 {
        2.0 * SURFACE_TENSION / (WATER_DENSITY * R_VAPOUR * t)
    }

    fn dynamic_viscosity(&self, t: f64) -> f64 {
        1.458e-6 * t.powf(1.5) / (t + 110.4)
    }
}

// =============================================================================
// KAPPA-KÖHLER
// =============================================================================

/// Water activity of a solution droplet.
#[inline]
pub fn water_activity(rw3: f64, rd3: f64, kappa: f64) -> f64 {
    (rw3 - rd3) / (rw3 - rd3 * (1.0 - kappa))
}

/// Kelvin curvature correction exp(A / r).
#[inline]
pub fn kelvin_term(rw: f64, kelvin_a: f64) -> f64 {
    (kelvin_a / rw).exp()
}

/// Equilibrium wet volume ignoring curvature; linear in the dry volume.
#[inline]
pub fn rw3_eq_nokelvin(rd3: f64, kappa: f64, vap_ratio: f64) -> f64 {
    rd3 * (1.0 - vap_ratio * (1.0 - kappa)) / (1.0 - vap_ratio)
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EquilibriumError {
    #[error("no sub-saturated equilibrium for vapour ratio {0}")]
    NotSubsaturated(f64),
    #[error("equilibrium not bracketed in [{lo:e}, {hi:e}]")]
    NotBracketed { lo: f64, hi: f64 },
}

/// Iterations for the equilibrium bisection; halves the bracket to well
/// below f64 resolution of a cubed radius.
const EQUILIBRIUM_ITERATIONS: usize = 200;

/// Equilibrium wet volume including the Kelvin term.
///
/// Solves `vap_ratio = a_w(rw3) * exp(A / rw)` for `rw3` in the bracket
/// `[rd3, rw3_eq_nokelvin]`. Only sub-saturated conditions have a root there.
pub fn rw3_eq(rd3: f64, kappa: f64, vap_ratio: f64, kelvin_a: f64) -> Result<f64, EquilibriumError> {
    if !(vap_ratio > 0.0 && vap_ratio < 1.0) {
        return Err(EquilibriumError::NotSubsaturated(vap_ratio));
    }

    let balance = |rw3: f64| vap_ratio - water_activity(rw3, rd3, kappa) * kelvin_term(rw3.cbrt(), kelvin_a);

    let mut lo = rd3;
    let mut hi = rw3_eq_nokelvin(rd3, kappa, vap_ratio);
    let f_lo = balance(lo);
    let f_hi = balance(hi);
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(EquilibriumError::NotBracketed { lo, hi });
    }

    let lo_sign = f_lo.signum();
    for _ in 0..EQUILIBRIUM_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if balance(mid).signum() == lo_sign {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

// =============================================================================
// TERMINAL VELOCITY
// =============================================================================

const KC_DELTA_0: f64 = 9.06;
const KC_C_0: f64 = 0.292;

/// Terminal fall speed (m/s, positive downward) of a water sphere.
///
/// Best number X = (32/3) (ρ_w - ρ_a) g ρ_a r³ / η² and
/// Re = δ0²/4 (√(1 + c1 √X) - 1)², reducing to Stokes' law for small drops.
pub fn terminal_velocity(rw: f64, rho_air: f64, eta: f64) -> f64 {
    if rw <= 0.0 {
        return 0.0;
    }
    let best = 32.0 / 3.0 * (WATER_DENSITY - rho_air) * GRAVITY * rho_air * rw.powi(3) / (eta * eta);
    let c1 = 4.0 / (KC_DELTA_0 * KC_DELTA_0 * KC_C_0.sqrt());
    let bracket = (1.0 + c1 * best.sqrt()).sqrt() - 1.0;
    let reynolds = KC_DELTA_0 * KC_DELTA_0 / 4.0 * bracket * bracket;
    reynolds * eta / (rho_air * 2.0 * rw)
}
