//! Reparameterisations of the droplet growth variable.
//!
//! The condensation rate law is always evaluated in radius space; a transform
//! only changes the coordinate the ODE is integrated in, which changes the
//! stiffness seen by the stepper but not the physical trajectory:
//!
//! ```text
//! d(xi)/dt = (d xi / d r) * (d r / d t)
//! ```

/// Forward/inverse map between wet radius and the growth variable `xi`.
pub trait GrowthTransform: Copy + Send + Sync + 'static {
    /// Short name used in logs and configuration.
    const NAME: &'static str;

    /// Radius (m) to growth variable.
    fn forward(&self, r: f64) -> f64;

    /// Growth variable to radius (m).
    fn inverse(&self, xi: f64) -> f64;

    /// d(xi)/dr evaluated at radius `r`.
    fn derivative(&self, r: f64) -> f64;

    /// Convert a radial growth rate into d(xi)/dt at the state `xi`.
    #[inline]
    fn rate(&self, xi: f64, drdt: f64) -> f64 {
        self.derivative(self.inverse(xi)) * drdt
    }

    /// A physical radius cutoff expressed in `xi` space. Every transform is
    /// strictly increasing, so `xi > threshold(r)` iff `radius > r`.
    #[inline]
    fn threshold(&self, radius_cutoff: f64) -> f64 {
        self.forward(radius_cutoff)
    }
}

/// xi = r
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

/// xi = ln(r)
#[derive(Clone, Copy, Debug, Default)]
pub struct LogRadius;

/// xi = r²
#[derive(Clone, Copy, Debug, Default)]
pub struct SquaredRadius;

/// xi = r³ (proportional to droplet volume)
#[derive(Clone, Copy, Debug, Default)]
pub struct CubedRadius;

impl GrowthTransform for Identity {
    const NAME: &'static str = "id";

    #[inline]
    fn forward(&self, r: f64) -> f64 {
        r
    }

    #[inline]
    fn inverse(&self, xi: f64) -> f64 {
        xi
    }

    #[inline]
    fn derivative(&self, _r: f64) -> f64 {
        1.0
    }

    #[inline]
    fn rate(&self, _xi: f64, drdt: f64) -> f64 {
        drdt
    }
}

impl GrowthTransform for LogRadius {
    const NAME: &'static str = "ln";

    #[inline]
    fn forward(&self, r: f64) -> f64 {
        r.ln()
    }

    #[inline]
    fn inverse(&self, xi: f64) -> f64 {
        xi.exp()
    }

    #[inline]
    fn derivative(&self, r: f64) -> f64 {
        1.0 / r
    }
}

impl GrowthTransform for SquaredRadius {
    const NAME: &'static str = "p2";

    #[inline]
    fn forward(&self, r: f64) -> f64 {
        r * r
    }

    #[inline]
    fn inverse(&self, xi: f64) -> f64 {
        xi.sqrt()
    }

    #[inline]
    fn derivative(&self, r: f64) -> f64 {
        2.0 * r
    }
}

impl GrowthTransform for CubedRadius {
    const NAME: &'static str = "p3";

    #[inline]
    fn forward(&self, r: f64) -> f64 {
        r * r * r
    }

    #[inline]
    fn inverse(&self, xi: f64) -> f64 {
        xi.cbrt()
    }

    #[inline]
    fn derivative(&self, r: f64) -> f64 {
        3.0 * r * r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_roundtrip<T: GrowthTransform>(t: T) {
        for r in [1e-9, 3.3e-8, 1e-6, 2.5e-5, 1e-3] {
            let back = t.inverse(t.forward(r));
            assert!(
                (back - r).abs() <= 1e-12 * r,
                "{}: r = {:e}, got {:e}",
                T::NAME,
                r,
                back
            );
        }
    }

    #[test]
    fn test_roundtrip_all_variants() {
        check_roundtrip(Identity);
        check_roundtrip(LogRadius);
        check_roundtrip(SquaredRadius);
        check_roundtrip(CubedRadius);
    }

    fn check_rate_matches_finite_difference<T: GrowthTransform>(t: T) {
        let r = 2e-6;
        let drdt = 1e-7;
        let dr = 1e-6 * r;
        let expected = (t.forward(r + dr) - t.forward(r - dr)) / (2.0 * dr) * drdt;
        let got = t.rate(t.forward(r), drdt);
        assert!(
            (got - expected).abs() <= 1e-6 * expected.abs(),
            "{}: {:e} vs {:e}",
            T::NAME,
            got,
            expected
        );
    }

    #[test]
    fn test_rate_is_chain_rule() {
        check_rate_matches_finite_difference(Identity);
        check_rate_matches_finite_difference(LogRadius);
        check_rate_matches_finite_difference(SquaredRadius);
        check_rate_matches_finite_difference(CubedRadius);
    }

    #[test]
    fn test_threshold_preserves_order() {
        let cutoff = 0.5e-6;
        let small = 0.4e-6;
        let large = 0.6e-6;
        assert!(LogRadius.forward(small) < LogRadius.threshold(cutoff));
        assert!(LogRadius.forward(large) > LogRadius.threshold(cutoff));
        assert!(CubedRadius.forward(large) > CubedRadius.threshold(cutoff));
        assert!(SquaredRadius.forward(small) < SquaredRadius.threshold(cutoff));
    }
}
