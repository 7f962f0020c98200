//! Scoring strategies that turn an average response time into a selection value.

use std::fmt::Debug;

/// Converts a host's decaying average response time (milliseconds, always
/// positive) into a selection value. Higher values win more traffic.
///
/// Values that are not finite and positive exclude the host from the
/// weighted pick for that round.
pub trait ValueCalculator: Debug + Send + Sync {
    /// Score a host from its average response time.
    fn value(&self, avg_response_ms: f64) -> f64;
}

/// Value is the inverse of the response time: a host twice as fast gets
/// twice the traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearValueCalculator;

impl ValueCalculator for LinearValueCalculator {
    fn value(&self, avg_response_ms: f64) -> f64 {
        1.0 / avg_response_ms
    }
}

/// Inverse response time raised to `exponent`; larger exponents push
/// traffic harder towards the fastest host.
#[derive(Debug, Clone, Copy)]
pub struct PolynomialValueCalculator {
    /// Exponent applied to the linear value.
    pub exponent: f64,
}

impl PolynomialValueCalculator {
    /// Create a calculator with the given exponent.
    pub fn new(exponent: f64) -> Self {
        Self { exponent }
    }
}

impl ValueCalculator for PolynomialValueCalculator {
    fn value(&self, avg_response_ms: f64) -> f64 {
        LinearValueCalculator.value(avg_response_ms).powf(self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let calc = LinearValueCalculator;
        assert_eq!(calc.value(10.0), 0.1);
        assert!(calc.value(10.0) > calc.value(50.0));
    }

    #[test]
    fn test_polynomial_sharpens_preference() {
        let calc = PolynomialValueCalculator::new(2.0);
        assert!((calc.value(10.0) - 0.01).abs() < 1e-12);

        let linear_ratio = LinearValueCalculator.value(10.0) / LinearValueCalculator.value(20.0);
        let poly_ratio = calc.value(10.0) / calc.value(20.0);
        assert!(poly_ratio > linear_ratio);
    }
}
