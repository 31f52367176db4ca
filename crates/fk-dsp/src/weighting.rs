//! A- and C-weighting coefficient design
//!
//! The analog IEC 61672 weighting curves are mapped to the z-plane with the
//! bilinear transform. Each analog pole `(s + w)` becomes
//! `(k + w) + (w - k) z^-1` with `k = 2 fs`, each zero at the origin becomes
//! `k (1 - z^-1)`, and the `(1 + z^-1)` terms left over balance the degrees.

use std::f64::consts::PI;

use fk_core::{FkError, FkResult};

/// Sample rates accepted by the weighting designs
pub const WEIGHTING_SAMPLE_RATES: [u32; 11] = [
    8000, 11025, 16000, 22050, 24000, 32000, 44100, 48000, 88200, 96000, 192000,
];

/// Filter order (coefficient count) of the A-weighting design
pub(crate) const A_WEIGHTING_ORDER: usize = 7;

/// Filter order (coefficient count) of the C-weighting design
pub(crate) const C_WEIGHTING_ORDER: usize = 5;

// Pole frequencies of the analog weighting curves (Hz)
const F1: f64 = 20.598997;
const F2: f64 = 107.65265;
const F3: f64 = 737.86223;
const F4: f64 = 12194.217;

// Gains restoring 0 dB at 1 kHz
const A1000_DB: f64 = 1.9997;
const C1000_DB: f64 = 0.0619;

/// Feedforward and feedback coefficients, `a[0] == 1`
pub(crate) type Design = (Vec<f64>, Vec<f64>);

fn check_rate(sample_rate: u32) -> FkResult<()> {
    if WEIGHTING_SAMPLE_RATES.contains(&sample_rate) {
        Ok(())
    } else {
        Err(FkError::UnsupportedSampleRate(sample_rate))
    }
}

/// Multiply two polynomials in z^-1
fn poly_mul(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; lhs.len() + rhs.len() - 1];
    for (i, &l) in lhs.iter().enumerate() {
        for (j, &r) in rhs.iter().enumerate() {
            out[i + j] += l * r;
        }
    }
    out
}

/// Bilinear design from `zeros` zeros at s = 0 and the given real poles
fn bilinear(sample_rate: u32, zeros: usize, poles: &[f64], gain: f64) -> Design {
    let k = 2.0 * sample_rate as f64;

    let mut num = vec![gain];
    for _ in 0..zeros {
        num = poly_mul(&num, &[k, -k]);
    }
    for _ in zeros..poles.len() {
        num = poly_mul(&num, &[1.0, 1.0]);
    }

    let mut den = vec![1.0];
    for &w in poles {
        den = poly_mul(&den, &[k + w, w - k]);
    }

    let a0 = den[0];
    let b = num.iter().map(|v| v / a0).collect();
    let a = den.iter().map(|v| v / a0).collect();
    (b, a)
}

pub(crate) fn a_weighting(sample_rate: u32) -> FkResult<Design> {
    check_rate(sample_rate)?;
    let (w1, w2, w3, w4) = (2.0 * PI * F1, 2.0 * PI * F2, 2.0 * PI * F3, 2.0 * PI * F4);
    let gain = w4 * w4 * 10f64.powf(A1000_DB / 20.0);
    Ok(bilinear(sample_rate, 4, &[w1, w1, w2, w3, w4, w4], gain))
}

pub(crate) fn c_weighting(sample_rate: u32) -> FkResult<Design> {
    check_rate(sample_rate)?;
    let (w1, w4) = (2.0 * PI * F1, 2.0 * PI * F4);
    let gain = w4 * w4 * 10f64.powf(C1000_DB / 20.0);
    Ok(bilinear(sample_rate, 2, &[w1, w1, w4, w4], gain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_orders() {
        let (b, a) = a_weighting(48000).unwrap();
        assert_eq!(b.len(), A_WEIGHTING_ORDER);
        assert_eq!(a.len(), A_WEIGHTING_ORDER);
        assert_eq!(a[0], 1.0);

        let (b, a) = c_weighting(44100).unwrap();
        assert_eq!(b.len(), C_WEIGHTING_ORDER);
        assert_eq!(a.len(), C_WEIGHTING_ORDER);
    }

    #[test]
    fn test_zero_gain_at_dc() {
        // zeros at s = 0 map to z = 1, so the numerator sums to zero
        let (b, _) = a_weighting(44100).unwrap();
        approx::assert_abs_diff_eq!(b.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unsupported_rate() {
        assert_eq!(a_weighting(12345), Err(FkError::UnsupportedSampleRate(12345)));
        assert!(c_weighting(0).is_err());
    }
}
