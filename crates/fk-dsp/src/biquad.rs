//! Biquad coefficient designs (RBJ cookbook)
//!
//! Designs produce normalized coefficients (`a0 == 1`) that load into a
//! third-order [`Filter`](crate::Filter) through
//! [`Filter::biquad_design`](crate::Filter::biquad_design).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Normalized biquad coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Unity gain, no filtering
    pub const BYPASS: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn normalized(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        Self {
            b0: b[0] / a0,
            b1: b[1] / a0,
            b2: b[2] / a0,
            a1: a[1] / a0,
            a2: a[2] / a0,
        }
    }
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::BYPASS
    }
}

/// Second-order filter shapes; `freq` in Hz, gains in dB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BiquadDesign {
    Lowpass { freq: f64, q: f64 },
    Highpass { freq: f64, q: f64 },
    /// Constant 0 dB peak gain
    Bandpass { freq: f64, q: f64 },
    Notch { freq: f64, q: f64 },
    Allpass { freq: f64, q: f64 },
    Peaking { freq: f64, q: f64, gain_db: f64 },
    LowShelf { freq: f64, q: f64, gain_db: f64 },
    HighShelf { freq: f64, q: f64, gain_db: f64 },
}

impl BiquadDesign {
    fn freq_q(&self) -> (f64, f64) {
        match *self {
            Self::Lowpass { freq, q }
            | Self::Highpass { freq, q }
            | Self::Bandpass { freq, q }
            | Self::Notch { freq, q }
            | Self::Allpass { freq, q }
            | Self::Peaking { freq, q, .. }
            | Self::LowShelf { freq, q, .. }
            | Self::HighShelf { freq, q, .. } => (freq, q),
        }
    }

    /// Compute coefficients at `sample_rate`
    pub fn coeffs(&self, sample_rate: f64) -> BiquadCoeffs {
        let (freq, q) = self.freq_q();
        let omega = 2.0 * PI * freq / sample_rate;
        let (sin_w, cos_w) = omega.sin_cos();
        let alpha = sin_w / (2.0 * q);

        match *self {
            Self::Lowpass { .. } => {
                let side = (1.0 - cos_w) / 2.0;
                BiquadCoeffs::normalized(
                    [side, 1.0 - cos_w, side],
                    [1.0 + alpha, -2.0 * cos_w, 1.0 - alpha],
                )
            }
            Self::Highpass { .. } => {
                let side = (1.0 + cos_w) / 2.0;
                BiquadCoeffs::normalized(
                    [side, -(1.0 + cos_w), side],
                    [1.0 + alpha, -2.0 * cos_w, 1.0 - alpha],
                )
            }
            Self::Bandpass { .. } => BiquadCoeffs::normalized(
                [alpha, 0.0, -alpha],
                [1.0 + alpha, -2.0 * cos_w, 1.0 - alpha],
            ),
            Self::Notch { .. } => BiquadCoeffs::normalized(
                [1.0, -2.0 * cos_w, 1.0],
                [1.0 + alpha, -2.0 * cos_w, 1.0 - alpha],
            ),
            Self::Allpass { .. } => BiquadCoeffs::normalized(
                [1.0 - alpha, -2.0 * cos_w, 1.0 + alpha],
                [1.0 + alpha, -2.0 * cos_w, 1.0 - alpha],
            ),
            Self::Peaking { gain_db, .. } => {
                let a = 10f64.powf(gain_db / 40.0);
                BiquadCoeffs::normalized(
                    [1.0 + alpha * a, -2.0 * cos_w, 1.0 - alpha * a],
                    [1.0 + alpha / a, -2.0 * cos_w, 1.0 - alpha / a],
                )
            }
            Self::LowShelf { gain_db, .. } => {
                let a = 10f64.powf(gain_db / 40.0);
                let s = 2.0 * a.sqrt() * alpha;
                BiquadCoeffs::normalized(
                    [
                        a * ((a + 1.0) - (a - 1.0) * cos_w + s),
                        2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
                        a * ((a + 1.0) - (a - 1.0) * cos_w - s),
                    ],
                    [
                        (a + 1.0) + (a - 1.0) * cos_w + s,
                        -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
                        (a + 1.0) + (a - 1.0) * cos_w - s,
                    ],
                )
            }
            Self::HighShelf { gain_db, .. } => {
                let a = 10f64.powf(gain_db / 40.0);
                let s = 2.0 * a.sqrt() * alpha;
                BiquadCoeffs::normalized(
                    [
                        a * ((a + 1.0) + (a - 1.0) * cos_w + s),
                        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
                        a * ((a + 1.0) + (a - 1.0) * cos_w - s),
                    ],
                    [
                        (a + 1.0) - (a - 1.0) * cos_w + s,
                        2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
                        (a + 1.0) - (a - 1.0) * cos_w - s,
                    ],
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dc_gain(c: &BiquadCoeffs) -> f64 {
        (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2)
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let c = BiquadDesign::Lowpass { freq: 1000.0, q: 0.707 }.coeffs(48000.0);
        approx::assert_abs_diff_eq!(dc_gain(&c), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let c = BiquadDesign::Highpass { freq: 1000.0, q: 0.707 }.coeffs(48000.0);
        approx::assert_abs_diff_eq!(dc_gain(&c), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_low_shelf_dc_gain_matches_setting() {
        let c = BiquadDesign::LowShelf {
            freq: 200.0,
            q: 0.707,
            gain_db: 6.0,
        }
        .coeffs(44100.0);
        let db = 20.0 * dc_gain(&c).log10();
        approx::assert_abs_diff_eq!(db, 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_peaking_zero_gain_is_identity() {
        let c = BiquadDesign::Peaking {
            freq: 1000.0,
            q: 1.0,
            gain_db: 0.0,
        }
        .coeffs(48000.0);
        approx::assert_abs_diff_eq!(c.b0, 1.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(c.b1, c.a1, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(c.b2, c.a2, epsilon = 1e-12);
    }
}
