//! In-place elementwise math on [`SimpleBuffer`]
//!
//! Each operation follows the IEEE 754 / libm behaviour of the matching
//! `f64` method: `log` of 0 is `-inf`, `log` of a negative value is NaN,
//! `round` rounds half away from zero. On a released buffer these are
//! no-ops over zero elements.

use crate::{Sample, SimpleBuffer};

impl SimpleBuffer {
    #[inline]
    fn map_inplace(&mut self, f: impl Fn(Sample) -> Sample) {
        for s in self.as_mut_slice() {
            *s = f(*s);
        }
    }

    pub fn exp(&mut self) {
        self.map_inplace(Sample::exp);
    }

    pub fn cos(&mut self) {
        self.map_inplace(Sample::cos);
    }

    pub fn sin(&mut self) {
        self.map_inplace(Sample::sin);
    }

    pub fn abs(&mut self) {
        self.map_inplace(Sample::abs);
    }

    pub fn sqrt(&mut self) {
        self.map_inplace(Sample::sqrt);
    }

    /// Natural logarithm
    pub fn log(&mut self) {
        self.map_inplace(Sample::ln);
    }

    pub fn log10(&mut self) {
        self.map_inplace(Sample::log10);
    }

    pub fn floor(&mut self) {
        self.map_inplace(Sample::floor);
    }

    pub fn ceil(&mut self) {
        self.map_inplace(Sample::ceil);
    }

    pub fn round(&mut self) {
        self.map_inplace(Sample::round);
    }

    /// Raise every sample to `power`
    pub fn pow(&mut self, power: Sample) {
        self.map_inplace(|s| s.powf(power));
    }

    /// Clamp every sample into `[-|absmax|, |absmax|]`
    pub fn clamp(&mut self, absmax: Sample) {
        let limit = absmax.abs();
        self.map_inplace(|s| {
            if s > limit {
                limit
            } else if s < -limit {
                -limit
            } else {
                s
            }
        });
    }

    /// Multiply every sample by `gain`
    pub fn scale(&mut self, gain: Sample) {
        self.map_inplace(|s| s * gain);
    }

    pub fn sum(&self) -> Sample {
        self.as_slice().iter().sum()
    }

    /// Arithmetic mean (0 for an empty buffer)
    pub fn mean(&self) -> Sample {
        if self.is_empty() {
            0.0
        } else {
            self.sum() / self.len() as Sample
        }
    }

    /// Largest sample (`-inf` for an empty buffer)
    pub fn max(&self) -> Sample {
        self.as_slice()
            .iter()
            .copied()
            .fold(Sample::NEG_INFINITY, Sample::max)
    }
}
