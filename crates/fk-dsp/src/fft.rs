//! Real FFT engine shared by the spectral stages
//!
//! Owns the plans and every scratch vector up front so forward/inverse
//! transforms never allocate.

use std::sync::Arc;

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use fk_core::{ComplexBuffer, FkError, FkResult, Sample};

pub(crate) struct RealFft {
    size: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
    time: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    forward_scratch: Vec<Complex<f64>>,
    inverse_scratch: Vec<Complex<f64>>,
}

impl RealFft {
    pub(crate) fn new(size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);

        Self {
            size,
            time: forward.make_input_vec(),
            spectrum: forward.make_output_vec(),
            forward_scratch: forward.make_scratch_vec(),
            inverse_scratch: inverse.make_scratch_vec(),
            forward,
            inverse,
        }
    }

    /// Number of spectrum bins (`size / 2 + 1`)
    #[inline]
    pub(crate) fn bins(&self) -> usize {
        self.spectrum.len()
    }

    /// Time-domain working buffer, `size` samples
    #[inline]
    pub(crate) fn time(&self) -> &[f64] {
        &self.time
    }

    #[inline]
    pub(crate) fn time_mut(&mut self) -> &mut [f64] {
        &mut self.time
    }

    /// Transform the time buffer into `grain` as norm/phase pairs.
    /// The time buffer is used as scratch and left unspecified.
    pub(crate) fn forward_into(&mut self, grain: &mut ComplexBuffer) -> FkResult<()> {
        FkError::check_len(self.bins(), grain.len())?;
        self.forward
            .process_with_scratch(&mut self.time, &mut self.spectrum, &mut self.forward_scratch)
            .map_err(|e| FkError::Dsp(e.to_string()))?;

        let (norm, phase) = grain.parts_mut();
        for ((c, n), p) in self.spectrum.iter().zip(norm).zip(phase) {
            *n = c.norm();
            *p = c.arg();
        }
        Ok(())
    }

    /// Transform `grain` back into the time buffer, scaled by `1 / size`
    pub(crate) fn inverse_from(&mut self, grain: &ComplexBuffer) -> FkResult<()> {
        FkError::check_len(self.bins(), grain.len())?;
        for ((c, &n), &p) in self
            .spectrum
            .iter_mut()
            .zip(grain.norm_slice())
            .zip(grain.phase_slice())
        {
            *c = Complex::from_polar(n, p);
        }

        // DC and Nyquist bins of a real signal carry no imaginary part
        self.spectrum[0].im = 0.0;
        if self.size % 2 == 0 {
            let last = self.spectrum.len() - 1;
            self.spectrum[last].im = 0.0;
        }

        self.inverse
            .process_with_scratch(&mut self.spectrum, &mut self.time, &mut self.inverse_scratch)
            .map_err(|e| FkError::Dsp(e.to_string()))?;

        let norm = 1.0 / self.size as Sample;
        for s in &mut self.time {
            *s *= norm;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_inverse_round_trip() {
        for size in [8, 15, 64] {
            let mut fft = RealFft::new(size);
            let signal: Vec<f64> = (0..size).map(|i| (i as f64 * 0.7).sin() + 0.25).collect();
            fft.time_mut().copy_from_slice(&signal);

            let mut grain = ComplexBuffer::for_window(size);
            fft.forward_into(&mut grain).unwrap();
            fft.inverse_from(&grain).unwrap();

            for (a, b) in fft.time().iter().zip(&signal) {
                approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_dc_lands_in_bin_zero() {
        let mut fft = RealFft::new(16);
        fft.time_mut().fill(1.0);
        let mut grain = ComplexBuffer::for_window(16);
        fft.forward_into(&mut grain).unwrap();
        approx::assert_abs_diff_eq!(grain.norm_slice()[0], 16.0, epsilon = 1e-12);
        assert!(grain.norm_slice()[1..].iter().all(|&n| n < 1e-9));
    }

    #[test]
    fn test_rejects_wrong_grain_size() {
        let mut fft = RealFft::new(16);
        let mut grain = ComplexBuffer::new(4);
        assert!(fft.forward_into(&mut grain).is_err());
    }
}
