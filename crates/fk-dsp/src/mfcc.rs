//! Mel-frequency cepstral coefficients
//!
//! Spectrum -> mel filterbank -> `log10` -> scale -> DCT-II.

use fk_core::{ComplexBuffer, FkError, FkResult, Release, Sample, SimpleBuffer};

use crate::dct::Dct;
use crate::filterbank::{FilterBank, SLANEY_FILTERS};
use crate::{Stage, ensure_live};

const NAME: &str = "Mfcc";

/// Floor applied to band energies before the logarithm
const ENERGY_FLOOR: Sample = 1e-10;

/// Cepstral coefficient extractor
pub struct Mfcc {
    sample_rate: u32,
    filterbank: FilterBank,
    dct: Dct,
    /// Log band energies
    bands: Vec<Sample>,
    scale: Sample,
    output: SimpleBuffer,
    released: bool,
}

impl Mfcc {
    /// `coefficients` cepstral values from `filters` mel bands of a
    /// `window_size` FFT. Forty filters use Slaney's layout, any other count
    /// is mel-spaced from 0 Hz to Nyquist.
    pub fn new(
        window_size: usize,
        filters: usize,
        coefficients: usize,
        sample_rate: u32,
    ) -> FkResult<Self> {
        if sample_rate == 0 {
            return Err(FkError::Construction("MFCC sample rate must be positive".into()));
        }
        if coefficients == 0 || coefficients > filters {
            return Err(FkError::Construction(format!(
                "MFCC needs 0 < coefficients <= filters, got {coefficients} of {filters}"
            )));
        }

        let mut filterbank = FilterBank::new(filters, window_size)?;
        if filters == SLANEY_FILTERS {
            filterbank.set_mel_coeffs_slaney(sample_rate)?;
        } else {
            filterbank.set_mel_coeffs(sample_rate, 0.0, sample_rate as f64 / 2.0)?;
        }
        let dct = Dct::new(filters, coefficients)?;

        log::debug!(
            "Mfcc: window {window_size}, {filters} filters, {coefficients} coefficients, {sample_rate} Hz"
        );
        Ok(Self {
            sample_rate,
            filterbank,
            dct,
            bands: vec![0.0; filters],
            scale: 1.0,
            output: SimpleBuffer::new(coefficients),
            released: false,
        })
    }

    /// Compute coefficients of `spectrum` into the owned output buffer
    pub fn process(&mut self, spectrum: &ComplexBuffer) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        self.filterbank.process(spectrum)?;

        let scale = self.scale;
        for (band, &energy) in self.bands.iter_mut().zip(self.filterbank.output().as_slice()) {
            *band = energy.max(ENERGY_FLOOR).log10() * scale;
        }
        self.dct.forward(&self.bands, self.output.as_mut_slice());
        Ok(())
    }

    /// Coefficients of the last [`process`](Self::process) call
    #[inline]
    pub fn output(&self) -> &SimpleBuffer {
        &self.output
    }

    #[inline]
    pub fn coefficients(&self) -> usize {
        self.output.len()
    }

    #[inline]
    pub fn filters(&self) -> usize {
        self.filterbank.filters()
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_scale(&mut self, scale: Sample) {
        self.scale = scale;
    }

    #[inline]
    pub fn scale(&self) -> Sample {
        self.scale
    }

    pub fn set_power(&mut self, power: Sample) {
        self.filterbank.set_power(power);
    }

    #[inline]
    pub fn power(&self) -> Sample {
        self.filterbank.power()
    }

    /// Band layout access; mel setters apply to the internal filterbank
    pub fn set_mel_coeffs(&mut self, fmin: Sample, fmax: Sample) -> FkResult<()> {
        self.filterbank.set_mel_coeffs(self.sample_rate, fmin, fmax)
    }

    pub fn set_mel_coeffs_htk(&mut self, fmin: Sample, fmax: Sample) -> FkResult<()> {
        self.filterbank.set_mel_coeffs_htk(self.sample_rate, fmin, fmax)
    }

    pub fn set_mel_coeffs_slaney(&mut self) -> FkResult<()> {
        self.filterbank.set_mel_coeffs_slaney(self.sample_rate)
    }

    /// Internal filterbank, for reading its coefficients
    #[inline]
    pub fn filterbank(&self) -> &FilterBank {
        &self.filterbank
    }
}

impl std::fmt::Debug for Mfcc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mfcc")
            .field("sample_rate", &self.sample_rate)
            .field("filters", &self.filterbank.filters())
            .field("coefficients", &self.dct.outputs())
            .field("scale", &self.scale)
            .field("released", &self.released)
            .finish()
    }
}

impl Release for Mfcc {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.filterbank.release();
        self.bands = Vec::new();
        self.output.release();
        self.released = true;
        log::debug!("Mfcc released");
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Stage for Mfcc {
    fn reset(&mut self) {
        self.output.zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_length() {
        let mfcc = Mfcc::new(512, 40, 13, 16000).unwrap();
        assert_eq!(mfcc.coefficients(), 13);
        assert_eq!(mfcc.output().len(), 13);
        assert_eq!(mfcc.filters(), 40);
    }

    #[test]
    fn test_construction_errors() {
        assert!(Mfcc::new(512, 10, 13, 16000).is_err());
        assert!(Mfcc::new(512, 40, 0, 16000).is_err());
        assert!(Mfcc::new(512, 40, 13, 0).is_err());
        assert!(Mfcc::new(0, 40, 13, 16000).is_err());
    }

    #[test]
    fn test_silence_is_finite() {
        let mut mfcc = Mfcc::new(512, 40, 13, 16000).unwrap();
        mfcc.process(&ComplexBuffer::for_window(512)).unwrap();
        let out = mfcc.output().to_vec();
        assert!(out.iter().all(|c| c.is_finite()));
        // every band at the floor: only the DC coefficient survives
        approx::assert_relative_eq!(out[0], -10.0 * 40f64.sqrt(), epsilon = 1e-9);
        for &c in &out[1..] {
            approx::assert_abs_diff_eq!(c, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_scale_is_linear() {
        let spectrum = ComplexBuffer::from_norm(257, &[0.3; 257]);
        let mut a = Mfcc::new(512, 20, 10, 22050).unwrap();
        let mut b = Mfcc::new(512, 20, 10, 22050).unwrap();
        b.set_scale(2.0);
        a.process(&spectrum).unwrap();
        b.process(&spectrum).unwrap();
        for (x, y) in a.output().as_slice().iter().zip(b.output().as_slice()) {
            approx::assert_relative_eq!(2.0 * x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_size_mismatch_and_release() {
        let mut mfcc = Mfcc::new(512, 40, 13, 16000).unwrap();
        assert!(matches!(
            mfcc.process(&ComplexBuffer::new(100)),
            Err(FkError::SizeMismatch { .. })
        ));
        mfcc.release();
        assert_eq!(
            mfcc.process(&ComplexBuffer::for_window(512)),
            Err(FkError::Released("Mfcc"))
        );
        assert_eq!(mfcc.coefficients(), 0);
    }
}
