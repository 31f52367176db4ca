//! Spectral filterbank
//!
//! Maps a magnitude spectrum to per-band energies through a
//! `filters × bins` coefficient matrix:
//!
//! ```text
//! out[f] = sum_b coeffs[f][b] * norm[b]^power
//! ```
//!
//! Coefficients start at zero. Fill them with one of the band layouts
//! (`set_triangle_bands`, `set_mel_coeffs*`) or load a matrix directly with
//! `set_coeffs`.

use fk_core::{
    ComplexBuffer, FkError, FkResult, MatrixBuffer, Release, Sample, SampleBuffer, SimpleBuffer,
};

use crate::mel::{hz_to_mel, hz_to_mel_htk, mel_to_hz, mel_to_hz_htk};
use crate::{Stage, ensure_live};

const NAME: &str = "FilterBank";

// Slaney's Auditory Toolbox layout
const SLANEY_LOWEST_HZ: f64 = 133.3333;
const SLANEY_LINEAR_SPACING: f64 = 66.66666666;
const SLANEY_LOG_SPACING: f64 = 1.0711703;
const SLANEY_LINEAR_FILTERS: usize = 13;
const SLANEY_LOG_FILTERS: usize = 27;

/// Band count of the Slaney layout
pub const SLANEY_FILTERS: usize = SLANEY_LINEAR_FILTERS + SLANEY_LOG_FILTERS;

/// Spectrum to band-energy transform
#[derive(Debug)]
pub struct FilterBank {
    filters: usize,
    window_size: usize,
    norm: Sample,
    power: Sample,
    coeffs: MatrixBuffer,
    /// Spectrum norms raised to `power`
    scratch: Vec<Sample>,
    output: SimpleBuffer,
    released: bool,
}

impl FilterBank {
    /// Zeroed filterbank of `filters` bands over a `window_size` FFT
    pub fn new(filters: usize, window_size: usize) -> FkResult<Self> {
        if filters == 0 {
            return Err(FkError::Construction("filterbank needs at least one filter".into()));
        }
        if window_size < 2 {
            return Err(FkError::Construction(format!(
                "filterbank window size must be at least 2, got {window_size}"
            )));
        }
        let bins = window_size / 2 + 1;
        log::debug!("FilterBank: {filters} filters, window {window_size} ({bins} bins)");

        Ok(Self {
            filters,
            window_size,
            norm: 1.0,
            power: 1.0,
            coeffs: MatrixBuffer::new(filters, bins),
            scratch: vec![0.0; bins],
            output: SimpleBuffer::new(filters),
            released: false,
        })
    }

    /// Compute band energies of `spectrum` into the owned output buffer
    pub fn process(&mut self, spectrum: &ComplexBuffer) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        spectrum.check_live()?;
        FkError::check_len(self.scratch.len(), spectrum.len())?;

        self.scratch.copy_from_slice(spectrum.norm_slice());
        if self.power != 1.0 {
            let power = self.power;
            for s in &mut self.scratch {
                *s = s.powf(power);
            }
        }

        for (out, row) in self.output.as_mut_slice().iter_mut().zip(self.coeffs.rows()) {
            *out = row.iter().zip(&self.scratch).map(|(c, s)| c * s).sum();
        }
        Ok(())
    }

    /// Band energies of the last [`process`](Self::process) call
    #[inline]
    pub fn output(&self) -> &SimpleBuffer {
        &self.output
    }

    #[inline]
    pub fn filters(&self) -> usize {
        if self.released { 0 } else { self.filters }
    }

    #[inline]
    pub fn window_size(&self) -> usize {
        if self.released { 0 } else { self.window_size }
    }

    /// Spectrum bins per filter
    #[inline]
    pub fn bins(&self) -> usize {
        self.scratch.len()
    }

    /// Area normalisation of triangle bands (1 on, 0 off)
    pub fn set_norm(&mut self, norm: Sample) -> FkResult<()> {
        if norm != 0.0 && norm != 1.0 {
            return Err(FkError::InvalidParam(format!(
                "filterbank norm must be 0 or 1, got {norm}"
            )));
        }
        self.norm = norm;
        Ok(())
    }

    #[inline]
    pub fn norm(&self) -> Sample {
        self.norm
    }

    /// Exponent applied to spectrum norms before filtering
    pub fn set_power(&mut self, power: Sample) {
        self.power = power;
    }

    #[inline]
    pub fn power(&self) -> Sample {
        self.power
    }

    /// Current coefficient matrix
    #[inline]
    pub fn coeffs(&self) -> &MatrixBuffer {
        &self.coeffs
    }

    /// Replace the coefficient matrix with a copy of `coeffs`, which must
    /// have the same `filters × bins` shape
    pub fn set_coeffs(&mut self, coeffs: &MatrixBuffer) -> FkResult<()> {
        if self.released {
            return Err(FkError::Released(NAME));
        }
        coeffs.check_live()?;
        FkError::check_len(self.filters, coeffs.height())?;
        FkError::check_len(self.scratch.len(), coeffs.length())?;

        let mut fresh = MatrixBuffer::new(self.filters, self.scratch.len());
        for (dst, src) in fresh.rows_mut().zip(coeffs.rows()) {
            dst.copy_from_slice(src);
        }
        self.coeffs = fresh;
        Ok(())
    }

    /// Scale every filter so its peak coefficient is 1. Filters without a
    /// positive coefficient (all-zero, or all-negative rows installed through
    /// [`set_coeffs`](Self::set_coeffs)) are left untouched.
    pub fn normalize_coeffs(&mut self) {
        for row in self.coeffs.rows_mut() {
            let peak = row.iter().copied().fold(Sample::NEG_INFINITY, Sample::max);
            if peak > 0.0 {
                for c in row.iter_mut() {
                    *c /= peak;
                }
            }
        }
    }

    /// Overlapping triangles from consecutive corner frequencies.
    ///
    /// Filter `f` rises from `corners[f]` to `corners[f + 1]` and falls to
    /// `corners[f + 2]`, so `filters + 2` corners fill every band. With
    /// `norm == 1` each triangle has unit area, otherwise unit height.
    pub fn set_triangle_bands(&mut self, corners: &[Sample], sample_rate: u32) -> FkResult<()> {
        if self.released {
            return Err(FkError::Released(NAME));
        }
        if sample_rate == 0 {
            return Err(FkError::InvalidParam("sample rate must be positive".into()));
        }
        if corners.len() < 3 {
            return Err(FkError::InvalidParam(format!(
                "triangle bands need at least 3 corners, got {}",
                corners.len()
            )));
        }
        if let Some(bad) = corners.iter().find(|&&f| f < 0.0) {
            return Err(FkError::InvalidParam(format!(
                "band corner frequencies must be positive, got {bad}"
            )));
        }
        if corners.windows(2).any(|w| w[1] < w[0]) {
            return Err(FkError::InvalidParam(
                "band corner frequencies must be in ascending order".into(),
            ));
        }

        let requested = corners.len() - 2;
        if requested < self.filters {
            log::warn!(
                "FilterBank: {} filters allocated but only {requested} bands given",
                self.filters
            );
        } else if requested > self.filters {
            log::warn!(
                "FilterBank: {requested} bands given but only {} filters allocated",
                self.filters
            );
        }
        let nyquist = sample_rate as f64 / 2.0;
        if corners.iter().any(|&f| f > nyquist) {
            log::warn!("FilterBank: band corners above Nyquist ({nyquist} Hz)");
        }
        if corners.windows(2).any(|w| w[0] == w[1]) {
            log::warn!("FilterBank: duplicate band corners produce empty slopes");
        }

        let bin_hz = sample_rate as f64 / self.window_size as f64;
        let norm = self.norm;
        let bands = requested.min(self.filters);

        for (f, row) in self.coeffs.rows_mut().enumerate() {
            row.fill(0.0);
            if f >= bands {
                continue;
            }
            let (lo, centre, hi) = (corners[f], corners[f + 1], corners[f + 2]);
            let height = if norm == 1.0 { 2.0 / (hi - lo) } else { 1.0 };

            for (b, c) in row.iter_mut().enumerate() {
                let freq = b as f64 * bin_hz;
                if freq > lo && freq < centre {
                    *c = height * (freq - lo) / (centre - lo);
                } else if freq >= centre && freq < hi {
                    *c = height * (hi - freq) / (hi - centre);
                }
            }
        }
        Ok(())
    }

    /// Slaney's 40-band layout: 13 linear bands from 133 Hz, then 27
    /// log-spaced bands
    pub fn set_mel_coeffs_slaney(&mut self, sample_rate: u32) -> FkResult<()> {
        if sample_rate == 0 {
            return Err(FkError::InvalidParam("sample rate must be positive".into()));
        }
        if self.filters != SLANEY_FILTERS {
            log::warn!(
                "FilterBank: Slaney layout has {SLANEY_FILTERS} bands, {} allocated",
                self.filters
            );
        }

        let mut corners = [0.0; SLANEY_FILTERS + 2];
        for (i, c) in corners.iter_mut().take(SLANEY_LINEAR_FILTERS).enumerate() {
            *c = SLANEY_LOWEST_HZ + i as f64 * SLANEY_LINEAR_SPACING;
        }
        let last_linear = corners[SLANEY_LINEAR_FILTERS - 1];
        for (i, c) in corners.iter_mut().skip(SLANEY_LINEAR_FILTERS).enumerate() {
            *c = last_linear * SLANEY_LOG_SPACING.powi(i as i32 + 1);
        }
        self.set_triangle_bands(&corners, sample_rate)
    }

    /// `filters + 2` corners evenly spaced on the Slaney mel scale between
    /// `fmin` and `fmax` (`fmax == 0` selects Nyquist)
    pub fn set_mel_coeffs(&mut self, sample_rate: u32, fmin: Sample, fmax: Sample) -> FkResult<()> {
        self.set_mel_spaced(sample_rate, fmin, fmax, hz_to_mel, mel_to_hz)
    }

    /// Same as [`set_mel_coeffs`](Self::set_mel_coeffs) on the HTK mel scale
    pub fn set_mel_coeffs_htk(
        &mut self,
        sample_rate: u32,
        fmin: Sample,
        fmax: Sample,
    ) -> FkResult<()> {
        self.set_mel_spaced(sample_rate, fmin, fmax, hz_to_mel_htk, mel_to_hz_htk)
    }

    fn set_mel_spaced(
        &mut self,
        sample_rate: u32,
        fmin: Sample,
        fmax: Sample,
        to_mel: fn(f64) -> f64,
        to_hz: fn(f64) -> f64,
    ) -> FkResult<()> {
        if sample_rate == 0 {
            return Err(FkError::InvalidParam("sample rate must be positive".into()));
        }
        if fmin < 0.0 || fmax < 0.0 {
            return Err(FkError::InvalidParam(format!(
                "mel range must be positive, got {fmin}..{fmax}"
            )));
        }
        let fmax = if fmax == 0.0 { sample_rate as f64 / 2.0 } else { fmax };
        if fmin >= fmax {
            return Err(FkError::InvalidParam(format!(
                "mel range is empty: {fmin}..{fmax}"
            )));
        }

        let start = to_mel(fmin);
        let step = (to_mel(fmax) - start) / (self.filters + 1) as f64;
        let corners: Vec<Sample> = (0..self.filters + 2)
            .map(|i| to_hz(start + i as f64 * step))
            .collect();
        self.set_triangle_bands(&corners, sample_rate)
    }
}

impl Release for FilterBank {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.coeffs.release();
        self.scratch = Vec::new();
        self.output.release();
        self.released = true;
        log::debug!("FilterBank released");
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Stage for FilterBank {
    fn reset(&mut self) {
        self.output.zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let fb = FilterBank::new(40, 512).unwrap();
        assert_eq!(fb.coeffs().height(), 40);
        assert_eq!(fb.coeffs().length(), 257);
        assert_eq!(fb.output().len(), 40);
        assert!(FilterBank::new(0, 512).is_err());
        assert!(FilterBank::new(4, 1).is_err());
    }

    #[test]
    fn test_coeffs_round_trip() {
        let mut fb = FilterBank::new(2, 6).unwrap();
        let m = MatrixBuffer::from_channels(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![0.5, 0.0, 0.25, 0.0],
        ])
        .unwrap();
        fb.set_coeffs(&m).unwrap();
        assert_eq!(fb.coeffs(), &m);

        let wrong = MatrixBuffer::new(2, 5);
        assert!(matches!(
            fb.set_coeffs(&wrong),
            Err(FkError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_process_is_weighted_sum() {
        let mut fb = FilterBank::new(2, 6).unwrap();
        fb.set_coeffs(
            &MatrixBuffer::from_channels(&[vec![1.0, 1.0, 0.0, 0.0], vec![0.0, 0.0, 2.0, 1.0]])
                .unwrap(),
        )
        .unwrap();
        let spectrum = ComplexBuffer::from_norm(4, &[1.0, 2.0, 3.0, 4.0]);
        fb.process(&spectrum).unwrap();
        assert_eq!(fb.output().to_vec(), vec![3.0, 10.0]);

        fb.set_power(2.0);
        fb.process(&spectrum).unwrap();
        assert_eq!(fb.output().to_vec(), vec![5.0, 34.0]);
        // the caller's spectrum is not raised in place
        assert_eq!(spectrum.norm(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_triangle_bands() {
        // 8 kHz, window 16: bins every 500 Hz
        let mut fb = FilterBank::new(1, 16).unwrap();
        fb.set_norm(0.0).unwrap();
        fb.set_triangle_bands(&[500.0, 1500.0, 2500.0], 8000).unwrap();
        let row = fb.coeffs().channel(0).unwrap();
        assert_eq!(&row[..6], &[0.0, 0.0, 0.5, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_triangle_area_normalisation_and_normalize() {
        let mut fb = FilterBank::new(2, 16).unwrap();
        fb.set_triangle_bands(&[500.0, 1500.0, 2500.0, 4000.0], 8000).unwrap();
        let peak0 = fb.coeffs().channel(0).unwrap().iter().copied().fold(0.0, f64::max);
        approx::assert_relative_eq!(peak0, 2.0 / 2000.0);

        fb.normalize_coeffs();
        for row in fb.coeffs().rows() {
            let peak = row.iter().copied().fold(0.0, f64::max);
            assert_eq!(peak, 1.0);
        }
    }

    #[test]
    fn test_normalize_leaves_zero_rows() {
        let mut fb = FilterBank::new(3, 16).unwrap();
        fb.normalize_coeffs();
        assert!(fb.coeffs().as_slice().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_normalize_skips_rows_without_positive_peak() {
        let mut fb = FilterBank::new(2, 4).unwrap();
        let m = MatrixBuffer::from_channels(&[
            vec![-1.0, -2.0, -0.5],
            vec![0.5, -4.0, 0.25],
        ])
        .unwrap();
        fb.set_coeffs(&m).unwrap();
        fb.normalize_coeffs();
        assert_eq!(fb.coeffs().channel(0).unwrap(), vec![-1.0, -2.0, -0.5]);
        assert_eq!(fb.coeffs().channel(1).unwrap(), vec![1.0, -8.0, 0.5]);
    }

    #[test]
    fn test_triangle_validation() {
        let mut fb = FilterBank::new(2, 16).unwrap();
        assert!(fb.set_triangle_bands(&[100.0, 200.0], 8000).is_err());
        assert!(fb.set_triangle_bands(&[-1.0, 200.0, 300.0], 8000).is_err());
        assert!(fb.set_triangle_bands(&[300.0, 200.0, 400.0], 8000).is_err());
        assert!(matches!(
            fb.set_triangle_bands(&[100.0, 200.0, 300.0], 0),
            Err(FkError::InvalidParam(_))
        ));
        // oddities only warn
        fb.set_triangle_bands(&[100.0, 100.0, 300.0], 8000).unwrap();
        fb.set_triangle_bands(&[100.0, 200.0, 300.0, 400.0, 5000.0], 8000).unwrap();
        assert!(fb.set_norm(0.5).is_err());
    }

    #[test]
    fn test_slaney_layout() {
        let mut fb = FilterBank::new(SLANEY_FILTERS, 512).unwrap();
        fb.set_mel_coeffs_slaney(16000).unwrap();
        for row in fb.coeffs().rows() {
            assert!(row.iter().any(|&c| c > 0.0));
        }
    }

    #[test]
    fn test_mel_layouts_cover_range() {
        for htk in [false, true] {
            let mut fb = FilterBank::new(20, 1024).unwrap();
            if htk {
                fb.set_mel_coeffs_htk(44100, 0.0, 0.0).unwrap();
            } else {
                fb.set_mel_coeffs(44100, 0.0, 0.0).unwrap();
            }
            let last = fb.coeffs().channel(19).unwrap();
            let top = last.iter().rposition(|&c| c > 0.0).unwrap();
            assert!(top > 480, "highest band ends at bin {top}");
        }
        let mut fb = FilterBank::new(20, 1024).unwrap();
        assert!(fb.set_mel_coeffs(44100, -5.0, 0.0).is_err());
        assert!(fb.set_mel_coeffs(0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_release() {
        let mut fb = FilterBank::new(4, 64).unwrap();
        fb.release();
        fb.release();
        assert_eq!(fb.filters(), 0);
        assert_eq!(fb.output().len(), 0);
        assert_eq!(
            fb.process(&ComplexBuffer::for_window(64)),
            Err(FkError::Released("FilterBank"))
        );
    }
}
