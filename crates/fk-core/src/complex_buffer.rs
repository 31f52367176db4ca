//! Spectrum buffer (norm/phase per bin)

use crate::{BufferKind, FkError, FkResult, Release, Sample, SampleBuffer, check_index};

const KIND: BufferKind = BufferKind::Complex;

/// Spectrum stored as polar pairs, one per bin
///
/// `norm` and `phase` always have the same length. Phases are radians.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexBuffer {
    norm: Vec<Sample>,
    phase: Vec<Sample>,
    released: bool,
}

impl ComplexBuffer {
    /// Allocate a zeroed spectrum of `bins` bins
    pub fn new(bins: usize) -> Self {
        Self {
            norm: vec![0.0; bins],
            phase: vec![0.0; bins],
            released: false,
        }
    }

    /// Allocate the spectrum of a real FFT over `window_size` samples
    /// (`window_size / 2 + 1` bins)
    pub fn for_window(window_size: usize) -> Self {
        Self::new(window_size / 2 + 1)
    }

    /// Allocate `bins` bins and load `norms`; phases start at zero
    pub fn from_norm(bins: usize, norms: &[Sample]) -> Self {
        let mut buf = Self::new(bins);
        let n = bins.min(norms.len());
        buf.norm[..n].copy_from_slice(&norms[..n]);
        buf
    }

    #[inline]
    fn live(&self) -> FkResult<()> {
        if self.released {
            Err(FkError::Released(KIND.name()))
        } else {
            Ok(())
        }
    }

    /// Number of bins (0 once released)
    #[inline]
    pub fn len(&self) -> usize {
        self.norm.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.norm.is_empty()
    }

    pub fn get_norm(&self, bin: usize) -> FkResult<Sample> {
        self.live()?;
        check_index(bin, self.norm.len())?;
        Ok(self.norm[bin])
    }

    pub fn set_norm(&mut self, bin: usize, value: Sample) -> FkResult<()> {
        self.live()?;
        check_index(bin, self.norm.len())?;
        self.norm[bin] = value;
        Ok(())
    }

    pub fn get_phase(&self, bin: usize) -> FkResult<Sample> {
        self.live()?;
        check_index(bin, self.phase.len())?;
        Ok(self.phase[bin])
    }

    pub fn set_phase(&mut self, bin: usize, value: Sample) -> FkResult<()> {
        self.live()?;
        check_index(bin, self.phase.len())?;
        self.phase[bin] = value;
        Ok(())
    }

    /// Load norms; copies `min(len, data.len())` values
    pub fn set_norm_data(&mut self, data: &[Sample]) -> FkResult<()> {
        self.live()?;
        let n = self.norm.len().min(data.len());
        self.norm[..n].copy_from_slice(&data[..n]);
        Ok(())
    }

    /// Load phases; copies `min(len, data.len())` values
    pub fn set_phase_data(&mut self, data: &[Sample]) -> FkResult<()> {
        self.live()?;
        let n = self.phase.len().min(data.len());
        self.phase[..n].copy_from_slice(&data[..n]);
        Ok(())
    }

    /// Copy another spectrum with the same bin count into this one
    pub fn copy_from(&mut self, other: &ComplexBuffer) -> FkResult<()> {
        self.live()?;
        other.live()?;
        FkError::check_len(self.norm.len(), other.norm.len())?;
        self.norm.copy_from_slice(&other.norm);
        self.phase.copy_from_slice(&other.phase);
        Ok(())
    }

    /// Copy of the norms
    pub fn norm(&self) -> Vec<Sample> {
        self.norm.clone()
    }

    /// Copy of the phases
    pub fn phase(&self) -> Vec<Sample> {
        self.phase.clone()
    }

    #[inline]
    pub fn norm_slice(&self) -> &[Sample] {
        &self.norm
    }

    #[inline]
    pub fn phase_slice(&self) -> &[Sample] {
        &self.phase
    }

    #[inline]
    pub fn norm_mut(&mut self) -> &mut [Sample] {
        &mut self.norm
    }

    #[inline]
    pub fn phase_mut(&mut self) -> &mut [Sample] {
        &mut self.phase
    }

    /// Both halves mutably at once
    #[inline]
    pub fn parts_mut(&mut self) -> (&mut [Sample], &mut [Sample]) {
        (&mut self.norm, &mut self.phase)
    }

    /// Sum of squared norms
    pub fn energy(&self) -> Sample {
        self.norm.iter().map(|n| n * n).sum()
    }
}

impl Release for ComplexBuffer {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.norm = Vec::new();
        self.phase = Vec::new();
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl SampleBuffer for ComplexBuffer {
    fn kind(&self) -> BufferKind {
        KIND
    }

    fn len(&self) -> usize {
        self.norm.len()
    }

    fn clear(&mut self) {
        self.norm.fill(0.0);
        self.phase.fill(0.0);
    }
}
