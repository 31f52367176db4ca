//! Transient / steady-state separation
//!
//! Per bin, the second difference of the phase across frames measures how far
//! the bin departs from a stationary sinusoid (whose phase advances
//! linearly). Bins deviating by more than `parm * oft1` go to the transient
//! output, bins deviating by less than `parm * oft2` go to the steady output.
//! `oft1`/`oft2` adapt per bin: a bin that was just classified becomes more
//! likely to be classified the same way again.

use std::f64::consts::PI;

use fk_core::{ComplexBuffer, FkError, FkResult, Release, Sample, SampleBuffer};

use crate::music::unwrap2pi;
use crate::{Stage, ensure_live};

const NAME: &str = "Tss";

pub const DEFAULT_THRESHOLD: Sample = 0.1;
pub const DEFAULT_ALPHA: Sample = 3.0;
pub const DEFAULT_BETA: Sample = 4.0;

/// Per-bin adaptive factor after a frame: 1 for an empty bin, `alpha`
/// (plus `beta` when `alpha > 1`) for a classified one
#[inline]
fn adapt(norm: Sample, alpha: Sample, beta: Sample) -> Sample {
    if norm == 0.0 {
        1.0
    } else if alpha > 1.0 {
        alpha + beta
    } else {
        alpha
    }
}

/// Transient / steady-state separator
#[derive(Debug)]
pub struct Tss {
    threshold: Sample,
    alpha: Sample,
    beta: Sample,
    /// `2 pi hop / bins`
    threshold_factor: Sample,
    parm: Sample,
    /// Phases of the previous two frames
    theta1: Vec<Sample>,
    theta2: Vec<Sample>,
    oft1: Vec<Sample>,
    oft2: Vec<Sample>,
    transient: ComplexBuffer,
    steady: ComplexBuffer,
    released: bool,
}

impl Tss {
    /// Separator for spectra of a `window_size` FFT advanced by `hop_size`
    pub fn new(window_size: usize, hop_size: usize) -> FkResult<Self> {
        if window_size < 2 || hop_size == 0 {
            return Err(FkError::Construction(format!(
                "TSS needs window >= 2 and hop >= 1, got {window_size}/{hop_size}"
            )));
        }
        if hop_size > window_size {
            return Err(FkError::Construction(format!(
                "hop size {hop_size} is larger than window size {window_size}"
            )));
        }

        let bins = window_size / 2 + 1;
        let threshold_factor = 2.0 * PI * hop_size as f64 / bins as f64;
        log::debug!("Tss: window {window_size}, hop {hop_size}, {bins} bins");

        Ok(Self {
            threshold: DEFAULT_THRESHOLD,
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            threshold_factor,
            parm: DEFAULT_THRESHOLD * threshold_factor,
            theta1: vec![0.0; bins],
            theta2: vec![0.0; bins],
            oft1: vec![0.0; bins],
            oft2: vec![0.0; bins],
            transient: ComplexBuffer::new(bins),
            steady: ComplexBuffer::new(bins),
            released: false,
        })
    }

    /// Split `spectrum` into the transient and steady outputs
    #[allow(clippy::needless_range_loop)]
    pub fn process(&mut self, spectrum: &ComplexBuffer) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        spectrum.check_live()?;
        FkError::check_len(self.theta1.len(), spectrum.len())?;

        let (alpha, beta, parm) = (self.alpha, self.beta, self.parm);
        let (trans_norm, trans_phase) = self.transient.parts_mut();
        let (stead_norm, stead_phase) = self.steady.parts_mut();
        let norms = spectrum.norm_slice();
        let phases = spectrum.phase_slice();

        for j in 0..norms.len() {
            let phase = phases[j];
            let dev = unwrap2pi(phase - 2.0 * self.theta1[j] + self.theta2[j]).abs();
            self.theta2[j] = self.theta1[j];
            self.theta1[j] = phase;

            let is_transient = dev > parm * self.oft1[j];
            trans_norm[j] = if is_transient { norms[j] } else { 0.0 };
            trans_phase[j] = if is_transient { phase } else { 0.0 };

            let is_steady = dev < parm * self.oft2[j];
            stead_norm[j] = if is_steady { norms[j] } else { 0.0 };
            stead_phase[j] = if is_steady { phase } else { 0.0 };

            self.oft1[j] = adapt(trans_norm[j], alpha, beta);
            self.oft2[j] = adapt(stead_norm[j], alpha, beta);
        }
        Ok(())
    }

    /// Transient part of the last processed spectrum
    #[inline]
    pub fn transient(&self) -> &ComplexBuffer {
        &self.transient
    }

    /// Steady-state part of the last processed spectrum
    #[inline]
    pub fn steady(&self) -> &ComplexBuffer {
        &self.steady
    }

    pub fn set_threshold(&mut self, threshold: Sample) {
        self.threshold = threshold;
        self.parm = threshold * self.threshold_factor;
    }

    #[inline]
    pub fn threshold(&self) -> Sample {
        self.threshold
    }

    pub fn set_alpha(&mut self, alpha: Sample) {
        self.alpha = alpha;
    }

    #[inline]
    pub fn alpha(&self) -> Sample {
        self.alpha
    }

    pub fn set_beta(&mut self, beta: Sample) {
        self.beta = beta;
    }

    #[inline]
    pub fn beta(&self) -> Sample {
        self.beta
    }
}

impl Release for Tss {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.theta1 = Vec::new();
        self.theta2 = Vec::new();
        self.oft1 = Vec::new();
        self.oft2 = Vec::new();
        self.transient.release();
        self.steady.release();
        self.released = true;
        log::debug!("Tss released");
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Stage for Tss {
    fn reset(&mut self) {
        self.theta1.fill(0.0);
        self.theta2.fill(0.0);
        self.oft1.fill(0.0);
        self.oft2.fill(0.0);
    }
}
