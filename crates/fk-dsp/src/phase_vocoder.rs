//! Phase vocoder
//!
//! Sliding-window STFT with overlap-add resynthesis:
//!
//! - analysis: slide `hop` new samples into a `window`-sized frame, apply a
//!   periodic Hann window, rotate by half a window and transform into the
//!   grain
//! - synthesis: inverse transform the grain, undo the rotation, window again
//!   when overlap exceeds 50%, and overlap-add one hop into the caller's
//!   buffer
//!
//! An unmodified grain reconstructs the input delayed by `window - hop`
//! samples.

use std::f64::consts::PI;

use fk_core::{ComplexBuffer, FkError, FkResult, Release, Sample, SampleBuffer, SimpleBuffer};

use crate::fft::RealFft;
use crate::{Stage, ensure_live};

const NAME: &str = "PhaseVocoder";

/// STFT analysis / synthesis stage
pub struct PhaseVocoder {
    window_size: usize,
    hop_size: usize,
    fft: RealFft,
    window: Vec<Sample>,
    /// Last `window - hop` input samples
    data_old: Vec<Sample>,
    /// Overlap-add accumulator, `window` samples
    synth_old: Vec<Sample>,
    grain: ComplexBuffer,
    /// Accumulator region shifted forward each hop
    start: usize,
    /// Accumulator region receiving the tail of each frame
    end: usize,
    scale: Sample,
    released: bool,
}

impl PhaseVocoder {
    /// `window_size` FFT frames advanced by `hop_size` samples per call
    pub fn new(window_size: usize, hop_size: usize) -> FkResult<Self> {
        if hop_size < 1 {
            return Err(FkError::Construction(format!(
                "hop size must be at least 1, got {hop_size}"
            )));
        }
        if window_size < 2 {
            return Err(FkError::Construction(format!(
                "window size must be at least 2, got {window_size}"
            )));
        }
        if window_size < hop_size {
            return Err(FkError::Construction(format!(
                "hop size {hop_size} is larger than window size {window_size}"
            )));
        }
        if !window_size.is_power_of_two() {
            log::warn!("PhaseVocoder: window size {window_size} is not a power of two");
        }

        let start = if window_size < 2 * hop_size {
            0
        } else {
            window_size - 2 * hop_size
        };
        let end = window_size - hop_size;

        let scale = if window_size == 4 * hop_size {
            2.0 / 3.0
        } else if window_size == 8 * hop_size {
            1.0 / 3.0
        } else if window_size == 2 * hop_size {
            1.0
        } else {
            0.5
        };

        let n = window_size as f64;
        let window = (0..window_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n).cos()))
            .collect();

        log::debug!("PhaseVocoder: window {window_size}, hop {hop_size}, scale {scale:.3}");
        Ok(Self {
            window_size,
            hop_size,
            fft: RealFft::new(window_size),
            window,
            data_old: vec![0.0; window_size - hop_size],
            synth_old: vec![0.0; window_size],
            grain: ComplexBuffer::for_window(window_size),
            start,
            end,
            scale,
            released: false,
        })
    }

    /// Analyse one hop of input into the grain
    pub fn process(&mut self, input: &SimpleBuffer) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        input.check_live()?;
        FkError::check_len(self.hop_size, input.len())?;

        let keep = self.window_size - self.hop_size;
        let frame = self.fft.time_mut();
        frame[..keep].copy_from_slice(&self.data_old);
        frame[keep..].copy_from_slice(input.as_slice());
        self.data_old.copy_from_slice(&frame[self.hop_size..]);

        for (s, w) in frame.iter_mut().zip(&self.window) {
            *s *= w;
        }
        frame.rotate_left(self.window_size / 2);

        self.fft.forward_into(&mut self.grain)
    }

    /// Resynthesise the current grain, writing one hop into `output`
    pub fn synthesize(&mut self, output: &mut SimpleBuffer) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        output.check_live()?;
        FkError::check_len(self.hop_size, output.len())?;

        self.fft.inverse_from(&self.grain)?;
        let hop = self.hop_size;
        let scale = self.scale;
        let synth = self.fft.time_mut();
        synth.rotate_right(self.window_size / 2);
        if 2 * hop < self.window_size {
            for (s, w) in synth.iter_mut().zip(&self.window) {
                *s *= w;
            }
        }

        let out = output.as_mut_slice();
        for (o, s) in out.iter_mut().zip(&synth[..hop]) {
            *o = s * scale;
        }
        if self.end == 0 {
            return Ok(());
        }

        for (o, old) in out.iter_mut().zip(&self.synth_old[..hop]) {
            *o += old;
        }
        self.synth_old.copy_within(hop..hop + self.start, 0);
        self.synth_old[self.start..self.end].fill(0.0);
        for (old, s) in self.synth_old[..self.end].iter_mut().zip(&synth[hop..]) {
            *old += s * scale;
        }
        Ok(())
    }

    /// Spectrum of the last analysed frame
    #[inline]
    pub fn grain(&self) -> &ComplexBuffer {
        &self.grain
    }

    /// Mutable grain for spectral processing between analysis and synthesis
    #[inline]
    pub fn grain_mut(&mut self) -> &mut ComplexBuffer {
        &mut self.grain
    }

    #[inline]
    pub fn window_size(&self) -> usize {
        if self.released { 0 } else { self.window_size }
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        if self.released { 0 } else { self.hop_size }
    }
}

impl std::fmt::Debug for PhaseVocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseVocoder")
            .field("window_size", &self.window_size)
            .field("hop_size", &self.hop_size)
            .field("scale", &self.scale)
            .field("released", &self.released)
            .finish()
    }
}

impl Release for PhaseVocoder {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.window = Vec::new();
        self.data_old = Vec::new();
        self.synth_old = Vec::new();
        self.grain.release();
        self.released = true;
        log::debug!("PhaseVocoder released");
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Stage for PhaseVocoder {
    fn reset(&mut self) {
        self.data_old.fill(0.0);
        self.synth_old.fill(0.0);
    }

    fn latency(&self) -> usize {
        self.end
    }
}
