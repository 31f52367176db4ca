//! Sample-rate converter
//!
//! Fixed ratio, fixed input block size. Each call consumes exactly
//! `input_size` samples and produces `floor(input_size * ratio)` samples into
//! the owned output buffer. A tail of past input is kept between calls so the
//! interpolation kernel sees a continuous signal.
//!
//! Output samples are spaced `input_size / output_size` input samples apart,
//! so every block covers exactly one input block and the read position never
//! jumps at block boundaries. When `input_size * ratio` is not whole the
//! effective ratio is `output_size / input_size`.
//!
//! Quality levels:
//! - 0..=2: Blackman-windowed sinc with decreasing kernel width
//! - 3: zero-order hold
//! - 4: linear interpolation

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use fk_core::{FkError, FkResult, Release, Sample, SampleBuffer, SimpleBuffer};

use crate::{Stage, ensure_live};

const NAME: &str = "Resampler";

/// Lowest accepted conversion ratio
pub const MIN_RATIO: f64 = 1.0 / 256.0;

/// Highest accepted conversion ratio
pub const MAX_RATIO: f64 = 256.0;

/// Kernel table resolution (entries per input sample)
const OVERSAMPLE: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// QUALITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Speed / quality trade-off of the interpolator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleQuality {
    /// Widest sinc kernel
    Best,
    #[default]
    Medium,
    /// Narrowest sinc kernel
    Fastest,
    /// Repeat the nearest earlier sample
    ZeroOrderHold,
    Linear,
}

impl ResampleQuality {
    /// Map a numeric level (0 = best ... 4 = linear)
    pub fn from_level(level: u8) -> FkResult<Self> {
        match level {
            0 => Ok(Self::Best),
            1 => Ok(Self::Medium),
            2 => Ok(Self::Fastest),
            3 => Ok(Self::ZeroOrderHold),
            4 => Ok(Self::Linear),
            _ => Err(FkError::InvalidParam(format!(
                "resampler quality must be 0..=4, got {level}"
            ))),
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Self::Best => 0,
            Self::Medium => 1,
            Self::Fastest => 2,
            Self::ZeroOrderHold => 3,
            Self::Linear => 4,
        }
    }

    /// Sinc zero crossings on each side of the kernel centre
    fn half_width(&self) -> usize {
        match self {
            Self::Best => 32,
            Self::Medium => 16,
            Self::Fastest => 4,
            Self::ZeroOrderHold => 0,
            Self::Linear => 1,
        }
    }

    fn is_sinc(&self) -> bool {
        matches!(self, Self::Best | Self::Medium | Self::Fastest)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINC KERNEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Tabulated half of a symmetric windowed-sinc lowpass
#[derive(Debug)]
struct SincKernel {
    /// h(d) for d = k / OVERSAMPLE, k = 0..
    table: Vec<f64>,
    /// Kernel support radius in input samples
    radius: f64,
}

impl SincKernel {
    fn new(half_width: usize, cutoff: f64) -> Self {
        let radius = half_width as f64 / cutoff;
        let len = (radius * OVERSAMPLE as f64).ceil() as usize + 2;

        let table = (0..len)
            .map(|k| {
                let d = k as f64 / OVERSAMPLE as f64;
                if d >= radius {
                    return 0.0;
                }
                let x = PI * cutoff * d;
                let sinc = if x.abs() < 1e-12 { 1.0 } else { x.sin() / x };
                let w = d / radius;
                let blackman = 0.42 + 0.5 * (PI * w).cos() + 0.08 * (2.0 * PI * w).cos();
                cutoff * sinc * blackman
            })
            .collect();

        Self { table, radius }
    }

    #[inline]
    fn at(&self, d: f64) -> f64 {
        let pos = d.abs() * OVERSAMPLE as f64;
        let k = pos as usize;
        if k + 1 >= self.table.len() {
            return 0.0;
        }
        let frac = pos - k as f64;
        self.table[k] + (self.table[k + 1] - self.table[k]) * frac
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESAMPLER
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed-ratio streaming resampler
#[derive(Debug)]
pub struct Resampler {
    ratio: f64,
    quality: ResampleQuality,
    input_size: usize,
    /// Kernel radius rounded up; also the output delay in input samples
    reach: usize,
    kernel: Option<SincKernel>,
    /// `2 * reach` samples of history followed by the current block
    work: Vec<Sample>,
    output: SimpleBuffer,
    released: bool,
}

impl Resampler {
    /// Create a resampler converting `input_size`-sample blocks by `ratio`
    /// (output rate / input rate)
    pub fn new(ratio: f64, quality: ResampleQuality, input_size: usize) -> FkResult<Self> {
        if !ratio.is_finite() || !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
            return Err(FkError::InvalidParam(format!(
                "resampling ratio must be within [1/256, 256], got {ratio}"
            )));
        }
        if input_size == 0 {
            return Err(FkError::Construction(
                "resampler input size must be positive".into(),
            ));
        }

        let cutoff = ratio.min(1.0);
        let (reach, kernel) = if quality.is_sinc() {
            let kernel = SincKernel::new(quality.half_width(), cutoff);
            (kernel.radius.ceil() as usize, Some(kernel))
        } else {
            (quality.half_width(), None)
        };

        let output_size = (input_size as f64 * ratio).floor() as usize;
        log::debug!(
            "Resampler: ratio {ratio}, {quality:?}, {input_size} -> {output_size} samples, delay {reach}"
        );

        Ok(Self {
            ratio,
            quality,
            input_size,
            reach,
            kernel,
            work: vec![0.0; 2 * reach + input_size],
            output: SimpleBuffer::new(output_size),
            released: false,
        })
    }

    /// Resample one block into the owned output buffer
    pub fn process(&mut self, input: &SimpleBuffer) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        input.check_live()?;
        FkError::check_len(self.input_size, input.len())?;

        let lookback = 2 * self.reach;
        self.work[lookback..].copy_from_slice(input.as_slice());

        let step = self.input_size as f64 / self.output.len().max(1) as f64;
        let work = &self.work;
        let last = work.len() - 1;

        for (j, out) in self.output.as_mut_slice().iter_mut().enumerate() {
            // position in `work`, delayed by `reach` samples
            let pos = j as f64 * step + self.reach as f64;

            *out = match (&self.kernel, self.quality) {
                (Some(kernel), _) => {
                    let lo = (pos - kernel.radius).ceil().max(0.0) as usize;
                    let hi = ((pos + kernel.radius).floor() as usize).min(last);
                    let mut acc = 0.0;
                    let mut weight = 0.0;
                    for (i, &x) in work.iter().enumerate().take(hi + 1).skip(lo) {
                        let h = kernel.at(pos - i as f64);
                        acc += x * h;
                        weight += h;
                    }
                    if weight.abs() > f64::EPSILON { acc / weight } else { 0.0 }
                }
                (None, ResampleQuality::Linear) => {
                    let i = pos as usize;
                    let frac = pos - i as f64;
                    let next = work[(i + 1).min(last)];
                    work[i] + (next - work[i]) * frac
                }
                (None, _) => work[pos as usize],
            };
        }

        let keep = self.work.len() - lookback;
        self.work.copy_within(keep.., 0);
        Ok(())
    }

    /// Output of the last [`process`](Self::process) call
    #[inline]
    pub fn output(&self) -> &SimpleBuffer {
        &self.output
    }

    #[inline]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Ratio actually realised per block, `output_size / input_size`
    #[inline]
    pub fn effective_ratio(&self) -> f64 {
        if self.released {
            return 0.0;
        }
        self.output.len() as f64 / self.input_size as f64
    }

    #[inline]
    pub fn quality(&self) -> ResampleQuality {
        self.quality
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        if self.released { 0 } else { self.input_size }
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.output.len()
    }
}

impl Release for Resampler {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.kernel = None;
        self.work = Vec::new();
        self.output.release();
        self.released = true;
        log::debug!("Resampler released");
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Stage for Resampler {
    fn reset(&mut self) {
        self.work.fill(0.0);
    }

    fn latency(&self) -> usize {
        self.reach
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> SimpleBuffer {
        let data: Vec<f64> = (0..len).map(|i| i as f64).collect();
        SimpleBuffer::from_data(len, &data)
    }

    #[test]
    fn test_quality_levels() {
        for level in 0..=4 {
            assert_eq!(ResampleQuality::from_level(level).unwrap().level(), level);
        }
        assert!(matches!(
            ResampleQuality::from_level(5),
            Err(FkError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_output_sizes() {
        for ratio in [0.5, 1.0, 2.0, 0.3] {
            for len in [64, 100, 1000] {
                let r = Resampler::new(ratio, ResampleQuality::Fastest, len).unwrap();
                assert_eq!(r.output_size(), (len as f64 * ratio).floor() as usize);
            }
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(Resampler::new(0.0, ResampleQuality::Best, 64).is_err());
        assert!(Resampler::new(300.0, ResampleQuality::Best, 64).is_err());
        assert!(Resampler::new(f64::NAN, ResampleQuality::Best, 64).is_err());
        assert!(Resampler::new(1.0, ResampleQuality::Best, 0).is_err());
    }

    #[test]
    fn test_hold_upsamples_by_repetition() {
        let mut r = Resampler::new(2.0, ResampleQuality::ZeroOrderHold, 4).unwrap();
        assert_eq!(r.latency(), 0);
        r.process(&ramp(4)).unwrap();
        assert_eq!(r.output().to_vec(), vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_linear_interpolates_midpoints() {
        let mut r = Resampler::new(2.0, ResampleQuality::Linear, 4).unwrap();
        assert_eq!(r.latency(), 1);
        r.process(&ramp(4)).unwrap();
        r.process(&SimpleBuffer::from_data(4, &[4.0, 5.0, 6.0, 7.0])).unwrap();
        // one sample of delay: output continues the ramp from 3.0
        assert_eq!(
            r.output().to_vec(),
            vec![3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5]
        );
    }

    #[test]
    fn test_fractional_ratio_streams_without_jumps() {
        let mut r = Resampler::new(48000.0 / 44100.0, ResampleQuality::Linear, 64).unwrap();
        assert_eq!(r.output_size(), 69);
        approx::assert_abs_diff_eq!(r.effective_ratio(), 69.0 / 64.0, epsilon = 1e-12);

        let signal: Vec<f64> = (0..64 * 6).map(|i| i as f64).collect();
        let mut out = Vec::new();
        for block in signal.chunks_exact(64) {
            r.process(&SimpleBuffer::from_data(64, block)).unwrap();
            out.extend(r.output().to_vec());
        }

        // a ramp read at a constant step stays a ramp across block boundaries
        let step = 64.0 / 69.0;
        for n in 4..out.len() {
            approx::assert_abs_diff_eq!(out[n] - out[n - 1], step, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unity_sinc_is_pure_delay() {
        let mut r = Resampler::new(1.0, ResampleQuality::Fastest, 32).unwrap();
        let delay = r.latency();
        assert_eq!(delay, 4);

        let signal: Vec<f64> = (0..64).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut out = Vec::new();
        for block in signal.chunks(32) {
            r.process(&SimpleBuffer::from_data(32, block)).unwrap();
            out.extend(r.output().to_vec());
        }
        for n in delay..64 {
            approx::assert_abs_diff_eq!(out[n], signal[n - delay], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_downsampling_keeps_dc() {
        let mut r = Resampler::new(0.5, ResampleQuality::Medium, 256).unwrap();
        let dc = SimpleBuffer::from_data(256, &[0.5; 256]);
        for _ in 0..4 {
            r.process(&dc).unwrap();
        }
        for &s in r.output().as_slice() {
            approx::assert_abs_diff_eq!(s, 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_size_mismatch_and_release() {
        let mut r = Resampler::new(2.0, ResampleQuality::Linear, 8).unwrap();
        assert_eq!(
            r.process(&SimpleBuffer::new(4)),
            Err(FkError::SizeMismatch {
                expected: 8,
                actual: 4
            })
        );
        r.release();
        r.release();
        assert_eq!(r.output_size(), 0);
        assert_eq!(r.process(&SimpleBuffer::new(8)), Err(FkError::Released("Resampler")));
    }
}
