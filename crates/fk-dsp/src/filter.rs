//! Stateful IIR filter
//!
//! Direct form I difference equation of arbitrary order:
//!
//! ```text
//! y[n] = b[0] x[n] + sum_{l=1}^{order-1} (b[l] x[n-l] - a[l] y[n-l])
//! ```
//!
//! `a[0]` is taken as 1. The same state machine backs the identity
//! filter, biquads (order 3), A-weighting (order 7) and C-weighting
//! (order 5).

use rustfft::num_complex::Complex;

use fk_core::{FkError, FkResult, LongBuffer, Release, SampleBuffer, SimpleBuffer, scoped};

use crate::biquad::{BiquadCoeffs, BiquadDesign};
use crate::weighting::{self, A_WEIGHTING_ORDER, C_WEIGHTING_ORDER};
use crate::{Stage, ensure_live};

const NAME: &str = "Filter";

/// Coefficients plus input/output history
#[derive(Debug)]
struct IirCore {
    feedforward: LongBuffer,
    feedback: LongBuffer,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl IirCore {
    fn identity(order: usize) -> Self {
        let mut feedforward = LongBuffer::new(order);
        let mut feedback = LongBuffer::new(order);
        feedforward.as_mut_slice()[0] = 1.0;
        feedback.as_mut_slice()[0] = 1.0;
        Self {
            feedforward,
            feedback,
            x: vec![0.0; order],
            y: vec![0.0; order],
        }
    }

    fn run(&mut self, samples: &mut [f64]) {
        let b = self.feedforward.as_slice();
        let a = self.feedback.as_slice();
        let order = b.len();

        for s in samples.iter_mut() {
            self.x[0] = *s;
            let mut acc = b[0] * self.x[0];
            for l in 1..order {
                acc += b[l] * self.x[l] - a[l] * self.y[l];
            }
            self.y[0] = acc;
            *s = acc;

            self.x.copy_within(0..order - 1, 1);
            self.y.copy_within(0..order - 1, 1);
        }
    }

    fn reset(&mut self) {
        self.x.fill(0.0);
        self.y.fill(0.0);
    }
}

/// IIR filter with its own output buffer
#[derive(Debug)]
pub struct Filter {
    order: usize,
    sample_rate: u32,
    core: IirCore,
    output: SimpleBuffer,
    released: bool,
}

impl Filter {
    /// Identity filter of `order` coefficients with an `output_size` output
    /// buffer for [`process_into`](Self::process_into)
    pub fn new(order: usize, output_size: usize) -> FkResult<Self> {
        if order < 1 {
            return Err(FkError::Construction(format!(
                "filter order must be at least 1, got {order}"
            )));
        }
        log::debug!("Filter: order {order}, output {output_size}");
        Ok(Self {
            order,
            sample_rate: 0,
            core: IirCore::identity(order),
            output: SimpleBuffer::new(output_size),
            released: false,
        })
    }

    /// A-weighting filter; `sample_rate` must be one of
    /// [`WEIGHTING_SAMPLE_RATES`](crate::WEIGHTING_SAMPLE_RATES)
    pub fn a_weighting(sample_rate: u32, output_size: usize) -> FkResult<Self> {
        let mut filter = Self::new(A_WEIGHTING_ORDER, output_size)?;
        filter.set_a_weighting(sample_rate)?;
        Ok(filter)
    }

    /// C-weighting filter; `sample_rate` must be one of
    /// [`WEIGHTING_SAMPLE_RATES`](crate::WEIGHTING_SAMPLE_RATES)
    pub fn c_weighting(sample_rate: u32, output_size: usize) -> FkResult<Self> {
        let mut filter = Self::new(C_WEIGHTING_ORDER, output_size)?;
        filter.set_c_weighting(sample_rate)?;
        Ok(filter)
    }

    /// Biquad from explicit normalized coefficients
    pub fn biquad(
        b0: f64,
        b1: f64,
        b2: f64,
        a1: f64,
        a2: f64,
        output_size: usize,
    ) -> FkResult<Self> {
        let mut filter = Self::new(3, output_size)?;
        filter.set_biquad(b0, b1, b2, a1, a2)?;
        Ok(filter)
    }

    /// Biquad from a cookbook design evaluated at `sample_rate`
    pub fn biquad_design(
        design: BiquadDesign,
        sample_rate: u32,
        output_size: usize,
    ) -> FkResult<Self> {
        let c = design.coeffs(sample_rate as f64);
        let mut filter = Self::biquad(c.b0, c.b1, c.b2, c.a1, c.a2, output_size)?;
        filter.sample_rate = sample_rate;
        Ok(filter)
    }

    /// Filter `buf` in place. The output buffer is not touched.
    pub fn process(&mut self, buf: &mut SimpleBuffer) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        buf.check_live()?;
        self.core.run(buf.as_mut_slice());
        Ok(())
    }

    /// Filter `input` into the owned output buffer, leaving `input` as is
    pub fn process_into(&mut self, input: &SimpleBuffer) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        self.output.copy_from(input)?;
        self.core.run(self.output.as_mut_slice());
        Ok(())
    }

    /// Zero-phase filtering: forward pass, then a pass over the reversed
    /// signal. History is cleared after each pass. The reversal scratch of
    /// `work_size` samples lives only for this call.
    pub fn filtfilt(&mut self, buf: &mut SimpleBuffer, work_size: usize) -> FkResult<()> {
        ensure_live(self.released, NAME)?;
        buf.check_live()?;
        let len = buf.len();
        if work_size < len {
            return Err(FkError::SizeMismatch {
                expected: len,
                actual: work_size,
            });
        }

        self.core.run(buf.as_mut_slice());
        self.core.reset();

        scoped(SimpleBuffer::new(work_size), |work| {
            let reversed = &mut work.as_mut_slice()[..len];
            for (dst, &src) in reversed.iter_mut().zip(buf.as_slice().iter().rev()) {
                *dst = src;
            }
            self.core.run(reversed);
            self.core.reset();
            for (dst, &src) in buf.as_mut_slice().iter_mut().zip(reversed.iter().rev()) {
                *dst = src;
            }
        });
        Ok(())
    }

    /// Output of the last [`process_into`](Self::process_into) call
    #[inline]
    pub fn output(&self) -> &SimpleBuffer {
        &self.output
    }

    #[inline]
    pub fn order(&self) -> usize {
        if self.released { 0 } else { self.order }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Feedback (`a`) coefficients
    #[inline]
    pub fn feedback(&self) -> &LongBuffer {
        &self.core.feedback
    }

    /// Feedforward (`b`) coefficients
    #[inline]
    pub fn feedforward(&self) -> &LongBuffer {
        &self.core.feedforward
    }

    fn check_coeffs(&self, coeffs: &[f64]) -> FkResult<()> {
        if self.released {
            return Err(FkError::Released(NAME));
        }
        FkError::check_len(self.order, coeffs.len())
    }

    /// Load feedback coefficients; `coeffs.len()` must equal the order
    pub fn set_feedback(&mut self, coeffs: &[f64]) -> FkResult<()> {
        self.check_coeffs(coeffs)?;
        self.core.feedback.as_mut_slice().copy_from_slice(coeffs);
        Ok(())
    }

    /// Load feedforward coefficients; `coeffs.len()` must equal the order
    pub fn set_feedforward(&mut self, coeffs: &[f64]) -> FkResult<()> {
        self.check_coeffs(coeffs)?;
        self.core.feedforward.as_mut_slice().copy_from_slice(coeffs);
        Ok(())
    }

    fn require_order(&self, order: usize, design: &str) -> FkResult<()> {
        if self.order == order {
            Ok(())
        } else {
            Err(FkError::InvalidParam(format!(
                "{design} needs a filter of order {order}, this one has order {}",
                self.order
            )))
        }
    }

    /// Re-initialise as A-weighting (order 7 only)
    pub fn set_a_weighting(&mut self, sample_rate: u32) -> FkResult<()> {
        self.require_order(A_WEIGHTING_ORDER, "A-weighting")?;
        let (b, a) = weighting::a_weighting(sample_rate)?;
        self.set_feedforward(&b)?;
        self.set_feedback(&a)?;
        self.sample_rate = sample_rate;
        self.core.reset();
        Ok(())
    }

    /// Re-initialise as C-weighting (order 5 only)
    pub fn set_c_weighting(&mut self, sample_rate: u32) -> FkResult<()> {
        self.require_order(C_WEIGHTING_ORDER, "C-weighting")?;
        let (b, a) = weighting::c_weighting(sample_rate)?;
        self.set_feedforward(&b)?;
        self.set_feedback(&a)?;
        self.sample_rate = sample_rate;
        self.core.reset();
        Ok(())
    }

    /// Re-initialise as a biquad (order 3 only)
    pub fn set_biquad(&mut self, b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> FkResult<()> {
        self.require_order(3, "biquad")?;
        self.set_feedforward(&[b0, b1, b2])?;
        self.set_feedback(&[1.0, a1, a2])?;
        Ok(())
    }

    /// Current coefficients as a biquad (order 3 only)
    pub fn biquad_coeffs(&self) -> FkResult<BiquadCoeffs> {
        if self.released {
            return Err(FkError::Released(NAME));
        }
        self.require_order(3, "biquad")?;
        let b = self.core.feedforward.as_slice();
        let a = self.core.feedback.as_slice();
        Ok(BiquadCoeffs {
            b0: b[0],
            b1: b[1],
            b2: b[2],
            a1: a[1],
            a2: a[2],
        })
    }

    /// Magnitude of the transfer function at `freq` Hz, using the filter's
    /// sample rate
    pub fn magnitude_at(&self, freq: f64) -> FkResult<f64> {
        if self.released {
            return Err(FkError::Released(NAME));
        }
        if self.sample_rate == 0 {
            return Err(FkError::InvalidParam(
                "magnitude response needs a sample rate".into(),
            ));
        }
        let omega = 2.0 * std::f64::consts::PI * freq / self.sample_rate as f64;
        let eval = |coeffs: &[f64]| -> Complex<f64> {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, &c)| Complex::from_polar(c, -omega * k as f64))
                .sum()
        };
        let num = eval(self.core.feedforward.as_slice());
        let mut den = eval(self.core.feedback.as_slice());
        // a[0] is implied to be 1 by the difference equation
        den += Complex::new(1.0 - self.core.feedback.as_slice()[0], 0.0);
        Ok((num / den).norm())
    }
}

impl Release for Filter {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.core.feedforward.release();
        self.core.feedback.release();
        self.core.x = Vec::new();
        self.core.y = Vec::new();
        self.output.release();
        self.released = true;
        log::debug!("Filter released");
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Stage for Filter {
    fn reset(&mut self) {
        self.core.reset();
    }
}
