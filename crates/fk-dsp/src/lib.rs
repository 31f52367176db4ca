//! fk-dsp: Stateful processing stages for FrameKit
//!
//! Every stage is built once from plain numeric configuration, owns its
//! output buffer(s), and overwrites them on each call without reallocating.
//!
//! ## Modules
//! - `filter` - IIR filter (generic order, biquad, A/C weighting)
//! - `biquad` - cookbook biquad coefficient designs
//! - `resampler` - windowed-sinc / hold / linear rate converter
//! - `filterbank` - spectrum to band energies (triangle and mel layouts)
//! - `phase_vocoder` - STFT analysis and overlap-add synthesis
//! - `mfcc` - mel-frequency cepstral coefficients
//! - `tss` - transient / steady-state separation
//! - `mel` - Hz / mel / bin conversions
//! - `music` - level, zero-crossing and phase helpers
//! - `config` - serde configuration for every stage

pub mod biquad;
pub mod config;
mod dct;
mod fft;
pub mod filter;
pub mod filterbank;
pub mod mel;
pub mod mfcc;
pub mod music;
pub mod phase_vocoder;
pub mod resampler;
pub mod tss;
mod weighting;

pub use biquad::{BiquadCoeffs, BiquadDesign};
pub use config::AnalysisConfig;
pub use filter::Filter;
pub use filterbank::FilterBank;
pub use mfcc::Mfcc;
pub use phase_vocoder::PhaseVocoder;
pub use resampler::{ResampleQuality, Resampler};
pub use tss::Tss;
pub use weighting::WEIGHTING_SAMPLE_RATES;

use fk_core::{FkError, FkResult, Release};

/// Lifecycle shared by all stages
///
/// Stages move from construction (fallible) to ready, and from ready to
/// released. Once released every `process*` call returns
/// [`FkError::Released`].
pub trait Stage: Release {
    /// Clear internal history without deallocating
    fn reset(&mut self);

    /// Delay in samples between input and output
    fn latency(&self) -> usize {
        0
    }
}

/// Guard for hot-path entry points of released stages
#[inline]
pub(crate) fn ensure_live(released: bool, stage: &'static str) -> FkResult<()> {
    if released {
        log::warn!("called process on released {stage}; was it released earlier?");
        Err(FkError::Released(stage))
    } else {
        Ok(())
    }
}
