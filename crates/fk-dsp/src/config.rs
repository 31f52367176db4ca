//! Configuration types for every stage
//!
//! Each config is plain data (serde), has a usable `Default`, and builds its
//! stage with `build()`.

use serde::{Deserialize, Serialize};

use fk_core::{FkResult, Sample};

use crate::biquad::BiquadDesign;
use crate::filter::Filter;
use crate::filterbank::FilterBank;
use crate::mfcc::Mfcc;
use crate::phase_vocoder::PhaseVocoder;
use crate::resampler::{ResampleQuality, Resampler};
use crate::tss::{DEFAULT_ALPHA, DEFAULT_BETA, DEFAULT_THRESHOLD, Tss};

// ═══════════════════════════════════════════════════════════════════════════════
// FILTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Which coefficients a [`Filter`] starts with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterDesign {
    /// Pass-through filter of the given order
    Identity { order: usize },
    AWeighting { sample_rate: u32 },
    CWeighting { sample_rate: u32 },
    /// Explicit normalized biquad coefficients
    Biquad {
        b0: f64,
        b1: f64,
        b2: f64,
        a1: f64,
        a2: f64,
    },
    /// Cookbook biquad evaluated at `sample_rate`
    Cookbook {
        design: BiquadDesign,
        sample_rate: u32,
    },
}

impl Default for FilterDesign {
    fn default() -> Self {
        Self::Identity { order: 1 }
    }
}

/// Filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub design: FilterDesign,

    /// Length of the owned output buffer used by `process_into`
    pub output_size: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            design: FilterDesign::default(),
            output_size: 512,
        }
    }
}

impl FilterConfig {
    /// A-weighting at `sample_rate`
    pub fn a_weighting(sample_rate: u32) -> Self {
        Self {
            design: FilterDesign::AWeighting { sample_rate },
            ..Default::default()
        }
    }

    /// C-weighting at `sample_rate`
    pub fn c_weighting(sample_rate: u32) -> Self {
        Self {
            design: FilterDesign::CWeighting { sample_rate },
            ..Default::default()
        }
    }

    pub fn with_design(mut self, design: FilterDesign) -> Self {
        self.design = design;
        self
    }

    pub fn with_output_size(mut self, size: usize) -> Self {
        self.output_size = size;
        self
    }

    pub fn build(&self) -> FkResult<Filter> {
        let size = self.output_size;
        match self.design {
            FilterDesign::Identity { order } => Filter::new(order, size),
            FilterDesign::AWeighting { sample_rate } => Filter::a_weighting(sample_rate, size),
            FilterDesign::CWeighting { sample_rate } => Filter::c_weighting(sample_rate, size),
            FilterDesign::Biquad { b0, b1, b2, a1, a2 } => Filter::biquad(b0, b1, b2, a1, a2, size),
            FilterDesign::Cookbook {
                design,
                sample_rate,
            } => Filter::biquad_design(design, sample_rate, size),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESAMPLER
// ═══════════════════════════════════════════════════════════════════════════════

/// Resampler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResamplerConfig {
    /// Output rate / input rate
    pub ratio: f64,
    pub quality: ResampleQuality,
    /// Samples consumed per call
    pub input_size: usize,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            quality: ResampleQuality::default(),
            input_size: 512,
        }
    }
}

impl ResamplerConfig {
    /// Convert between two sample rates
    pub fn rates(from: u32, to: u32) -> Self {
        Self {
            ratio: to as f64 / from as f64,
            ..Default::default()
        }
    }

    pub fn with_quality(mut self, quality: ResampleQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_input_size(mut self, size: usize) -> Self {
        self.input_size = size;
        self
    }

    pub fn build(&self) -> FkResult<Resampler> {
        Resampler::new(self.ratio, self.quality, self.input_size)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILTERBANK
// ═══════════════════════════════════════════════════════════════════════════════

/// Initial coefficients of a [`FilterBank`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BandLayout {
    /// All coefficients zero
    Zeroed,
    /// Slaney's fixed 40-band layout
    Slaney { sample_rate: u32 },
    /// Evenly spaced on the Slaney mel scale (`fmax == 0` selects Nyquist)
    Mel {
        sample_rate: u32,
        fmin: Sample,
        fmax: Sample,
    },
    /// Evenly spaced on the HTK mel scale (`fmax == 0` selects Nyquist)
    MelHtk {
        sample_rate: u32,
        fmin: Sample,
        fmax: Sample,
    },
    /// Explicit triangle corners
    Triangle {
        corners: Vec<Sample>,
        sample_rate: u32,
        /// Rescale each band to a peak of 1
        normalize: bool,
    },
}

impl Default for BandLayout {
    fn default() -> Self {
        Self::Zeroed
    }
}

/// FilterBank configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterBankConfig {
    pub filters: usize,
    pub window_size: usize,
    /// Triangle area normalisation (0 or 1)
    pub norm: Sample,
    /// Exponent applied to spectrum norms
    pub power: Sample,
    pub bands: BandLayout,
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            filters: 40,
            window_size: 512,
            norm: 1.0,
            power: 1.0,
            bands: BandLayout::Zeroed,
        }
    }
}

impl FilterBankConfig {
    pub fn with_bands(mut self, bands: BandLayout) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_power(mut self, power: Sample) -> Self {
        self.power = power;
        self
    }

    pub fn with_norm(mut self, norm: Sample) -> Self {
        self.norm = norm;
        self
    }

    pub fn build(&self) -> FkResult<FilterBank> {
        let mut fb = FilterBank::new(self.filters, self.window_size)?;
        fb.set_norm(self.norm)?;
        fb.set_power(self.power);

        match &self.bands {
            BandLayout::Zeroed => {}
            BandLayout::Slaney { sample_rate } => fb.set_mel_coeffs_slaney(*sample_rate)?,
            BandLayout::Mel {
                sample_rate,
                fmin,
                fmax,
            } => fb.set_mel_coeffs(*sample_rate, *fmin, *fmax)?,
            BandLayout::MelHtk {
                sample_rate,
                fmin,
                fmax,
            } => fb.set_mel_coeffs_htk(*sample_rate, *fmin, *fmax)?,
            BandLayout::Triangle {
                corners,
                sample_rate,
                normalize,
            } => {
                fb.set_triangle_bands(corners, *sample_rate)?;
                if *normalize {
                    fb.normalize_coeffs();
                }
            }
        }
        Ok(fb)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPECTRAL STAGES
// ═══════════════════════════════════════════════════════════════════════════════

/// PhaseVocoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseVocoderConfig {
    pub window_size: usize,
    pub hop_size: usize,
}

impl Default for PhaseVocoderConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 256,
        }
    }
}

impl PhaseVocoderConfig {
    pub fn build(&self) -> FkResult<PhaseVocoder> {
        PhaseVocoder::new(self.window_size, self.hop_size)
    }
}

/// MFCC configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfccConfig {
    pub window_size: usize,
    pub filters: usize,
    pub coefficients: usize,
    pub sample_rate: u32,
    /// Multiplier applied to log band energies
    pub scale: Sample,
    pub power: Sample,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            window_size: 512,
            filters: 40,
            coefficients: 13,
            sample_rate: 44100,
            scale: 1.0,
            power: 1.0,
        }
    }
}

impl MfccConfig {
    pub fn with_coefficients(mut self, count: usize) -> Self {
        self.coefficients = count;
        self
    }

    pub fn build(&self) -> FkResult<Mfcc> {
        let mut mfcc = Mfcc::new(
            self.window_size,
            self.filters,
            self.coefficients,
            self.sample_rate,
        )?;
        mfcc.set_scale(self.scale);
        mfcc.set_power(self.power);
        Ok(mfcc)
    }
}

/// TSS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TssConfig {
    pub window_size: usize,
    pub hop_size: usize,
    pub threshold: Sample,
    pub alpha: Sample,
    pub beta: Sample,
}

impl Default for TssConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 256,
            threshold: DEFAULT_THRESHOLD,
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

impl TssConfig {
    pub fn build(&self) -> FkResult<Tss> {
        let mut tss = Tss::new(self.window_size, self.hop_size)?;
        tss.set_threshold(self.threshold);
        tss.set_alpha(self.alpha);
        tss.set_beta(self.beta);
        Ok(tss)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANALYSIS PRESETS
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared frame layout for a spectral analysis chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub window_size: usize,
    pub hop_size: usize,
    pub sample_rate: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 256,
            sample_rate: 44100,
        }
    }
}

impl AnalysisConfig {
    /// Short frames, 50% overlap
    pub fn fast() -> Self {
        Self {
            window_size: 512,
            hop_size: 256,
            ..Default::default()
        }
    }

    /// Long frames, 87.5% overlap
    pub fn quality() -> Self {
        Self {
            window_size: 4096,
            hop_size: 512,
            ..Default::default()
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Spectrum bins per frame
    pub fn bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    pub fn phase_vocoder(&self) -> PhaseVocoderConfig {
        PhaseVocoderConfig {
            window_size: self.window_size,
            hop_size: self.hop_size,
        }
    }

    pub fn tss(&self) -> TssConfig {
        TssConfig {
            window_size: self.window_size,
            hop_size: self.hop_size,
            ..Default::default()
        }
    }

    pub fn mfcc(&self) -> MfccConfig {
        MfccConfig {
            window_size: self.window_size,
            sample_rate: self.sample_rate,
            ..Default::default()
        }
    }

    /// Mel filterbank spanning 0 Hz to Nyquist
    pub fn mel_filterbank(&self, filters: usize) -> FilterBankConfig {
        FilterBankConfig {
            filters,
            window_size: self.window_size,
            bands: BandLayout::Mel {
                sample_rate: self.sample_rate,
                fmin: 0.0,
                fmax: 0.0,
            },
            ..Default::default()
        }
    }
}
