//! Frequency scale conversions
//!
//! Two mel scales are provided:
//! - Slaney (Auditory Toolbox): linear below 1 kHz, logarithmic above
//! - HTK (O'Shaughnessy): `1127 ln(1 + f / 700)`
//!
//! Negative inputs are out of domain and map to 0.

const LIN_SPACE: f64 = 200.0 / 3.0;
const SPLIT_HZ: f64 = 1000.0;
const SPLIT_MEL: f64 = SPLIT_HZ / LIN_SPACE;

#[inline]
fn log_space() -> f64 {
    27.0 / 6.4f64.ln()
}

/// Hz to mel, Slaney scale
pub fn hz_to_mel(freq: f64) -> f64 {
    if freq < 0.0 {
        log::warn!("hz_to_mel: negative frequency {freq}");
        return 0.0;
    }
    if freq < SPLIT_HZ {
        freq / LIN_SPACE
    } else {
        SPLIT_MEL + log_space() * (freq / SPLIT_HZ).ln()
    }
}

/// Mel to Hz, Slaney scale
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel < 0.0 {
        log::warn!("mel_to_hz: negative mel {mel}");
        return 0.0;
    }
    if mel < SPLIT_MEL {
        LIN_SPACE * mel
    } else {
        SPLIT_HZ * ((mel - SPLIT_MEL) / log_space()).exp()
    }
}

/// Hz to mel, HTK scale
pub fn hz_to_mel_htk(freq: f64) -> f64 {
    if freq < 0.0 {
        log::warn!("hz_to_mel_htk: negative frequency {freq}");
        return 0.0;
    }
    1127.0 * (1.0 + freq / 700.0).ln()
}

/// Mel to Hz, HTK scale
pub fn mel_to_hz_htk(mel: f64) -> f64 {
    if mel < 0.0 {
        log::warn!("mel_to_hz_htk: negative mel {mel}");
        return 0.0;
    }
    700.0 * ((mel / 1127.0).exp() - 1.0)
}

/// Centre frequency of FFT bin `bin`
#[inline]
pub fn bin_to_freq(bin: f64, sample_rate: f64, fft_size: f64) -> f64 {
    (bin * sample_rate / fft_size).max(0.0)
}

/// Fractional FFT bin of `freq`
#[inline]
pub fn freq_to_bin(freq: f64, sample_rate: f64, fft_size: f64) -> f64 {
    (freq * fft_size / sample_rate).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_slaney_linear_region() {
        assert_relative_eq!(hz_to_mel(200.0), 3.0, epsilon = 1e-12);
        assert_relative_eq!(hz_to_mel(1000.0), 15.0, epsilon = 1e-12);
        assert_relative_eq!(mel_to_hz(15.0), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slaney_log_region() {
        // 6.4 kHz sits 27 mels above the split
        assert_relative_eq!(hz_to_mel(6400.0), 42.0, epsilon = 1e-9);
        assert_relative_eq!(mel_to_hz(hz_to_mel(4321.0)), 4321.0, epsilon = 1e-9);
    }

    #[test]
    fn test_htk() {
        assert_relative_eq!(hz_to_mel_htk(700.0), 1127.0 * 2f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(mel_to_hz_htk(hz_to_mel_htk(2500.0)), 2500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_inputs() {
        assert_eq!(hz_to_mel(-1.0), 0.0);
        assert_eq!(mel_to_hz(-1.0), 0.0);
        assert_eq!(hz_to_mel_htk(-1.0), 0.0);
        assert_eq!(mel_to_hz_htk(-1.0), 0.0);
    }

    #[test]
    fn test_bins() {
        assert_eq!(bin_to_freq(16.0, 44100.0, 1024.0), 16.0 * 44100.0 / 1024.0);
        assert_relative_eq!(freq_to_bin(bin_to_freq(7.0, 48000.0, 512.0), 48000.0, 512.0), 7.0);
    }
}
