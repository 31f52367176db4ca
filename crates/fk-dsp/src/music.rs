//! Level, silence and phase helpers

use std::f64::consts::PI;

use fk_core::{Sample, SimpleBuffer};

/// Mean square of the buffer (0 for an empty buffer)
pub fn level_lin(buf: &SimpleBuffer) -> Sample {
    let samples = buf.as_slice();
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s * s).sum::<Sample>() / samples.len() as Sample
}

/// Sound pressure level in dB (`-inf` for silence)
pub fn db_spl(buf: &SimpleBuffer) -> Sample {
    10.0 * level_lin(buf).log10()
}

/// Level in dB SPL, or 1.0 when the level is below `threshold`
pub fn level_detection(buf: &SimpleBuffer, threshold: Sample) -> Sample {
    let db = db_spl(buf);
    if db < threshold { 1.0 } else { db }
}

/// True when the level in dB SPL is below `threshold`
pub fn silence_detection(buf: &SimpleBuffer, threshold: Sample) -> bool {
    db_spl(buf) < threshold
}

/// Sign changes per sample; zero counts as negative
pub fn zero_crossing_rate(buf: &SimpleBuffer) -> Sample {
    let samples = buf.as_slice();
    if samples.is_empty() {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] <= 0.0) != (w[1] <= 0.0))
        .count();
    crossings as Sample / samples.len() as Sample
}

/// Principal argument: wrap `phase` into `(-pi, pi]`
#[inline]
pub fn unwrap2pi(phase: Sample) -> Sample {
    let two_pi = 2.0 * PI;
    phase + two_pi * (1.0 + (-(phase + PI) / two_pi).floor())
}
