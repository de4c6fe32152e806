pub mod enhance;
pub mod freq_map;
pub mod resample;
pub mod transform;

use thiserror::Error;

/// Sample rate the analysis chain is tuned for.
pub const SAMPLE_RATE: u32 = 44_100;

/// Samples per delivery block (0.1 s at 44.1 kHz).
pub const BLOCK_LENGTH: usize = 4_410;

/// Analysis window length. Must be a power of two.
pub const FFT_LENGTH: usize = 16_384;

/// Frequency bins produced per transform.
pub const BIN_COUNT: usize = FFT_LENGTH / 2;

pub const NOTES_PER_OCTAVE: usize = 12;
pub const POINTS_PER_NOTE: usize = 12;
pub const OCTAVE_COUNT: usize = 8;

/// Notes across the analyzed range (C1..B8).
pub const TOTAL_NOTE_COUNT: usize = NOTES_PER_OCTAVE * OCTAVE_COUNT;

/// Resampled points per octave on the note axis.
pub const POINTS_PER_OCTAVE: usize = NOTES_PER_OCTAVE * POINTS_PER_NOTE;

/// Length of the note-axis spectrum (muSpectrum).
pub const POINT_COUNT: usize = TOTAL_NOTE_COUNT * POINTS_PER_NOTE;

/// Six-octave prefix of the note axis kept in history frames.
pub const HISTORY_POINT_COUNT: usize = 6 * POINTS_PER_OCTAVE;

/// Frames retained by the history ring.
pub const HISTORY_FRAMES: usize = 48;

/// Errors raised by the spectral analysis stages. A failed stage aborts
/// the current cycle only; the previously published frame stays visible.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis window has {got} samples, transform expects {expected}")]
    WindowLength { expected: usize, got: usize },

    #[error("spectrum has {got} bins, resampler expects {expected}")]
    SpectrumLength { expected: usize, got: usize },
}
