use super::freq_map::FrequencyMap;
use super::{AnalysisError, POINTS_PER_OCTAVE, POINT_COUNT};

/// One output point's interpolation tap: a pair of source bins and the
/// blend fraction between them.
#[derive(Clone, Copy)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f32,
}

/// Maps a linear-bin spectrum onto the fixed-resolution musical note axis.
///
/// Point `p` samples the spectrum at the fractional bin index of frequency
/// `lower_freq * 2^(p / 144)`, linearly interpolated between neighboring
/// bins. Low octaves upsample (many points per bin), high octaves
/// downsample (many bins per point). Indices are clamped into the valid
/// input range at construction, so resampling never reads out of bounds.
pub struct NoteResampler {
    taps: Vec<Tap>,
    input_len: usize,
}

impl NoteResampler {
    pub fn new(map: &FrequencyMap, input_len: usize) -> Self {
        assert!(input_len > 0, "resampler needs a non-empty input spectrum");

        let max_pos = (input_len - 1) as f64;
        let taps = (0..POINT_COUNT)
            .map(|p| {
                let freq = map.lower_freq * 2.0_f64.powf(p as f64 / POINTS_PER_OCTAVE as f64);
                let pos = (freq / map.bin_width).clamp(0.0, max_pos);
                let lo = pos.floor() as usize;
                Tap {
                    lo,
                    hi: (lo + 1).min(input_len - 1),
                    frac: (pos - lo as f64) as f32,
                }
            })
            .collect();

        Self { taps, input_len }
    }

    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Writes the note-axis spectrum into `out` (length `POINT_COUNT`).
    pub fn resample(&self, spectrum: &[f32], out: &mut [f32]) -> Result<(), AnalysisError> {
        if spectrum.len() != self.input_len {
            return Err(AnalysisError::SpectrumLength {
                expected: self.input_len,
                got: spectrum.len(),
            });
        }
        debug_assert_eq!(out.len(), POINT_COUNT);

        for (o, tap) in out.iter_mut().zip(self.taps.iter()) {
            let a = spectrum[tap.lo];
            let b = spectrum[tap.hi];
            *o = a + tap.frac * (b - a);
        }

        Ok(())
    }
}
