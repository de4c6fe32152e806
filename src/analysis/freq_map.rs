use super::{BIN_COUNT, OCTAVE_COUNT, SAMPLE_RATE};

/// Inclusive FFT-bin range covered by one octave. An octave that lies
/// entirely above Nyquist holds no bins (`bottom_bin > top_bin`).
#[derive(Clone, Copy, Debug)]
pub struct OctaveSpan {
    /// Frequency of the octave's lower edge in Hz.
    pub left_freq: f64,
    /// Frequency of the octave's upper edge in Hz (2x the lower edge).
    pub right_freq: f64,
    /// First bin whose center frequency is at or above the lower edge.
    pub bottom_bin: usize,
    /// Last bin whose center frequency is below the upper edge,
    /// saturated at the final bin.
    pub top_bin: usize,
}

impl OctaveSpan {
    pub fn bin_count(&self) -> usize {
        (self.top_bin + 1).saturating_sub(self.bottom_bin)
    }

    pub fn contains(&self, bin: usize) -> bool {
        bin >= self.bottom_bin && bin <= self.top_bin
    }
}

/// Mapping between linear FFT bins and the musical frequency axis,
/// computed once at startup and immutable afterwards.
///
/// The analyzed range spans eight octaves starting just below C1
/// (55 Hz * 2^(-9/12), widened by a quarter semitone on each side), so
/// roughly 31.77 Hz to 8133.68 Hz at the nominal sample rate.
pub struct FrequencyMap {
    /// Width of one FFT bin in Hz.
    pub bin_width: f64,
    /// Lower frequency bound of the analyzed range.
    pub lower_freq: f64,
    /// Upper frequency bound of the analyzed range.
    pub upper_freq: f64,
    /// One span per octave, contiguous and non-overlapping in bin space.
    pub octaves: Vec<OctaveSpan>,
    /// Number of bins covering the full eight-octave range.
    pub bin_cutoff: usize,
    position_factor: Vec<f32>,
}

impl FrequencyMap {
    /// Builds the map for an arbitrary sample rate and bin count.
    /// Ranges that would exceed Nyquist are clamped with a warning
    /// rather than rejected; bin indices never go out of bounds.
    pub fn new(sample_rate: f64, bin_count: usize) -> Self {
        let freq_c1 = 55.0_f64 * 2.0_f64.powf(-9.0 / 12.0);
        let lower_freq = freq_c1 / 2.0_f64.powf(1.0 / 24.0);
        let upper_freq = lower_freq * 2.0_f64.powi(OCTAVE_COUNT as i32);

        let nyquist = sample_rate / 2.0;
        let bin_width = nyquist / bin_count as f64;

        if upper_freq > nyquist {
            log::warn!(
                "octave range tops out at {upper_freq:.1} Hz but Nyquist is {nyquist:.1} Hz; \
                 upper octaves will be clamped"
            );
        }

        let mut octaves = Vec::with_capacity(OCTAVE_COUNT);
        let mut position_factor = vec![0.0f32; bin_count];

        for k in 0..OCTAVE_COUNT {
            let left_freq = lower_freq * 2.0_f64.powi(k as i32);
            let right_freq = 2.0 * left_freq;

            // First bin at or above the left edge; a bin sitting exactly on
            // the shared edge belongs to the upper octave.
            let bottom_bin = (left_freq / bin_width).ceil() as usize;
            let top_bin = ((right_freq / bin_width).ceil() as usize)
                .saturating_sub(1)
                .min(bin_count.saturating_sub(1));

            if bottom_bin <= top_bin {
                for bin in bottom_bin..=top_bin {
                    let frac = (bin as f64 * bin_width - left_freq) / (right_freq - left_freq);
                    position_factor[bin] = (2.0 - 2.0_f64.powf(1.0 - frac)) as f32;
                }
            }

            octaves.push(OctaveSpan {
                left_freq,
                right_freq,
                bottom_bin,
                top_bin,
            });
        }

        let bin_cutoff = ((upper_freq / bin_width).ceil() as usize).min(bin_count);

        Self {
            bin_width,
            lower_freq,
            upper_freq,
            octaves,
            bin_cutoff,
            position_factor,
        }
    }

    /// Index of the octave containing `bin`, if any.
    pub fn octave_of(&self, bin: usize) -> Option<usize> {
        self.octaves.iter().position(|span| span.contains(bin))
    }

    /// Horizontal position of `bin` within its octave, in [0, 1).
    ///
    /// The curve is semitone-exponential (`2 - 2^(1 - frac)` over the
    /// octave's frequency fraction), matching the per-note widths used by
    /// octave-aligned layouts. Zero for bins outside the analyzed range.
    pub fn position_factor(&self, bin: usize) -> f32 {
        self.position_factor.get(bin).copied().unwrap_or(0.0)
    }

    pub fn position_factors(&self) -> &[f32] {
        &self.position_factor
    }

    /// Center frequency of `bin` in Hz.
    pub fn bin_freq(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_width
    }
}

impl Default for FrequencyMap {
    fn default() -> Self {
        Self::new(SAMPLE_RATE as f64, BIN_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_match_tuning() {
        let map = FrequencyMap::default();
        assert!((map.lower_freq - 31.772).abs() < 0.01);
        assert!((map.upper_freq - 8133.68).abs() < 0.01);
        assert_eq!(map.bin_cutoff, 3022);
    }

    #[test]
    fn octaves_partition_bin_range() {
        let map = FrequencyMap::default();
        assert_eq!(map.octaves.len(), OCTAVE_COUNT);

        // Ranges are contiguous, non-overlapping, and increasing.
        for pair in map.octaves.windows(2) {
            assert_eq!(pair[1].bottom_bin, pair[0].top_bin + 1);
            assert!(pair[1].left_freq > pair[0].left_freq);
        }

        // Every bin in range belongs to exactly one octave.
        let first = map.octaves[0].bottom_bin;
        let last = map.octaves[OCTAVE_COUNT - 1].top_bin;
        for bin in first..=last {
            let owners = map.octaves.iter().filter(|s| s.contains(bin)).count();
            assert_eq!(owners, 1, "bin {bin} owned by {owners} octaves");
        }

        // Bins below the range belong to no octave.
        assert_eq!(map.octave_of(first - 1), None);
    }

    #[test]
    fn position_factor_monotone_within_octave() {
        let map = FrequencyMap::default();
        for span in &map.octaves {
            let bottom = map.position_factor(span.bottom_bin);
            let top = map.position_factor(span.top_bin);
            assert!(bottom >= 0.0 && bottom < 0.1, "bottom factor {bottom}");
            assert!(top < 1.0, "top factor {top}");
            for bin in span.bottom_bin..span.top_bin {
                assert!(map.position_factor(bin) <= map.position_factor(bin + 1));
            }
        }
    }

    #[test]
    fn clamps_when_range_exceeds_nyquist() {
        // 8 kHz sample rate: the top octaves sit above Nyquist.
        let map = FrequencyMap::new(8_000.0, 512);
        assert!(map.bin_cutoff <= 512);
        for span in &map.octaves {
            assert!(span.top_bin <= 511);
        }
        // Clamped octaves are empty rather than overlapping.
        let covered: usize = map.octaves.iter().map(|s| s.bin_count()).sum();
        assert!(covered <= 512);
        assert_eq!(map.octaves[OCTAVE_COUNT - 1].bin_count(), 0);
    }
}
