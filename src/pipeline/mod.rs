pub mod driver;
pub mod history;
pub mod output;
pub mod stream_buffer;

use std::sync::Arc;

use crate::analysis::enhance::SpectralEnhancer;
use crate::analysis::freq_map::FrequencyMap;
use crate::analysis::resample::NoteResampler;
use crate::analysis::transform::SpectralTransform;
use crate::analysis::{
    AnalysisError, BLOCK_LENGTH, FFT_LENGTH, HISTORY_FRAMES, HISTORY_POINT_COUNT, POINT_COUNT,
};
use crate::params::Params;

use history::HistoryRing;
use output::{AnalysisFrame, OutputHandle};
use stream_buffer::StreamBuffer;

/// Scale applied to raw FFT magnitudes before the gain/slope tilt,
/// bringing a full-scale sinusoid near the [0, 1] display range.
const MAGNITUDE_SCALE: f32 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// No audio received yet.
    Idle,
    /// Receiving blocks; the stream buffer still contains initial zeros.
    Filling,
    /// Every ingested block triggers one full analysis cycle.
    Steady,
}

/// What happened to one delivered block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Rejected at ingestion: wrong length or non-finite samples.
    Discarded,
    /// Absorbed into the stream buffer; no analysis ran yet.
    Buffering,
    /// A full cycle ran and a new frame was published.
    Published,
    /// A cycle started but failed; the previous frame remains visible.
    Failed,
}

/// Drives one analysis cycle per audio block: ingest, window, transform,
/// normalize, optionally enhance, resample onto the note axis, extend the
/// history, publish. All mutable state is owned here; consumers interact
/// only through [`OutputHandle`] snapshots and the shared [`Params`].
pub struct AnalysisPipeline {
    map: Arc<FrequencyMap>,
    transform: SpectralTransform,
    enhancer: SpectralEnhancer,
    resampler: NoteResampler,
    stream: StreamBuffer,
    history: HistoryRing,
    params: Params,
    output: OutputHandle,
    state: PipelineState,
    frame_index: u64,
    discarded_blocks: u64,

    // Per-cycle scratch, allocated once.
    window: Vec<f32>,
    magnitudes: Vec<f32>,
    spectrum: Vec<f32>,
    enhanced: Vec<f32>,
    mu_spectrum: Vec<f32>,
}

impl AnalysisPipeline {
    pub fn new(params: Params) -> Self {
        let map = Arc::new(FrequencyMap::default());
        let cutoff = map.bin_cutoff;
        let transform = SpectralTransform::new(FFT_LENGTH);
        let bin_count = transform.bin_count();
        let resampler = NoteResampler::new(&map, cutoff);

        log::info!(
            "analysis pipeline: window {FFT_LENGTH}, {cutoff} bins over {:.1}-{:.1} Hz, \
             {POINT_COUNT} note points, {HISTORY_FRAMES} history frames",
            map.lower_freq,
            map.upper_freq
        );

        Self {
            map,
            transform,
            enhancer: SpectralEnhancer::default(),
            resampler,
            stream: StreamBuffer::new(FFT_LENGTH),
            history: HistoryRing::new(HISTORY_FRAMES, HISTORY_POINT_COUNT),
            params,
            output: OutputHandle::new(AnalysisFrame::silent(
                cutoff,
                POINT_COUNT,
                HISTORY_FRAMES * HISTORY_POINT_COUNT,
            )),
            state: PipelineState::Idle,
            frame_index: 0,
            discarded_blocks: 0,
            window: vec![0.0; FFT_LENGTH],
            magnitudes: vec![0.0; bin_count],
            spectrum: vec![0.0; cutoff],
            enhanced: vec![0.0; cutoff],
            mu_spectrum: vec![0.0; POINT_COUNT],
        }
    }

    /// Handle for reading published frames; cheap to clone and safe to
    /// hand to other threads.
    pub fn output(&self) -> OutputHandle {
        self.output.clone()
    }

    /// The shared parameter handle this pipeline reads every cycle.
    pub fn params(&self) -> Params {
        self.params.clone()
    }

    /// The immutable bin-to-note mapping, for layout-side consumers.
    pub fn frequency_map(&self) -> Arc<FrequencyMap> {
        self.map.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Cycles completed since start.
    pub fn frames_published(&self) -> u64 {
        self.frame_index
    }

    /// Malformed blocks rejected at ingestion since start.
    pub fn discarded_blocks(&self) -> u64 {
        self.discarded_blocks
    }

    /// Delivers one audio block. Blocks of the wrong length or containing
    /// non-finite samples are discarded without running a cycle, keeping
    /// every downstream array at its fixed length.
    pub fn ingest(&mut self, block: &[f32]) -> CycleOutcome {
        if block.len() != BLOCK_LENGTH || !block.iter().all(|s| s.is_finite()) {
            self.discarded_blocks += 1;
            log::debug!(
                "discarding malformed block ({} samples, {} discarded so far)",
                block.len(),
                self.discarded_blocks
            );
            return CycleOutcome::Discarded;
        }

        if self.state == PipelineState::Idle {
            self.state = PipelineState::Filling;
        }

        self.stream.ingest(block);

        if self.state == PipelineState::Filling {
            if self.stream.is_ready() {
                self.state = PipelineState::Steady;
                log::info!("stream buffer filled; entering steady analysis");
            } else {
                return CycleOutcome::Buffering;
            }
        }

        match self.run_cycle() {
            Ok(()) => CycleOutcome::Published,
            Err(err) => {
                log::error!("analysis cycle failed: {err}; keeping previous frame");
                CycleOutcome::Failed
            }
        }
    }

    fn run_cycle(&mut self) -> Result<(), AnalysisError> {
        self.stream.window_into(&mut self.window);
        self.transform.magnitudes(&self.window, &mut self.magnitudes)?;

        // Normalize with the per-bin tilt. Gain and slope are re-read every
        // cycle; the setters already clamp them into range.
        let params = self.params.snapshot();
        for (bin, out) in self.spectrum.iter_mut().enumerate() {
            *out = self.magnitudes[bin] * MAGNITUDE_SCALE * (params.gain + params.slope * bin as f32);
        }

        let source = if params.peak_mode {
            self.enhancer.enhance(&self.spectrum, &mut self.enhanced);
            &self.enhanced
        } else {
            &self.spectrum
        };

        self.resampler.resample(source, &mut self.mu_spectrum)?;
        self.history.append(&self.mu_spectrum[..HISTORY_POINT_COUNT]);

        self.frame_index += 1;
        self.output.publish(AnalysisFrame {
            frame_index: self.frame_index,
            spectrum: source.clone(),
            mu_spectrum: self.mu_spectrum.clone(),
            mu_history: self.history.snapshot(),
        });

        Ok(())
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{POINTS_PER_OCTAVE, SAMPLE_RATE};
    use std::f64::consts::PI;

    /// Contiguous sinusoid split into pipeline-sized blocks.
    fn sine_blocks(freq: f64, amplitude: f32, count: usize) -> Vec<Vec<f32>> {
        (0..count)
            .map(|b| {
                (0..BLOCK_LENGTH)
                    .map(|i| {
                        let n = (b * BLOCK_LENGTH + i) as f64;
                        (amplitude as f64 * (2.0 * PI * freq * n / SAMPLE_RATE as f64).sin()) as f32
                    })
                    .collect()
            })
            .collect()
    }

    fn argmax(values: &[f32]) -> usize {
        values
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap()
    }

    fn blocks_to_fill() -> usize {
        FFT_LENGTH.div_ceil(BLOCK_LENGTH)
    }

    #[test]
    fn state_machine_walks_idle_filling_steady() {
        let mut pipeline = AnalysisPipeline::default();
        assert_eq!(pipeline.state(), PipelineState::Idle);

        let block = vec![0.0f32; BLOCK_LENGTH];
        assert_eq!(pipeline.ingest(&block), CycleOutcome::Buffering);
        assert_eq!(pipeline.state(), PipelineState::Filling);

        for _ in 1..blocks_to_fill() - 1 {
            assert_eq!(pipeline.ingest(&block), CycleOutcome::Buffering);
        }
        // The block that completes the buffer also runs the first cycle.
        assert_eq!(pipeline.ingest(&block), CycleOutcome::Published);
        assert_eq!(pipeline.state(), PipelineState::Steady);
        assert_eq!(pipeline.frames_published(), 1);
    }

    #[test]
    fn malformed_blocks_are_discarded_without_a_cycle() {
        let mut pipeline = AnalysisPipeline::default();

        assert_eq!(pipeline.ingest(&[0.0; 100]), CycleOutcome::Discarded);
        assert_eq!(pipeline.state(), PipelineState::Idle);

        let mut nan_block = vec![0.0f32; BLOCK_LENGTH];
        nan_block[17] = f32::NAN;
        assert_eq!(pipeline.ingest(&nan_block), CycleOutcome::Discarded);

        assert_eq!(pipeline.discarded_blocks(), 2);
        assert_eq!(pipeline.output().latest().frame_index, 0);
    }

    #[test]
    fn silence_publishes_near_zero_frames() {
        let params = Params::new(2.0, 0.03, false);
        let mut pipeline = AnalysisPipeline::new(params);
        let block = vec![0.0f32; BLOCK_LENGTH];
        for _ in 0..blocks_to_fill() + 2 {
            pipeline.ingest(&block);
        }

        let frame = pipeline.output().latest();
        assert!(frame.spectrum.iter().all(|&v| v.abs() < 1e-6));
        assert!(frame.mu_spectrum.iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn sinusoid_peaks_at_expected_bin_and_note_point() {
        let params = Params::new(1.0, 0.0, false);
        let mut pipeline = AnalysisPipeline::new(params);
        let map = pipeline.frequency_map();

        // Bin-aligned tone at bin 1000, roughly 2691.65 Hz.
        let bin = 1000usize;
        let freq = bin as f64 * map.bin_width;
        for block in sine_blocks(freq, 0.5, blocks_to_fill() + 1) {
            pipeline.ingest(&block);
        }

        let frame = pipeline.output().latest();
        assert_eq!(argmax(&frame.spectrum), bin);

        let expected_point = (POINTS_PER_OCTAVE as f64 * (freq / map.lower_freq).log2()).round();
        let peak_point = argmax(&frame.mu_spectrum) as i64;
        assert!(
            (peak_point - expected_point as i64).abs() <= 2,
            "note peak at {peak_point}, expected near {expected_point}"
        );
    }

    #[test]
    fn history_length_never_grows() {
        let mut pipeline = AnalysisPipeline::default();
        let expected = HISTORY_FRAMES * HISTORY_POINT_COUNT;
        for block in sine_blocks(440.0, 0.3, blocks_to_fill() + HISTORY_FRAMES + 5) {
            pipeline.ingest(&block);
            assert_eq!(pipeline.output().latest().mu_history.len(), expected);
        }
        assert!(pipeline.frames_published() as usize > HISTORY_FRAMES);
    }

    #[test]
    fn history_ends_with_the_newest_frame() {
        let mut pipeline = AnalysisPipeline::default();
        for block in sine_blocks(1000.0, 0.4, blocks_to_fill() + 3) {
            pipeline.ingest(&block);
        }
        let frame = pipeline.output().latest();
        let tail = &frame.mu_history[frame.mu_history.len() - HISTORY_POINT_COUNT..];
        assert_eq!(tail, &frame.mu_spectrum[..HISTORY_POINT_COUNT]);
    }

    #[test]
    fn peak_mode_toggle_keeps_output_shapes() {
        let pipeline_params = Params::new(1.0, 0.0, false);
        let mut pipeline = AnalysisPipeline::new(pipeline_params.clone());
        let blocks = sine_blocks(2000.0, 0.5, blocks_to_fill() + 2);
        for block in &blocks[..blocks.len() - 1] {
            pipeline.ingest(block);
        }
        let plain = pipeline.output().latest();

        pipeline_params.set_peak_mode(true);
        assert_eq!(pipeline.ingest(&blocks[blocks.len() - 1]), CycleOutcome::Published);
        let enhanced = pipeline.output().latest();

        assert_eq!(enhanced.spectrum.len(), plain.spectrum.len());
        assert_eq!(enhanced.mu_spectrum.len(), plain.mu_spectrum.len());
        assert!(enhanced.frame_index > plain.frame_index);
        // Enhancement never produces negative magnitudes.
        assert!(enhanced.spectrum.iter().all(|&v| v >= 0.0));
    }
}
