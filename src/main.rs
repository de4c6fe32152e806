mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::{Duration, Instant};

use cli::Cli;
use tonika::analysis::{BIN_COUNT, POINTS_PER_NOTE, SAMPLE_RATE};
use tonika::audio::decode;
use tonika::pipeline::driver::PipelineDriver;
use tonika::{AnalysisFrame, AnalysisPipeline, Params};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detected locations.
    let config_path = cli.config.clone().or_else(config::discover_config);
    let file_config = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                config::Config::default()
            }
        },
        None => config::Config::default(),
    };

    // CLI flags win over the config file.
    let gain = cli.gain.unwrap_or(file_config.analysis.gain);
    let slope = cli.slope.unwrap_or(file_config.analysis.slope);
    let peak_mode = cli.peaks || file_config.analysis.peak_mode;

    log::info!("tonika - musical spectrum analysis");
    log::info!("Input: {}", cli.input.display());
    log::info!("Gain: {gain:.3}, slope: {slope:.4}, peaks: {peak_mode}");

    let audio = decode::decode_file(&cli.input)?;
    if audio.trailing_samples() > 0 {
        log::info!(
            "{} trailing samples do not fill a block and will be skipped",
            audio.trailing_samples()
        );
    }
    if audio.block_count() == 0 {
        anyhow::bail!("Input is shorter than one analysis block");
    }

    let params = Params::new(gain, slope, peak_mode);
    let pipeline = AnalysisPipeline::new(params);
    let output = pipeline.output();

    let progress = ProgressBar::new(audio.block_count() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    let (frames, discarded, dropped) = if cli.realtime {
        run_realtime(pipeline, &audio, &progress)?
    } else {
        run_offline(pipeline, &audio, &progress)
    };
    progress.finish_with_message("Analysis complete");

    log::info!(
        "Published {frames} frames ({discarded} blocks discarded, {dropped} dropped under load)"
    );

    let frame = output.latest();
    summarize(&frame);

    if let Some(ref path) = cli.dump {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create dump file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, &*frame).context("Failed to serialize frame")?;
        log::info!("Wrote final frame to {}", path.display());
    }

    Ok(())
}

/// Feed every block back-to-back, as fast as the analysis runs.
fn run_offline(
    mut pipeline: AnalysisPipeline,
    audio: &decode::DecodedAudio,
    progress: &ProgressBar,
) -> (u64, u64, u64) {
    for block in audio.blocks() {
        pipeline.ingest(block);
        progress.inc(1);
    }
    (pipeline.frames_published(), pipeline.discarded_blocks(), 0)
}

/// Feed blocks at the nominal 0.1 s cadence through the worker thread,
/// exercising the same backpressure path a live audio source would.
fn run_realtime(
    pipeline: AnalysisPipeline,
    audio: &decode::DecodedAudio,
    progress: &ProgressBar,
) -> Result<(u64, u64, u64)> {
    let driver = PipelineDriver::spawn(pipeline).context("Failed to start analysis worker")?;
    let period = Duration::from_millis(100);
    let mut next = Instant::now();

    for block in audio.blocks() {
        driver.submit(block.to_vec());
        progress.inc(1);
        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        }
    }

    let dropped = driver.dropped_blocks();
    let pipeline = driver.shutdown();
    Ok((pipeline.frames_published(), pipeline.discarded_blocks(), dropped))
}

fn summarize(frame: &AnalysisFrame) {
    if frame.frame_index == 0 {
        log::warn!("No frames were published (input too short?)");
        return;
    }

    let bin_width = SAMPLE_RATE as f32 / 2.0 / BIN_COUNT as f32;
    if let Some(peak_bin) = argmax(&frame.spectrum) {
        log::info!(
            "Final frame {}: spectrum peak at bin {} ({:.1} Hz approx)",
            frame.frame_index,
            peak_bin,
            peak_bin as f32 * bin_width
        );
    }
    if let Some(peak_point) = argmax(&frame.mu_spectrum) {
        log::info!(
            "Note axis peak near {} (point {peak_point})",
            note_label(peak_point)
        );
    }
}

fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

/// Display label for a note-axis point, e.g. "A4".
fn note_label(point: usize) -> String {
    let note = point / POINTS_PER_NOTE;
    let octave = note / NOTE_NAMES.len() + 1;
    format!("{}{}", NOTE_NAMES[note % NOTE_NAMES.len()], octave)
}
