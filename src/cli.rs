use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tonika", about = "Musical spectrum analysis pipeline for audio visualizers")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Config file path (defaults to tonika.toml / user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Spectrum gain, 0.0-2.0
    #[arg(short, long)]
    pub gain: Option<f32>,

    /// Per-bin slope boost, 0.0-0.03
    #[arg(short, long)]
    pub slope: Option<f32>,

    /// Enable peak-emphasis enhancement
    #[arg(long)]
    pub peaks: bool,

    /// Feed blocks at the nominal 0.1 s cadence through the worker thread
    #[arg(long)]
    pub realtime: bool,

    /// Write the final published frame as JSON
    #[arg(long)]
    pub dump: Option<PathBuf>,
}
