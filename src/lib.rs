pub mod analysis;
pub mod audio;
pub mod params;
pub mod pipeline;

pub use analysis::freq_map::FrequencyMap;
pub use params::Params;
pub use pipeline::output::{AnalysisFrame, OutputHandle};
pub use pipeline::{AnalysisPipeline, CycleOutcome};
