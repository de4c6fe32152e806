use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// One complete published analysis result. Consumers treat every frame as
/// a full replacement for the previous one, never an incremental patch.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisFrame {
    /// Monotonically increasing cycle counter; 0 is the pre-start frame.
    pub frame_index: u64,
    /// Normalized linear-bin magnitudes covering the eight-octave range.
    pub spectrum: Vec<f32>,
    /// Note-axis spectrum: 96 notes x 12 points per note.
    pub mu_spectrum: Vec<f32>,
    /// Flattened six-octave history, oldest frame first.
    pub mu_history: Vec<f32>,
}

impl AnalysisFrame {
    /// All-zero frame published before the first cycle completes.
    pub fn silent(spectrum_len: usize, point_count: usize, history_len: usize) -> Self {
        Self {
            frame_index: 0,
            spectrum: vec![0.0; spectrum_len],
            mu_spectrum: vec![0.0; point_count],
            mu_history: vec![0.0; history_len],
        }
    }
}

/// Handle through which the presentation layer reads the latest frame.
///
/// Publication swaps a complete frame in under a short lock, so a reader
/// sees either the previous frame or the new one, never a mix. Cloning
/// the handle is cheap; readers poll `latest` at their own cadence.
#[derive(Clone)]
pub struct OutputHandle {
    latest: Arc<Mutex<Arc<AnalysisFrame>>>,
}

impl OutputHandle {
    pub fn new(initial: AnalysisFrame) -> Self {
        Self {
            latest: Arc::new(Mutex::new(Arc::new(initial))),
        }
    }

    /// The most recently published frame.
    pub fn latest(&self) -> Arc<AnalysisFrame> {
        self.latest.lock().clone()
    }

    pub(crate) fn publish(&self, frame: AnalysisFrame) {
        *self.latest.lock() = Arc::new(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_whole_frames() {
        let handle = OutputHandle::new(AnalysisFrame::silent(4, 2, 6));
        assert_eq!(handle.latest().frame_index, 0);

        let reader = handle.clone();
        handle.publish(AnalysisFrame {
            frame_index: 1,
            spectrum: vec![1.0; 4],
            mu_spectrum: vec![2.0; 2],
            mu_history: vec![3.0; 6],
        });

        let frame = reader.latest();
        assert_eq!(frame.frame_index, 1);
        assert_eq!(frame.spectrum, vec![1.0; 4]);
        assert_eq!(frame.mu_history, vec![3.0; 6]);
    }

    #[test]
    fn old_snapshots_stay_valid_after_publish() {
        let handle = OutputHandle::new(AnalysisFrame::silent(2, 2, 2));
        let old = handle.latest();
        handle.publish(AnalysisFrame {
            frame_index: 7,
            spectrum: vec![9.0; 2],
            mu_spectrum: vec![9.0; 2],
            mu_history: vec![9.0; 2],
        });
        // The reader's snapshot is immutable even though a newer frame exists.
        assert_eq!(old.frame_index, 0);
        assert_eq!(handle.latest().frame_index, 7);
    }
}
