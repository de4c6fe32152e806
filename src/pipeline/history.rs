/// Fixed-length circular log of past note-spectrum frames, oldest first.
///
/// Backed by one flat allocation with a head index; appending overwrites
/// the oldest frame slot instead of shifting. Starts zero-filled, so a
/// snapshot is always exactly `frames * frame_len` values.
pub struct HistoryRing {
    data: Vec<f32>,
    frame_len: usize,
    frames: usize,
    /// Slot holding the oldest frame (and the next to be overwritten).
    head: usize,
}

impl HistoryRing {
    pub fn new(frames: usize, frame_len: usize) -> Self {
        assert!(frames > 0 && frame_len > 0);
        Self {
            data: vec![0.0; frames * frame_len],
            frame_len,
            frames,
            head: 0,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Total number of values in a snapshot.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drops the oldest frame and appends `frame` as the newest.
    pub fn append(&mut self, frame: &[f32]) {
        assert_eq!(frame.len(), self.frame_len);
        let start = self.head * self.frame_len;
        self.data[start..start + self.frame_len].copy_from_slice(frame);
        self.head = (self.head + 1) % self.frames;
    }

    /// Flat chronological copy: index 0 is the start of the oldest frame,
    /// the final `frame_len` values are the newest frame.
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.data.len());
        for k in 0..self.frames {
            let slot = (self.head + k) % self.frames;
            let start = slot * self.frame_len;
            out.extend_from_slice(&self.data[start..start + self.frame_len]);
        }
        out
    }
}
