/// Fixed-capacity sliding sample buffer between the block-rate audio
/// source and the analysis window.
///
/// The buffer starts zero-filled at full capacity, so `window_into` is
/// always valid; `is_ready` reports when every zero has been displaced by
/// real input. Storage is an index-based ring, so ingesting N samples
/// costs O(N) rather than shifting the whole buffer.
pub struct StreamBuffer {
    data: Vec<f32>,
    /// Index of the oldest sample.
    head: usize,
    /// Total samples ingested since creation, saturating.
    received: usize,
}

impl StreamBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "stream buffer capacity must be non-zero");
        Self {
            data: vec![0.0; capacity],
            head: 0,
            received: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// True once at least `capacity` samples have been ingested, i.e. the
    /// analysis window no longer contains any of the initial zero fill.
    pub fn is_ready(&self) -> bool {
        self.received >= self.data.len()
    }

    /// Appends `block`, discarding the same number of oldest samples.
    /// A block longer than the capacity keeps only its newest samples.
    pub fn ingest(&mut self, block: &[f32]) {
        let cap = self.data.len();
        let src = if block.len() > cap {
            &block[block.len() - cap..]
        } else {
            block
        };

        let first = src.len().min(cap - self.head);
        self.data[self.head..self.head + first].copy_from_slice(&src[..first]);
        self.data[..src.len() - first].copy_from_slice(&src[first..]);

        self.head = (self.head + src.len()) % cap;
        self.received = self.received.saturating_add(block.len());
    }

    /// Copies the oldest `out.len()` samples, in arrival order, into `out`.
    /// `out` must not exceed the capacity.
    pub fn window_into(&self, out: &mut [f32]) {
        let cap = self.data.len();
        debug_assert!(out.len() <= cap);

        let first = out.len().min(cap - self.head);
        out[..first].copy_from_slice(&self.data[self.head..self.head + first]);
        out[first..].copy_from_slice(&self.data[..out.len() - first]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(buf: &StreamBuffer, len: usize) -> Vec<f32> {
        let mut out = vec![0.0; len];
        buf.window_into(&mut out);
        out
    }

    #[test]
    fn starts_zero_filled_and_not_ready() {
        let buf = StreamBuffer::new(8);
        assert!(!buf.is_ready());
        assert_eq!(window(&buf, 8), vec![0.0; 8]);
    }

    #[test]
    fn keeps_newest_samples_oldest_first() {
        let mut buf = StreamBuffer::new(8);
        buf.ingest(&[1.0, 2.0, 3.0, 4.0]);
        assert!(!buf.is_ready());
        buf.ingest(&[5.0, 6.0, 7.0, 8.0]);
        assert!(buf.is_ready());
        assert_eq!(
            window(&buf, 8),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );

        buf.ingest(&[9.0, 10.0]);
        assert_eq!(
            window(&buf, 8),
            vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]
        );
    }

    #[test]
    fn shorter_window_reads_the_oldest_samples() {
        let mut buf = StreamBuffer::new(8);
        buf.ingest(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        buf.ingest(&[9.0, 10.0]);
        assert_eq!(window(&buf, 4), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn oversized_block_keeps_its_tail() {
        let mut buf = StreamBuffer::new(4);
        let block: Vec<f32> = (1..=10).map(|i| i as f32).collect();
        buf.ingest(&block);
        assert!(buf.is_ready());
        assert_eq!(window(&buf, 4), vec![7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn ready_state_persists_across_wraps() {
        let mut buf = StreamBuffer::new(6);
        for chunk in [[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]] {
            buf.ingest(&chunk);
        }
        assert!(buf.is_ready());
        assert_eq!(window(&buf, 6), vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }
}
