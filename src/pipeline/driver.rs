use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use super::output::OutputHandle;
use super::AnalysisPipeline;

/// Runs an [`AnalysisPipeline`] on a dedicated worker thread behind a
/// one-slot queue.
///
/// At most one block is in flight at a time. When a block arrives while
/// the previous cycle is still running, `submit` drops it and counts the
/// drop: bounded latency is preferred over completeness, so the pipeline
/// never builds a backlog against a slow cycle.
pub struct PipelineDriver {
    sender: SyncSender<Vec<f32>>,
    worker: JoinHandle<AnalysisPipeline>,
    output: OutputHandle,
    dropped: AtomicU64,
}

impl PipelineDriver {
    pub fn spawn(mut pipeline: AnalysisPipeline) -> std::io::Result<Self> {
        let output = pipeline.output();
        let (sender, receiver) = mpsc::sync_channel::<Vec<f32>>(1);

        let worker = thread::Builder::new()
            .name("tonika-analysis".into())
            .spawn(move || {
                while let Ok(block) = receiver.recv() {
                    pipeline.ingest(&block);
                }
                pipeline
            })?;

        Ok(Self {
            sender,
            worker,
            output,
            dropped: AtomicU64::new(0),
        })
    }

    /// Offers a block to the worker. Returns false if the block was
    /// dropped because the worker is still busy with the previous one.
    pub fn submit(&self, block: Vec<f32>) -> bool {
        match self.sender.try_send(block) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                log::debug!("analysis busy, dropping block ({dropped} dropped so far)");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("analysis worker is gone; block dropped");
                false
            }
        }
    }

    /// Blocks dropped by the backpressure policy since spawn.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Handle for reading frames published by the worker.
    pub fn output(&self) -> OutputHandle {
        self.output.clone()
    }

    /// Stops accepting blocks, lets the in-flight cycle finish, and
    /// returns the pipeline with its final state intact.
    pub fn shutdown(self) -> AnalysisPipeline {
        let PipelineDriver { sender, worker, .. } = self;
        drop(sender);
        worker.join().expect("analysis worker panicked")
    }
}
