use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::AnalysisError;

/// Fixed-size windowed forward FFT producing magnitude per bin.
///
/// The window length is fixed at construction. Output is `sqrt(re^2 + im^2)`
/// for bins `[0, length/2)` with no scaling; normalization and gain are
/// applied downstream. The same input always produces the same output.
pub struct SpectralTransform {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    length: usize,
}

impl SpectralTransform {
    pub fn new(length: usize) -> Self {
        debug_assert!(length.is_power_of_two());
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(length);
        Self {
            fft,
            window: hann_window(length),
            scratch: vec![Complex::new(0.0, 0.0); length],
            length,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn bin_count(&self) -> usize {
        self.length / 2
    }

    /// Windows `samples`, transforms, and writes bin magnitudes into `out`.
    /// `samples` must be exactly the transform length and `out` exactly
    /// half of it.
    pub fn magnitudes(&mut self, samples: &[f32], out: &mut [f32]) -> Result<(), AnalysisError> {
        if samples.len() != self.length {
            return Err(AnalysisError::WindowLength {
                expected: self.length,
                got: samples.len(),
            });
        }
        if out.len() != self.bin_count() {
            return Err(AnalysisError::SpectrumLength {
                expected: self.bin_count(),
                got: out.len(),
            });
        }

        for (slot, (&s, &w)) in self
            .scratch
            .iter_mut()
            .zip(samples.iter().zip(self.window.iter()))
        {
            *slot = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut self.scratch);

        for (o, c) in out.iter_mut().zip(self.scratch.iter()) {
            *o = c.norm();
        }

        Ok(())
    }
}

pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}
