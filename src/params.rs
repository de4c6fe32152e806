use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

pub const GAIN_MIN: f32 = 0.0;
pub const GAIN_MAX: f32 = 2.0;
pub const SLOPE_MIN: f32 = 0.0;
pub const SLOPE_MAX: f32 = 0.03;

pub const DEFAULT_GAIN: f32 = 1.0;
pub const DEFAULT_SLOPE: f32 = 0.015;

/// Point-in-time copy of the user parameters. Each field is read
/// atomically; the fields of one snapshot may reflect slightly different
/// moments, which is acceptable for display gain and slope.
#[derive(Clone, Copy, Debug)]
pub struct ParamSnapshot {
    pub gain: f32,
    pub slope: f32,
    pub peak_mode: bool,
}

/// Live-adjustable analysis parameters, shared between UI glue and the
/// pipeline. Setters clamp into the documented ranges, so the
/// normalization math never sees out-of-range values. Cloning shares the
/// same underlying state.
#[derive(Clone)]
pub struct Params {
    inner: Arc<Inner>,
}

struct Inner {
    gain: AtomicU32,
    slope: AtomicU32,
    peak_mode: AtomicBool,
}

impl Params {
    pub fn new(gain: f32, slope: f32, peak_mode: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                gain: AtomicU32::new(clamp_finite(gain, GAIN_MIN, GAIN_MAX).to_bits()),
                slope: AtomicU32::new(clamp_finite(slope, SLOPE_MIN, SLOPE_MAX).to_bits()),
                peak_mode: AtomicBool::new(peak_mode),
            }),
        }
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.inner.gain.load(Ordering::Relaxed))
    }

    pub fn set_gain(&self, gain: f32) {
        self.inner
            .gain
            .store(clamp_finite(gain, GAIN_MIN, GAIN_MAX).to_bits(), Ordering::Relaxed);
    }

    pub fn slope(&self) -> f32 {
        f32::from_bits(self.inner.slope.load(Ordering::Relaxed))
    }

    pub fn set_slope(&self, slope: f32) {
        self.inner
            .slope
            .store(clamp_finite(slope, SLOPE_MIN, SLOPE_MAX).to_bits(), Ordering::Relaxed);
    }

    pub fn peak_mode(&self) -> bool {
        self.inner.peak_mode.load(Ordering::Relaxed)
    }

    pub fn set_peak_mode(&self, enabled: bool) {
        self.inner.peak_mode.store(enabled, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            gain: self.gain(),
            slope: self.slope(),
            peak_mode: self.peak_mode(),
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new(DEFAULT_GAIN, DEFAULT_SLOPE, false)
    }
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}
