//! Loudness gate for streamed frames.
//!
//! Frames whose mean absolute amplitude falls below the threshold are
//! treated as silence and never reach the stream buffer.

use crate::audio::frame::AudioFrame;
use crate::defaults;

/// Decision for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Loud enough to buffer.
    Accept { volume: f64 },
    /// Below the threshold; drop it.
    Reject { volume: f64 },
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept { .. })
    }

    pub fn volume(&self) -> f64 {
        match *self {
            GateDecision::Accept { volume } | GateDecision::Reject { volume } => volume,
        }
    }
}

/// Mean-absolute-amplitude silence gate.
#[derive(Debug, Clone, Copy)]
pub struct VolumeGate {
    threshold: f64,
}

impl Default for VolumeGate {
    fn default() -> Self {
        Self::new(defaults::VOLUME_THRESHOLD)
    }
}

impl VolumeGate {
    /// Creates a gate rejecting frames with mean amplitude below `threshold`.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classifies a frame.
    pub fn check(&self, frame: &AudioFrame) -> GateDecision {
        let volume = mean_abs_amplitude(&frame.samples);
        if volume < self.threshold {
            GateDecision::Reject { volume }
        } else {
            GateDecision::Accept { volume }
        }
    }
}

/// Mean of `|sample|` on the i16 scale; 0.0 for an empty slice.
pub fn mean_abs_amplitude(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: u64 = samples
        .iter()
        .map(|&sample| u64::from(sample.unsigned_abs()))
        .sum();

    sum as f64 / samples.len() as f64
}

/// Largest `|sample|`, 0 for an empty slice.
pub fn peak_amplitude(samples: &[i16]) -> u16 {
    samples
        .iter()
        .map(|sample| sample.unsigned_abs())
        .max()
        .unwrap_or(0)
}
