//! Duration-triggered accumulation of accepted frames.

use crate::audio::frame::AudioFrame;
use crate::defaults;

/// Pending audio for one streaming connection.
///
/// Duration is the sum of each frame's declared `sample_count / sample_rate`;
/// frames with different rates are not resampled against each other.
#[derive(Debug)]
pub struct StreamBuffer {
    pending: Vec<Vec<i16>>,
    accumulated_secs: f64,
    flush_threshold_secs: f64,
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new(defaults::MIN_FLUSH_DURATION_SECS)
    }
}

impl StreamBuffer {
    /// Creates an empty buffer that becomes ready at `flush_threshold_secs`.
    pub fn new(flush_threshold_secs: f64) -> Self {
        Self {
            pending: Vec::new(),
            accumulated_secs: 0.0,
            flush_threshold_secs,
        }
    }

    /// Appends an accepted frame.
    pub fn push(&mut self, frame: AudioFrame) {
        self.accumulated_secs += frame.duration_secs();
        self.pending.push(frame.samples);
    }

    /// True once the accumulated duration reaches the flush threshold.
    pub fn is_ready(&self) -> bool {
        self.accumulated_secs >= self.flush_threshold_secs
    }

    /// Concatenates pending samples in arrival order and resets the buffer.
    pub fn drain(&mut self) -> Vec<i16> {
        let total: usize = self.pending.iter().map(Vec::len).sum();
        let mut combined = Vec::with_capacity(total);
        for chunk in self.pending.drain(..) {
            combined.extend(chunk);
        }
        self.accumulated_secs = 0.0;
        combined
    }

    pub fn accumulated_secs(&self) -> f64 {
        self.accumulated_secs
    }

    pub fn flush_threshold_secs(&self) -> f64 {
        self.flush_threshold_secs
    }

    /// Number of frames waiting to be flushed.
    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    /// Number of samples waiting to be flushed.
    pub fn pending_samples(&self) -> usize {
        self.pending.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.accumulated_secs == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rate: u32, count: usize, value: i16) -> AudioFrame {
        AudioFrame::new(rate, vec![value; count])
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = StreamBuffer::default();
        assert!(buffer.is_empty());
        assert!(!buffer.is_ready());
        assert_eq!(buffer.flush_threshold_secs(), 2.0);
    }

    #[test]
    fn test_push_accumulates_duration() {
        let mut buffer = StreamBuffer::default();
        buffer.push(frame(44100, 22050, 1000));
        buffer.push(frame(44100, 22050, 1000));

        assert_eq!(buffer.accumulated_secs(), 1.0);
        assert_eq!(buffer.pending_frames(), 2);
        assert_eq!(buffer.pending_samples(), 44100);
        assert!(!buffer.is_ready());
    }

    #[test]
    fn test_ready_at_exact_threshold() {
        let mut buffer = StreamBuffer::default();
        for _ in 0..4 {
            buffer.push(frame(44100, 22050, 1000));
        }
        assert_eq!(buffer.accumulated_secs(), 2.0);
        assert!(buffer.is_ready());
    }

    #[test]
    fn test_drain_concatenates_in_arrival_order_and_resets() {
        let mut buffer = StreamBuffer::new(0.1);
        buffer.push(AudioFrame::new(16000, vec![1, 2]));
        buffer.push(AudioFrame::new(16000, vec![3]));
        buffer.push(AudioFrame::new(16000, vec![4, 5, 6]));

        let combined = buffer.drain();

        assert_eq!(combined, vec![1, 2, 3, 4, 5, 6]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.accumulated_secs(), 0.0);
        assert_eq!(buffer.pending_samples(), 0);
    }

    #[test]
    fn test_mixed_rates_sum_without_reconciliation() {
        let mut buffer = StreamBuffer::default();
        buffer.push(frame(16000, 8000, 1000)); // 0.5s
        buffer.push(frame(8000, 8000, 1000)); // 1.0s
        assert_eq!(buffer.accumulated_secs(), 1.5);
    }

    #[test]
    fn test_duration_uses_declared_count() {
        let mut buffer = StreamBuffer::default();
        // Header says 32000 samples at 16kHz, payload only carried 10.
        buffer.push(AudioFrame {
            sample_rate: 16000,
            sample_count: 32000,
            samples: vec![700; 10],
        });
        assert!(buffer.is_ready());
        assert_eq!(buffer.drain().len(), 10);
    }

    #[test]
    fn test_drain_on_empty_buffer() {
        let mut buffer = StreamBuffer::default();
        assert!(buffer.drain().is_empty());
        assert!(buffer.is_empty());
    }
}
