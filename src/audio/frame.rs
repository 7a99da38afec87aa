//! Wire format for streamed audio frames.
//!
//! One binary WebSocket message carries one frame:
//!
//! ```text
//! [0..4)  sample rate   u32 little-endian
//! [4..8)  sample count  u32 little-endian
//! [8..)   samples       i16 little-endian PCM, mono
//! ```
//!
//! The declared sample count is trusted for duration bookkeeping and is not
//! checked against the payload length.

use crate::error::{Result, VoicserveError};

/// Size of the rate/count header in bytes.
pub const HEADER_LEN: usize = 8;

/// Audio frame decoded from one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    /// Sample rate declared by the sender, in Hz.
    pub sample_rate: u32,
    /// Sample count declared by the sender.
    pub sample_count: u32,
    /// Audio samples as 16-bit PCM.
    pub samples: Vec<i16>,
}

impl AudioFrame {
    /// Creates a frame whose declared count matches its samples.
    ///
    /// The count saturates at `u32::MAX`.
    pub fn new(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            sample_count: declared_count(samples.len()),
            samples,
        }
    }

    /// Parses a frame from a binary payload.
    ///
    /// Fails only when the header is incomplete or declares a zero sample
    /// rate. A trailing odd byte is ignored.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < HEADER_LEN {
            return Err(VoicserveError::FrameDecode {
                message: format!(
                    "expected at least {} header bytes, got {}",
                    HEADER_LEN,
                    payload.len()
                ),
            });
        }

        let sample_rate = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let sample_count = u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);

        if sample_rate == 0 {
            return Err(VoicserveError::FrameDecode {
                message: "sample rate is zero".to_string(),
            });
        }

        let samples: Vec<i16> = payload[HEADER_LEN..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        if samples.len() != sample_count as usize {
            tracing::debug!(
                declared = sample_count,
                actual = samples.len(),
                "frame sample count does not match payload"
            );
        }

        Ok(Self {
            sample_rate,
            sample_count,
            samples,
        })
    }

    /// Serializes the frame into its wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.samples.len() * 2);
        bytes.extend_from_slice(&self.sample_rate.to_le_bytes());
        bytes.extend_from_slice(&self.sample_count.to_le_bytes());
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    /// Duration implied by the declared header, in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }
}

fn declared_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
