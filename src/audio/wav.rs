//! WAV header inspection for uploaded audio.

use crate::error::{Result, VoicserveError};
use std::path::Path;

/// Format details read from a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Frames (samples per channel) declared in the data chunk.
    pub frames: u32,
}

impl WavInfo {
    /// Duration implied by the header, in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Read the header of a WAV file without decoding samples.
pub fn probe(path: &Path) -> Result<WavInfo> {
    let reader = hound::WavReader::open(path).map_err(|e| VoicserveError::UnsupportedFormat {
        expected: "16-bit PCM WAV".to_string(),
        actual: format!("unreadable WAV ({})", e),
    })?;

    let spec = reader.spec();
    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        frames: reader.duration(),
    })
}

/// Fail unless the WAV file at `path` is sampled at `expected_rate`.
pub fn require_sample_rate(path: &Path, expected_rate: u32) -> Result<WavInfo> {
    let info = probe(path)?;
    tracing::debug!(
        path = %path.display(),
        sample_rate = info.sample_rate,
        channels = info.channels,
        bits = info.bits_per_sample,
        seconds = info.duration_secs(),
        "inspected WAV upload"
    );

    if info.sample_rate != expected_rate {
        return Err(VoicserveError::UnsupportedFormat {
            expected: format!("{} Hz", expected_rate),
            actual: format!("{} Hz", info.sample_rate),
        });
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(dir: &TempDir, name: &str, sample_rate: u32, samples: &[i16]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_probe_reads_header() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "a.wav", 16000, &[0; 8000]);

        let info = probe(&path).unwrap();
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.frames, 8000);
        assert_eq!(info.duration_secs(), 0.5);
    }

    #[test]
    fn test_require_sample_rate_accepts_16k() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "ok.wav", 16000, &[1, 2, 3]);
        assert!(require_sample_rate(&path, 16000).is_ok());
    }

    #[test]
    fn test_require_sample_rate_rejects_other_rates() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "cd.wav", 44100, &[1, 2, 3]);

        match require_sample_rate(&path, 16000) {
            Err(VoicserveError::UnsupportedFormat { expected, actual }) => {
                assert_eq!(expected, "16000 Hz");
                assert_eq!(actual, "44100 Hz");
            }
            other => panic!("Expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_probe_rejects_non_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();

        assert!(matches!(
            probe(&path),
            Err(VoicserveError::UnsupportedFormat { .. })
        ));
    }
}
