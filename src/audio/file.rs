use anyhow::{Context, Result};
use hound::WavReader;
use std::path::Path;
use tracing::info;

/// Header facts about a downloaded recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl RecordingInfo {
    /// Read the WAV header of `path` without decoding the samples
    pub fn probe(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file {}", path.display()))?;

        let spec = reader.spec();
        if spec.sample_rate == 0 {
            anyhow::bail!("WAV file {} declares a zero sample rate", path.display());
        }

        // `duration` counts frames, i.e. samples per channel
        let duration_seconds = reader.duration() as f64 / spec.sample_rate as f64;

        info!(
            "Recording {}: {:.1}s, {}Hz, {} channels",
            path.display(),
            duration_seconds,
            spec.sample_rate,
            spec.channels
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.duration_seconds == 0.0
    }
}
