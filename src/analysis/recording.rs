use crate::error::{StreamError, StreamResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete offline waveform: parallel time (seconds) and amplitude arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformRecording {
    time: Vec<f64>,
    amplitude: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WaveformRow {
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "ecg", alias = "ECG")]
    ecg: f64,
}

impl WaveformRecording {
    pub fn new(time: Vec<f64>, amplitude: Vec<f64>) -> StreamResult<Self> {
        if time.len() != amplitude.len() {
            return Err(StreamError::LengthMismatch {
                time: time.len(),
                amplitude: amplitude.len(),
            });
        }
        Ok(Self { time, amplitude })
    }

    /// Evaluate `f` at every timestamp.
    pub fn from_fn(time: Vec<f64>, f: impl FnMut(f64) -> f64) -> Self {
        let amplitude = time.iter().copied().map(f).collect();
        Self { time, amplitude }
    }

    /// Load a two-column `Time,ecg` CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> StreamResult<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut time = Vec::new();
        let mut amplitude = Vec::new();
        for row in reader.deserialize::<WaveformRow>() {
            let row = row?;
            time.push(row.time);
            amplitude.push(row.ecg);
        }
        Ok(Self { time, amplitude })
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> StreamResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (&time, &ecg) in self.time.iter().zip(&self.amplitude) {
            writer.serialize(WaveformRow { time, ecg })?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn amplitude(&self) -> &[f64] {
        &self.amplitude
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Mean sampling frequency in Hz, if at least two samples span a positive duration.
    pub fn sampling_frequency(&self) -> Option<f64> {
        let duration = self.duration();
        if self.len() < 2 || !(duration > 0.0) {
            return None;
        }
        Some((self.len() - 1) as f64 / duration)
    }
}
