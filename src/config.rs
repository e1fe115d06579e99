use crate::error::{StreamError, StreamResult};
use crate::simulator::imu::ANGLE_RANGE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Heart rates the ECG model supports.
pub const BPM_RANGE: (f64, f64) = (30.0, 220.0);

/// Longest accepted gap between two samples, in seconds.
pub const MAX_SAMPLE_PERIOD_SECS: f64 = 60.0;

/// Fastest accepted knee oscillation, in Hz.
pub const MAX_MOVEMENT_FREQ_HZ: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seconds between two produced samples (0.02 = 50 Hz).
    pub sample_period_secs: f64,
    /// Number of samples kept in the sliding window (K).
    pub window_capacity: usize,
    /// Flat-file sink mirroring the window. `None` keeps the stream in memory only.
    pub stream_file: Option<PathBuf>,
    /// Emit a progress line every this many produced samples.
    pub progress_log_every: u64,
    pub synthesizer: SynthesizerConfig,
    pub thresholds: AnomalyThresholds,
    pub peaks: PeakDetectionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_period_secs: 0.02,
            window_capacity: 250,
            stream_file: None,
            progress_log_every: 50,
            synthesizer: SynthesizerConfig::default(),
            thresholds: AnomalyThresholds::default(),
            peaks: PeakDetectionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    pub base_bpm: f64,
    pub heart_rate_modulation: Option<HeartRateModulation>,
    /// Standard deviation of the Gaussian noise added to every ECG sample.
    pub ecg_noise_std: f64,
    /// Produced samples per exercise phase before toggling.
    pub phase_period_samples: u64,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub imu: ImuConfig,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            base_bpm: 75.0,
            heart_rate_modulation: None,
            ecg_noise_std: 0.05,
            phase_period_samples: 100,
            seed: None,
            imu: ImuConfig::default(),
        }
    }
}

/// Slow sinusoidal drift of the heart rate: `base + amplitude * sin(angular_freq * t)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateModulation {
    pub amplitude_bpm: f64,
    pub angular_freq: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
    pub movement_freq_hz: f64,
    pub extension_center: f64,
    pub extension_amplitude: f64,
    pub flexion_center: f64,
    pub flexion_amplitude: f64,
    pub lateral_accel_std: f64,
    pub gravity: f64,
    pub vertical_accel_std: f64,
    pub gyro_noise_std: f64,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            movement_freq_hz: 0.3,
            extension_center: 45.0,
            extension_amplitude: 15.0,
            flexion_center: 60.0,
            flexion_amplitude: 35.0,
            lateral_accel_std: 2.0,
            gravity: 9.81,
            vertical_accel_std: 0.1,
            gyro_noise_std: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyThresholds {
    /// Absolute ECG noise above which a sample is flagged as arrhythmia.
    pub arrhythmia_noise: f64,
    pub fatigue_accel_y: f64,
    pub fatigue_gyro_y: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            arrhythmia_noise: 0.12,
            fatigue_accel_y: 5.0,
            fatigue_gyro_y: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakDetectionConfig {
    /// Refractory period between two R-peaks, in samples.
    pub min_distance: usize,
    pub min_prominence: f64,
    /// Baseline-wander removal ahead of peak detection.
    pub highpass_cutoff_hz: Option<f64>,
}

impl Default for PeakDetectionConfig {
    fn default() -> Self {
        Self {
            min_distance: 50,
            min_prominence: 0.5,
            highpass_cutoff_hz: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> StreamResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(self.sample_period_secs)
    }

    pub fn validate(&self) -> StreamResult<()> {
        let period = Duration::try_from_secs_f64(self.sample_period_secs)
            .ok()
            .filter(|p| !p.is_zero() && p.as_secs_f64() <= MAX_SAMPLE_PERIOD_SECS);
        if period.is_none() {
            return Err(invalid(format!(
                "sample_period_secs must lie in (0, {MAX_SAMPLE_PERIOD_SECS}], got {}",
                self.sample_period_secs
            )));
        }
        if self.window_capacity < 2 {
            return Err(invalid(format!(
                "window_capacity must be at least 2, got {}",
                self.window_capacity
            )));
        }
        self.synthesizer.validate()?;
        self.thresholds.validate()?;
        self.peaks.validate()
    }
}

impl SynthesizerConfig {
    pub fn validate(&self) -> StreamResult<()> {
        let (low, high) = BPM_RANGE;
        if !(low..=high).contains(&self.base_bpm) {
            return Err(invalid(format!(
                "base_bpm must lie in {low}..={high}, got {}",
                self.base_bpm
            )));
        }
        if let Some(m) = self.heart_rate_modulation {
            if !(low..=high).contains(&(self.base_bpm - m.amplitude_bpm.abs()))
                || !(low..=high).contains(&(self.base_bpm + m.amplitude_bpm.abs()))
            {
                return Err(invalid(format!(
                    "heart rate modulation of {} bpm leaves {low}..={high}",
                    m.amplitude_bpm
                )));
            }
            if !m.angular_freq.is_finite() {
                return Err(invalid("heart rate modulation frequency must be finite".into()));
            }
        }
        if !(self.ecg_noise_std.is_finite() && self.ecg_noise_std >= 0.0) {
            return Err(invalid(format!("ecg_noise_std must be >= 0, got {}", self.ecg_noise_std)));
        }
        if self.phase_period_samples == 0 {
            return Err(invalid("phase_period_samples must be at least 1".into()));
        }
        let imu = &self.imu;
        for (name, std) in [
            ("lateral_accel_std", imu.lateral_accel_std),
            ("vertical_accel_std", imu.vertical_accel_std),
            ("gyro_noise_std", imu.gyro_noise_std),
        ] {
            if !(std.is_finite() && std >= 0.0) {
                return Err(invalid(format!("imu.{name} must be >= 0, got {std}")));
            }
        }
        imu.validate()
    }
}

impl ImuConfig {
    pub fn validate(&self) -> StreamResult<()> {
        let (low, high) = ANGLE_RANGE;
        for (name, value) in [
            ("extension_center", self.extension_center),
            ("flexion_center", self.flexion_center),
        ] {
            if !(low..=high).contains(&value) {
                return Err(invalid(format!("imu.{name} must lie in {low}..={high}, got {value}")));
            }
        }
        for (name, value) in [
            ("extension_amplitude", self.extension_amplitude),
            ("flexion_amplitude", self.flexion_amplitude),
        ] {
            if !(value.is_finite() && value.abs() <= high - low) {
                return Err(invalid(format!("imu.{name} must be at most {} degrees, got {value}", high - low)));
            }
        }
        if !(self.movement_freq_hz.is_finite() && self.movement_freq_hz.abs() <= MAX_MOVEMENT_FREQ_HZ) {
            return Err(invalid(format!(
                "imu.movement_freq_hz must be finite and at most {MAX_MOVEMENT_FREQ_HZ} Hz, got {}",
                self.movement_freq_hz
            )));
        }
        if !self.gravity.is_finite() {
            return Err(invalid(format!("imu.gravity must be finite, got {}", self.gravity)));
        }
        Ok(())
    }
}

impl AnomalyThresholds {
    pub fn validate(&self) -> StreamResult<()> {
        for (name, value) in [
            ("arrhythmia_noise", self.arrhythmia_noise),
            ("fatigue_accel_y", self.fatigue_accel_y),
            ("fatigue_gyro_y", self.fatigue_gyro_y),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("thresholds.{name} must be >= 0, got {value}")));
            }
        }
        Ok(())
    }
}

impl PeakDetectionConfig {
    pub fn validate(&self) -> StreamResult<()> {
        if self.min_distance == 0 {
            return Err(invalid("peaks.min_distance must be at least 1".into()));
        }
        if !(self.min_prominence.is_finite() && self.min_prominence >= 0.0) {
            return Err(invalid(format!(
                "peaks.min_prominence must be >= 0, got {}",
                self.min_prominence
            )));
        }
        if let Some(cutoff) = self.highpass_cutoff_hz {
            if !(cutoff.is_finite() && cutoff > 0.0) {
                return Err(invalid(format!("peaks.highpass_cutoff_hz must be positive, got {cutoff}")));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> StreamError {
    StreamError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_tiny_window() {
        let config = PipelineConfig {
            window_capacity: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StreamError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_bpm_outside_physiological_range() {
        let mut config = PipelineConfig::default();
        config.synthesizer.base_bpm = 250.0;
        assert!(config.validate().is_err());

        config.synthesizer.base_bpm = 215.0;
        config.synthesizer.heart_rate_modulation = Some(HeartRateModulation {
            amplitude_bpm: 10.0,
            angular_freq: 0.1,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_sample_period_outside_duration_range() {
        for period in [0.0, -0.02, f64::NAN, f64::INFINITY, 1e20, MAX_SAMPLE_PERIOD_SECS * 2.0] {
            let config = PipelineConfig {
                sample_period_secs: period,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(StreamError::InvalidConfig(_))),
                "period {period} accepted"
            );
        }
        let slow = PipelineConfig {
            sample_period_secs: MAX_SAMPLE_PERIOD_SECS,
            ..Default::default()
        };
        assert!(slow.validate().is_ok());
    }

    #[test]
    fn rejects_imu_model_outside_angle_range() {
        let cases = [
            ImuConfig {
                extension_amplitude: 1e308,
                ..Default::default()
            },
            ImuConfig {
                flexion_amplitude: f64::NAN,
                ..Default::default()
            },
            ImuConfig {
                extension_center: 150.0,
                ..Default::default()
            },
            ImuConfig {
                flexion_center: f64::INFINITY,
                ..Default::default()
            },
            ImuConfig {
                movement_freq_hz: 1e300,
                ..Default::default()
            },
            ImuConfig {
                gravity: f64::NEG_INFINITY,
                ..Default::default()
            },
        ];
        for imu in cases {
            let mut config = PipelineConfig::default();
            config.synthesizer.imu = imu.clone();
            assert!(
                matches!(config.validate(), Err(StreamError::InvalidConfig(_))),
                "{imu:?} accepted"
            );
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "window_capacity": 50, "synthesizer": { "base_bpm": 90.0 } }"#)
                .unwrap();
        assert_eq!(config.window_capacity, 50);
        assert_eq!(config.synthesizer.base_bpm, 90.0);
        assert_eq!(config.synthesizer.phase_period_samples, 100);
        assert_eq!(config.peaks, PeakDetectionConfig::default());
    }
}
