use crate::config::AnomalyThresholds;
use crate::sample::{EcgStatus, ImuStatus, Window};
use ndarray::Array1;
use ndarray_stats::QuantileExt;

/// Fewer samples than this cannot be classified.
pub const MIN_CLASSIFIABLE_SAMPLES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub ecg: EcgStatus,
    pub imu: ImuStatus,
}

impl Classification {
    pub fn has_arrhythmia(&self) -> bool {
        self.ecg == EcgStatus::RedFlagArrhythmia
    }

    pub fn has_fatigue(&self) -> bool {
        self.imu == ImuStatus::RedFlagFatigue
    }
}

/// Outcome of classifying a window. Too little data is a result of its own,
/// not "no anomaly".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    InsufficientData { samples: usize },
    Classified(Classification),
}

impl Assessment {
    pub fn classification(&self) -> Option<Classification> {
        match self {
            Assessment::Classified(c) => Some(*c),
            Assessment::InsufficientData { .. } => None,
        }
    }

    pub fn ecg_message(&self) -> &'static str {
        match self {
            Assessment::InsufficientData { .. } => "Collecting data...",
            Assessment::Classified(c) if c.has_arrhythmia() => "ARRHYTHMIA DETECTED",
            Assessment::Classified(_) => "Normal rhythm",
        }
    }

    pub fn imu_message(&self) -> &'static str {
        match self {
            Assessment::InsufficientData { .. } => "Collecting data...",
            Assessment::Classified(c) if c.has_fatigue() => "FATIGUE DETECTED",
            Assessment::Classified(_) => "Fluid movement",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
    pub samples: usize,
    pub ecg_min: f64,
    pub ecg_max: f64,
    pub ecg_mean: f64,
    pub angle_min: f64,
    pub angle_max: f64,
    pub arrhythmia_samples: usize,
    pub fatigue_samples: usize,
}

/// Threshold-based anomaly flags.
///
/// Per-sample flags are derived at synthesis time (arrhythmia from the
/// magnitude of the injected ECG noise, fatigue from the secondary IMU
/// axes). A window carries the most severe flag found in any of its samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnomalyClassifier {
    thresholds: AnomalyThresholds,
}

impl AnomalyClassifier {
    pub fn new(thresholds: AnomalyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AnomalyThresholds {
        &self.thresholds
    }

    pub fn ecg_status(&self, noise: f64) -> EcgStatus {
        if noise.abs() > self.thresholds.arrhythmia_noise {
            EcgStatus::RedFlagArrhythmia
        } else {
            EcgStatus::Normal
        }
    }

    pub fn imu_status(&self, accel_y: f64, gyro_y: f64) -> ImuStatus {
        if accel_y.abs() > self.thresholds.fatigue_accel_y || gyro_y.abs() > self.thresholds.fatigue_gyro_y {
            ImuStatus::RedFlagFatigue
        } else {
            ImuStatus::Normal
        }
    }

    /// OR-reduction of the per-sample flags over the whole window.
    pub fn classify(&self, window: &Window) -> Assessment {
        if window.len() < MIN_CLASSIFIABLE_SAMPLES {
            return Assessment::InsufficientData { samples: window.len() };
        }
        let ecg = window.iter().map(|s| s.status_ecg).max().unwrap_or_default();
        let imu = window.iter().map(|s| s.status_imu).max().unwrap_or_default();
        Assessment::Classified(Classification { ecg, imu })
    }

    pub fn statistics(&self, window: &Window) -> Option<WindowStats> {
        if window.is_empty() {
            return None;
        }
        let ecg = Array1::from(window.ecg_values());
        let angles = Array1::from(window.knee_angles());

        Some(WindowStats {
            samples: window.len(),
            ecg_min: *ecg.min_skipnan(),
            ecg_max: *ecg.max_skipnan(),
            ecg_mean: ecg.mean().unwrap_or(0.0),
            angle_min: *angles.min_skipnan(),
            angle_max: *angles.max_skipnan(),
            arrhythmia_samples: window
                .iter()
                .filter(|s| s.status_ecg == EcgStatus::RedFlagArrhythmia)
                .count(),
            fatigue_samples: window
                .iter()
                .filter(|s| s.status_imu == ImuStatus::RedFlagFatigue)
                .count(),
        })
    }
}
