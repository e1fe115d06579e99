use serde::{Deserialize, Serialize};
use std::fmt;

/// Column order of the flat-file transport. The first row is always this header.
pub const STREAM_HEADER: [&str; 10] = [
    "timestamp",
    "ecg",
    "accel_x",
    "accel_y",
    "accel_z",
    "gyro_x",
    "gyro_y",
    "gyro_z",
    "status_ecg",
    "status_imu",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum EcgStatus {
    #[default]
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "RED_FLAG_ARRHYTHMIA")]
    RedFlagArrhythmia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ImuStatus {
    #[default]
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "RED_FLAG_FATIGUE")]
    RedFlagFatigue,
}

impl EcgStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EcgStatus::Normal => "NORMAL",
            EcgStatus::RedFlagArrhythmia => "RED_FLAG_ARRHYTHMIA",
        }
    }
}

impl ImuStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImuStatus::Normal => "NORMAL",
            ImuStatus::RedFlagFatigue => "RED_FLAG_FATIGUE",
        }
    }
}

impl fmt::Display for EcgStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ImuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement phase of the knee exercise. Drives the IMU angle model only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExercisePhase {
    Extension,
    Flexion,
}

impl ExercisePhase {
    /// Phase for the `count`-th produced sample: starts in extension and
    /// toggles every `period` samples.
    pub fn for_sample(count: u64, period: u64) -> Self {
        if (count / period.max(1)) % 2 == 0 {
            ExercisePhase::Extension
        } else {
            ExercisePhase::Flexion
        }
    }
}

/// One synthesized ECG + IMU reading. Immutable once written to a transport.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: String,
    pub ecg: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    pub status_ecg: EcgStatus,
    pub status_imu: ImuStatus,
}

impl Sample {
    /// Knee angle in degrees, reported on the primary accelerometer axis.
    pub fn knee_angle(&self) -> f64 {
        self.accel_x
    }

    /// Row in transport column order with the fixed decimal formatting.
    pub fn to_record(&self) -> [String; 10] {
        [
            self.timestamp.clone(),
            format!("{:.4}", self.ecg),
            format!("{:.2}", self.accel_x),
            format!("{:.2}", self.accel_y),
            format!("{:.2}", self.accel_z),
            format!("{:.2}", self.gyro_x),
            format!("{:.2}", self.gyro_y),
            format!("{:.2}", self.gyro_z),
            self.status_ecg.to_string(),
            self.status_imu.to_string(),
        ]
    }
}

/// The most recent samples of a stream, oldest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Window {
    samples: Vec<Sample>,
}

impl Window {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn ecg_values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.ecg).collect()
    }

    pub fn knee_angles(&self) -> Vec<f64> {
        self.samples.iter().map(Sample::knee_angle).collect()
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

impl<'a> IntoIterator for &'a Window {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
