//! Procedural ECG + IMU signal model.
//!
//! The synthesizer produces one [`Sample`] per time step from elapsed time
//! and the current exercise phase. ECG comes from a phase-based PQRST
//! template plus Gaussian noise; IMU from a knee-angle oscillation plus
//! noisy secondary axes. Per-sample anomaly flags are derived here through
//! [`AnomalyClassifier`] because they depend on the injected noise.

use crate::analysis::classifier::AnomalyClassifier;
use crate::config::SynthesizerConfig;
use crate::error::{StreamError, StreamResult};
use crate::sample::{EcgStatus, ExercisePhase, ImuStatus, Sample};
use noisy_float::types::R64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

pub mod demo;
pub mod ecg;
pub mod imu;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EcgReading {
    pub value: f64,
    /// The noise term included in `value`.
    pub noise: f64,
    pub status: EcgStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuReading {
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    pub status: ImuStatus,
}

pub struct WaveformSynthesizer {
    config: SynthesizerConfig,
    classifier: AnomalyClassifier,
    rng: StdRng,
    ecg_noise: Normal<f64>,
    lateral_noise: Normal<f64>,
    vertical_noise: Normal<f64>,
    gyro_noise: Normal<f64>,
}

impl WaveformSynthesizer {
    pub fn new(config: SynthesizerConfig, classifier: AnomalyClassifier) -> StreamResult<Self> {
        config.validate()?;
        Self::build(config, classifier)
    }

    /// Like [`WaveformSynthesizer::new`] without range validation. The
    /// noise distributions still have to be constructible.
    pub(crate) fn build(config: SynthesizerConfig, classifier: AnomalyClassifier) -> StreamResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let imu = &config.imu;

        Ok(Self {
            ecg_noise: normal(config.ecg_noise_std, "ecg_noise_std")?,
            lateral_noise: normal(imu.lateral_accel_std, "imu.lateral_accel_std")?,
            vertical_noise: normal(imu.vertical_accel_std, "imu.vertical_accel_std")?,
            gyro_noise: normal(imu.gyro_noise_std, "imu.gyro_noise_std")?,
            config,
            classifier,
            rng,
        })
    }

    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Heart rate driving the beat period at elapsed time `t`.
    pub fn heart_rate_at(&self, t: f64) -> f64 {
        match self.config.heart_rate_modulation {
            Some(m) => self.config.base_bpm + m.amplitude_bpm * (m.angular_freq * t).sin(),
            None => self.config.base_bpm,
        }
    }

    pub fn ecg_sample(&mut self, t: f64) -> StreamResult<EcgReading> {
        let clean = ecg::clean_ecg(t, self.heart_rate_at(t));
        let noise = self.ecg_noise.sample(&mut self.rng);
        let value = finite(clean + noise, "ecg", t)?;

        Ok(EcgReading {
            value,
            noise,
            status: self.classifier.ecg_status(noise),
        })
    }

    pub fn imu_sample(&mut self, t: f64, phase: ExercisePhase) -> StreamResult<ImuReading> {
        let imu = &self.config.imu;
        let angle = imu::knee_angle(t, phase, imu);
        let angular_velocity = imu::knee_angular_velocity(t, phase, imu);
        let gravity = imu.gravity;

        let accel_y = self.lateral_noise.sample(&mut self.rng);
        let accel_z = gravity + self.vertical_noise.sample(&mut self.rng);
        let gyro_y = self.gyro_noise.sample(&mut self.rng);
        let gyro_z = self.gyro_noise.sample(&mut self.rng);

        Ok(ImuReading {
            accel_x: finite(angle, "accel_x", t)?,
            accel_y: finite(accel_y, "accel_y", t)?,
            accel_z: finite(accel_z, "accel_z", t)?,
            gyro_x: finite(angular_velocity, "gyro_x", t)?,
            gyro_y: finite(gyro_y, "gyro_y", t)?,
            gyro_z: finite(gyro_z, "gyro_z", t)?,
            status: self.classifier.imu_status(accel_y, gyro_y),
        })
    }

    /// One complete sample at elapsed time `t` seconds.
    pub fn sample(&mut self, t: f64, phase: ExercisePhase, timestamp: String) -> StreamResult<Sample> {
        let ecg = self.ecg_sample(t)?;
        let imu = self.imu_sample(t, phase)?;

        Ok(Sample {
            timestamp,
            ecg: ecg.value,
            accel_x: imu.accel_x,
            accel_y: imu.accel_y,
            accel_z: imu.accel_z,
            gyro_x: imu.gyro_x,
            gyro_y: imu.gyro_y,
            gyro_z: imu.gyro_z,
            status_ecg: ecg.status,
            status_imu: imu.status,
        })
    }
}

fn normal(std_dev: f64, name: &str) -> StreamResult<Normal<f64>> {
    Normal::new(0.0, std_dev)
        .map_err(|e| StreamError::InvalidConfig(format!("{name}: {e}")))
}

fn finite(value: f64, channel: &'static str, t: f64) -> StreamResult<f64> {
    R64::try_new(value)
        .map(R64::raw)
        .ok_or(StreamError::SynthesisFailure { channel, t })
}
