use crate::config::ImuConfig;
use crate::sample::ExercisePhase;
use std::f64::consts::PI;

pub const ANGLE_RANGE: (f64, f64) = (0.0, 100.0);

fn center_and_amplitude(phase: ExercisePhase, config: &ImuConfig) -> (f64, f64) {
    match phase {
        ExercisePhase::Extension => (config.extension_center, config.extension_amplitude),
        ExercisePhase::Flexion => (config.flexion_center, config.flexion_amplitude),
    }
}

/// Knee angle in degrees, clamped to `ANGLE_RANGE`.
pub fn knee_angle(t: f64, phase: ExercisePhase, config: &ImuConfig) -> f64 {
    let (center, amplitude) = center_and_amplitude(phase, config);
    let angle = center + amplitude * (2.0 * PI * config.movement_freq_hz * t).sin();
    angle.clamp(ANGLE_RANGE.0, ANGLE_RANGE.1)
}

/// Angular velocity of the unclamped knee angle, in degrees per second.
pub fn knee_angular_velocity(t: f64, phase: ExercisePhase, config: &ImuConfig) -> f64 {
    let (_, amplitude) = center_and_amplitude(phase, config);
    let omega = 2.0 * PI * config.movement_freq_hz;
    amplitude * omega * (omega * t).cos()
}
