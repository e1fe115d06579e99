use crate::analysis::recording::WaveformRecording;
use crate::simulator::ecg;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const DEMO_SAMPLING_HZ: f64 = 200.0;
pub const DEMO_DURATION_SECS: f64 = 10.0;
const DEMO_NOISE_STD: f64 = 0.01;

/// Canned recordings for the offline heart-rate view. Not used by the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemoProfile {
    Normal,
    Stress,
}

impl DemoProfile {
    pub fn base_bpm(&self) -> f64 {
        match self {
            DemoProfile::Normal => 75.0,
            DemoProfile::Stress => 105.0,
        }
    }

    /// Amplitude and frequency (Hz) of the superimposed high-frequency component.
    fn high_frequency(&self) -> Option<(f64, f64)> {
        match self {
            DemoProfile::Normal => None,
            DemoProfile::Stress => Some((0.08, 7.0)),
        }
    }
}

/// Ten seconds of PQRST waveform at 200 Hz for the given profile.
pub fn demo_recording(profile: DemoProfile, seed: u64) -> WaveformRecording {
    let samples = (DEMO_SAMPLING_HZ * DEMO_DURATION_SECS) as usize;
    let time: Vec<f64> = (0..samples).map(|i| i as f64 / DEMO_SAMPLING_HZ).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, DEMO_NOISE_STD).ok();
    let bpm = profile.base_bpm();
    let high_frequency = profile.high_frequency();

    WaveformRecording::from_fn(time, |t| {
        let mut value = ecg::clean_ecg(t, bpm);
        if let Some((amplitude, frequency)) = high_frequency {
            value += amplitude * (2.0 * PI * frequency * t).sin();
        }
        if let Some(noise) = &noise {
            value += noise.sample(&mut rng);
        }
        value
    })
}
