use std::f64::consts::PI;

/// One half-sine deflection of the heartbeat, placed on the normalized
/// cycle `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deflection {
    pub name: &'static str,
    pub start: f64,
    pub end: f64,
    pub amplitude: f64,
}

impl Deflection {
    const fn new(name: &'static str, start: f64, end: f64, amplitude: f64) -> Self {
        Self { name, start, end, amplitude }
    }

    pub fn contribution(&self, normalized_t: f64) -> f64 {
        if normalized_t < self.start || normalized_t >= self.end {
            return 0.0;
        }
        let phase = (normalized_t - self.start) / (self.end - self.start);
        self.amplitude * (PI * phase).sin()
    }
}

/// Stylized PQRST complex. The QRS complex spans 0.15..0.30 of the cycle
/// and is split 10% / 30% / 60% between Q, R and S.
pub const PQRST: [Deflection; 5] = [
    Deflection::new("P", 0.00, 0.12, 0.12),
    Deflection::new("Q", 0.15, 0.165, -0.05),
    Deflection::new("R", 0.165, 0.21, 1.0),
    Deflection::new("S", 0.21, 0.30, -0.1),
    Deflection::new("T", 0.40, 0.65, 0.25),
];

/// Position inside the current beat, in `[0, 1)`.
pub fn beat_phase(t: f64, bpm: f64) -> f64 {
    let beat_period = 60.0 / bpm;
    t.rem_euclid(beat_period) / beat_period
}

/// Noise-free ECG amplitude at a normalized cycle position. Zero on the
/// isoelectric segments between deflections.
pub fn pqrst(normalized_t: f64) -> f64 {
    PQRST.iter().map(|d| d.contribution(normalized_t)).sum()
}

pub fn clean_ecg(t: f64, bpm: f64) -> f64 {
    pqrst(beat_phase(t, bpm))
}

/// Normalized cycle position of the R-wave apex.
pub fn r_peak_phase() -> f64 {
    let r = PQRST[2];
    (r.start + r.end) / 2.0
}
