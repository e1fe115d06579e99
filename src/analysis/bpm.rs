use crate::analysis::filter::highpass_filter;
use crate::analysis::recording::WaveformRecording;
use crate::config::PeakDetectionConfig;
use crate::error::StreamResult;
use find_peaks::PeakFinder;
use ndarray::{Array1, ArrayView1};

/// Receives intermediate signals of an estimation run: the signal, a stage
/// name and, for the peak stage, the accepted peak indices.
pub type Inspector = Box<dyn Fn(ArrayView1<f64>, &str, Option<&[usize]>) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BpmEstimate {
    /// Sample indices of the accepted R-peaks, ascending.
    pub peaks: Vec<usize>,
    /// Mean heart rate; 0.0 when fewer than two peaks were found.
    pub bpm: f64,
    /// Seconds between consecutive peaks.
    pub rr_intervals: Vec<f64>,
    /// 60 / RR for every interval.
    pub instantaneous_bpm: Vec<f64>,
}

impl BpmEstimate {
    /// `false` means "undetermined", not asystole.
    pub fn is_determined(&self) -> bool {
        self.bpm > 0.0
    }
}

pub struct PeakBasedBpmEstimator {
    pub params: PeakDetectionConfig,
    pub inspector: Option<Inspector>,
}

impl PeakBasedBpmEstimator {
    pub fn new(params: PeakDetectionConfig) -> Self {
        Self { params, inspector: None }
    }

    pub fn with_inspector<F>(mut self, inspector: F) -> Self
    where
        F: Fn(ArrayView1<f64>, &str, Option<&[usize]>) + Send + Sync + 'static,
    {
        self.inspector = Some(Box::new(inspector));
        self
    }

    /// Detect R-peaks in a full recording and convert the mean R-R interval
    /// to beats per minute.
    ///
    /// Finding no or a single peak is not an error: the estimate then has
    /// `bpm == 0.0`. Errors only come from an unusable high-pass setting.
    pub fn estimate(&self, recording: &WaveformRecording) -> StreamResult<BpmEstimate> {
        if recording.is_empty() {
            return Ok(BpmEstimate::default());
        }

        let signal = ArrayView1::from(recording.amplitude());
        self.inspect(signal, "raw", None);

        let mean = signal.mean().unwrap_or(0.0);
        let normalized = signal.mapv(|a| a - mean);
        self.inspect(normalized.view(), "normalized", None);

        let conditioned = match (self.params.highpass_cutoff_hz, recording.sampling_frequency()) {
            (Some(cutoff), Some(fs)) => {
                let filtered = highpass_filter(normalized.view(), cutoff, fs)?;
                self.inspect(filtered.view(), "filtered", None);
                filtered
            }
            _ => normalized,
        };

        let peaks = self.find_peaks(&conditioned);
        self.inspect(conditioned.view(), "peaks", Some(&peaks));

        let rr_intervals = rr_intervals(recording.time(), &peaks);
        let instantaneous_bpm = rr_intervals
            .iter()
            .filter(|&&rr| rr > 0.0)
            .map(|&rr| 60.0 / rr)
            .collect();

        Ok(BpmEstimate {
            bpm: bpm_from_rr(&rr_intervals),
            peaks,
            rr_intervals,
            instantaneous_bpm,
        })
    }

    fn find_peaks(&self, signal: &Array1<f64>) -> Vec<usize> {
        let samples = signal.to_vec();
        let found = PeakFinder::new(&samples)
            .with_min_prominence(self.params.min_prominence)
            .with_min_distance(self.params.min_distance)
            .find_peaks();

        let mut peaks: Vec<usize> = found.iter().map(|p| p.position.start).collect();
        peaks.sort_unstable();
        peaks
    }

    fn inspect(&self, signal: ArrayView1<f64>, stage: &str, peaks: Option<&[usize]>) {
        if let Some(f) = &self.inspector {
            f(signal, stage, peaks);
        }
    }
}

impl Default for PeakBasedBpmEstimator {
    fn default() -> Self {
        Self::new(PeakDetectionConfig::default())
    }
}

/// Time differences between consecutive peaks.
pub fn rr_intervals(time: &[f64], peaks: &[usize]) -> Vec<f64> {
    peaks
        .windows(2)
        .filter_map(|w| Some(time.get(w[1])? - time.get(w[0])?))
        .collect()
}

/// `60 / mean(rr)`, or 0.0 when there is no usable interval.
pub fn bpm_from_rr(rr_intervals: &[f64]) -> f64 {
    if rr_intervals.is_empty() {
        return 0.0;
    }
    let mean = rr_intervals.iter().sum::<f64>() / rr_intervals.len() as f64;
    if mean.is_finite() && mean > 0.0 {
        60.0 / mean
    } else {
        0.0
    }
}
