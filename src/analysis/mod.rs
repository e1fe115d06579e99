pub mod bpm;
pub mod classifier;
mod filter;
pub mod recording;

pub use bpm::{BpmEstimate, PeakBasedBpmEstimator};
pub use classifier::{AnomalyClassifier, Assessment, Classification, WindowStats};
pub use recording::WaveformRecording;
