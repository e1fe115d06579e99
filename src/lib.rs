//! Physiological-signal streaming core: synthesizes ECG and knee-IMU
//! samples at a fixed cadence, keeps the most recent K of them in a bounded
//! window shared with consumers, classifies anomaly flags over that window
//! and estimates heart rate from R-peaks in offline recordings.

use futures::Stream;
use slog::{o, Logger};
use std::time::Duration;

pub mod analysis;
pub mod config;
pub mod error;
pub mod log;
pub mod monitor;
pub mod producer;
pub mod sample;
pub mod simulator;
pub mod storage;

pub use analysis::{AnomalyClassifier, Assessment, BpmEstimate, PeakBasedBpmEstimator, WaveformRecording};
pub use config::PipelineConfig;
pub use error::{StreamError, StreamResult};
pub use monitor::WindowReport;
pub use producer::{ProducerHandle, ProducerLoop, ProducerReport, ProducerState};
pub use sample::{EcgStatus, ExercisePhase, ImuStatus, Sample, Window};
pub use storage::{CsvTransport, StreamReader, StreamWriter};

/// A running producer together with the reader side of its transport.
pub struct StreamPipeline {
    config: PipelineConfig,
    reader: StreamReader,
    classifier: AnomalyClassifier,
    producer: ProducerHandle,
}

impl StreamPipeline {
    /// Validate `config`, create the transport and spawn the producer on the
    /// current tokio runtime. Fails with [`StreamError::NoRuntime`] when
    /// called outside one.
    pub fn start(config: PipelineConfig, logger: &Logger) -> StreamResult<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()?;
        let logger = logger.new(o!("pipeline" => "sensor-stream"));

        let sink = config
            .stream_file
            .as_ref()
            .map(|path| CsvTransport::new(path, config.window_capacity));
        let (writer, reader) = storage::channel(config.window_capacity, sink, &logger);
        let producer = ProducerLoop::new(config.clone(), writer, &logger)?.spawn_on(&runtime);

        Ok(Self {
            classifier: AnomalyClassifier::new(config.thresholds),
            config,
            reader,
            producer,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reader(&self) -> StreamReader {
        self.reader.clone()
    }

    pub fn classifier(&self) -> AnomalyClassifier {
        self.classifier
    }

    pub fn state(&self) -> ProducerState {
        self.producer.state()
    }

    pub fn state_changes(&self) -> tokio::sync::watch::Receiver<ProducerState> {
        self.producer.state_changes()
    }

    pub async fn read_window(&self) -> Window {
        self.reader.read_window().await
    }

    pub async fn assess(&self) -> WindowReport {
        monitor::assess(&self.reader.read_window().await, &self.classifier)
    }

    /// Poll the window every `period`.
    pub fn reports(&self, period: Duration) -> impl Stream<Item = WindowReport> {
        monitor::watch(self.reader.clone(), self.classifier, period)
    }

    /// Stop the producer and wait for it to finish.
    pub async fn stop(self) -> StreamResult<ProducerReport> {
        self.producer.stop().await
    }
}
