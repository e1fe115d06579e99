use crate::analysis::classifier::AnomalyClassifier;
use crate::config::PipelineConfig;
use crate::error::StreamResult;
use crate::sample::ExercisePhase;
use crate::simulator::WaveformSynthesizer;
use crate::storage::StreamWriter;
use slog::{debug, error, info, o, Logger};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    Init,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerReport {
    pub samples_produced: u64,
}

/// Local wall-clock time with millisecond precision, e.g. `14:03:07.250`.
pub fn wall_clock_timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Synthesizes one sample per period and appends it to the transport until
/// stopped. Any synthesis or transport error ends the loop.
pub struct ProducerLoop {
    config: PipelineConfig,
    synthesizer: WaveformSynthesizer,
    writer: StreamWriter,
    logger: Logger,
}

impl ProducerLoop {
    pub fn new(config: PipelineConfig, writer: StreamWriter, logger: &Logger) -> StreamResult<Self> {
        config.validate()?;
        let classifier = AnomalyClassifier::new(config.thresholds);
        let synthesizer = WaveformSynthesizer::new(config.synthesizer.clone(), classifier)?;
        Ok(Self {
            config,
            synthesizer,
            writer,
            logger: logger.new(o!("task" => "producer")),
        })
    }

    /// Run on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use [`ProducerLoop::spawn_on`]
    /// with a handle from `Handle::try_current` to get an error instead.
    pub fn spawn(self) -> ProducerHandle {
        self.spawn_on(&Handle::current())
    }

    pub fn spawn_on(self, runtime: &Handle) -> ProducerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ProducerState::Init);
        let task = runtime.spawn(self.run(stop_rx, state_tx));
        ProducerHandle {
            stop: stop_tx,
            state: state_rx,
            task,
        }
    }

    /// Drive the loop until `stop` turns true (or its sender is dropped) or
    /// an error occurs. `state` ends in `Stopped` either way.
    pub async fn run(
        mut self,
        mut stop: watch::Receiver<bool>,
        state: watch::Sender<ProducerState>,
    ) -> StreamResult<ProducerReport> {
        let result = self.produce(&mut stop, &state).await;
        state.send_replace(ProducerState::Stopped);

        match &result {
            Ok(report) => info!(self.logger, "Producer stopped"; "samples" => report.samples_produced),
            Err(e) => error!(self.logger, "Producer failed, stream halted"; "error" => %e),
        }
        result
    }

    async fn produce(
        &mut self,
        stop: &mut watch::Receiver<bool>,
        state: &watch::Sender<ProducerState>,
    ) -> StreamResult<ProducerReport> {
        self.writer.initialize().await?;
        state.send_replace(ProducerState::Running);

        let period = self.config.sample_period();
        let phase_period = self.config.synthesizer.phase_period_samples;
        let progress_every = self.config.progress_log_every;
        info!(self.logger, "Producer started";
            "rate_hz" => 1.0 / self.config.sample_period_secs,
            "capacity" => self.writer.capacity());

        let started = Instant::now();
        let mut produced: u64 = 0;
        while !*stop.borrow() {
            let t = started.elapsed().as_secs_f64();
            let phase = ExercisePhase::for_sample(produced, phase_period);
            let sample = self.synthesizer.sample(t, phase, wall_clock_timestamp())?;
            let ecg = sample.ecg;

            self.writer.append(sample).await?;
            produced += 1;

            if progress_every > 0 && produced % progress_every == 0 {
                debug!(self.logger, "Streaming";
                    "t" => format!("{t:.2}"), "ecg" => format!("{ecg:.3}"), "phase" => ?phase, "samples" => produced);
            }

            tokio::select! {
                _ = sleep(period) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        Ok(ProducerReport {
            samples_produced: produced,
        })
    }
}

/// Owner-side handle of a spawned [`ProducerLoop`]. Dropping it also stops
/// the loop.
pub struct ProducerHandle {
    stop: watch::Sender<bool>,
    state: watch::Receiver<ProducerState>,
    task: JoinHandle<StreamResult<ProducerReport>>,
}

impl ProducerHandle {
    pub fn state(&self) -> ProducerState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn state_changes(&self) -> watch::Receiver<ProducerState> {
        self.state.clone()
    }

    /// Request a stop and wait for the loop to finish. Returns the loop's
    /// error if it had already failed.
    pub async fn stop(self) -> StreamResult<ProducerReport> {
        let _ = self.stop.send(true);
        self.task.await?
    }

    /// Wait for the loop to end on its own (it only does so on error).
    pub async fn join(self) -> StreamResult<ProducerReport> {
        self.task.await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImuConfig;
    use crate::error::StreamError;
    use crate::log::silent_logger;
    use crate::storage;
    use std::time::Duration;

    fn fast_config() -> PipelineConfig {
        let mut config = PipelineConfig {
            sample_period_secs: 0.001,
            window_capacity: 10,
            ..Default::default()
        };
        config.synthesizer.seed = Some(5);
        config
    }

    #[tokio::test]
    async fn synthesis_failure_stops_without_writing() {
        let config = fast_config();
        let (writer, reader) = storage::channel(config.window_capacity, None, &silent_logger());

        let mut overflowing = config.synthesizer.clone();
        overflowing.imu = ImuConfig {
            extension_amplitude: 1e308,
            flexion_amplitude: 1e308,
            ..Default::default()
        };
        let classifier = AnomalyClassifier::new(config.thresholds);
        let producer = ProducerLoop {
            synthesizer: WaveformSynthesizer::build(overflowing, classifier).unwrap(),
            config,
            writer,
            logger: silent_logger(),
        };

        let handle = producer.spawn();
        let mut states = handle.state_changes();
        let result = handle.join().await;

        assert!(matches!(result, Err(StreamError::SynthesisFailure { channel: "gyro_x", .. })));
        assert_eq!(*states.borrow_and_update(), ProducerState::Stopped);
        assert!(reader.read_window().await.is_empty());
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_loop() {
        let config = fast_config();
        let (writer, reader) = storage::channel(config.window_capacity, None, &silent_logger());
        let handle = ProducerLoop::new(config, writer, &silent_logger()).unwrap().spawn();
        let mut states = handle.state_changes();

        states
            .wait_for(|s| *s == ProducerState::Running)
            .await
            .unwrap();
        drop(handle);

        tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == ProducerState::Stopped))
            .await
            .expect("loop kept running after its handle was dropped")
            .unwrap();

        let settled = reader.read_window().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(reader.read_window().await, settled);
    }

    #[test]
    fn spawn_on_runs_on_an_explicit_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let config = fast_config();
        let (writer, reader) = storage::channel(config.window_capacity, None, &silent_logger());
        let handle = ProducerLoop::new(config, writer, &silent_logger())
            .unwrap()
            .spawn_on(runtime.handle());

        let report = runtime.block_on(async move {
            while reader.read_window().await.len() < 3 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            handle.stop().await
        });
        assert!(report.unwrap().samples_produced >= 3);
    }
}
