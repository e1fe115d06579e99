//! Consumer side: polls the transport on its own timer and classifies
//! whatever window is current.
//!
//! There is no push channel and no backlog. A slow poller only ever sees
//! the latest K samples; a fast one may see the same window twice.

use crate::analysis::classifier::{AnomalyClassifier, Assessment, WindowStats};
use crate::sample::Window;
use crate::storage::{csv_file, StreamReader};
use futures::{Stream, StreamExt};
use slog::Logger;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub assessment: Assessment,
    pub stats: Option<WindowStats>,
    /// Timestamp of the newest sample in the window.
    pub latest: Option<String>,
}

impl WindowReport {
    pub fn window_len(&self) -> usize {
        self.stats.as_ref().map_or(0, |s| s.samples)
    }
}

pub fn assess(window: &Window, classifier: &AnomalyClassifier) -> WindowReport {
    WindowReport {
        assessment: classifier.classify(window),
        stats: classifier.statistics(window),
        latest: window.last().map(|s| s.timestamp.clone()),
    }
}

/// One report per `period`, read from the in-process transport.
pub fn watch(reader: StreamReader, classifier: AnomalyClassifier, period: Duration) -> impl Stream<Item = WindowReport> {
    ticks(period).then(move |_| {
        let reader = reader.clone();
        async move {
            let window = reader.read_window().await;
            assess(&window, &classifier)
        }
    })
}

/// One report per `period`, read from a flat-file transport written by
/// another process. A missing file reports as insufficient data.
pub fn watch_file(
    path: PathBuf,
    capacity: usize,
    classifier: AnomalyClassifier,
    period: Duration,
    logger: Logger,
) -> impl Stream<Item = WindowReport> {
    ticks(period).then(move |_| {
        let path = path.clone();
        let logger = logger.clone();
        async move {
            let window = tokio::task::spawn_blocking(move || csv_file::read_window(&path, capacity, &logger))
                .await
                .unwrap_or_default();
            assess(&window, &classifier)
        }
    })
}

fn ticks(period: Duration) -> IntervalStream {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    IntervalStream::new(ticker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::silent_logger;
    use crate::sample::{EcgStatus, Sample};
    use crate::storage;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reports_follow_the_window() {
        let (mut writer, reader) = storage::channel(10, None, &silent_logger());
        writer.initialize().await.unwrap();

        let mut reports = Box::pin(watch(reader, AnomalyClassifier::default(), Duration::from_millis(5)));
        let first = reports.next().await.unwrap();
        assert_eq!(first.assessment, Assessment::InsufficientData { samples: 0 });
        assert_eq!(first.window_len(), 0);

        for i in 0..3 {
            writer
                .append(Sample {
                    timestamp: format!("t{i}"),
                    status_ecg: if i == 1 { EcgStatus::RedFlagArrhythmia } else { EcgStatus::Normal },
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let report = reports.next().await.unwrap();
        assert_eq!(report.window_len(), 3);
        assert_eq!(report.latest.as_deref(), Some("t2"));
        assert!(report.assessment.classification().unwrap().has_arrhythmia());
    }

    #[tokio::test]
    async fn missing_file_reports_insufficient_data() {
        let dir = tempdir().unwrap();
        let mut reports = Box::pin(watch_file(
            dir.path().join("absent.csv"),
            50,
            AnomalyClassifier::default(),
            Duration::from_millis(5),
            silent_logger(),
        ));
        let report = reports.next().await.unwrap();
        assert_eq!(report.assessment, Assessment::InsufficientData { samples: 0 });
        assert!(report.latest.is_none());
    }
}
