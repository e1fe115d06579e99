use crate::error::StreamResult;
use crate::sample::{Sample, Window};
use slog::{info, o, Logger};
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod csv_file;
mod ringbuffer;

pub use csv_file::CsvTransport;
use ringbuffer::SliceableRingBuffer;

type SharedWindow = Arc<RwLock<SliceableRingBuffer<Sample>>>;

/// Create the bounded transport shared by one writer and any number of readers.
///
/// `sink` optionally mirrors every append into a flat file for
/// out-of-process consumers.
pub fn channel(capacity: usize, sink: Option<CsvTransport>, logger: &Logger) -> (StreamWriter, StreamReader) {
    let capacity = capacity.max(1);
    let shared: SharedWindow = Arc::new(RwLock::new(SliceableRingBuffer::new(capacity, Sample::default())));
    let writer = StreamWriter {
        shared: shared.clone(),
        sink,
        capacity,
        appended: 0,
        logger: logger.new(o!("role" => "writer")),
    };
    let reader = StreamReader { shared, capacity };
    (writer, reader)
}

/// The only handle allowed to modify the window. Not `Clone`.
pub struct StreamWriter {
    shared: SharedWindow,
    sink: Option<CsvTransport>,
    capacity: usize,
    appended: u64,
    logger: Logger,
}

impl StreamWriter {
    /// Empty the window and (re)create the file sink with its header.
    pub async fn initialize(&mut self) -> StreamResult<()> {
        if let Some(sink) = self.sink.clone() {
            tokio::task::spawn_blocking(move || sink.initialize()).await??;
        }
        self.shared.write().await.clear();
        self.appended = 0;

        info!(self.logger, "Transport initialized";
            "capacity" => self.capacity,
            "sink" => self.sink.as_ref().map(|s| s.path().display().to_string()).unwrap_or_else(|| "memory".into()));
        Ok(())
    }

    /// Append one sample, evicting the oldest once the window is full.
    ///
    /// The file sink is written first; if it fails the in-memory window is
    /// left untouched and the error is returned.
    pub async fn append(&mut self, sample: Sample) -> StreamResult<()> {
        if let Some(sink) = self.sink.clone() {
            let mirrored = sample.clone();
            tokio::task::spawn_blocking(move || sink.append(&mirrored)).await??;
        }
        self.shared.write().await.write(sample);
        self.appended += 1;
        Ok(())
    }

    pub fn reader(&self) -> StreamReader {
        StreamReader {
            shared: self.shared.clone(),
            capacity: self.capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples appended since the last `initialize`.
    pub fn appended(&self) -> u64 {
        self.appended
    }
}

#[derive(Clone)]
pub struct StreamReader {
    shared: SharedWindow,
    capacity: usize,
}

impl StreamReader {
    /// Copy out the current window, oldest first. Never blocks on the
    /// writer for longer than one append.
    pub async fn read_window(&self) -> Window {
        let buffer = self.shared.read().await;
        if buffer.is_empty() {
            return Window::empty();
        }
        let mut samples = Vec::with_capacity(buffer.len());
        samples.extend_from_slice(buffer.get_slice());
        Window::new(samples)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
