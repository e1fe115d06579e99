//! Flat-file transport: a CSV file holding a header row followed by at most
//! K sample rows.
//!
//! Every append reads the whole file, keeps the most recent K-1 rows and
//! writes them back with the new row, so an append costs O(K). This is fine
//! for windows of a few hundred samples at tens of Hz and nothing beyond
//! that; the in-memory ring in [`super`] is the primary transport and this
//! file is a persistence/debug mirror for out-of-process readers.
//!
//! Rewrites go to a sibling `*.tmp` file that is renamed over the transport,
//! so readers observe either the previous or the next window, never a
//! half-written one.

use crate::error::{StreamError, StreamResult};
use crate::sample::{Sample, Window, STREAM_HEADER};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use slog::{debug, warn, Logger};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CsvTransport {
    path: PathBuf,
    capacity: usize,
}

impl CsvTransport {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create (or wipe) the transport so it holds only the header row.
    /// Must not run concurrently with `append`.
    pub fn initialize(&self) -> StreamResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.unavailable(e))?;
        }
        self.replace_with(&[], None)
    }

    /// Append one sample, truncating the file to the last K rows.
    ///
    /// Fails if the file is missing, unreadable, or holds a malformed row.
    /// Nothing is written in that case.
    pub fn append(&self, sample: &Sample) -> StreamResult<()> {
        let mut rows = self.read_rows()?;
        let keep = self.capacity - 1;
        if rows.len() > keep {
            rows.drain(..rows.len() - keep);
        }
        self.replace_with(&rows, Some(sample))
    }

    /// Tolerant read of the current window; see [`read_window`].
    pub fn read_window(&self, logger: &Logger) -> Window {
        read_window(&self.path, self.capacity, logger)
    }

    fn read_rows(&self) -> StreamResult<Vec<StringRecord>> {
        let file = File::open(&self.path).map_err(|e| self.unavailable(e))?;
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

        let headers = reader.headers()?.clone();
        if headers.iter().ne(STREAM_HEADER.iter().copied()) {
            return Err(self.corrupt(0, format!("unexpected header {:?}", headers)));
        }

        let mut rows = Vec::with_capacity(self.capacity);
        for (index, record) in reader.records().enumerate() {
            let row = index + 1;
            let record = record.map_err(|e| self.corrupt(row, e.to_string()))?;
            if record.len() != STREAM_HEADER.len() {
                return Err(self.corrupt(
                    row,
                    format!("expected {} columns, found {}", STREAM_HEADER.len(), record.len()),
                ));
            }
            record
                .deserialize::<Sample>(Some(&headers))
                .map_err(|e| self.corrupt(row, e.to_string()))?;
            rows.push(record);
        }
        Ok(rows)
    }

    fn replace_with(&self, rows: &[StringRecord], new_sample: Option<&Sample>) -> StreamResult<()> {
        let tmp_path = self.tmp_path();
        let file = File::create(&tmp_path).map_err(|e| self.unavailable(e))?;
        let mut writer = WriterBuilder::new().from_writer(file);

        writer.write_record(STREAM_HEADER)?;
        for row in rows {
            writer.write_record(row)?;
        }
        if let Some(sample) = new_sample {
            writer.write_record(sample.to_record())?;
        }
        writer.flush().map_err(|e| self.unavailable(e))?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.unavailable(e))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("stream"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn unavailable(&self, source: io::Error) -> StreamError {
        StreamError::TransportUnavailable {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, row: usize, reason: String) -> StreamError {
        StreamError::TransportCorrupt {
            path: self.path.clone(),
            row,
            reason,
        }
    }
}

/// Read up to the last `capacity` samples of a transport file.
///
/// A missing or unreadable file is "no data yet" and yields an empty window.
/// A malformed row ends the read: the well-formed rows before it are returned.
pub fn read_window(path: &Path, capacity: usize, logger: &Logger) -> Window {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                debug!(logger, "Transport not readable, returning empty window";
                    "path" => %path.display(), "error" => %e);
            }
            return Window::empty();
        }
    };

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let mut samples = VecDeque::with_capacity(capacity);
    for (index, result) in reader.deserialize::<Sample>().enumerate() {
        match result {
            Ok(sample) => {
                if samples.len() == capacity {
                    samples.pop_front();
                }
                samples.push_back(sample);
            }
            Err(e) => {
                warn!(logger, "Skipping malformed transport tail";
                    "path" => %path.display(), "row" => index + 1, "error" => %e);
                break;
            }
        }
    }

    Window::new(samples.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::silent_logger;
    use crate::sample::{EcgStatus, ImuStatus};
    use std::io::Write;
    use tempfile::tempdir;

    fn sample(i: usize) -> Sample {
        Sample {
            timestamp: format!("10:00:{:02}.{:03}", i / 50, (i % 50) * 20),
            ecg: i as f64 * 0.001,
            accel_x: 45.0,
            accel_y: 0.1,
            accel_z: 9.81,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
            status_ecg: EcgStatus::Normal,
            status_imu: ImuStatus::Normal,
        }
    }

    #[test]
    fn missing_file_reads_as_empty_window() {
        let dir = tempdir().unwrap();
        let window = read_window(&dir.path().join("absent.csv"), 10, &silent_logger());
        assert!(window.is_empty());
    }

    #[test]
    fn append_without_initialize_fails_loudly() {
        let dir = tempdir().unwrap();
        let transport = CsvTransport::new(dir.path().join("stream.csv"), 10);
        let result = transport.append(&sample(0));
        assert!(matches!(result, Err(StreamError::TransportUnavailable { .. })));
    }

    #[test]
    fn initialize_writes_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("stream.csv");
        let transport = CsvTransport::new(&path, 10);
        transport.initialize().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), STREAM_HEADER.join(","));
        assert!(transport.read_window(&silent_logger()).is_empty());
    }

    #[test]
    fn truncates_to_capacity() {
        let dir = tempdir().unwrap();
        let transport = CsvTransport::new(dir.path().join("stream.csv"), 5);
        transport.initialize().unwrap();
        for i in 0..12 {
            transport.append(&sample(i)).unwrap();
        }

        let window = transport.read_window(&silent_logger());
        assert_eq!(window.len(), 5);
        assert_eq!(window.first().unwrap().timestamp, sample(7).timestamp);
        assert_eq!(window.last().unwrap().timestamp, sample(11).timestamp);

        let lines = fs::read_to_string(transport.path()).unwrap().lines().count();
        assert_eq!(lines, 6);
    }

    #[test]
    fn writer_rejects_corrupt_transport() {
        let dir = tempdir().unwrap();
        let transport = CsvTransport::new(dir.path().join("stream.csv"), 5);
        transport.initialize().unwrap();
        transport.append(&sample(0)).unwrap();

        let mut file = fs::OpenOptions::new().append(true).open(transport.path()).unwrap();
        writeln!(file, "garbage,row").unwrap();

        let result = transport.append(&sample(1));
        assert!(matches!(result, Err(StreamError::TransportCorrupt { row: 2, .. })));
    }

    #[test]
    fn reader_keeps_well_formed_prefix() {
        let dir = tempdir().unwrap();
        let transport = CsvTransport::new(dir.path().join("stream.csv"), 5);
        transport.initialize().unwrap();
        for i in 0..3 {
            transport.append(&sample(i)).unwrap();
        }

        let mut file = fs::OpenOptions::new().append(true).open(transport.path()).unwrap();
        writeln!(file, "10:00:09.000,not-a-number").unwrap();

        let window = transport.read_window(&silent_logger());
        assert_eq!(window.len(), 3);
        assert_eq!(window.last().unwrap().timestamp, sample(2).timestamp);
    }
}
