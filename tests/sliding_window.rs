use rehabcore::log::silent_logger;
use rehabcore::storage::{self, csv_file, CsvTransport};
use rehabcore::{EcgStatus, ImuStatus, Sample};
use tempfile::tempdir;

fn sample(i: usize) -> Sample {
    Sample {
        timestamp: format!("09:{:02}:{:02}.{:03}", i / 3000, (i / 50) % 60, (i % 50) * 20),
        ecg: (i as f64 * 0.37).sin(),
        accel_x: 45.0 + (i % 10) as f64,
        accel_y: 0.2,
        accel_z: 9.81,
        gyro_x: 1.5,
        gyro_y: -0.3,
        gyro_z: 0.1,
        status_ecg: if i % 97 == 0 { EcgStatus::RedFlagArrhythmia } else { EcgStatus::Normal },
        status_imu: ImuStatus::Normal,
    }
}

#[tokio::test]
async fn memory_window_keeps_last_250_of_260() {
    let (mut writer, reader) = storage::channel(250, None, &silent_logger());
    writer.initialize().await.unwrap();

    for i in 0..260 {
        writer.append(sample(i)).await.unwrap();
        let expected = (i + 1).min(250);
        assert_eq!(reader.read_window().await.len(), expected);
    }

    let window = reader.read_window().await;
    assert_eq!(window.len(), 250);
    assert_eq!(window.first().unwrap().timestamp, sample(10).timestamp);
    assert_eq!(window.last().unwrap().timestamp, sample(259).timestamp);
}

#[tokio::test]
async fn file_sink_mirrors_the_memory_window() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sensor_data_stream.csv");
    let (mut writer, reader) = storage::channel(250, Some(CsvTransport::new(&path, 250)), &silent_logger());
    writer.initialize().await.unwrap();

    for i in 0..260 {
        writer.append(sample(i)).await.unwrap();
    }

    let from_file = csv_file::read_window(&path, 250, &silent_logger());
    let from_memory = reader.read_window().await;
    assert_eq!(from_file.len(), 250);
    assert_eq!(from_file.first().unwrap().timestamp, sample(10).timestamp);

    let file_stamps: Vec<_> = from_file.iter().map(|s| s.timestamp.clone()).collect();
    let memory_stamps: Vec<_> = from_memory.iter().map(|s| s.timestamp.clone()).collect();
    assert_eq!(file_stamps, memory_stamps);

    for (f, m) in from_file.iter().zip(from_memory.iter()) {
        assert!((f.ecg - m.ecg).abs() <= 5e-5);
        assert_eq!(f.status_ecg, m.status_ecg);
    }
}

#[test]
fn short_stream_reads_back_every_sample() {
    let dir = tempdir().unwrap();
    let transport = CsvTransport::new(dir.path().join("stream.csv"), 250);
    transport.initialize().unwrap();
    for i in 0..40 {
        transport.append(&sample(i)).unwrap();
    }

    let window = transport.read_window(&silent_logger());
    assert_eq!(window.len(), 40);
    assert_eq!(window.first().unwrap().timestamp, sample(0).timestamp);
    assert_eq!(window, transport.read_window(&silent_logger()));
}

#[test]
fn reader_tolerates_a_transport_that_does_not_exist_yet() {
    let dir = tempdir().unwrap();
    let window = csv_file::read_window(&dir.path().join("sensor_data_stream.csv"), 250, &silent_logger());
    assert!(window.is_empty());
}
