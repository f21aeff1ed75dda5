//! Snapshot writer
//!
//! Saves the most recent camera frames together with a small text record of
//! the distance reading at the time of capture.

use crate::error::SnapshotError;
use crate::frame::Frame;
use crate::message::LogSinkHandle;
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Files produced by one capture
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Timestamp tag shared by every file of the capture
    pub timestamp: String,
    /// Written files; images first, the data record last
    pub files: Vec<PathBuf>,
}

/// Writes snapshots into a directory, creating it on first use
pub struct SnapshotWriter {
    directory: PathBuf,
    log: Option<LogSinkHandle>,
}

impl SnapshotWriter {
    /// Create a writer targeting `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            log: None,
        }
    }

    /// Report every saved file to `log`
    pub fn with_log(mut self, log: LogSinkHandle) -> Self {
        self.log = Some(log);
        self
    }

    /// Target directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Capture now
    pub fn capture(
        &self,
        rgb: Option<&Frame>,
        thermal: Option<&Frame>,
        distance_cm: f64,
    ) -> Result<Snapshot, SnapshotError> {
        self.capture_at(Local::now(), rgb, thermal, distance_cm)
    }

    /// Capture with an explicit timestamp
    pub fn capture_at(
        &self,
        at: DateTime<Local>,
        rgb: Option<&Frame>,
        thermal: Option<&Frame>,
        distance_cm: f64,
    ) -> Result<Snapshot, SnapshotError> {
        fs::create_dir_all(&self.directory)?;

        let timestamp = at.format("%Y%m%d_%H%M%S").to_string();
        let mut files = Vec::with_capacity(3);

        for (frame, suffix) in [(rgb, "rgb"), (thermal, "thermal")] {
            if let Some(frame) = frame {
                let path = self
                    .directory
                    .join(format!("snap_{}_{}.jpg", timestamp, suffix));
                frame.image.save(&path)?;
                self.report(&format!("Saved: {}", path.display()));
                files.push(path);
            }
        }

        let data_path = self.directory.join(format!("snap_{}_data.txt", timestamp));
        let mut file = fs::File::create(&data_path)?;
        writeln!(file, "Timestamp: {}", timestamp)?;
        writeln!(file, "Distance: {:?} cm", distance_cm)?;
        self.report("Snapshot Data Saved");
        files.push(data_path);

        tracing::info!("Snapshot {} written ({} files)", timestamp, files.len());
        Ok(Snapshot { timestamp, files })
    }

    fn report(&self, message: &str) {
        if let Some(log) = &self.log {
            log.log(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameKind;
    use crate::message::MessageLog;
    use chrono::TimeZone;
    use image::RgbImage;
    use std::sync::Arc;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 3, 14, 9, 26, 53)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_data_record_always_written() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().join("snapshots"));

        let snapshot = writer.capture_at(fixed_time(), None, None, 87.0).unwrap();

        assert_eq!(snapshot.timestamp, "20250314_092653");
        assert_eq!(snapshot.files.len(), 1);
        let content = fs::read_to_string(&snapshot.files[0]).unwrap();
        assert_eq!(content, "Timestamp: 20250314_092653\nDistance: 87.0 cm\n");
    }

    #[test]
    fn test_frames_saved_as_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(MessageLog::default());
        let writer = SnapshotWriter::new(dir.path()).with_log(log.clone());

        let rgb = Frame::new(FrameKind::Rgb, RgbImage::new(8, 8));
        let thermal = Frame::new(FrameKind::Thermal, RgbImage::new(8, 8));
        let snapshot = writer
            .capture_at(fixed_time(), Some(&rgb), Some(&thermal), 12.5)
            .unwrap();

        let names: Vec<String> = snapshot
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "snap_20250314_092653_rgb.jpg",
                "snap_20250314_092653_thermal.jpg",
                "snap_20250314_092653_data.txt",
            ]
        );
        assert!(snapshot.files.iter().all(|p| p.exists()));
        assert_eq!(log.len(), 3);
    }
}
