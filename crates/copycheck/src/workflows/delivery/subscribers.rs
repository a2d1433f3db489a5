use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::workflows::analysis::{AnalysisReport, Criterion};

/// One row of the append-only subscriber log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriberRecord {
    pub email: String,
    pub recorded_at: DateTime<Utc>,
    pub average_score: f64,
    pub lowest_criterion: Option<Criterion>,
    pub lowest_score: Option<f64>,
}

impl SubscriberRecord {
    pub fn from_report(email: &str, report: &AnalysisReport, recorded_at: DateTime<Utc>) -> Self {
        let lowest = report.summary.lowest_three.first();
        Self {
            email: email.to_string(),
            recorded_at,
            average_score: report.summary.average_score,
            lowest_criterion: lowest.map(|low| low.criterion),
            lowest_score: lowest.map(|low| low.score),
        }
    }
}

/// Durable, append-only record of delivered reports. Never reads back.
pub trait SubscriberLog: Send + Sync {
    fn append(&self, record: &SubscriberRecord) -> Result<(), SubscriberLogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriberLogError {
    #[error("subscriber log unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("subscriber row could not be written: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV file log; the header is written only when the file is new or empty.
#[derive(Debug, Clone)]
pub struct CsvSubscriberLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl CsvSubscriberLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SubscriberLog for CsvSubscriberLog {
    fn append(&self, record: &SubscriberRecord) -> Result<(), SubscriberLogError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(email: &str) -> SubscriberRecord {
        SubscriberRecord {
            email: email.to_string(),
            recorded_at: Utc
                .with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
                .single()
                .expect("valid time"),
            average_score: 6.5,
            lowest_criterion: Some(Criterion::Action),
            lowest_score: Some(3.0),
        }
    }

    #[test]
    fn appends_rows_with_a_single_header() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log = CsvSubscriberLog::new(dir.path().join("subscribers.csv"));

        log.append(&record("a@example.com")).expect("first append");
        log.append(&record("b@example.com")).expect("second append");

        let contents = std::fs::read_to_string(log.path()).expect("log readable");
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "email,recorded_at,average_score,lowest_criterion,lowest_score",
                "a@example.com,2025-03-01T09:30:00Z,6.5,action,3.0",
                "b@example.com,2025-03-01T09:30:00Z,6.5,action,3.0",
            ]
        );
    }

    #[test]
    fn existing_rows_are_never_rewritten() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("subscribers.csv");
        std::fs::write(&path, "legacy,row\n").expect("seed file");

        CsvSubscriberLog::new(&path)
            .append(&record("c@example.com"))
            .expect("append");

        let contents = std::fs::read_to_string(&path).expect("log readable");
        assert!(contents.starts_with("legacy,row\nc@example.com,"));
    }
}
