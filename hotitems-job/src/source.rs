//! CSV ingestion of user-behavior events.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;
use tracing::{error, warn};

use crate::metrics::JobMetrics;
use crate::record::{RecordError, UserBehavior, csv_reader};

/// Lazily decodes `userId,itemId,categoryId,behavior,timestamp` records.
///
/// Fields follow RFC 4180 quoting and are trimmed. Blank lines are skipped.
/// Malformed records are logged with their line number, counted and
/// skipped. An I/O error ends the stream.
#[derive(Debug)]
pub struct BehaviorReader<R> {
    reader: csv::Reader<R>,
    record: StringRecord,
    metrics: JobMetrics,
}

impl<R: Read> BehaviorReader<R> {
    pub fn new(reader: R, metrics: JobMetrics) -> Self {
        Self {
            reader: csv_reader(reader),
            record: StringRecord::new(),
            metrics,
        }
    }

    fn line(&self) -> u64 {
        self.record.position().map_or(0, |pos| pos.line())
    }

    fn skip_record(&self, line: u64, err: &RecordError) {
        self.metrics.inc_malformed_records(1);
        warn!(line, %err, "skipping malformed record");
    }
}

impl<R: Read> Iterator for BehaviorReader<R> {
    type Item = UserBehavior;

    fn next(&mut self) -> Option<UserBehavior> {
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(false) => return None,
                Ok(true) => {}
                Err(err) if err.is_io_error() => {
                    let line = err.position().map_or(0, |pos| pos.line());
                    error!(line, %err, "failed to read input, stopping");
                    return None;
                }
                Err(err) => {
                    let line = err.position().map_or(0, |pos| pos.line());
                    self.skip_record(line, &RecordError::from(err));
                    continue;
                }
            }
            if self.record.iter().all(str::is_empty) {
                continue;
            }
            match UserBehavior::from_record(&self.record) {
                Ok(event) => return Some(event),
                Err(err) => self.skip_record(self.line(), &err),
            }
        }
    }
}

/// Read events from `reader`.
pub fn read_behaviors<R: Read>(reader: R, metrics: JobMetrics) -> BehaviorReader<R> {
    BehaviorReader::new(reader, metrics)
}

/// Open a CSV file of events. The csv reader buffers internally.
pub fn open_behaviors(path: impl AsRef<Path>, metrics: JobMetrics) -> Result<BehaviorReader<File>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening input {}", path.display()))?;
    Ok(read_behaviors(file, metrics))
}
