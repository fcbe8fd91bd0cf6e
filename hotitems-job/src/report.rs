//! Ranking reports and the sinks that receive them.

use std::fmt;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use hotitems_core::types::EventTime;
use serde::{Deserialize, Serialize};

const RULE: &str = "====================================";

/// One line of a ranking, `rank` starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedItem {
    pub rank: usize,
    pub item_id: i64,
    pub view_count: u64,
}

/// Top items of one closed window, most viewed first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingReport {
    pub window_end: EventTime,
    pub entries: Vec<RankedItem>,
}

impl RankingReport {
    /// Last millisecond covered by the window.
    pub fn closed_at(&self) -> EventTime {
        self.window_end - 1
    }

    /// `closed_at` as `YYYY-MM-DD HH:MM:SS.mmm` in UTC.
    pub fn closed_at_display(&self) -> String {
        match DateTime::<Utc>::from_timestamp_millis(self.closed_at()) {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            None => format!("{}ms", self.closed_at()),
        }
    }
}

impl fmt::Display for RankingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Time: {}", self.closed_at_display())?;
        for entry in &self.entries {
            writeln!(
                f,
                "No{}:  ItemID={}  Views={}",
                entry.rank, entry.item_id, entry.view_count
            )?;
        }
        writeln!(f, "{RULE}")
    }
}

/// Consumer of ranking reports.
pub trait ReportSink {
    fn emit(&mut self, report: &RankingReport) -> Result<()>;
}

/// Writes each report as text followed by a blank line.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn emit(&mut self, report: &RankingReport) -> Result<()> {
        writeln!(self.writer, "{report}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps reports in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    reports: Vec<RankingReport>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[RankingReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<RankingReport> {
        self.reports
    }
}

impl ReportSink for CollectSink {
    fn emit(&mut self, report: &RankingReport) -> Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}
