/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-run structured log.
//!
//! Every frame crossing the transport is rendered as
//! `[device_ms][TX|RX][KIND][segment][payload]`, where `device_ms` is the
//! projected device clock (`-1` before the first progress report) and
//! `segment` is the 0-based segment index (`-1` when none applies).
//!
//! Lines go to one file per run, `<yyyyMMdd_HHmmss_mmm>.log`.  If the file
//! cannot be created or written, the log falls back to event-only delivery.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::protocol::FrameKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Tx,
    Rx,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Tx => "TX",
            Direction::Rx => "RX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Work,
    Config,
    Test,
    Error,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Work => "WORK",
            LogKind::Config => "CONFIG",
            LogKind::Test => "TEST",
            LogKind::Error => "ERROR",
        }
    }
}

/// Configuration and test frames keep their own tag; everything else on the
/// line, progress reports included, is run traffic.
impl From<FrameKind> for LogKind {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::Config => LogKind::Config,
            FrameKind::Test => LogKind::Test,
            FrameKind::Work | FrameKind::Progress | FrameKind::Unknown => LogKind::Work,
        }
    }
}

pub fn format_log_line(
    device_ms: i64,
    direction: Direction,
    kind: LogKind,
    segment: Option<usize>,
    payload: &str,
) -> String {
    let segment = segment.map_or(-1, |s| s as i64);
    format!(
        "[{}][{}][{}][{}][{}]",
        device_ms,
        direction.as_str(),
        kind.as_str(),
        segment,
        payload.trim()
    )
}

/// File name for a run started at `at`.
pub fn log_file_name(at: DateTime<Local>) -> String {
    format!("{}.log", at.format("%Y%m%d_%H%M%S_%3f"))
}

/// File sink of the run log.  A disabled log drops lines silently.
#[derive(Debug, Default)]
pub struct RunLog {
    sink: Option<(PathBuf, BufWriter<File>)>,
}

impl RunLog {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Create `dir` if needed and open a fresh log file in it.
    pub fn create(dir: &Path, at: DateTime<Local>) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(log_file_name(at));
        let file = File::create(&path)?;
        Ok(Self {
            sink: Some((path, BufWriter::new(file))),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|(p, _)| p.as_path())
    }

    /// Append one line and flush.  On error the log disables itself and the
    /// error is returned once.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let Some((_, writer)) = self.sink.as_mut() else {
            return Ok(());
        };
        let result = writeln!(writer, "{line}").and_then(|_| writer.flush());
        if result.is_err() {
            self.sink = None;
        }
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
