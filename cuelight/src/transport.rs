/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Outbound transport collaborator.
//!
//! The core only ever hands a finished text frame to a [`Transport`]; port
//! discovery, opening and inbound reading belong to the owner of the
//! transport.  Inbound bytes reach the scheduler through
//! [`SegmentScheduler::on_bytes_received`](crate::scheduler::SegmentScheduler::on_bytes_received).

use std::io::Write;

use thiserror::Error;
use tracing::debug;

use crate::protocol::CRLF;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport not open")]
    NotOpen,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport error: {0}")]
    Other(String),
}

/// Fire-and-forget frame sink.  `send` never waits for an acknowledgment.
pub trait Transport {
    fn is_open(&self) -> bool;

    /// Send one frame.  A missing CRLF terminator is appended.
    fn send(&mut self, frame: &str) -> Result<(), TransportError>;
}

fn terminated(frame: &str) -> String {
    if frame.ends_with(CRLF) {
        frame.to_string()
    } else {
        format!("{frame}{CRLF}")
    }
}

// ── MemoryTransport ───────────────────────────────────────────────────────────

/// Records every frame in memory.  Used for dry runs and tests.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    open: bool,
    sent: Vec<String>,
}

impl MemoryTransport {
    /// A new, open transport.
    pub fn new() -> Self {
        Self {
            open: true,
            sent: Vec::new(),
        }
    }

    pub fn closed() -> Self {
        Self {
            open: false,
            sent: Vec::new(),
        }
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    /// Frames sent so far, CRLF-terminated.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        self.sent.push(terminated(frame));
        Ok(())
    }
}

// ── WriterTransport ───────────────────────────────────────────────────────────

/// Writes frames to any byte sink, e.g. an already-configured serial device
/// file.
#[derive(Debug)]
pub struct WriterTransport<W: Write> {
    writer: Option<W>,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    /// Close the transport, returning the sink.
    pub fn close(&mut self) -> Option<W> {
        self.writer.take()
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::NotOpen)?;
        let payload = terminated(frame);
        writer.write_all(payload.as_bytes())?;
        writer.flush()?;
        debug!(bytes = payload.len(), "frame written");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
