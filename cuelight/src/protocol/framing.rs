/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Inbound line framing.
//!
//! [`LineBuffer`] accumulates raw bytes from the transport and yields one
//! frame per `\n`.  A preceding `\r` is stripped along with surrounding
//! whitespace, and empty lines are dropped.

/// Longest partial line kept before the buffer is discarded.
pub const MAX_PENDING_BYTES: usize = 8192;

/// Output of [`LineBuffer::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framed {
    /// One complete, trimmed, non-empty line.
    Line(String),
    /// The pending partial line grew past [`MAX_PENDING_BYTES`] and was
    /// thrown away.
    Overflow { discarded: usize },
}

#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Feed bytes; returns the lines completed by this chunk.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Framed> {
        let mut out = Vec::new();
        self.buffer.extend_from_slice(bytes);

        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let text = String::from_utf8_lossy(&line);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(Framed::Line(trimmed.to_string()));
            }
        }

        if self.buffer.len() > MAX_PENDING_BYTES {
            out.push(Framed::Overflow {
                discarded: self.buffer.len(),
            });
            self.buffer.clear();
        }
        out
    }

    /// Bytes waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> Framed {
        Framed::Line(s.to_string())
    }

    #[test]
    fn crlf_and_lf_both_terminate() {
        let mut buf = LineBuffer::new();
        let out = buf.push(b"SETPRUN:1,100\r\nSETPRUN:2,200\n");
        assert_eq!(out, vec![line("SETPRUN:1,100"), line("SETPRUN:2,200")]);
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn split_line_is_joined_across_pushes() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"SETP").is_empty());
        assert_eq!(buf.pending(), 4);
        assert_eq!(buf.push(b"RUN:3,9\r\n"), vec![line("SETPRUN:3,9")]);
    }

    #[test]
    fn blank_lines_are_dropped() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"\r\n  \n").is_empty());
    }

    #[test]
    fn oversize_partial_line_is_discarded() {
        let mut buf = LineBuffer::new();
        let junk = vec![b'x'; MAX_PENDING_BYTES + 1];
        assert_eq!(
            buf.push(&junk),
            vec![Framed::Overflow {
                discarded: MAX_PENDING_BYTES + 1,
            }]
        );
        assert_eq!(buf.pending(), 0);
        assert_eq!(buf.push(b"OK\n"), vec![line("OK")]);
    }

    #[test]
    fn reset_drops_partial_line() {
        let mut buf = LineBuffer::new();
        buf.push(b"partial");
        buf.reset();
        assert_eq!(buf.push(b"next\n"), vec![line("next")]);
    }
}
