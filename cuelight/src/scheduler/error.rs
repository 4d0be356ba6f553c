/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Runtime errors of the segment scheduler.
//!
//! All of these are recoverable: the caller may fix the transport (or load a
//! plan) and call `advance()` again.  Scheduler state is left untouched by a
//! failed call, so a retry sends the same segment.

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum RunError {
    /// `advance()` was called before a non-empty plan was loaded.
    #[error("no plan loaded")]
    NoPlan,

    /// The transport reported itself closed before anything was sent.
    #[error("transport not open")]
    TransportNotOpen,

    /// The transport accepted the call but failed to send.
    #[error("send failed: {0}")]
    Send(#[from] TransportError),
}

impl RunError {
    /// Whether retrying after fixing the transport can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RunError::TransportNotOpen | RunError::Send(_))
    }
}
