/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the colour resolver.
//!
//! Two layers, mirroring how the failure is reported:
//!
//! * [`SolveReason`]: why one LED action has no valid colour assignment.
//! * [`ResolveError`]: top-level failure of `precheck()` / `resolve()`,
//!   naming the offending action.
//!
//! The caller must block run-start on any of these; none is retried
//! automatically.

use thiserror::Error;

// ── Per-action reason ─────────────────────────────────────────────────────────

/// Detailed reason why a single LED action is unsolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveReason {
    /// A fixed colour index is not in the palette.
    UnknownColor { color: u32 },

    /// Two different fixed colours share a conflict triple.  No search can fix
    /// this.
    FixedColorClash {
        triple: usize,
        first: u32,
        second: u32,
    },

    /// Wildcard slots exist but the palette is empty.
    EmptyPalette,

    /// Backtracking ran out of candidates.  `slot` is the 1-based LED slot
    /// where no colour could be placed.
    Exhausted { slot: usize },

    /// The final guard found two distinct colours from one triple.
    ConflictViolation {
        triple: usize,
        first: u32,
        second: u32,
    },
}

impl std::fmt::Display for SolveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveReason::UnknownColor { color } => {
                write!(f, "fixed colour {} is not in the colour table", color)
            }

            SolveReason::FixedColorClash {
                triple,
                first,
                second,
            } => write!(
                f,
                "fixed colours clash: conflict group #{} contains both {} and {}",
                triple, first, second
            ),

            SolveReason::EmptyPalette => {
                write!(f, "need random colour but the colour table is empty")
            }

            SolveReason::Exhausted { slot } => write!(
                f,
                "no colour can be placed at LED{} without violating a conflict group",
                slot
            ),

            SolveReason::ConflictViolation {
                triple,
                first,
                second,
            } => write!(
                f,
                "conflict violation: group #{} contains both {} and {}",
                triple, first, second
            ),
        }
    }
}

// ── Top-level errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The device LED count is zero.
    #[error("invalid LED count: {0}")]
    InvalidLedCount(usize),

    /// One LED action has no valid assignment.
    ///
    /// `action_index` is the 0-based position in the plan; the message shows
    /// it 1-based.
    #[error("action {} ({flow}) is unsolvable: {reason}", .action_index + 1)]
    Unsolvable {
        action_index: usize,
        flow: String,
        reason: SolveReason,
    },
}
