/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Import errors.
//!
//! Every variant aborts the whole import: no partial plan is ever returned,
//! so a bad row can never silently shorten a run.  Row and column numbers are
//! 1-based, matching what a spreadsheet shows.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The sheet contains merged / irregular cell regions.
    #[error("merged cells are not allowed (region starting at row {row}, column {col})")]
    MergedCells { row: usize, col: usize },

    /// A non-empty row appeared before the first header row.
    #[error("row {row}: data row appears before any header row")]
    DataBeforeHeader { row: usize },

    /// Header text that looks like a block token but does not form a valid
    /// block.
    #[error("row {row}, column {col}: malformed header: {reason}")]
    MalformedHeader {
        row: usize,
        col: usize,
        reason: String,
    },

    /// LED columns are not `LED1..LEDn` in order with no gaps.
    #[error("row {row}, column {col}: LED columns must be sequential (expected LED{expected}, found LED{found})")]
    NonSequentialLed {
        row: usize,
        col: usize,
        expected: u32,
        found: u32,
    },

    /// More LED columns than the device protocol supports.
    #[error("row {row}, column {col}: LED column count exceeds the limit ({limit})")]
    TooManyLeds {
        row: usize,
        col: usize,
        limit: usize,
    },

    /// A VOICE column without the style column right after it.
    #[error("row {row}, column {col}: VOICE column must be followed by a style column")]
    VoiceMissingStyle { row: usize, col: usize },

    /// Work-mode cell text not in the alias table.
    #[error("row {row}, column {col}: work mode \"{text}\" is invalid (must be ALL/SEQ/RAND)")]
    InvalidMode {
        row: usize,
        col: usize,
        text: String,
    },

    /// A numeric cell that is non-numeric or negative.
    #[error("row {row}, column {col}: {field} value \"{text}\" is invalid (must be an integer >= 0)")]
    InvalidNumber {
        row: usize,
        col: usize,
        field: &'static str,
        text: String,
    },

    /// Voice text present but the style cell is empty or not 1/2.
    #[error("row {row}, column {col}: style value \"{text}\" is invalid (must be 1 or 2)")]
    InvalidStyle {
        row: usize,
        col: usize,
        text: String,
    },

    #[error("no data rows under the header")]
    NoDataRows,

    /// The last header row has no data rows below it, typically a data row
    /// whose text happens to be a header token.
    #[error("row {row}: header row has no data rows under it")]
    HeaderWithoutData { row: usize },

    #[error("no valid actions were parsed from the sheet")]
    NoActions,
}
