/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Header-row recognition and the block layout it defines.
//!
//! A header row is scanned left to right with a column cursor.  Four block
//! shapes are recognised greedily:
//!
//! | Block | Columns |
//! |---|---|
//! | LED   | mode marker + `LED1..LEDn` (n ≤ [`MAX_LED_COLUMNS`]) |
//! | BEEP  | 1 |
//! | VOICE | 2 (text, style) |
//! | DELAY | 1 |
//!
//! The resulting [`HeaderLayout`] is a plain value: the parser rebinds it each
//! time another header row appears.

use super::error::ParseError;

/// Protocol limit on LED columns per block.
pub const MAX_LED_COLUMNS: usize = 20;

const LED_MARKER_KEYS: &[&str] = &[
    "led工作模式",
    "工作模式",
    "mode",
    "workmode",
    "ledmode",
];

const STYLE_KEYS: &[&str] = &[
    "风格",
    "语音风格",
    "voiceset",
    "voiceset1",
    "voiceset2",
    "voicestyle",
    "voice_style",
    "style",
];

// ── Tokens ────────────────────────────────────────────────────────────────────

/// A recognised header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderToken {
    /// LED block marker (holds the work-mode column).
    LedMarker,
    /// `LED<n>` colour column.
    Led(u32),
    Beep,
    Voice,
    /// Voice style column.
    Style,
    Delay,
}

/// Lower-case the text and drop all whitespace.
fn header_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Recognise a header token, or `None` for ordinary text.
pub fn classify(text: &str) -> Option<HeaderToken> {
    let key = header_key(text);
    if key.is_empty() {
        return None;
    }
    if LED_MARKER_KEYS.contains(&key.as_str()) {
        return Some(HeaderToken::LedMarker);
    }
    if let Some(digits) = key.strip_prefix("led") {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return digits.parse().ok().map(HeaderToken::Led);
        }
    }
    if STYLE_KEYS.contains(&key.as_str()) {
        return Some(HeaderToken::Style);
    }
    match key.as_str() {
        "beep" => Some(HeaderToken::Beep),
        "voice" => Some(HeaderToken::Voice),
        "delay" => Some(HeaderToken::Delay),
        _ => None,
    }
}

/// Text that is not a token but resembles an LED / mode / style token.
/// Such text inside a header row is an error rather than being ignored.
fn looks_malformed(text: &str) -> bool {
    let key = header_key(text);
    key.starts_with("led")
        || key.contains("模式")
        || key.contains("mode")
        || key.contains("风格")
        || key.contains("style")
}

/// Returns `true` if any cell of `cells` is a recognised header token.
pub fn is_header_row(cells: &[String]) -> bool {
    cells.iter().any(|c| classify(c).is_some())
}

// ── Blocks ────────────────────────────────────────────────────────────────────

/// One typed group of columns.  Column numbers are 0-based grid columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Led {
        mode_col: usize,
        led_cols: Vec<usize>,
    },
    Beep { col: usize },
    Voice { text_col: usize, style_col: usize },
    Delay { col: usize },
}

impl Block {
    /// Every grid column the block occupies, left to right.
    pub fn columns(&self) -> Vec<usize> {
        match self {
            Block::Led { mode_col, led_cols } => {
                let mut cols = vec![*mode_col];
                cols.extend(led_cols);
                cols
            }
            Block::Beep { col } | Block::Delay { col } => vec![*col],
            Block::Voice {
                text_col,
                style_col,
            } => vec![*text_col, *style_col],
        }
    }

    /// Right-most column of the block.
    pub fn last_col(&self) -> usize {
        match self {
            Block::Led { mode_col, led_cols } => led_cols.last().copied().unwrap_or(*mode_col),
            Block::Beep { col } | Block::Delay { col } => *col,
            Block::Voice { style_col, .. } => *style_col,
        }
    }
}

/// Column layout defined by one header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    /// 1-based sheet row the header was read from.
    pub source_row: usize,
    pub blocks: Vec<Block>,
}

impl HeaderLayout {
    /// Scan a header row into blocks.
    ///
    /// `row` is the 1-based sheet row, used only for error messages.
    pub fn parse(cells: &[String], row: usize) -> Result<Self, ParseError> {
        let tokens: Vec<Option<HeaderToken>> = cells.iter().map(|c| classify(c)).collect();
        let mut blocks = Vec::new();
        let mut col = 0usize;

        while col < tokens.len() {
            match tokens[col] {
                Some(HeaderToken::LedMarker) => {
                    let led_cols = scan_led_run(&tokens, col + 1, row)?;
                    if led_cols.is_empty() {
                        return Err(ParseError::MalformedHeader {
                            row,
                            col: col + 1,
                            reason: format!(
                                "LED block marker \"{}\" must be followed by LED1..LEDn",
                                cells[col]
                            ),
                        });
                    }
                    let next = col + 1 + led_cols.len();
                    blocks.push(Block::Led {
                        mode_col: col,
                        led_cols,
                    });
                    col = next;
                }
                Some(HeaderToken::Led(_)) => {
                    // A sequence error inside the stray run is the more useful
                    // diagnostic, so report that first.
                    scan_led_run(&tokens, col, row)?;
                    return Err(ParseError::MalformedHeader {
                        row,
                        col: col + 1,
                        reason: format!(
                            "\"{}\" appears outside an LED block (missing work-mode column)",
                            cells[col]
                        ),
                    });
                }
                Some(HeaderToken::Beep) => {
                    blocks.push(Block::Beep { col });
                    col += 1;
                }
                Some(HeaderToken::Voice) => {
                    if tokens.get(col + 1).copied().flatten() != Some(HeaderToken::Style) {
                        return Err(ParseError::VoiceMissingStyle { row, col: col + 1 });
                    }
                    blocks.push(Block::Voice {
                        text_col: col,
                        style_col: col + 1,
                    });
                    col += 2;
                }
                Some(HeaderToken::Style) => {
                    return Err(ParseError::MalformedHeader {
                        row,
                        col: col + 1,
                        reason: format!(
                            "style column \"{}\" must follow a VOICE column",
                            cells[col]
                        ),
                    });
                }
                Some(HeaderToken::Delay) => {
                    blocks.push(Block::Delay { col });
                    col += 1;
                }
                None => {
                    if looks_malformed(&cells[col]) {
                        return Err(ParseError::MalformedHeader {
                            row,
                            col: col + 1,
                            reason: format!("unrecognised header \"{}\"", cells[col]),
                        });
                    }
                    col += 1;
                }
            }
        }

        Ok(Self {
            source_row: row,
            blocks,
        })
    }

    /// All columns the layout reads, used for blank-row detection.
    pub fn checked_columns(&self) -> Vec<usize> {
        self.blocks.iter().flat_map(Block::columns).collect()
    }

    /// Width of the widest LED block (0 if none).
    pub fn led_count(&self) -> usize {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Led { led_cols, .. } => Some(led_cols.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Returns `true` if `col` is the right-most column of some block.
    pub fn ends_block_at(&self, col: usize) -> bool {
        self.blocks.iter().any(|b| b.last_col() == col)
    }

    pub fn is_led_column(&self, col: usize) -> bool {
        self.blocks.iter().any(|b| match b {
            Block::Led { led_cols, .. } => led_cols.contains(&col),
            _ => false,
        })
    }
}

/// Collect the contiguous run of `LED<n>` columns starting at `start`,
/// checking they count up from 1 without gaps and stay within the limit.
fn scan_led_run(
    tokens: &[Option<HeaderToken>],
    start: usize,
    row: usize,
) -> Result<Vec<usize>, ParseError> {
    let mut cols = Vec::new();
    let mut col = start;
    while let Some(Some(HeaderToken::Led(found))) = tokens.get(col).copied() {
        let expected = cols.len() as u32 + 1;
        if found != expected {
            return Err(ParseError::NonSequentialLed {
                row,
                col: col + 1,
                expected,
                found,
            });
        }
        if cols.len() >= MAX_LED_COLUMNS {
            return Err(ParseError::TooManyLeds {
                row,
                col: col + 1,
                limit: MAX_LED_COLUMNS,
            });
        }
        cols.push(col);
        col += 1;
    }
    Ok(cols)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
