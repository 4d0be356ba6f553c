/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Colour palette and conflict table.
//!
//! The palette is always kept dense: entries are numbered `1..=N` with no
//! gaps, in ascending order.  Every mutation that could break that property
//! renumbers the palette and rewrites the conflict table so that no triple
//! keeps pointing at a colour that no longer exists.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of palette entries.
pub const MAX_PALETTE_SIZE: usize = 100;

// ── Rgb ───────────────────────────────────────────────────────────────────────

/// 24-bit colour, serialised as a six-digit uppercase hex string (`"FF8800"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `"RRGGBB"`, uppercase, no leading `#`.
    pub fn to_hex6(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse `"RRGGBB"` (an optional leading `#` is accepted).
    pub fn from_hex6(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R:{},G:{},B:{}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex6(&value).ok_or_else(|| format!("invalid RRGGBB colour: '{value}'"))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex6()
    }
}

// ── ColorItem / ConflictTriple ────────────────────────────────────────────────

/// One palette entry.  `index` is 1-based and dense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorItem {
    pub index: u32,
    pub rgb: Rgb,
}

/// Up to three palette indices that must never appear as two *different*
/// colours within one LED action.  `0` marks an unused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConflictTriple {
    #[serde(default)]
    pub c1: u32,
    #[serde(default)]
    pub c2: u32,
    #[serde(default)]
    pub c3: u32,
}

impl ConflictTriple {
    pub const fn new(c1: u32, c2: u32, c3: u32) -> Self {
        Self { c1, c2, c3 }
    }

    /// Non-zero members, in slot order.
    pub fn members(&self) -> impl Iterator<Item = u32> {
        [self.c1, self.c2, self.c3].into_iter().filter(|&c| c > 0)
    }

    pub fn contains(&self, color: u32) -> bool {
        color > 0 && self.members().any(|c| c == color)
    }

    fn slots_mut(&mut self) -> [&mut u32; 3] {
        [&mut self.c1, &mut self.c2, &mut self.c3]
    }
}

impl fmt::Display for ConflictTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.c1, self.c2, self.c3)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette is full (limit {limit})")]
    Full { limit: usize },

    #[error("palette position {position} is out of range (palette has {len} entries)")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("conflict row {row} does not exist ({len} rows)")]
    ConflictRowOutOfRange { row: usize, len: usize },

    #[error("conflict slot {slot} does not exist (valid: 0..=2)")]
    ConflictSlotOutOfRange { slot: usize },

    #[error("colour index {index} is not in the palette (valid: 0..={max})")]
    IndexOutOfRange { index: u32, max: u32 },
}

// ── Free helpers ──────────────────────────────────────────────────────────────

/// Sort by index, cap at [`MAX_PALETTE_SIZE`], and renumber `1..=N`.
pub fn normalize_colors(mut colors: Vec<ColorItem>) -> Vec<ColorItem> {
    colors.sort_by_key(|c| c.index);
    colors.truncate(MAX_PALETTE_SIZE);
    renumber(&mut colors);
    colors
}

/// Zero every conflict slot that references a colour above `max_index`.
pub fn clamp_conflicts(conflicts: &mut [ConflictTriple], max_index: u32) {
    for triple in conflicts.iter_mut() {
        for slot in triple.slots_mut() {
            if *slot > max_index {
                *slot = 0;
            }
        }
    }
}

/// Rewrite conflict references after palette index `removed_index` was
/// deleted: references to it become `0`, references above it shift down by
/// one so they keep pointing at the same colour.
pub fn remap_conflicts_after_removal(conflicts: &mut [ConflictTriple], removed_index: u32) {
    for triple in conflicts.iter_mut() {
        for slot in triple.slots_mut() {
            if *slot == removed_index {
                *slot = 0;
            } else if *slot > removed_index {
                *slot -= 1;
            }
        }
    }
}

fn renumber(colors: &mut [ColorItem]) {
    for (i, c) in colors.iter_mut().enumerate() {
        c.index = i as u32 + 1;
    }
}

// ── ColorTable ────────────────────────────────────────────────────────────────

/// Palette plus the conflict table that references it.
///
/// The two are kept together so that every palette mutation can rewrite the
/// conflict references in the same step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<ColorItem>,
    conflicts: Vec<ConflictTriple>,
}

impl ColorTable {
    /// Build a table from raw (possibly unnormalised) records.
    pub fn new(colors: Vec<ColorItem>, mut conflicts: Vec<ConflictTriple>) -> Self {
        let colors = normalize_colors(colors);
        clamp_conflicts(&mut conflicts, colors.len() as u32);
        Self { colors, conflicts }
    }

    pub fn colors(&self) -> &[ColorItem] {
        &self.colors
    }

    pub fn conflicts(&self) -> &[ConflictTriple] {
        &self.conflicts
    }

    /// Highest valid palette index (`0` when the palette is empty).
    pub fn max_index(&self) -> u32 {
        self.colors.len() as u32
    }

    pub fn rgb(&self, index: u32) -> Option<Rgb> {
        self.colors.iter().find(|c| c.index == index).map(|c| c.rgb)
    }

    /// Append a colour; returns its new index.
    pub fn add_color(&mut self, rgb: Rgb) -> Result<u32, PaletteError> {
        if self.colors.len() >= MAX_PALETTE_SIZE {
            return Err(PaletteError::Full {
                limit: MAX_PALETTE_SIZE,
            });
        }
        let index = self.colors.len() as u32 + 1;
        self.colors.push(ColorItem { index, rgb });
        Ok(index)
    }

    /// Delete the entry at 0-based `position` and remap the conflict table.
    pub fn remove_color_at(&mut self, position: usize) -> Result<ColorItem, PaletteError> {
        if position >= self.colors.len() {
            return Err(PaletteError::PositionOutOfRange {
                position,
                len: self.colors.len(),
            });
        }
        let removed = self.colors.remove(position);
        renumber(&mut self.colors);
        remap_conflicts_after_removal(&mut self.conflicts, position as u32 + 1);
        Ok(removed)
    }

    /// Remove every colour.  Conflict rows are kept but all their slots
    /// become unused.
    pub fn clear_colors(&mut self) {
        self.colors.clear();
        clamp_conflicts(&mut self.conflicts, 0);
    }

    /// Append an empty conflict row; returns its 0-based row number.
    pub fn add_conflict(&mut self) -> usize {
        self.conflicts.push(ConflictTriple::default());
        self.conflicts.len() - 1
    }

    /// Set one slot (0..=2) of a conflict row.  `index` must be `0` or a
    /// palette index.
    pub fn set_conflict_slot(
        &mut self,
        row: usize,
        slot: usize,
        index: u32,
    ) -> Result<(), PaletteError> {
        if index > self.max_index() {
            return Err(PaletteError::IndexOutOfRange {
                index,
                max: self.max_index(),
            });
        }
        let len = self.conflicts.len();
        let triple = self
            .conflicts
            .get_mut(row)
            .ok_or(PaletteError::ConflictRowOutOfRange { row, len })?;
        let target = triple
            .slots_mut()
            .into_iter()
            .nth(slot)
            .ok_or(PaletteError::ConflictSlotOutOfRange { slot })?;
        *target = index;
        Ok(())
    }

    pub fn remove_conflict(&mut self, row: usize) -> Result<ConflictTriple, PaletteError> {
        if row >= self.conflicts.len() {
            return Err(PaletteError::ConflictRowOutOfRange {
                row,
                len: self.conflicts.len(),
            });
        }
        Ok(self.conflicts.remove(row))
    }

    pub fn clear_conflicts(&mut self) {
        self.conflicts.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
