/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Workflow sheet import.
//!
//! Turns a grid of trimmed text cells into an ordered [`Action`] list plus a
//! display mirror of the sheet.
//!
//! # Layout rules
//! * Any row containing a recognised header token is a header row.  Headers
//!   may recur; each one rebinds the [`HeaderLayout`] used for the rows below.
//! * Every data row becomes one flow (`flow1`, `flow2`, …).  Each block of the
//!   active layout contributes at most one action, in header-column order.
//! * Scanning stops at the first row that is blank across the checked columns
//!   of the active layout.  Anything below it is never read.
//! * Every failure aborts the whole import.

pub mod error;
pub mod header;

pub use error::ParseError;
pub use header::{Block, HeaderLayout, MAX_LED_COLUMNS};

use tracing::{debug, info};

use crate::action::{Action, ActionKind, LedMode, VoiceSet, WILDCARD_COLOR};
use crate::config::ColorTable;

/// Header label of the synthetic progress-time column.
pub const TIME_COLUMN_LABEL: &str = "TIME";

// ── Grid ──────────────────────────────────────────────────────────────────────

/// A rectangular (or ragged) region of merged cells, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

/// Raw sheet contents handed over by the file-reading collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
    merged: Vec<MergedRegion>,
}

impl Grid {
    /// Build a grid, trimming every cell.
    pub fn new<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(trim_cell).collect())
                .collect(),
            merged: Vec::new(),
        }
    }

    /// Tab-separated text, one row per line.
    pub fn from_tsv(text: &str) -> Self {
        Self::new(text.lines().map(|line| line.split('\t')))
    }

    pub fn with_merged(mut self, regions: Vec<MergedRegion>) -> Self {
        self.merged = regions;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cells of row `r` (0-based).
    pub fn row(&self, r: usize) -> &[String] {
        self.rows.get(r).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell text, `""` when outside the grid.
    pub fn cell(&self, r: usize, c: usize) -> &str {
        self.row(r).get(c).map(String::as_str).unwrap_or("")
    }
}

fn trim_cell<S: AsRef<str>>(cell: S) -> String {
    cell.as_ref().trim().to_string()
}

// ── Display mirror ────────────────────────────────────────────────────────────

/// One row of the display mirror.  Column indices are mirror columns, which
/// include the synthetic time columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub is_header: bool,
    /// 1-based sheet row.
    pub source_row: usize,
    /// Flow produced by this row (`None` for header rows).
    pub flow_name: Option<String>,
    pub cells: Vec<String>,
    pub led_columns: Vec<usize>,
    pub time_columns: Vec<usize>,
}

fn mirror_row(
    layout: &HeaderLayout,
    cells: &[String],
    width: usize,
    source_row: usize,
    flow_name: Option<String>,
) -> DisplayRow {
    let is_header = flow_name.is_none();
    let mut row = DisplayRow {
        is_header,
        source_row,
        flow_name,
        cells: Vec::with_capacity(width + layout.blocks.len()),
        led_columns: Vec::new(),
        time_columns: Vec::new(),
    };
    for col in 0..width {
        if layout.is_led_column(col) {
            row.led_columns.push(row.cells.len());
        }
        row.cells.push(cells.get(col).cloned().unwrap_or_default());
        if layout.ends_block_at(col) {
            row.time_columns.push(row.cells.len());
            row.cells.push(if is_header {
                TIME_COLUMN_LABEL.to_string()
            } else {
                String::new()
            });
        }
    }
    row
}

// ── Parse result ──────────────────────────────────────────────────────────────

/// Successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPlan {
    pub actions: Vec<Action>,
    pub display: Vec<DisplayRow>,
    led_count: usize,
}

impl ParsedPlan {
    /// Widest LED block seen in any header.
    pub fn led_count(&self) -> usize {
        self.led_count
    }

    /// Mirror width (widest display row).
    pub fn column_count(&self) -> usize {
        self.display
            .iter()
            .map(|r| r.cells.len())
            .max()
            .unwrap_or(0)
    }

    pub fn has_kind(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|a| a.kind() == kind)
    }

    pub fn has_wildcard_color(&self) -> bool {
        self.actions.iter().any(Action::has_wildcard)
    }

    /// Fixed colour indices used by the plan but missing from `palette`,
    /// sorted and deduplicated.
    pub fn unknown_colors(&self, palette: &ColorTable) -> Vec<u32> {
        let mut unknown: Vec<u32> = self
            .actions
            .iter()
            .filter_map(Action::led_colors)
            .flatten()
            .copied()
            .filter(|&c| c != WILDCARD_COLOR && palette.rgb(c).is_none())
            .collect();
        unknown.sort_unstable();
        unknown.dedup();
        unknown
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Import a sheet.
pub fn parse(grid: &Grid) -> Result<ParsedPlan, ParseError> {
    if let Some(region) = grid.merged.first() {
        return Err(ParseError::MergedCells {
            row: region.first_row,
            col: region.first_col,
        });
    }

    let width = grid.width();
    let mut layout: Option<HeaderLayout> = None;
    let mut actions = Vec::new();
    let mut display = Vec::new();
    let mut led_count = 0usize;
    let mut data_rows = 0usize;
    let mut rows_under_header = 0usize;

    for r in 0..grid.row_count() {
        let cells = grid.row(r);
        let sheet_row = r + 1;

        if header::is_header_row(cells) {
            let parsed = HeaderLayout::parse(cells, sheet_row)?;
            debug!(row = sheet_row, blocks = parsed.blocks.len(), "header row");
            led_count = led_count.max(parsed.led_count());
            display.push(mirror_row(&parsed, cells, width, sheet_row, None));
            layout = Some(parsed);
            rows_under_header = 0;
            continue;
        }

        let Some(active) = layout.as_ref() else {
            if cells.iter().all(String::is_empty) {
                continue;
            }
            return Err(ParseError::DataBeforeHeader { row: sheet_row });
        };

        if active
            .checked_columns()
            .iter()
            .all(|&c| grid.cell(r, c).is_empty())
        {
            debug!(row = sheet_row, "blank row, import stops");
            break;
        }

        data_rows += 1;
        rows_under_header += 1;
        let flow_name = format!("flow{data_rows}");
        parse_data_row(active, grid, r, &flow_name, &mut actions)?;
        display.push(mirror_row(active, cells, width, sheet_row, Some(flow_name)));
    }

    if data_rows == 0 {
        return Err(ParseError::NoDataRows);
    }
    if rows_under_header == 0 {
        if let Some(last) = &layout {
            return Err(ParseError::HeaderWithoutData {
                row: last.source_row,
            });
        }
    }
    if actions.is_empty() {
        return Err(ParseError::NoActions);
    }

    info!(
        rows = data_rows,
        actions = actions.len(),
        led_count,
        "workflow sheet imported"
    );
    Ok(ParsedPlan {
        actions,
        display,
        led_count,
    })
}

/// Append the actions of one data row.  `r` is the 0-based grid row.
fn parse_data_row(
    layout: &HeaderLayout,
    grid: &Grid,
    r: usize,
    flow_name: &str,
    out: &mut Vec<Action>,
) -> Result<(), ParseError> {
    let row = r + 1;
    for block in &layout.blocks {
        match block {
            Block::Led { mode_col, led_cols } => {
                let text = grid.cell(r, *mode_col);
                let mode = LedMode::from_alias(text).ok_or_else(|| ParseError::InvalidMode {
                    row,
                    col: mode_col + 1,
                    text: text.to_string(),
                })?;
                let colors = led_cols
                    .iter()
                    .map(|&c| match grid.cell(r, c) {
                        "" => Ok(WILDCARD_COLOR),
                        text => parse_non_negative(text, row, c, "LED"),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                out.push(Action::led(flow_name, mode, colors));
            }
            Block::Beep { col } => {
                let text = grid.cell(r, *col);
                if text.is_empty() {
                    continue;
                }
                match parse_non_negative(text, row, *col, "BEEP")? {
                    0 => {}
                    1 => out.push(Action::beep(flow_name, 0)),
                    tenths => out.push(Action::beep(flow_name, tenths.saturating_mul(100))),
                }
            }
            Block::Voice {
                text_col,
                style_col,
            } => {
                let text = grid.cell(r, *text_col);
                let style = grid.cell(r, *style_col);
                let voice_set = if style.is_empty() {
                    None
                } else {
                    let parsed = style
                        .parse::<i64>()
                        .ok()
                        .and_then(VoiceSet::from_style)
                        .ok_or_else(|| ParseError::InvalidStyle {
                            row,
                            col: style_col + 1,
                            text: style.to_string(),
                        })?;
                    Some(parsed)
                };
                if text.is_empty() {
                    continue;
                }
                let voice_set = voice_set.ok_or_else(|| ParseError::InvalidStyle {
                    row,
                    col: style_col + 1,
                    text: String::new(),
                })?;
                out.push(Action::voice(flow_name, text, voice_set));
            }
            Block::Delay { col } => {
                let text = grid.cell(r, *col);
                if text.is_empty() {
                    continue;
                }
                let ms = parse_non_negative(text, row, *col, "DELAY")?;
                out.push(Action::delay(flow_name, ms));
            }
        }
    }
    Ok(())
}

fn parse_non_negative(
    text: &str,
    row: usize,
    col: usize,
    field: &'static str,
) -> Result<u32, ParseError> {
    text.parse().map_err(|_| ParseError::InvalidNumber {
        row,
        col: col + 1,
        field,
        text: text.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionBody;
    use crate::config::Rgb;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(rows.iter().map(|r| r.iter().copied()))
    }

    // ── Basic import ──────────────────────────────────────────────────────────

    #[test]
    fn led_and_beep_row_share_flow_name() {
        let g = grid(&[
            &["LED工作模式", "LED1", "LED2", "BEEP"],
            &["ALL", "3", "0", "5"],
        ]);
        let plan = parse(&g).unwrap();
        assert_eq!(
            plan.actions,
            vec![
                Action::led("flow1", LedMode::All, vec![3, 0]),
                Action::beep("flow1", 500),
            ]
        );
        assert_eq!(plan.led_count(), 2);
        assert!(plan.has_wildcard_color());
        assert!(plan.has_kind(ActionKind::Beep));
        assert!(!plan.has_kind(ActionKind::Voice));
    }

    #[test]
    fn beep_sentinels_stay_distinct() {
        let g = grid(&[
            &["LED工作模式", "LED1", "BEEP"],
            &["ALL", "1", "0"],
            &["ALL", "1", "1"],
            &["ALL", "1", ""],
        ]);
        let plan = parse(&g).unwrap();
        let beeps: Vec<_> = plan
            .actions
            .iter()
            .filter(|a| a.kind() == ActionKind::Beep)
            .collect();
        assert_eq!(beeps, vec![&Action::beep("flow2", 0)]);
        assert_eq!(plan.actions.len(), 4);
    }

    #[test]
    fn actions_follow_header_column_order() {
        let g = grid(&[
            &["DELAY", "VOICE", "风格", "LED工作模式", "LED1"],
            &["20", "hello", "2", "SEQ", "4"],
        ]);
        let plan = parse(&g).unwrap();
        let kinds: Vec<_> = plan.actions.iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::Delay, ActionKind::Voice, ActionKind::Led]
        );
    }

    #[test]
    fn voice_action_carries_text_and_set() {
        let g = grid(&[&["VOICE", "STYLE"], &["欢迎", "2"]]);
        let plan = parse(&g).unwrap();
        assert_eq!(
            plan.actions,
            vec![Action::voice("flow1", "欢迎", VoiceSet::Two)]
        );
        assert_eq!(plan.led_count(), 0);
    }

    #[test]
    fn empty_optional_cells_emit_no_action() {
        let g = grid(&[
            &["LED工作模式", "LED1", "VOICE", "风格", "DELAY"],
            &["RAND", "", "", "", ""],
        ]);
        let plan = parse(&g).unwrap();
        assert_eq!(
            plan.actions,
            vec![Action::led("flow1", LedMode::Rand, vec![0])]
        );
    }

    #[test]
    fn mode_aliases_are_normalised() {
        let g = grid(&[&["工作模式", "LED1"], &["随机", "2"]]);
        let plan = parse(&g).unwrap();
        assert!(matches!(
            plan.actions[0].body,
            ActionBody::Led {
                mode: LedMode::Rand,
                ..
            }
        ));
    }

    // ── Recurring headers and sentinel rows ───────────────────────────────────

    #[test]
    fn recurring_header_rebinds_layout() {
        let g = grid(&[
            &["LED工作模式", "LED1"],
            &["ALL", "1"],
            &["DELAY"],
            &["30"],
        ]);
        let plan = parse(&g).unwrap();
        assert_eq!(
            plan.actions,
            vec![
                Action::led("flow1", LedMode::All, vec![1]),
                Action::delay("flow2", 30),
            ]
        );
        assert_eq!(plan.display.len(), 4);
        assert!(plan.display[2].is_header);
    }

    #[test]
    fn scanning_stops_at_first_blank_row() {
        let g = grid(&[
            &["LED工作模式", "LED1", "Notes"],
            &["ALL", "1", ""],
            &["", "", "ignored note"],
            &["ALL", "2", ""],
        ]);
        let plan = parse(&g).unwrap();
        assert_eq!(plan.actions.len(), 1);
    }

    #[test]
    fn blank_rows_before_first_header_are_skipped() {
        let g = grid(&[&["", ""], &["DELAY"], &["5"]]);
        assert_eq!(parse(&g).unwrap().actions, vec![Action::delay("flow1", 5)]);
    }

    // ── Display mirror ────────────────────────────────────────────────────────

    #[test]
    fn display_mirror_interleaves_time_columns() {
        let g = grid(&[
            &["LED工作模式", "LED1", "LED2", "BEEP"],
            &["ALL", "3", "0", "5"],
        ]);
        let plan = parse(&g).unwrap();
        let header = &plan.display[0];
        assert_eq!(
            header.cells,
            vec!["LED工作模式", "LED1", "LED2", "TIME", "BEEP", "TIME"]
        );
        assert_eq!(header.led_columns, vec![1, 2]);
        assert_eq!(header.time_columns, vec![3, 5]);

        let data = &plan.display[1];
        assert_eq!(data.flow_name.as_deref(), Some("flow1"));
        assert_eq!(data.source_row, 2);
        assert_eq!(data.cells, vec!["ALL", "3", "0", "", "5", ""]);
        assert_eq!(plan.column_count(), 6);
    }

    // ── Palette queries ───────────────────────────────────────────────────────

    #[test]
    fn unknown_colors_lists_fixed_indices_missing_from_palette() {
        let g = grid(&[
            &["LED工作模式", "LED1", "LED2"],
            &["ALL", "2", "7"],
            &["SEQ", "7", "0"],
        ]);
        let plan = parse(&g).unwrap();
        let mut palette = ColorTable::default();
        palette.add_color(Rgb::new(1, 1, 1)).unwrap();
        palette.add_color(Rgb::new(2, 2, 2)).unwrap();
        assert_eq!(plan.unknown_colors(&palette), vec![7]);
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    #[test]
    fn empty_grid_is_no_data_rows() {
        assert_eq!(parse(&Grid::default()), Err(ParseError::NoDataRows));
    }

    #[test]
    fn header_without_data_is_no_data_rows() {
        let g = grid(&[&["LED工作模式", "LED1"], &["", ""]]);
        assert_eq!(parse(&g), Err(ParseError::NoDataRows));
    }

    #[test]
    fn rows_without_actions_is_no_actions() {
        let g = grid(&[&["BEEP", "DELAY"], &["0", ""]]);
        assert_eq!(parse(&g), Err(ParseError::NoActions));
    }

    #[test]
    fn led_gap_rejected() {
        let g = grid(&[&["LED工作模式", "LED1", "LED3"], &["ALL", "1", "2"]]);
        assert!(matches!(parse(&g), Err(ParseError::NonSequentialLed { .. })));
    }

    #[test]
    fn data_before_header_rejected() {
        let g = grid(&[&["ALL", "1"], &["LED工作模式", "LED1"]]);
        assert_eq!(parse(&g), Err(ParseError::DataBeforeHeader { row: 1 }));
    }

    #[test]
    fn merged_region_rejected() {
        let g = grid(&[&["DELAY"], &["5"]]).with_merged(vec![MergedRegion {
            first_row: 2,
            first_col: 1,
            last_row: 3,
            last_col: 1,
        }]);
        assert_eq!(parse(&g), Err(ParseError::MergedCells { row: 2, col: 1 }));
    }

    #[test]
    fn unknown_mode_rejected_with_position() {
        let g = grid(&[&["LED工作模式", "LED1"], &["BLINK", "1"]]);
        assert_eq!(
            parse(&g),
            Err(ParseError::InvalidMode {
                row: 2,
                col: 1,
                text: "BLINK".to_string(),
            })
        );
    }

    #[test]
    fn empty_mode_rejected() {
        let g = grid(&[&["LED工作模式", "LED1"], &["", "1"]]);
        assert!(matches!(parse(&g), Err(ParseError::InvalidMode { .. })));
    }

    #[test]
    fn negative_and_non_numeric_values_rejected() {
        let g = grid(&[&["LED工作模式", "LED1"], &["ALL", "-1"]]);
        assert!(matches!(
            parse(&g),
            Err(ParseError::InvalidNumber {
                field: "LED",
                col: 2,
                ..
            })
        ));

        let g = grid(&[&["DELAY"], &["soon"]]);
        assert!(matches!(
            parse(&g),
            Err(ParseError::InvalidNumber { field: "DELAY", .. })
        ));
    }

    #[test]
    fn voice_text_requires_valid_style() {
        let g = grid(&[&["VOICE", "风格"], &["hello", ""]]);
        assert!(matches!(parse(&g), Err(ParseError::InvalidStyle { col: 2, .. })));

        let g = grid(&[&["VOICE", "风格"], &["hello", "3"]]);
        assert!(matches!(parse(&g), Err(ParseError::InvalidStyle { .. })));
    }

    #[test]
    fn voice_style_without_text_is_still_validated() {
        let g = grid(&[&["VOICE", "风格", "DELAY"], &["", "2", "5"]]);
        assert_eq!(parse(&g).unwrap().actions, vec![Action::delay("flow1", 5)]);

        let g = grid(&[&["VOICE", "风格", "DELAY"], &["", "3", "5"]]);
        assert_eq!(
            parse(&g),
            Err(ParseError::InvalidStyle {
                row: 2,
                col: 2,
                text: "3".to_string(),
            })
        );
    }

    #[test]
    fn trailing_header_without_data_rejected() {
        let g = grid(&[&["VOICE", "风格"], &["你好", "1"], &["Delay", "1"]]);
        assert_eq!(parse(&g), Err(ParseError::HeaderWithoutData { row: 3 }));

        let g = grid(&[&["DELAY"], &["5"], &["BEEP"], &[""]]);
        assert_eq!(parse(&g), Err(ParseError::HeaderWithoutData { row: 3 }));
    }

    #[test]
    fn error_messages_are_one_based() {
        let g = grid(&[&["LED工作模式", "LED1"], &["ALL", "x"]]);
        let msg = parse(&g).unwrap_err().to_string();
        assert!(msg.starts_with("row 2, column 2:"), "{msg}");
    }

    // ── TSV ───────────────────────────────────────────────────────────────────

    #[test]
    fn tsv_cells_are_trimmed() {
        let g = Grid::from_tsv("DELAY\t BEEP \n 10 \t2\n");
        assert_eq!(g.row_count(), 2);
        assert_eq!(g.cell(0, 1), "BEEP");
        assert_eq!(g.cell(1, 0), "10");
        assert_eq!(g.cell(5, 5), "");
    }
}
