/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core plan data structures shared by the parser, resolver, codec and
//! scheduler.
//!
//! ```text
//! grid ──(table)──►  Vec<Action>  ──(resolver)──►  Vec<Action>  ──(scheduler)──►  Segment ──► WORK frame
//!                     ↑ may hold wildcard 0            ↑ every LED slot concrete
//! ```
//!
//! # Ownership model
//! The parser produces an owned `Vec<Action>`.  The resolver never mutates its
//! input; it returns a fresh resolved copy, which is then **moved** into the
//! scheduler by `load_plan()`.  Segments only carry index ranges into that
//! plan, never copies of the actions themselves.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Colour index meaning "pick a colour at run time".
pub const WILDCARD_COLOR: u32 = 0;

// ── LED work mode ─────────────────────────────────────────────────────────────

/// How the device lights the LEDs of one LED action.
///
/// Carrying the typed enum through the whole pipeline (instead of the raw cell
/// text) makes an invalid mode unrepresentable once a row has been parsed.
/// The conversion back to text only happens at the wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedMode {
    /// All LEDs light at once.
    #[default]
    All,
    /// LEDs light one after another in slot order.
    Seq,
    /// LEDs light one after another in a shuffled order.
    Rand,
}

impl LedMode {
    /// Normalise a work-mode cell through the alias table.
    ///
    /// Matching is case-insensitive for the Latin names; the localized
    /// synonyms must match exactly after trimming.  Returns `None` for
    /// anything unrecognised so the caller can report the offending cell.
    pub fn from_alias(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let upper = trimmed.to_uppercase();
        match (upper.as_str(), trimmed) {
            ("ALL", _) | (_, "全部" | "全亮" | "同时" | "同时点亮") => Some(LedMode::All),
            ("SEQ", _) | (_, "顺序" | "顺序点亮" | "依次") => Some(LedMode::Seq),
            ("RAND", _) | (_, "随机" | "随机点亮") => Some(LedMode::Rand),
            _ => None,
        }
    }

    /// Canonical wire / log spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            LedMode::All => "ALL",
            LedMode::Seq => "SEQ",
            LedMode::Rand => "RAND",
        }
    }
}

impl fmt::Display for LedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Voice parameter set ───────────────────────────────────────────────────────

/// Which of the two device voice-parameter sets (`VOICESET1` / `VOICESET2`)
/// a voice action speaks with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceSet {
    #[default]
    One,
    Two,
}

impl VoiceSet {
    /// Parse the style cell value.  Only `1` and `2` are valid.
    pub fn from_style(v: i64) -> Option<Self> {
        match v {
            1 => Some(VoiceSet::One),
            2 => Some(VoiceSet::Two),
            _ => None,
        }
    }

    /// Style number used on the wire.
    pub fn as_u8(self) -> u8 {
        match self {
            VoiceSet::One => 1,
            VoiceSet::Two => 2,
        }
    }
}

// ── Action ────────────────────────────────────────────────────────────────────

/// Discriminant of [`ActionBody`], used for event payloads and plan queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Led,
    Beep,
    Voice,
    Delay,
}

impl ActionKind {
    /// One-letter code shown in progress views.
    pub fn code(self) -> &'static str {
        match self {
            ActionKind::Led => "L",
            ActionKind::Beep => "B",
            ActionKind::Voice => "V",
            ActionKind::Delay => "D",
        }
    }
}

/// Variant-specific payload of an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionBody {
    /// Light the LEDs.  `colors` holds one palette index per LED slot;
    /// [`WILDCARD_COLOR`] marks a slot the resolver must fill.
    Led { mode: LedMode, colors: Vec<u32> },

    /// Sound the buzzer.  `duration_ms == 0` means "device default duration".
    /// A beep cell of `0` never produces an action at all, so the two
    /// sentinels stay distinct.
    Beep { duration_ms: u32 },

    /// Speak `text` with the chosen voice parameter set.
    Voice { text: String, voice_set: VoiceSet },

    /// Pause the device for `ms` milliseconds.
    Delay { ms: u32 },
}

/// One typed step of the plan.
///
/// Every action produced from the same source row shares a `flow_name`, and
/// those actions are contiguous in plan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Grouping key, unique per logical source row (`flow1`, `flow2`, …).
    pub flow_name: String,
    pub body: ActionBody,
}

impl Action {
    pub fn led(flow_name: impl Into<String>, mode: LedMode, colors: Vec<u32>) -> Self {
        Self {
            flow_name: flow_name.into(),
            body: ActionBody::Led { mode, colors },
        }
    }

    pub fn beep(flow_name: impl Into<String>, duration_ms: u32) -> Self {
        Self {
            flow_name: flow_name.into(),
            body: ActionBody::Beep { duration_ms },
        }
    }

    pub fn voice(
        flow_name: impl Into<String>,
        text: impl Into<String>,
        voice_set: VoiceSet,
    ) -> Self {
        Self {
            flow_name: flow_name.into(),
            body: ActionBody::Voice {
                text: text.into(),
                voice_set,
            },
        }
    }

    pub fn delay(flow_name: impl Into<String>, ms: u32) -> Self {
        Self {
            flow_name: flow_name.into(),
            body: ActionBody::Delay { ms },
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self.body {
            ActionBody::Led { .. } => ActionKind::Led,
            ActionBody::Beep { .. } => ActionKind::Beep,
            ActionBody::Voice { .. } => ActionKind::Voice,
            ActionBody::Delay { .. } => ActionKind::Delay,
        }
    }

    /// LED colour slots, or `None` for non-LED actions.
    pub fn led_colors(&self) -> Option<&[u32]> {
        match &self.body {
            ActionBody::Led { colors, .. } => Some(colors),
            _ => None,
        }
    }

    /// Returns `true` if this is an LED action with at least one wildcard slot.
    pub fn has_wildcard(&self) -> bool {
        self.led_colors()
            .is_some_and(|c| c.contains(&WILDCARD_COLOR))
    }

    /// Human-readable parameter summary for progress events and logs.
    pub fn params(&self) -> String {
        match &self.body {
            ActionBody::Led { mode, colors } => {
                format!("mode={} colors={}", mode, join_ints(colors))
            }
            ActionBody::Beep { duration_ms: 0 } => "default".to_string(),
            ActionBody::Beep { duration_ms } => format!("{duration_ms}ms"),
            ActionBody::Voice { text, voice_set } => {
                format!("style={} text={}", voice_set.as_u8(), text)
            }
            ActionBody::Delay { ms } => format!("{ms}ms"),
        }
    }
}

/// Comma-join a list of integers (`[1, 0, 3]` → `"1,0,3"`).
pub(crate) fn join_ints<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

// ── Segment ───────────────────────────────────────────────────────────────────

/// A contiguous run of actions sharing one `flow_name`; the scheduler's unit
/// of execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Display name `"<flow>#<occurrence>"`, disambiguating repeated flows.
    pub name: String,
    /// Flow name shared by every action in the segment.
    pub flow_name: String,
    /// Index of the first action (inclusive).
    pub first: usize,
    /// Index of the last action (inclusive).
    pub last: usize,
}

impl Segment {
    pub fn range(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    /// Number of actions in the segment (never zero).
    pub fn action_count(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Split a plan into segments wherever `flow_name` changes.
///
/// Occurrences are counted per flow name, so a flow that reappears later in
/// the plan becomes `name#2`, `name#3`, ….
pub fn build_segments(actions: &[Action]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut occurrences: HashMap<&str, usize> = HashMap::new();

    let mut start = 0usize;
    for i in 1..=actions.len() {
        let boundary = i == actions.len() || actions[i].flow_name != actions[start].flow_name;
        if !boundary {
            continue;
        }
        let flow = actions[start].flow_name.as_str();
        let count = occurrences.entry(flow).or_insert(0);
        *count += 1;
        segments.push(Segment {
            name: format!("{flow}#{count}"),
            flow_name: flow.to_string(),
            first: start,
            last: i - 1,
        });
        start = i;
    }

    segments
}

// ── Tests ─────────────────────────────────────────────────────────────────────
