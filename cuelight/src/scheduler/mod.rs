/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Segment-by-segment plan execution.
//!
//! [`SegmentScheduler`] owns a resolved plan, splits it into [`Segment`]s
//! and sends one WORK frame per [`advance()`](SegmentScheduler::advance).
//!
//! # State machine
//! ```text
//! Idle ──load_plan──► Idle(ready) ──advance──► SegmentRunning ──frame sent──► Idle
//! ```
//! Only one segment is ever in flight.  The protocol has no per-action
//! acknowledgment, so a segment completes synchronously inside `advance()`;
//! real device progress arrives later as `SETPRUN` frames via
//! [`on_frame_received()`](SegmentScheduler::on_frame_received).
//!
//! # Threading
//! No internal locking.  A multi-threaded host must serialise calls (single
//! writer).  Observers read [`SchedulerEvent`]s from the `crossbeam-channel`
//! receiver returned by [`SegmentScheduler::new`].
//!
//! # Settings
//! Device, voice and palette settings are passed into each call by
//! reference; the scheduler never stores them.

pub mod clock;
pub mod error;
pub mod runlog;

pub use clock::{DeviceTimeBase, HostClock, ManualClock, MonotonicClock};
pub use error::RunError;
pub use runlog::{format_log_line, Direction, LogKind, RunLog};

use std::path::Path;

use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::action::{build_segments, Action, ActionKind, Segment, VoiceSet};
use crate::config::{DeviceProps, Settings};
use crate::protocol::{self, Framed, LineBuffer, Progress};
use crate::transport::Transport;

// ── Events ────────────────────────────────────────────────────────────────────

/// Notification for the presentation layer.  Action indices refer to the
/// loaded plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    Idle,
    SegmentStarted {
        index: usize,
        name: String,
        first_action: usize,
        last_action: usize,
    },
    ActionStarted {
        action_index: usize,
        kind: ActionKind,
        params: String,
    },
    ActionFinished {
        action_index: usize,
        ok: bool,
        code: i32,
        message: String,
    },
    ProgressUpdated {
        current_step: i32,
        device_ms: i64,
    },
    RerunMarked {
        flow_name: String,
    },
    LogLine(String),
}

// ── Run state ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    SegmentRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunState {
    pub phase: Phase,
    /// Most recently started segment (`None` = nothing started yet).
    pub current_segment: Option<usize>,
    /// Segment to run next, ahead of forward progress.
    pub marked_rerun: Option<usize>,
}

// ── SegmentScheduler ──────────────────────────────────────────────────────────

pub struct SegmentScheduler<C: HostClock = MonotonicClock> {
    actions: Vec<Action>,
    segments: Vec<Segment>,
    state: RunState,
    time_base: Option<DeviceTimeBase>,
    clock: C,
    run_log: RunLog,
    rx_buffer: LineBuffer,
    events: Sender<SchedulerEvent>,
}

impl SegmentScheduler<MonotonicClock> {
    /// Scheduler on the monotonic host clock.
    pub fn with_monotonic_clock() -> (Self, Receiver<SchedulerEvent>) {
        Self::new(MonotonicClock::new())
    }
}

impl<C: HostClock> SegmentScheduler<C> {
    /// Create an idle scheduler with no plan.  The returned receiver is the
    /// single consumer of [`SchedulerEvent`]s.
    pub fn new(clock: C) -> (Self, Receiver<SchedulerEvent>) {
        let (events, rx) = unbounded();
        let scheduler = Self {
            actions: Vec::new(),
            segments: Vec::new(),
            state: RunState::default(),
            time_base: None,
            clock,
            run_log: RunLog::disabled(),
            rx_buffer: LineBuffer::new(),
            events,
        };
        (scheduler, rx)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn plan(&self) -> &[Action] {
        &self.actions
    }

    pub fn has_plan(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn time_base(&self) -> Option<DeviceTimeBase> {
        self.time_base
    }

    pub fn run_log(&self) -> &RunLog {
        &self.run_log
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    // ── Plan lifecycle ────────────────────────────────────────────────────────

    /// Take ownership of a resolved plan, rebuild segments and reset.
    pub fn load_plan(&mut self, actions: Vec<Action>) {
        self.segments = build_segments(&actions);
        self.actions = actions;
        info!(
            actions = self.actions.len(),
            segments = self.segments.len(),
            "plan loaded"
        );
        self.reset();
    }

    /// Clear run state and rerun mark.  The loaded plan is kept.
    pub fn reset(&mut self) {
        self.state = RunState::default();
        self.emit(SchedulerEvent::Idle);
    }

    /// Start a new run: restart the host clock, forget the device time base
    /// and open a fresh run log under `log_dir`.
    pub fn begin_run(&mut self, log_dir: &Path) {
        self.clock.restart();
        self.time_base = None;
        self.rx_buffer.reset();
        self.run_log = match RunLog::create(log_dir, Local::now()) {
            Ok(log) => {
                if let Some(path) = log.path() {
                    info!(path = %path.display(), "run log opened");
                }
                log
            }
            Err(e) => {
                warn!(dir = %log_dir.display(), error = %e, "run log unavailable, events only");
                self.emit(SchedulerEvent::LogLine(format!(
                    "run log could not be created in {}: {}",
                    log_dir.display(),
                    e
                )));
                RunLog::disabled()
            }
        };
    }

    // ── Advance ───────────────────────────────────────────────────────────────

    /// Segment the next `advance()` would run.  A marked rerun preempts
    /// forward progress.
    pub fn pick_next(&self) -> Option<usize> {
        if let Some(marked) = self.state.marked_rerun.filter(|&m| m < self.segments.len()) {
            return Some(marked);
        }
        let next = self.state.current_segment.map_or(0, |c| c + 1);
        (next < self.segments.len()).then_some(next)
    }

    /// Send the next segment.
    ///
    /// Returns `Ok(Some(index))` for the segment sent, `Ok(None)` once the
    /// plan is exhausted.  On error nothing is consumed, so a retry sends the
    /// same segment.
    pub fn advance<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        device: &DeviceProps,
    ) -> Result<Option<usize>, RunError> {
        self.advance_with_rng(transport, device, &mut rand::thread_rng())
    }

    /// [`advance()`](Self::advance) with an explicit generator for RAND
    /// orderings.
    pub fn advance_with_rng<T: Transport + ?Sized, R: Rng + ?Sized>(
        &mut self,
        transport: &mut T,
        device: &DeviceProps,
        rng: &mut R,
    ) -> Result<Option<usize>, RunError> {
        if self.segments.is_empty() {
            return Err(RunError::NoPlan);
        }
        if !transport.is_open() {
            self.log(Direction::Tx, LogKind::Error, None, "transport not open");
            return Err(RunError::TransportNotOpen);
        }

        let Some(index) = self.pick_next() else {
            self.log(Direction::Tx, LogKind::Work, None, "no next segment");
            self.emit(SchedulerEvent::Idle);
            return Ok(None);
        };

        let segment = self.segments[index].clone();
        let frame = protocol::pack_work_with_rng(&self.actions[segment.range()], device, rng);

        self.state.phase = Phase::SegmentRunning;
        self.emit(SchedulerEvent::SegmentStarted {
            index,
            name: segment.name.clone(),
            first_action: segment.first,
            last_action: segment.last,
        });
        for i in segment.range() {
            let action = &self.actions[i];
            let started = SchedulerEvent::ActionStarted {
                action_index: i,
                kind: action.kind(),
                params: action.params(),
            };
            self.emit(started);
        }

        self.log_frame(Direction::Tx, Some(index), &frame);
        if let Err(e) = transport.send(&frame) {
            warn!(segment = %segment.name, error = %e, "WORK frame not sent");
            self.log(Direction::Tx, LogKind::Error, Some(index), &e.to_string());
            for i in segment.range() {
                self.emit(SchedulerEvent::ActionFinished {
                    action_index: i,
                    ok: false,
                    code: -1,
                    message: e.to_string(),
                });
            }
            self.state.phase = Phase::Idle;
            self.emit(SchedulerEvent::Idle);
            return Err(RunError::Send(e));
        }

        if self.state.marked_rerun == Some(index) {
            self.state.marked_rerun = None;
        }
        self.state.current_segment = Some(index);

        for i in segment.range() {
            self.emit(SchedulerEvent::ActionFinished {
                action_index: i,
                ok: true,
                code: 0,
                message: "OK".to_string(),
            });
        }
        self.state.phase = Phase::Idle;
        self.emit(SchedulerEvent::Idle);

        debug!(
            segment = %segment.name,
            index,
            actions = segment.action_count(),
            "segment sent"
        );
        Ok(Some(index))
    }

    // ── Rerun ─────────────────────────────────────────────────────────────────

    /// Mark the running segment, or the last completed one, to run again on
    /// the next `advance()`.  Returns the marked index, or `None` if nothing
    /// has run yet.
    pub fn mark_rerun(&mut self) -> Option<usize> {
        let target = self
            .state
            .current_segment
            .filter(|&c| c < self.segments.len())?;
        self.state.marked_rerun = Some(target);

        let flow_name = self.segments[target].flow_name.clone();
        info!(segment = %self.segments[target].name, "segment marked for rerun");
        self.emit(SchedulerEvent::RerunMarked { flow_name });
        Some(target)
    }

    // ── Configuration and test frames ─────────────────────────────────────────

    /// Send `LEDSET`, `VOICESET1`, `VOICESET2` and `BEEPSET`.
    pub fn send_configs<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        settings: &Settings,
    ) -> Result<(), RunError> {
        if !transport.is_open() {
            self.log(Direction::Tx, LogKind::Error, None, "transport not open");
            return Err(RunError::TransportNotOpen);
        }

        let frames = [
            protocol::pack_led_config(&settings.device, &settings.palette),
            protocol::pack_voice_config(VoiceSet::One, &settings.voice1),
            protocol::pack_voice_config(VoiceSet::Two, &settings.voice2),
            protocol::pack_beep_config(&settings.device),
        ];
        for frame in &frames {
            if let Err(e) = transport.send(frame) {
                warn!(error = %e, "config frame not sent");
                let failed = format!("{}: {e}", frame.trim());
                self.log(Direction::Tx, LogKind::Error, None, &failed);
                return Err(RunError::Send(e));
            }
            self.log_frame(Direction::Tx, None, frame);
        }
        Ok(())
    }

    /// Record an ad-hoc test frame sent by the host.
    pub fn log_test_tx(&mut self, frame: &str) {
        self.log(Direction::Tx, LogKind::Test, None, frame);
    }

    // ── Inbound ───────────────────────────────────────────────────────────────

    /// Feed raw inbound bytes.  Each completed line goes through
    /// [`on_frame_received()`](Self::on_frame_received); the progress reports
    /// among them are returned in arrival order.
    pub fn on_bytes_received(&mut self, bytes: &[u8]) -> Vec<Progress> {
        let mut reports = Vec::new();
        for framed in self.rx_buffer.push(bytes) {
            match framed {
                Framed::Line(line) => reports.extend(self.on_frame_received(&line)),
                Framed::Overflow { discarded } => {
                    warn!(discarded, "inbound line too long, dropped");
                    let segment = self.state.current_segment;
                    let note = format!("{discarded} bytes without line end dropped");
                    self.log(Direction::Rx, LogKind::Error, segment, &note);
                }
            }
        }
        reports
    }

    /// Handle one inbound line.  Every line is logged; `SETPRUN` reports also
    /// anchor the device time base (first one per run) and emit
    /// [`SchedulerEvent::ProgressUpdated`].
    pub fn on_frame_received(&mut self, text: &str) -> Option<Progress> {
        self.log_frame(Direction::Rx, self.state.current_segment, text);

        let progress = protocol::parse_setp_run(text)?;
        if self.time_base.is_none() {
            let base = DeviceTimeBase {
                device_base_ms: progress.device_ms,
                host_base_elapsed_ms: self.clock.elapsed_ms(),
            };
            debug!(
                device_base_ms = base.device_base_ms,
                host_base_elapsed_ms = base.host_base_elapsed_ms,
                "device time base set"
            );
            self.time_base = Some(base);
        }
        self.emit(SchedulerEvent::ProgressUpdated {
            current_step: progress.current_step,
            device_ms: progress.device_ms,
        });
        Some(progress)
    }

    /// Projected device clock, or `-1` before the first progress report.
    pub fn now_device_ms(&self) -> i64 {
        self.time_base
            .map_or(-1, |base| base.project(self.clock.elapsed_ms()))
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn emit(&self, event: SchedulerEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.events.send(event);
    }

    /// Log a protocol frame under the kind its header names.
    fn log_frame(&mut self, direction: Direction, segment: Option<usize>, frame: &str) {
        let kind = LogKind::from(protocol::classify_frame(frame));
        self.log(direction, kind, segment, frame);
    }

    fn log(&mut self, direction: Direction, kind: LogKind, segment: Option<usize>, payload: &str) {
        let line = format_log_line(self.now_device_ms(), direction, kind, segment, payload);
        if let Err(e) = self.run_log.write_line(&line) {
            warn!(error = %e, "run log write failed, events only");
        }
        self.emit(SchedulerEvent::LogLine(line));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
