/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! cuelight – sheet-driven indicator device controller
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── action       – Action / Segment data model
//! ├── config/      – YAML settings, palette and conflict table
//! ├── table/       – workflow sheet import (recurring headers, blocks)
//! ├── resolver/    – wildcard colour resolution with conflict backtracking
//! ├── protocol/    – wire frame codec, GBK voice payloads, line framing
//! ├── transport    – outbound frame sink collaborator
//! └── scheduler/   – segment execution, rerun, device clock, run log
//! ```
//!
//! Data flow:
//!
//! ```text
//! Grid ─► table::parse ─► resolver::resolve ─► SegmentScheduler ─► protocol ─► Transport
//!                                                     ▲
//!                                  on_frame_received ─┘ (SETPRUN progress)
//! ```

pub mod action;
pub mod config;
pub mod protocol;
pub mod resolver;
pub mod scheduler;
pub mod table;
pub mod transport;
