/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Host-side elapsed clocks and device-time projection.

use std::time::Instant;

/// Monotonic host clock, restarted once per run.
pub trait HostClock {
    /// Milliseconds since the last `restart()`.
    fn elapsed_ms(&self) -> i64;
    fn restart(&mut self);
}

/// [`HostClock`] backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    started: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for MonotonicClock {
    fn elapsed_ms(&self) -> i64 {
        i64::try_from(self.started.elapsed().as_millis()).unwrap_or(i64::MAX)
    }

    fn restart(&mut self) {
        self.started = Instant::now();
    }
}

/// Hand-driven clock for simulations and tests.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: i64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: i64) {
        self.now_ms += ms;
    }
}

impl HostClock for ManualClock {
    fn elapsed_ms(&self) -> i64 {
        self.now_ms
    }

    fn restart(&mut self) {
        self.now_ms = 0;
    }
}

/// Anchor pairing the first reported device time of a run with the host
/// clock reading at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTimeBase {
    pub device_base_ms: i64,
    pub host_base_elapsed_ms: i64,
}

impl DeviceTimeBase {
    /// Project the device clock at host reading `host_now_ms`.
    pub fn project(&self, host_now_ms: i64) -> i64 {
        self.device_base_ms + (host_now_ms - self.host_base_elapsed_ms)
    }
}
