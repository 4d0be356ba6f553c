/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wire protocol codec.
//!
//! Pure functions: no state, no I/O.  Every outbound frame is a single
//! CRLF-terminated ASCII line.
//!
//! | Frame | Format |
//! |---|---|
//! | LED config | `LEDSET:<ledCount>,<onMs>,<gapMs>,<brightness>,<colorCount>[,<HEX6>]*` |
//! | Voice config | `VOICESET1:<announcer>,<style>,<speed>,<pitch>,<volume>` (and `VOICESET2`) |
//! | Buzzer config | `BEEPSET:<durationMs>,<freqHz>` |
//! | Segment | `WORK:<action>[;<action>]*;` |
//! | LED test | `LEDTEST:<colorIndex>` (0 = all off) |
//! | Buzzer test | `BEEPTEST` |
//! | Voice test | `VOICETEST:<hexbytes>,<style>` |
//! | Progress (inbound) | `SETPRUN:<currentStep>,<startTimeMs>` |
//!
//! WORK sub-frames are `LED,<order1..N>,<color1..N>`, `DELAY,<ms>`,
//! `VOICE,<hexbytes>,<style>` and `BEEP`.

pub mod framing;
pub mod text;

pub use framing::{Framed, LineBuffer, MAX_PENDING_BYTES};
pub use text::{escape_text, gbk_hex};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::action::{join_ints, Action, ActionBody, LedMode, VoiceSet};
use crate::config::{ColorTable, DeviceProps, VoiceProps};
use crate::resolver::align_colors;

/// Frame terminator.
pub const CRLF: &str = "\r\n";

const PROGRESS_PREFIX: &str = "SETPRUN:";

// ── Configuration frames ──────────────────────────────────────────────────────

pub fn pack_led_config(device: &DeviceProps, palette: &ColorTable) -> String {
    let mut out = format!(
        "LEDSET:{},{},{},{},{}",
        device.led_count,
        device.on_ms,
        device.gap_ms,
        device.brightness,
        palette.colors().len()
    );
    for item in palette.colors() {
        out.push(',');
        out.push_str(&item.rgb.to_hex6());
    }
    out.push_str(CRLF);
    out
}

/// `VOICESET1` for [`VoiceSet::One`], `VOICESET2` for [`VoiceSet::Two`].
pub fn pack_voice_config(set: VoiceSet, voice: &VoiceProps) -> String {
    format!(
        "VOICESET{}:{},{},{},{},{}{CRLF}",
        set.as_u8(),
        voice.announcer,
        voice.style,
        voice.speed,
        voice.pitch,
        voice.volume
    )
}

pub fn pack_beep_config(device: &DeviceProps) -> String {
    let (duration, freq) = (device.buzzer_dur_ms, device.buzzer_freq_hz);
    format!("BEEPSET:{duration},{freq}{CRLF}")
}

// ── WORK frame ────────────────────────────────────────────────────────────────

/// LED ordering field: a fresh permutation of `1..=led_count` for RAND, all
/// zeros otherwise.
pub fn led_order<R: Rng + ?Sized>(mode: LedMode, led_count: usize, rng: &mut R) -> Vec<u32> {
    match mode {
        LedMode::Rand => {
            let mut order: Vec<u32> = (1..=led_count as u32).collect();
            order.shuffle(rng);
            order
        }
        LedMode::All | LedMode::Seq => vec![0; led_count],
    }
}

/// Build the WORK frame for one segment's actions.  RAND orderings come from
/// the thread-local generator, so they differ between sends.
pub fn pack_work(actions: &[Action], device: &DeviceProps) -> String {
    pack_work_with_rng(actions, device, &mut rand::thread_rng())
}

pub fn pack_work_with_rng<R: Rng + ?Sized>(
    actions: &[Action],
    device: &DeviceProps,
    rng: &mut R,
) -> String {
    let led_count = device.led_count as usize;
    let parts: Vec<String> = actions
        .iter()
        .map(|action| match &action.body {
            ActionBody::Led { mode, colors } => format!(
                "LED,{},{}",
                join_ints(&led_order(*mode, led_count, &mut *rng)),
                join_ints(&align_colors(colors, led_count))
            ),
            ActionBody::Delay { ms } => format!("DELAY,{ms}"),
            ActionBody::Voice { text, voice_set } => {
                format!("VOICE,{},{}", gbk_hex(text), voice_set.as_u8())
            }
            ActionBody::Beep { .. } => "BEEP".to_string(),
        })
        .collect();
    format!("WORK:{};{CRLF}", parts.join(";"))
}

// ── Test frames ───────────────────────────────────────────────────────────────

/// Light every LED with palette colour `color_index` (0 = all off).
pub fn pack_test_solid(color_index: u32) -> String {
    format!("LEDTEST:{color_index}{CRLF}")
}

pub fn pack_test_all_off() -> String {
    pack_test_solid(0)
}

pub fn pack_beep_test() -> String {
    format!("BEEPTEST{CRLF}")
}

pub fn pack_voice_test(text: &str, set: VoiceSet) -> String {
    format!("VOICETEST:{},{}{CRLF}", gbk_hex(text), set.as_u8())
}

// ── Inbound ───────────────────────────────────────────────────────────────────

/// Decoded `SETPRUN` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current_step: i32,
    /// Device-side timestamp in milliseconds.
    pub device_ms: i64,
}

/// Decode a progress frame.  Anything malformed is `None`, never an error.
pub fn parse_setp_run(line: &str) -> Option<Progress> {
    let body = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = body.split(',');
    let current_step = fields.next()?.trim().parse().ok()?;
    let device_ms = fields.next()?.trim().parse().ok()?;
    Some(Progress {
        current_step,
        device_ms,
    })
}

/// Coarse frame family, used to tag log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Config,
    Work,
    Test,
    Progress,
    Unknown,
}

impl FrameKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameKind::Config => "CONFIG",
            FrameKind::Work => "WORK",
            FrameKind::Test => "TEST",
            FrameKind::Progress => "PROGRESS",
            FrameKind::Unknown => "UNKNOWN",
        }
    }
}

pub fn classify_frame(text: &str) -> FrameKind {
    let trimmed = text.trim();
    let head = trimmed.split(':').next().unwrap_or(trimmed);
    match head {
        "LEDSET" | "VOICESET1" | "VOICESET2" | "BEEPSET" => FrameKind::Config,
        "WORK" => FrameKind::Work,
        "LEDTEST" | "BEEPTEST" | "VOICETEST" => FrameKind::Test,
        "SETPRUN" => FrameKind::Progress,
        _ => FrameKind::Unknown,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn device(led_count: u32) -> DeviceProps {
        DeviceProps {
            led_count,
            ..DeviceProps::default()
        }
    }

    // ── Config frames ─────────────────────────────────────────────────────────

    #[test]
    fn led_config_lists_palette_hex() {
        let mut palette = ColorTable::default();
        palette.add_color(Rgb::new(0xff, 0, 0)).unwrap();
        palette.add_color(Rgb::new(0, 0x80, 0x0a)).unwrap();
        assert_eq!(
            pack_led_config(&DeviceProps::default(), &palette),
            "LEDSET:5,350,0,100,2,FF0000,00800A\r\n"
        );
    }

    #[test]
    fn led_config_with_empty_palette() {
        assert_eq!(
            pack_led_config(&device(3), &ColorTable::default()),
            "LEDSET:3,350,0,100,0\r\n"
        );
    }

    #[test]
    fn voice_configs_are_numbered_by_set() {
        let v = VoiceProps {
            announcer: 3,
            style: 2,
            speed: 6,
            pitch: 4,
            volume: 9,
        };
        assert_eq!(
            pack_voice_config(VoiceSet::One, &v),
            "VOICESET1:3,2,6,4,9\r\n"
        );
        assert_eq!(
            pack_voice_config(VoiceSet::Two, &v),
            "VOICESET2:3,2,6,4,9\r\n"
        );
    }

    #[test]
    fn beep_config_is_duration_then_frequency() {
        assert_eq!(
            pack_beep_config(&DeviceProps::default()),
            "BEEPSET:500,1500\r\n"
        );
    }

    // ── WORK ──────────────────────────────────────────────────────────────────

    #[test]
    fn seq_led_has_zero_order_field() {
        let actions = [Action::led("f", LedMode::Seq, vec![1, 2])];
        assert_eq!(pack_work(&actions, &device(2)), "WORK:LED,0,0,1,2;\r\n");
    }

    #[test]
    fn led_colors_are_aligned_to_device_count() {
        let actions = [Action::led("f", LedMode::All, vec![4])];
        assert_eq!(pack_work(&actions, &device(3)), "WORK:LED,0,0,0,4,0,0;\r\n");
    }

    #[test]
    fn rand_order_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let mut order = led_order(LedMode::Rand, 6, &mut rng);
            order.sort_unstable();
            assert_eq!(order, vec![1, 2, 3, 4, 5, 6]);
        }
    }

    #[test]
    fn seeded_rng_makes_rand_frame_reproducible() {
        let actions = [Action::led("f", LedMode::Rand, vec![1, 1, 1, 1])];
        let a = pack_work_with_rng(&actions, &device(4), &mut StdRng::seed_from_u64(7));
        let b = pack_work_with_rng(&actions, &device(4), &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.ends_with(",1,1,1,1;\r\n"), "{a}");
    }

    #[test]
    fn mixed_segment_joins_sub_frames() {
        let actions = [
            Action::led("f", LedMode::All, vec![1]),
            Action::beep("f", 0),
            Action::voice("f", "Hi", VoiceSet::Two),
            Action::delay("f", 250),
        ];
        assert_eq!(
            pack_work(&actions, &device(1)),
            "WORK:LED,0,1;BEEP;VOICE,48 69,2;DELAY,250;\r\n"
        );
    }

    // ── Test frames ───────────────────────────────────────────────────────────

    #[test]
    fn test_frames() {
        assert_eq!(pack_test_solid(3), "LEDTEST:3\r\n");
        assert_eq!(pack_test_all_off(), "LEDTEST:0\r\n");
        assert_eq!(pack_beep_test(), "BEEPTEST\r\n");
        assert_eq!(
            pack_voice_test("中", VoiceSet::One),
            "VOICETEST:D6 D0,1\r\n"
        );
    }

    // ── Inbound ───────────────────────────────────────────────────────────────

    #[test]
    fn setp_run_is_decoded() {
        assert_eq!(
            parse_setp_run("SETPRUN:3,120500\r\n"),
            Some(Progress {
                current_step: 3,
                device_ms: 120500,
            })
        );
    }

    #[test]
    fn malformed_progress_is_not_recognised() {
        assert_eq!(parse_setp_run("SETPRUN:3"), None);
        assert_eq!(parse_setp_run("SETPRUN:a,1"), None);
        assert_eq!(parse_setp_run("HELLO:1,2"), None);
        assert_eq!(parse_setp_run(""), None);
    }

    #[test]
    fn frames_are_classified_by_head() {
        assert_eq!(classify_frame("LEDSET:5,1,1,1,0"), FrameKind::Config);
        assert_eq!(classify_frame("VOICESET2:1,1,1,1,1"), FrameKind::Config);
        assert_eq!(classify_frame("WORK:BEEP;"), FrameKind::Work);
        assert_eq!(classify_frame("BEEPTEST\r\n"), FrameKind::Test);
        assert_eq!(classify_frame("SETPRUN:1,2"), FrameKind::Progress);
        assert_eq!(classify_frame("garbage"), FrameKind::Unknown);
    }
}
