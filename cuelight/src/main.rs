/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use cuelight::config::{SettingsStore, YamlSettingsStore};
use cuelight::resolver::ColorResolver;
use cuelight::scheduler::{SchedulerEvent, SegmentScheduler};
use cuelight::table::{self, Grid};
use cuelight::transport::{MemoryTransport, Transport, WriterTransport};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Run a workflow sheet on an LED / buzzer / voice indicator device.
///
/// Example:
///   cuelight --settings settings.yaml --plan plan.tsv --port /dev/ttyUSB0
#[derive(Debug, Parser)]
#[command(
    name = "cuelight",
    about = "Sheet-driven indicator device controller",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML settings file (device, voices, palette, conflicts).
    #[arg(short = 's', long = "settings", default_value = "settings.yaml")]
    settings: PathBuf,

    /// Tab-separated workflow sheet.  Defaults to the last imported plan.
    #[arg(short = 'p', long = "plan")]
    plan: Option<PathBuf>,

    /// Directory for per-run log files.
    #[arg(short = 'l', long = "log-dir", default_value = "logs")]
    log_dir: PathBuf,

    /// Already-configured serial device to write frames to.  Without it the
    /// run is a dry run and frames are printed.
    #[arg(long = "port")]
    port: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(
        settings = %cli.settings.display(),
        plan     = ?cli.plan,
        log_dir  = %cli.log_dir.display(),
        port     = ?cli.port,
        "Configuration"
    );

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let store = YamlSettingsStore::new(&cli.settings);
    let mut settings = store.load()?;

    let plan_path = cli
        .plan
        .clone()
        .or_else(|| settings.last_plan_path.clone())
        .context("No plan given (--plan) and no previously imported plan in settings")?;

    // ── Import and resolve ────────────────────────────────────────────────────
    let grid = read_grid(&plan_path)?;
    let parsed = table::parse(&grid)
        .with_context(|| format!("Failed to import {}", plan_path.display()))?;

    let unknown = parsed.unknown_colors(&settings.palette);
    if !unknown.is_empty() {
        warn!(colors = ?unknown, "plan uses colours missing from the palette");
    }

    let led_count = settings.device.led_count as usize;
    if parsed.led_count() != led_count {
        warn!(
            sheet = parsed.led_count(),
            device = led_count,
            "sheet LED columns differ from device LED count, aligning to device"
        );
    }

    let resolver = ColorResolver::new(&settings.palette, led_count);
    let failures = resolver.diagnose(&parsed.actions);
    if !failures.is_empty() {
        for f in &failures {
            error!("{}", f);
        }
        anyhow::bail!("{} LED action(s) cannot be resolved", failures.len());
    }
    let resolved = resolver.resolve(&parsed.actions)?;

    if settings.last_plan_path.as_deref() != Some(plan_path.as_path()) {
        settings.last_plan_path = Some(plan_path.clone());
        if let Err(e) = store.save(&settings) {
            warn!("Could not remember plan path: {:#}", e);
        }
    }

    // ── Execute ───────────────────────────────────────────────────────────────
    let (mut scheduler, events) = SegmentScheduler::with_monotonic_clock();
    scheduler.load_plan(resolved);
    scheduler.begin_run(&cli.log_dir);

    match &cli.port {
        Some(port) => {
            let file = OpenOptions::new()
                .write(true)
                .open(port)
                .with_context(|| format!("Cannot open port {}", port.display()))?;
            let mut transport = WriterTransport::new(file);
            execute(&mut scheduler, &mut transport, &settings)?;
        }
        None => {
            let mut transport = MemoryTransport::new();
            execute(&mut scheduler, &mut transport, &settings)?;
            for frame in transport.sent() {
                print!("{frame}");
            }
        }
    }

    for event in events.try_iter() {
        if let SchedulerEvent::LogLine(line) = event {
            info!("{}", line);
        }
    }
    Ok(())
}

fn read_grid(path: &Path) -> Result<Grid> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read plan file: {}", path.display()))?;
    Ok(Grid::from_tsv(&text))
}

fn execute<T: Transport>(
    scheduler: &mut SegmentScheduler,
    transport: &mut T,
    settings: &cuelight::config::Settings,
) -> Result<()> {
    scheduler.send_configs(&mut *transport, settings)?;
    let device = &settings.device;
    let mut sent = 0usize;
    while scheduler.advance(&mut *transport, device)?.is_some() {
        sent += 1;
    }
    info!(segments = sent, "run finished");
    Ok(())
}
