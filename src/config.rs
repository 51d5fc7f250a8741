use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use crate::tui::app::Intervals;

/// Interactive process and resource dashboard for Linux.
///
/// Keys: q quit, p/c/m sort by PID/CPU/MEM, arrows and PgUp/PgDn move,
/// k sends SIGTERM and K sends SIGKILL to the selected process, / filters by name.
#[derive(Debug, Parser)]
#[clap(name = "proctop", version)]
pub struct Opts {
    /// Pause between refreshes while browsing, in milliseconds.
    #[clap(short = 'i', long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// Pause between redraws while typing a filter, in milliseconds.
    #[clap(long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..))]
    pub filter_interval_ms: u64,

    /// Width of the NAME column; longer names are cut.
    #[clap(short = 'w', long, default_value = "20", value_parser = clap::value_parser!(u16).range(1..=255))]
    pub name_width: u16,

    /// Write log output to this file. The terminal belongs to the
    /// dashboard, so nothing is logged unless a file is given.
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose output, including debug and trace messages.
    /// Specify multiple times to increase verbosity.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Opts {
    pub fn intervals(&self) -> Intervals {
        Intervals {
            refresh: Duration::from_millis(self.interval_ms),
            filter: Duration::from_millis(self.filter_interval_ms),
        }
    }
}

pub fn init_logging(opts: &Opts) -> Result<()> {
    let Some(path) = &opts.log_file else {
        return Ok(());
    };

    let llv = match opts.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);

    let file = File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
    simplelog::WriteLogger::init(llv, lcfg.build(), file).context("Failed to install logger")?;
    Ok(())
}
