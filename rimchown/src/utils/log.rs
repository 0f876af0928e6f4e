// SPDX-License-Identifier: MIT

//! `log` backend for the CLI: `[rimchown] <level> <message>` on stderr.

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct RimLogger;

static LOGGER: RimLogger = RimLogger;

impl Log for RimLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[rimchown] {} {}", level_tag(record.level()), record.args());
        }
    }

    fn flush(&self) {}
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Error => "error".red().bold(),
        Level::Warn => "warn".yellow(),
        Level::Info => "info".green(),
        Level::Debug => "debug".blue(),
        Level::Trace => "trace".dimmed(),
    }
}

/// `-q` wins over `-v`; each `-v` adds one level above `Info`.
pub fn level_filter(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(filter: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(filter);
    Ok(())
}
