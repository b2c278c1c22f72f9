//! Process-wide logger writing to standard error.
//!
//! Plain lines on stderr keep stdout free for rendered state views.

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        eprintln!("[{:5}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// Installs the stderr logger and sets the level filter.
///
/// Only the first call takes effect; later calls leave the installed
/// logger and its level alone.
pub fn install(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        });
    }
}
