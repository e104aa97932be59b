//! Leveled diagnostics on stderr. The level is process-wide and set
//! once from the command line; library code only reads it.

use std::sync::atomic::{AtomicU8, Ordering};

use anyhow::{bail, Result};

// Do *not* make the fields public here to force going through `TryFrom`.
#[derive(Debug, Default, clap::Args)]
pub struct LogLevelOpt {
    /// Show which files are read and written
    #[clap(short, long)]
    verbose: bool,

    /// Show information that helps debug this program, e.g. how
    /// timing files were paired with metadata files (implies
    /// `--verbose`)
    #[clap(short, long)]
    debug: bool,

    /// Disable warnings (e.g. about timing files without metadata).
    /// Conflicts with `--verbose` and `--debug`.
    #[clap(short, long)]
    quiet: bool,
}

impl TryFrom<LogLevelOpt> for LogLevel {
    type Error = anyhow::Error;

    fn try_from(value: LogLevelOpt) -> Result<Self> {
        let LogLevelOpt {
            verbose,
            debug,
            quiet,
        } = value;
        match (verbose, debug, quiet) {
            (false, false, false) => Ok(LogLevel::Warn),
            (true, false, false) => Ok(LogLevel::Info),
            (_, true, false) => Ok(LogLevel::Debug),
            (false, false, true) => Ok(LogLevel::Quiet),
            (_, _, true) => {
                bail!("option `--quiet` conflicts with the options `--verbose` and `--debug`")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Only fatal errors and report diagnostics
    Quiet = 0,
    /// The default: `warn!` statements are shown
    Warn = 1,
    /// What is being read and written
    Info = 2,
    /// Internals, for debugging this program
    Debug = 3,
}

impl LogLevel {
    fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(LogLevel::Quiet),
            1 => Some(LogLevel::Warn),
            2 => Some(LogLevel::Info),
            3 => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

static LOGLEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

pub fn set_log_level(val: LogLevel) {
    LOGLEVEL.store(val as u8, Ordering::Relaxed);
}

#[inline]
pub fn log_level() -> LogLevel {
    let level = LOGLEVEL.load(Ordering::Relaxed);
    LogLevel::from_level(level).expect("only valid levels are ever stored")
}

#[macro_export]
macro_rules! warn {
    { $($arg:tt)* } => {
        if $crate::utillib::logging::log_level() >= $crate::utillib::logging::LogLevel::Warn {
            eprintln!("W: {}", format_args!($($arg)*));
        }
    }
}

#[macro_export]
macro_rules! info {
    { $($arg:tt)* } => {
        if $crate::utillib::logging::log_level() >= $crate::utillib::logging::LogLevel::Info {
            eprintln!("I: {}", format_args!($($arg)*));
        }
    }
}

#[macro_export]
macro_rules! debug {
    { $($arg:tt)* } => {
        if $crate::utillib::logging::log_level() >= $crate::utillib::logging::LogLevel::Debug {
            eprintln!("D: {}", format_args!($($arg)*));
        }
    }
}

/// A diagnostic about the requested output itself (e.g. why a report
/// was not produced). Shown at every level, including `--quiet`.
#[macro_export]
macro_rules! diagnostic {
    { $($arg:tt)* } => {
        eprintln!("{}", format_args!($($arg)*));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_levels() {
        for i in 0..=3 {
            let level = LogLevel::from_level(i).unwrap();
            assert_eq!(level as u8, i);
        }
        assert!(LogLevel::from_level(4).is_none());
        assert!(LogLevel::Debug > LogLevel::Info);
        assert!(LogLevel::Quiet < LogLevel::Warn);
    }

    #[test]
    fn t_opt_conflicts() {
        let opt = LogLevelOpt {
            verbose: true,
            debug: false,
            quiet: true,
        };
        assert!(LogLevel::try_from(opt).is_err());
        let opt = LogLevelOpt {
            verbose: true,
            debug: true,
            quiet: false,
        };
        assert_eq!(LogLevel::try_from(opt).unwrap(), LogLevel::Debug);
        assert_eq!(
            LogLevel::try_from(LogLevelOpt::default()).unwrap(),
            LogLevel::Warn
        );
    }
}
