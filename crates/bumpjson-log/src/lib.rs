//! A minimal, zero-dependency logging facade for the `bumpjson` crates.
//!
//! The arena and the decoders report noteworthy events (chunk growth,
//! exhausted fixed arenas, failed decodes) through these macros. Nothing is
//! printed unless the configured level lets it through, and logging never
//! changes library behavior.
//!
//! # Example
//!
//! ```
//! use bumpjson_log::{debug, info, Level};
//!
//! bumpjson_log::set_level(Level::Debug);
//!
//! info!("decoded {} bytes", 42);
//! debug!("arena grew to {} chunks", 3);
//! ```
//!
//! The level can also come from the environment:
//!
//! ```
//! // BUMPJSON_LOG=trace cargo test
//! bumpjson_log::init_from_env();
//! ```

use std::fmt::{self, Arguments};
use std::io::{IsTerminal, Write};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Environment variable read by [`init_from_env`].
pub const ENV_VAR: &str = "BUMPJSON_LOG";

/// Severity of a log record.
///
/// Lower numeric values are more severe; a logger set to `Info` emits
/// `Error`, `Warn` and `Info` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Failures the caller should know about.
    Error = 0,
    /// Suspicious but recoverable situations.
    Warn = 1,
    /// High level progress.
    Info = 2,
    /// Diagnostic detail (arena growth, decode failures).
    Debug = 3,
    /// Everything, including per-allocation refusals.
    Trace = 4,
}

impl Level {
    const ALL: [Level; 5] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Returns the upper-case name of this level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Level`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid log level: {:?}", self.input)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name case-insensitively.
    ///
    /// ```
    /// use bumpjson_log::Level;
    ///
    /// assert_eq!("debug".parse::<Level>(), Ok(Level::Debug));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseLevelError {
                input: s.to_string(),
            })
    }
}

/// The process-wide logger.
///
/// Obtained through [`logger`]; the level and color switch are atomics so
/// any thread may reconfigure it.
pub struct Logger {
    level: AtomicU8,
    color: AtomicBool,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
            color: AtomicBool::new(false),
        }
    }

    /// Sets the most verbose level that will be emitted.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    /// Returns the current level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Turns ANSI colors on or off.
    pub fn set_color(&self, enabled: bool) {
        self.color.store(enabled, Ordering::Relaxed);
    }

    /// Returns `true` if a record at `level` would be written.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }

    fn write_record(&self, level: Level, target: &str, args: Arguments<'_>) {
        const RESET: &str = "\x1b[0m";

        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        // A failed write to stderr has nowhere better to go.
        let _ = if self.color.load(Ordering::Relaxed) {
            writeln!(out, "{}[{level}]{RESET} {target}: {args}", level.color_code())
        } else {
            writeln!(out, "[{level}] {target}: {args}")
        };
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, creating it at `Level::Info` on first use.
pub fn logger() -> &'static Logger {
    LOGGER.get_or_init(|| {
        let logger = Logger::new(Level::Info);
        logger.set_color(std::io::stderr().is_terminal());
        logger
    })
}

/// Sets the global level.
pub fn set_level(level: Level) {
    logger().set_level(level);
}

/// Sets the global level from its name.
///
/// ```
/// bumpjson_log::set_level_from_str("trace").unwrap();
/// assert_eq!(bumpjson_log::logger().level(), bumpjson_log::Level::Trace);
/// ```
pub fn set_level_from_str(s: &str) -> Result<(), ParseLevelError> {
    set_level(s.parse()?);
    Ok(())
}

/// Configures the global level from [`ENV_VAR`].
///
/// Returns the level that was applied, or `None` if the variable is unset
/// or does not name a level (the current level is kept in that case).
pub fn init_from_env() -> Option<Level> {
    let raw = std::env::var(ENV_VAR).ok()?;
    let level = raw.parse::<Level>().ok()?;
    set_level(level);
    Some(level)
}

#[doc(hidden)]
pub fn __log(level: Level, target: &str, args: Arguments<'_>) {
    let logger = logger();
    if logger.enabled(level) {
        logger.write_record(level, target, args);
    }
}

/// Logs a record at an explicit level, tagged with the caller's module path.
///
/// ```
/// use bumpjson_log::{log, Level};
///
/// log!(Level::Info, "arena capacity is {} bytes", 512);
/// ```
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if $crate::logger().enabled(level) {
            $crate::__log(level, module_path!(), format_args!($($arg)+));
        }
    }};
}

/// Returns `true` if records at the given level are currently emitted.
///
/// Useful to skip building expensive log arguments.
#[macro_export]
macro_rules! log_enabled {
    ($level:expr) => {
        $crate::logger().enabled($level)
    };
}

/// Logs at [`Level::Error`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => { $crate::log!($crate::Level::Error, $($arg)+) };
}

/// Logs at [`Level::Warn`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => { $crate::log!($crate::Level::Warn, $($arg)+) };
}

/// Logs at [`Level::Info`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => { $crate::log!($crate::Level::Info, $($arg)+) };
}

/// Logs at [`Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => { $crate::log!($crate::Level::Debug, $($arg)+) };
}

/// Logs at [`Level::Trace`].
#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => { $crate::log!($crate::Level::Trace, $($arg)+) };
}
