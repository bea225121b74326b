use std::sync::{Mutex, OnceLock, atomic::{AtomicI8, Ordering}};

use core::str::FromStr;

use termcolor::{WriteColor, StandardStream, ColorChoice};

pub use termcolor::{ColorSpec, Color};

use crate::{LogConfig, LogError, LogFmt, LogFmtBuilder, Result};

use crate::fmt::SegmentSpec;

#[repr(i8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl Level {

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl FromStr for Level {

    type Err = ();

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("error") {
            Ok(Self::Error)
        } else if s.eq_ignore_ascii_case("warn") {
            Ok(Self::Warn)
        } else if s.eq_ignore_ascii_case("info") {
            Ok(Self::Info)
        } else if s.eq_ignore_ascii_case("debug") {
            Ok(Self::Debug)
        } else if s.eq_ignore_ascii_case("trace") {
            Ok(Self::Trace)
        } else {
            Err(())
        }
    }
}

pub(crate) struct Logger<W: WriteColor> {
    out: W,
    error_fmt: LogFmt,
    warn_fmt: LogFmt,
    info_fmt: LogFmt,
    debug_fmt: LogFmt,
    trace_fmt: LogFmt,
    config: LogConfig,
}

impl<W: WriteColor> Logger<W> {

    fn new(out: W, config: LogConfig) -> Self {
        Self {
            out,
            error_fmt: LogFmt::for_level(Level::Error),
            warn_fmt: LogFmt::for_level(Level::Warn),
            info_fmt: LogFmt::for_level(Level::Info),
            debug_fmt: LogFmt::for_level(Level::Debug),
            trace_fmt: LogFmt::for_level(Level::Trace),
            config,
        }
    }

    fn fmt_mut(&mut self, level: Level) -> &mut LogFmt {
        match level {
            Level::Error => &mut self.error_fmt,
            Level::Warn => &mut self.warn_fmt,
            Level::Info => &mut self.info_fmt,
            Level::Debug => &mut self.debug_fmt,
            Level::Trace => &mut self.trace_fmt,
        }
    }

    fn log(&mut self, target: &str, level: Level, msg: core::fmt::Arguments) -> Result<bool> {
        if self.config.target_level(target) < level {
            return Ok(false)
        }
        let fmt = match level {
            Level::Error => &self.error_fmt,
            Level::Warn => &self.warn_fmt,
            Level::Info => &self.info_fmt,
            Level::Debug => &self.debug_fmt,
            Level::Trace => &self.trace_fmt,
        };
        for segment in fmt {
            let (spec, text) = match segment {
                SegmentSpec::Message(spec) => (spec, None),
                SegmentSpec::Target(spec) => (spec, Some(target)),
                SegmentSpec::Text(text, spec) => (spec, Some(text.as_str())),
            };
            if let Some(color_spec) = &spec.color_spec {
                self.out.set_color(color_spec)?;
            }
            match text {
                Some(text) => self.out.write_all(text.as_bytes())?,
                None => write!(self.out, "{}", msg)?,
            }
            if spec.color_spec.is_some() {
                self.out.reset()?;
            }
        }
        self.out.write_all(b"\n")?;
        Ok(true)
    }
}

static LOGGER: OnceLock<Mutex<Logger<StandardStream>>> = OnceLock::new();

/// Most verbose level enabled for any target, `-1` until initialized.
static MAX_LEVEL: AtomicI8 = AtomicI8::new(-1);

/// Initializes the global logger from `RUST_LOG`. Calling it again is a no-op.
pub fn init() {
    init_with(LogConfig::from_env())
}

pub fn init_with(config: LogConfig) {
    let max_level = config.max_level();
    let logger = Logger::new(StandardStream::stderr(ColorChoice::Auto), config);
    if LOGGER.set(Mutex::new(logger)).is_ok() {
        MAX_LEVEL.store(max_level as i8, Ordering::Relaxed);
    }
}

/// Cheap check that skips formatting when no target has `level` enabled.
#[inline(always)]
pub fn enabled(level: Level) -> bool {
    level as i8 <= MAX_LEVEL.load(Ordering::Relaxed)
}

/// Replaces the output format of `level`.
pub fn set_fmt(level: Level, mut f: impl FnMut(&mut LogFmtBuilder)) -> Result<()> {
    let mut logger = LOGGER
        .get()
        .ok_or(LogError::Uninitialized)?
        .lock()
        .map_err(|_| LogError::Poisoned)?;
    let mut builder = LogFmtBuilder::new(logger.fmt_mut(level));
    f(&mut builder);
    Ok(())
}

#[inline(always)]
pub fn log(target: &str, level: Level, args: core::fmt::Arguments) -> Result<bool> {
    if !enabled(level) {
        return Ok(false)
    }
    LOGGER
        .get()
        .ok_or(LogError::Uninitialized)?
        .lock()
        .map_err(|_| LogError::Poisoned)?
        .log(target, level, args)
}

#[macro_export]
macro_rules! error {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Error, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! warn {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Warn, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! info {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Info, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! debug {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Debug, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! trace {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::log(module_path!(), $crate::Level::Trace, format_args!($fmt, $($arg),*))
            .unwrap_or(false)
    };
}
