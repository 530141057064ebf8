//! Diagnostics hook.
//!
//! The engine never logs through global state of its own. A [`GdiLogger`] is
//! handed to [`Gdi`](super::Gdi) at construction; the default forwards to the
//! `log` facade under the `rgdi` target.

use log::Level;
use std::fmt;

/// Receiver for engine diagnostics.
pub trait GdiLogger {
    fn log(&self, level: Level, args: fmt::Arguments<'_>);

    /// Cheap pre-check so callers can skip formatting.
    fn enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }
}

/// Forwards to the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl GdiLogger for LogFacade {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: "rgdi", level, "{}", args);
    }

    fn enabled(&self, level: Level) -> bool {
        log::log_enabled!(target: "rgdi", level)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl GdiLogger for NullLogger {
    fn log(&self, _level: Level, _args: fmt::Arguments<'_>) {}

    fn enabled(&self, _level: Level) -> bool {
        false
    }
}

impl<L: GdiLogger + ?Sized> GdiLogger for std::rc::Rc<L> {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        (**self).log(level, args)
    }

    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }
}

/// Log through a [`GdiLogger`], formatting only when the level is enabled.
macro_rules! gdi_log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log(level, format_args!($($arg)+));
        }
    }};
}

pub(crate) use gdi_log;

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Keeps every message for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingLogger {
        pub records: RefCell<Vec<(Level, String)>>,
    }

    impl RecordingLogger {
        pub fn messages_at(&self, level: Level) -> Vec<String> {
            self.records
                .borrow()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl GdiLogger for RecordingLogger {
        fn log(&self, level: Level, args: fmt::Arguments<'_>) {
            self.records.borrow_mut().push((level, args.to_string()));
        }
    }
}
