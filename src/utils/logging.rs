use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

const CRATE_TARGET: &str = "askdb";

/// stderr logger for the `log` facade. With `--verbose` debug records from
/// this crate are shown; otherwise only warnings and errors.
pub struct VerboseLogger {
    enabled: bool,
}

impl VerboseLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Install as the global logger. Fails if one is already set.
    pub fn init(verbose: bool) -> Result<(), SetLoggerError> {
        let logger = Self::new(verbose);
        let level = logger.level_filter();
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn level_filter(&self) -> LevelFilter {
        if self.enabled {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }

    pub fn format_line(level: Level, message: &str) -> String {
        let prefix = match level {
            Level::Error => "Error",
            Level::Warn => "Warning",
            Level::Info => "Info",
            Level::Debug | Level::Trace => "Verbose",
        };
        format!("{}: {}", prefix, message)
    }
}

impl Log for VerboseLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_filter() && metadata.target().starts_with(CRATE_TARGET)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{}",
                Self::format_line(record.level(), &record.args().to_string())
            );
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_follows_verbose_flag() {
        assert_eq!(VerboseLogger::new(true).level_filter(), LevelFilter::Debug);
        assert_eq!(VerboseLogger::new(false).level_filter(), LevelFilter::Warn);
        assert!(VerboseLogger::new(true).is_enabled());
    }

    #[test]
    fn test_enabled_only_for_crate_targets() {
        let logger = VerboseLogger::new(true);
        let ours = Metadata::builder()
            .level(Level::Debug)
            .target("askdb::core::session")
            .build();
        let theirs = Metadata::builder()
            .level(Level::Debug)
            .target("reqwest::connect")
            .build();
        assert!(logger.enabled(&ours));
        assert!(!logger.enabled(&theirs));

        let quiet = VerboseLogger::new(false);
        assert!(!quiet.enabled(&ours));
        let warning = Metadata::builder()
            .level(Level::Warn)
            .target("askdb::core::session")
            .build();
        assert!(quiet.enabled(&warning));
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            VerboseLogger::format_line(Level::Debug, "Dispatching query"),
            "Verbose: Dispatching query"
        );
        assert_eq!(
            VerboseLogger::format_line(Level::Warn, "Query failed"),
            "Warning: Query failed"
        );
    }
}
