use std::io::Write;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

/// Diagnostic logger; user-facing command traces are printed by the executor instead.
struct ToolbeltLogger {
    file: Option<Mutex<std::fs::File>>,
    filter: LevelFilter,
    start: Instant,
}

impl Log for ToolbeltLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());

        if let Some(ref file) = self.file {
            let elapsed = self.start.elapsed().as_secs_f64();
            let _ = writeln!(
                file.lock(),
                "[{elapsed:.3}s] [{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Level from a `RUST_LOG`-style value, `warn` when unset or unparsable.
fn parse_filter(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|s| s.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Initialize the global logger. Call once before any logging.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger is already installed.
pub fn init(log_file: Option<std::fs::File>) -> Result<(), SetLoggerError> {
    let filter = parse_filter(std::env::var("RUST_LOG").ok().as_deref());

    let logger = ToolbeltLogger {
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter(None), LevelFilter::Warn);
        assert_eq!(parse_filter(Some("debug")), LevelFilter::Debug);
        assert_eq!(parse_filter(Some("TRACE")), LevelFilter::Trace);
        assert_eq!(parse_filter(Some("not-a-level")), LevelFilter::Warn);
    }

    #[test]
    fn test_file_receives_enabled_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolbelt.log");
        let logger = ToolbeltLogger {
            file: Some(Mutex::new(std::fs::File::create(&path).unwrap())),
            filter: LevelFilter::Info,
            start: Instant::now(),
        };
        logger.log(
            &Record::builder()
                .level(log::Level::Info)
                .target("toolbelt::executor")
                .args(format_args!("spawned"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(log::Level::Debug)
                .args(format_args!("hidden"))
                .build(),
        );
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[INFO] toolbelt::executor: spawned"));
        assert!(!contents.contains("hidden"));
    }
}
