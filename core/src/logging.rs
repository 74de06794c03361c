//! log4rs setup shared by every binary in the workspace.

use std::backtrace::Backtrace;
use std::env;

use anyhow::Context;
use log::{Level, LevelFilter, Record};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::{self, Encode};
use log4rs::filter::threshold::ThresholdFilter;

pub const LOGGING_PATTERN: &str = "{d} {l} {f}:{L} - {m}\n";

/// Pattern encoder that appends a captured backtrace to error records when
/// `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE` is set.
#[derive(Debug)]
pub struct ErrorBacktraceEncoder {
    inner: PatternEncoder,
    capture: bool,
}

impl ErrorBacktraceEncoder {
    pub fn new(pattern: &str) -> Self {
        Self::with_capture(pattern, backtraces_requested())
    }

    pub fn with_capture(pattern: &str, capture: bool) -> Self {
        Self {
            inner: PatternEncoder::new(pattern),
            capture,
        }
    }
}

fn backtraces_requested() -> bool {
    ["RUST_BACKTRACE", "RUST_LIB_BACKTRACE"]
        .iter()
        .any(|name| env::var_os(name).is_some())
}

impl Encode for ErrorBacktraceEncoder {
    fn encode(&self, w: &mut dyn encode::Write, record: &Record<'_>) -> anyhow::Result<()> {
        if !self.capture || record.level() != Level::Error {
            return self.inner.encode(w, record);
        }

        let message = format_args!(
            "{}\nBacktrace:\n{}",
            record.args(),
            Backtrace::force_capture()
        );
        let with_trace = Record::builder()
            .args(message)
            .level(record.level())
            .target(record.target())
            .module_path(record.module_path())
            .file(record.file())
            .line(record.line())
            .build();
        self.inner.encode(w, &with_trace)
    }
}

/// Installs the global logger: stderr filtered at `log_level`, plus an
/// optional log file receiving the same records.
pub fn initialize_logger(log_level: LevelFilter, file_path: Option<&str>) -> anyhow::Result<()> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(ErrorBacktraceEncoder::new(LOGGING_PATTERN)))
        .build();

    let mut config = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(ErrorBacktraceEncoder::new(LOGGING_PATTERN)))
            .build(path)
            .with_context(|| format!("opening log file {path}"))?;
        config = config.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }

    let config = config
        .build(root.build(log_level))
        .context("building logger configuration")?;
    log4rs::init_config(config).context("installing logger")?;
    Ok(())
}
