use crate::error::{AnalyzerError, Result};
use chrono::Local;
use env_logger::{Builder, Env};
use log::{self, LevelFilter};
use std::io::Write;
use yansi::Paint;

/// Installs the CLI's stderr logger
///
/// `log_level` comes from `--log-level` and is overridden by `RUST_LOG`.
/// Analyzer progress, throttle backoffs, and fallbacks are emitted with
/// `tracing` and arrive here through its `log` bridge; structured gate and
/// analyzer events use the `terms_analyzer::events` target, so
/// `RUST_LOG=terms_analyzer::events=debug` shows only those.
///
/// Fails with [`AnalyzerError::Config`] when a logger is already installed.
pub fn init(log_level: &str) -> Result<()> {
    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", format_log(record)))
        .try_init()
        .map_err(|e| AnalyzerError::Config(format!("logger already initialized: {}", e)))
}

/// Renders one record as `[timestamp] LEVEL [target] message`
///
/// For events from the `terms_analyzer::events` target the message is the
/// event name followed by its `key=value` fields.
pub fn format_log(record: &log::Record) -> String {
    let level = match record.level() {
        log::Level::Error => Paint::red("ERROR").bold(),
        log::Level::Warn => Paint::yellow("WARN ").bold(),
        log::Level::Info => Paint::cyan("INFO ").bold(),
        log::Level::Debug => Paint::blue("DEBUG").bold(),
        log::Level::Trace => Paint::new("TRACE"),
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let target = if !record.target().is_empty() {
        record.target()
    } else {
        record.module_path().unwrap_or("unknown")
    };

    format!("[{}] {} [{}] {}", timestamp, level, target, record.args())
}

/// Maps a `--log-level` value to a filter; unknown names mean `info`
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
