//! Log setup for `pension-sim`.
//!
//! Records go to stderr so stdout only ever carries command output. An
//! optional log file receives the same records with timestamps.

use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal},
    path::PathBuf,
    sync::Mutex,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

const DEFAULT_DIRECTIVE: &str = "info";
const VERBOSE_DIRECTIVE: &str = "debug";

/// What the command line asked for.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub file: Option<PathBuf>,
}

// --- Formatter ---

/// `[timestamp] LEVEL crate: fields`.
struct RecordFmt {
    timestamps: bool,
}

fn level_colour(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

impl<S, N> FormatEvent<S, N> for RecordFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        if self.timestamps {
            write!(writer, "{} ", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))?;
        }

        let level = *meta.level();
        if ansi {
            write!(writer, "{}{level:>5}\x1b[0m ", level_colour(level))?;
        } else {
            write!(writer, "{level:>5} ")?;
        }

        let krate = meta.target().split("::").next().unwrap_or_default();
        if ansi {
            write!(writer, "\x1b[36m{krate}:\x1b[0m ")?;
        } else {
            write!(writer, "{krate}: ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Setup ---

/// RUST_LOG when set, otherwise `info`, or `debug` when verbose.
fn build_filter(
    env: Option<&str>,
    verbose: bool,
) -> Result<EnvFilter> {
    let directive = match env {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ if verbose => VERBOSE_DIRECTIVE,
        _ => DEFAULT_DIRECTIVE,
    };
    EnvFilter::try_new(directive).with_context(|| format!("invalid log filter '{directive}'"))
}

/// Installs the global subscriber. Call once at startup.
///
/// Fails when RUST_LOG holds an invalid filter or the log file cannot be
/// opened. A second call leaves the first subscriber in place.
pub fn init(options: &LogOptions) -> Result<()> {
    let env = std::env::var("RUST_LOG").ok();
    let filter = build_filter(env.as_deref(), options.verbose)?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(RecordFmt { timestamps: false })
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = match &options.file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(RecordFmt { timestamps: true })
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_info() {
        let filter = build_filter(None, false).unwrap();

        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn verbose_raises_default_to_debug() {
        let filter = build_filter(Some("  "), true).unwrap();

        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn rust_log_overrides_verbose() {
        let filter = build_filter(Some("pension_core=trace"), true).unwrap();

        assert_eq!(filter.to_string(), "pension_core=trace");
    }

    #[test]
    fn rejects_invalid_rust_log() {
        assert!(build_filter(Some("pension_core=loud"), false).is_err());
    }

    #[test]
    fn init_writes_to_log_file() {
        let path = std::env::temp_dir().join(format!("pension-sim-log-{}.log", std::process::id()));
        let options = LogOptions {
            verbose: false,
            file: Some(path.clone()),
        };

        init(&options).unwrap();

        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();
    }
}
