//! Subscriber setup for `tracing`.
//!
//! Each dispatch runs inside a `dispatch` span carrying the message id, author
//! and channel. Turning on [`SpanEvents::LIFECYCLE`] logs one line when a
//! command starts and one, with its busy time, when it finishes:
//!
//! ```rust,ignore
//! use thronebot_runtime::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .directive("thronebot_router=debug")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```
//!
//! [`ThronebotRuntime::from_config`](crate::ThronebotRuntime::from_config)
//! calls [`init_from_config`] with the `[logging]` table.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Which span transitions produce a log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanEvents {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    /// Closing also reports the span's busy and idle time.
    pub close: bool,
}

impl SpanEvents {
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Creation and close only.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn fmt_span(self) -> FmtSpan {
        [
            (self.new, FmtSpan::NEW),
            (self.enter, FmtSpan::ENTER),
            (self.exit, FmtSpan::EXIT),
            (self.close, FmtSpan::CLOSE),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(FmtSpan::NONE, |acc, (_, span)| acc | span)
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self {
            new: config.new,
            enter: config.enter,
            exit: config.exit,
            close: config.close,
        }
    }
}

/// Installs the global subscriber described by `config`, unless one is
/// already set.
pub fn init_from_config(config: &LoggingConfig) {
    LoggingBuilder::from_config(config).init();
}

/// Assembles an env filter and one fmt layer.
#[derive(Debug)]
pub struct LoggingBuilder {
    level: tracing::Level,
    directives: Vec<String>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    rotation: LogRotation,
    target: bool,
    thread_ids: bool,
    location: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// Compact `info` output on stdout.
    pub fn new() -> Self {
        Self {
            level: tracing::Level::INFO,
            directives: Vec::new(),
            span_events: SpanEvents::NONE,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            rotation: LogRotation::Never,
            target: true,
            thread_ids: false,
            location: false,
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort_by(|a, b| a.0.cmp(b.0));

        Self {
            level: config.level.to_tracing_level(),
            directives: filters
                .into_iter()
                .map(|(module, level)| format!("{module}={level}"))
                .collect(),
            span_events: SpanEvents::from(&config.span_events),
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            rotation: config.rotation,
            thread_ids: config.thread_ids,
            location: config.file_location,
            ..Self::new()
        }
    }

    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a directive such as `thronebot_router=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Writes to `path` and switches the output to [`LogOutput::File`].
    pub fn file(mut self, path: impl Into<PathBuf>, rotation: LogRotation) -> Self {
        self.output = LogOutput::File;
        self.file_path = Some(path.into());
        self.rotation = rotation;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    /// Prints the source file and line of each event.
    pub fn with_location(mut self, enabled: bool) -> Self {
        self.location = enabled;
        self
    }

    /// Base level first, then the per-module directives in insertion order.
    fn filter_directives(&self) -> Vec<String> {
        let mut directives = vec![self.level.as_str().to_lowercase()];
        directives.extend(self.directives.iter().cloned());
        directives
    }

    /// `RUST_LOG`, when set, replaces the base level but not the directives.
    /// Unparsable directives are skipped and pushed onto `problems`.
    fn build_filter(&self, problems: &mut Vec<String>) -> EnvFilter {
        let mut directives = self.filter_directives().into_iter();
        let base = directives.next().unwrap_or_default();

        let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base));
        for directive in directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => problems.push(format!("Ignoring invalid log filter `{directive}`: {e}")),
            }
        }
        filter
    }

    fn appender(&self, path: &Path) -> RollingFileAppender {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or_else(|| OsStr::new("thronebot.log"));
        match self.rotation {
            LogRotation::Never => rolling::never(dir, name),
            LogRotation::Hourly => rolling::hourly(dir, name),
            LogRotation::Daily => rolling::daily(dir, name),
        }
    }

    fn writer(&self, problems: &mut Vec<String>) -> BoxMakeWriter {
        match (self.output, &self.file_path) {
            (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => BoxMakeWriter::new(self.appender(path)),
            (LogOutput::File, None) => {
                problems.push(
                    "File output requested but no file path configured, falling back to stdout"
                        .to_string(),
                );
                BoxMakeWriter::new(std::io::stdout)
            }
        }
    }

    fn fmt_layer(&self, problems: &mut Vec<String>) -> BoxedLayer {
        let layer = fmt::layer()
            .with_writer(self.writer(problems))
            .with_span_events(self.span_events.fmt_span())
            .with_target(self.target)
            .with_thread_ids(self.thread_ids)
            .with_file(self.location)
            .with_line_number(self.location);

        match self.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            _ => layer.boxed(),
        }
    }

    /// Installs the subscriber; a second installation is silently ignored.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber, then logs anything that had to be ignored
    /// while building it.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let mut problems = Vec::new();
        let layer = self.fmt_layer(&mut problems);
        let filter = self.build_filter(&mut problems);
        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()?;

        for problem in problems {
            warn!("{problem}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_span_events_from_config() {
        let config = SpanEventConfig {
            new: true,
            close: true,
            ..Default::default()
        };
        let events = SpanEvents::from(&config);
        assert_eq!(events, SpanEvents::LIFECYCLE);
        assert_eq!(events.fmt_span(), FmtSpan::NEW | FmtSpan::CLOSE);
        assert_eq!(SpanEvents::NONE.fmt_span(), FmtSpan::NONE);
    }

    #[test]
    fn test_from_config_builds_directives() {
        let mut config = LoggingConfig {
            level: LogLevel::Warn,
            file_location: true,
            ..Default::default()
        };
        config
            .filters
            .insert("thronebot_router".to_string(), LogLevel::Trace);
        config
            .filters
            .insert("figment".to_string(), LogLevel::Error);

        let builder = LoggingBuilder::from_config(&config);
        assert!(builder.location);
        assert!(builder.target);
        assert_eq!(builder.filter_directives(), vec![
            "warn",
            "figment=error",
            "thronebot_router=trace",
        ]);
    }

    #[test]
    fn test_default_level_is_info() {
        let builder = LoggingBuilder::new().directive("thronebot=debug");
        assert_eq!(builder.filter_directives(), vec!["info", "thronebot=debug"]);
    }

    #[test]
    fn test_setup_problems_are_collected() {
        let builder = LoggingBuilder::new()
            .directive("thronebot=loud")
            .directive("thronebot_router=debug")
            .output(LogOutput::File);

        let mut problems = Vec::new();
        let _filter = builder.build_filter(&mut problems);
        let _writer = builder.writer(&mut problems);

        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("`thronebot=loud`"));
        assert!(problems[1].contains("no file path configured"));
    }

    #[test]
    fn test_file_switches_output() {
        let builder = LoggingBuilder::new().file("logs/bot.log", LogRotation::Daily);
        assert_eq!(builder.output, LogOutput::File);
        assert_eq!(builder.rotation, LogRotation::Daily);
        assert_eq!(builder.file_path, Some(PathBuf::from("logs/bot.log")));
    }
}
