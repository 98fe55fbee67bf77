//! Process log sink.
//!
//! The binary calls [`init_logging`] once before running the pipeline and keeps the returned
//! [`LogHandle`] alive until the run is over; dropping the handle flushes buffered lines.
//! Library code only emits `tracing` events and never configures logging itself.
//!
//! Lines look like `2024-01-01 12:00:00,123 - INFO - ETL run started`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::error::{EtlError, EtlResult};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "logs/etl.log";

/// Keeps the background log writer alive. Drop it (or call [`LogHandle::close`]) to flush.
#[must_use = "dropping the handle stops file logging"]
pub struct LogHandle {
    path: PathBuf,
    _guard: WorkerGuard,
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandle").field("path", &self.path).finish()
    }
}

impl LogHandle {
    /// Flush pending lines and stop the writer.
    pub fn close(self) {}
}

/// `timestamp - LEVEL - message` event format, fields appended after the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFormat;

impl<S, N> FormatEvent<S, N> for PlainFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Build a subscriber that writes [`PlainFormat`] lines to `make_writer`.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn subscriber<W>(make_writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .event_format(PlainFormat)
            .with_ansi(false)
            .with_writer(make_writer),
    )
}

/// Install the process-wide subscriber, appending to `path` (created along with its directory).
///
/// The file is never rotated. Fails if a global subscriber is already installed.
pub fn init_logging(path: impl AsRef<Path>) -> EtlResult<LogHandle> {
    let path = path.as_ref();
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path has no file name: {}", path.display()),
        )
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    subscriber(writer)
        .try_init()
        .map_err(|e| EtlError::Logging(e.to_string()))?;

    Ok(LogHandle {
        path: path.to_path_buf(),
        _guard: guard,
    })
}
