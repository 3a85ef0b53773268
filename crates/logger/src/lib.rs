use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{self, subscriber::SetGlobalDefaultError, Level};
use tracing_appender::{self, non_blocking::WorkerGuard};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{
    fmt::{self, time, writer::MakeWriterExt},
    layer::SubscriberExt,
    Layer,
};

const TIME_FORMAT: &str = "%d-%m-%y %H:%M:%S%z";

/// Name prefix of the daily rolling error log.
pub const ERROR_LOG_FILE: &str = "nbmail.error.log";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid log level: {0}; use one of error, warn, info, debug or trace")]
    Level(String),
    #[error("could not create log directory {dir:?}: {err}")]
    LogDir { dir: PathBuf, err: io::Error },
    #[error("failed to set global logger: {0}")]
    SetGlobalDefault(SetGlobalDefaultError),
}

/// Parses `error`, `warn`, `info`, `debug` or `trace`, ignoring case.
pub fn parse_level(level: &str) -> Result<Level, Error> {
    Level::from_str(level.trim()).map_err(|_| Error::Level(level.to_string()))
}

/// Installs the global subscriber.
///
/// Errors are always appended as JSON to a daily rolling
/// [`ERROR_LOG_FILE`] inside `log_dir`. Everything at or above `level` also
/// goes to stdout, either pretty-printed alongside progress bars or as JSON.
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init_logger(pretty: bool, level: Level, log_dir: &Path) -> Result<WorkerGuard, Error> {
    let timer = time::ChronoLocal::new(TIME_FORMAT.into());

    fs::create_dir_all(log_dir).map_err(|err| Error::LogDir {
        dir: log_dir.to_path_buf(),
        err,
    })?;
    let (error_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, ERROR_LOG_FILE));

    let error_file = fmt::Layer::new()
        .with_writer(error_writer.with_max_level(Level::ERROR))
        .json()
        .with_timer(timer.clone())
        .with_target(false)
        .with_line_number(false)
        .with_file(false);

    // progress bars own stdout in pretty mode, so log lines go through them
    let bars = pretty.then(IndicatifLayer::new);
    let stdout = match bars.as_ref() {
        Some(bars) => fmt::Layer::new()
            .with_writer(bars.get_stdout_writer().with_max_level(level))
            .pretty()
            .with_timer(timer)
            .with_target(false)
            .with_line_number(false)
            .with_file(false)
            .boxed(),
        None => fmt::Layer::new()
            .with_writer(io::stdout.with_max_level(level))
            .json()
            .with_timer(timer)
            .with_target(false)
            .with_line_number(false)
            .with_file(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(error_file)
        .with(stdout)
        .with(bars);
    tracing::subscriber::set_global_default(subscriber).map_err(Error::SetGlobalDefault)?;

    Ok(guard)
}
