// std
use std::io::Write;
use std::path::PathBuf;
// crates
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{self, InitError, RollingFileAppender};
use tracing_subscriber::fmt::{
    format::{DefaultFields, Format},
    Layer,
};
// internal

pub type FmtLayer<S> = Layer<S, DefaultFields, Format, NonBlocking>;

const DEFAULT_LOG_FILE: &str = "da-proxy.log";

/// How often the log file is rolled over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Minutely,
    #[default]
    Hourly,
    Daily,
    /// A single file named after the prefix.
    Never,
}

impl From<Rotation> for rolling::Rotation {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Minutely => rolling::Rotation::MINUTELY,
            Rotation::Hourly => rolling::Rotation::HOURLY,
            Rotation::Daily => rolling::Rotation::DAILY,
            Rotation::Never => rolling::Rotation::NEVER,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name, or prefix of the dated file names when rotating. `da-proxy.log` if unset.
    pub prefix: Option<String>,
    #[serde(default)]
    pub rotation: Rotation,
}

/// Log into `config.directory`. Fails if the directory cannot be created.
pub fn create_file_layer<S>(config: FileConfig) -> Result<(FmtLayer<S>, WorkerGuard), InitError> {
    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(config.prefix.as_deref().unwrap_or(DEFAULT_LOG_FILE))
        .build(config.directory)?;

    Ok(create_writer_layer(appender))
}

/// Log to `writer` from a background worker. Logs are flushed when the guard is dropped.
pub fn create_writer_layer<S, W>(writer: W) -> (FmtLayer<S>, WorkerGuard)
where
    W: Write + Send + 'static,
{
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    let layer = Layer::new()
        .with_level(true)
        .with_ansi(false)
        .with_writer(non_blocking);

    (layer, guard)
}
