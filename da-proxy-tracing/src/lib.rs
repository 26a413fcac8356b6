//! Logging setup shared by the proxy binaries and tests.
pub mod filter;
pub mod logging;
pub mod panic;

// std
use std::{
    fmt::{Debug, Formatter},
    io::Write,
    sync::{Arc, Mutex},
};
// crates
use serde::{Deserialize, Serialize};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter,
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};
// internal
use crate::filter::envfilter::{create_envfilter_layer, EnvFilterConfig};
use crate::logging::local::{create_file_layer, create_writer_layer, FileConfig};

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

type FilteredRegistry = Layered<Option<EnvFilter>, Layered<LevelFilter, Registry>>;

pub type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Cloneable handle over a writer, so settings holding it stay `Clone`.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<dyn Write + Send + Sync>>,
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| std::io::Error::other("shared writer lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner
            .lock()
            .map_err(|_| std::io::Error::other("shared writer lock poisoned"))?
            .flush()
    }
}

impl SharedWriter {
    pub fn new<W: Write + Send + Sync + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }
}

impl Debug for SharedWriter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWriter").finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LoggerLayer {
    File(FileConfig),
    Stdout,
    Stderr,
    #[serde(skip)]
    Writer(SharedWriter),
    // do not collect logs
    None,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FilterLayer {
    EnvFilter(EnvFilterConfig),
    None,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TracingSettings {
    pub logger: LoggerLayer,
    pub filter: FilterLayer,
    #[serde(with = "serde_level")]
    pub level: Level,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            logger: LoggerLayer::Stdout,
            filter: FilterLayer::None,
            level: Level::INFO,
        }
    }
}

impl TracingSettings {
    pub const fn new(logger: LoggerLayer, filter: FilterLayer, level: Level) -> Self {
        Self {
            logger,
            filter,
            level,
        }
    }
}

/// Subscriber described by `settings`: level and target filters in front of the logger. The
/// guard, if any, must be kept alive for as long as logs should be written.
pub fn build_subscriber(
    settings: TracingSettings,
) -> Result<(impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>), DynError> {
    let env_filter = match settings.filter {
        FilterLayer::EnvFilter(config) => Some(create_envfilter_layer(config)?),
        FilterLayer::None => None,
    };

    let (logger_layer, logger_guard): (Option<BoxedLayer>, Option<WorkerGuard>) =
        match settings.logger {
            LoggerLayer::File(config) => {
                let (layer, guard) = create_file_layer(config)?;
                (Some(Box::new(layer)), Some(guard))
            }
            LoggerLayer::Stdout => {
                let (layer, guard) = create_writer_layer(std::io::stdout());
                (Some(Box::new(layer)), Some(guard))
            }
            LoggerLayer::Stderr => {
                let (layer, guard) = create_writer_layer(std::io::stderr());
                (Some(Box::new(layer)), Some(guard))
            }
            LoggerLayer::Writer(writer) => {
                let (layer, guard) = create_writer_layer(writer);
                (Some(Box::new(layer)), Some(guard))
            }
            LoggerLayer::None => (None, None),
        };

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from(settings.level))
        .with(env_filter)
        .with(logger_layer);

    Ok((subscriber, logger_guard))
}

/// Install the global subscriber described by `settings` and report panics through it.
/// Fails if a global subscriber is already set.
pub fn init_tracing(settings: TracingSettings) -> Result<Option<WorkerGuard>, DynError> {
    if let LoggerLayer::None = settings.logger {
        return Ok(None);
    }
    let (subscriber, logger_guard) = build_subscriber(settings)?;

    subscriber.try_init()?;
    std::panic::set_hook(Box::new(panic::panic_hook));

    Ok(logger_guard)
}

mod serde_level {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    use super::Level;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        <String>::deserialize(deserializer).and_then(|v| {
            v.parse()
                .map_err(|e| D::Error::custom(format!("invalid log level {e}")))
        })
    }

    pub fn serialize<S>(value: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.as_str().serialize(serializer)
    }
}
