//! Logging setup for CLI commands

use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Level used until the config file has been read.
const STARTUP_LEVEL: &str = "info";

/// Parse log level from config string
fn parse_log_level(level: &str) -> LevelFilter {
  match level.trim().to_lowercase().as_str() {
    "off" => LevelFilter::OFF,
    "error" => LevelFilter::ERROR,
    "warn" => LevelFilter::WARN,
    "info" => LevelFilter::INFO,
    "debug" => LevelFilter::DEBUG,
    "trace" => LevelFilter::TRACE,
    _ => LevelFilter::INFO,
  }
}

/// RUST_LOG takes precedence over the configured level.
fn env_filter(level: &str) -> EnvFilter {
  EnvFilter::builder()
    .with_default_directive(parse_log_level(level).into())
    .from_env_lossy()
}

/// Switches the console filter once the configured level is known.
pub struct LogLevelHandle(reload::Handle<EnvFilter, Registry>);

impl LogLevelHandle {
  pub fn set(&self, level: &str) {
    if let Err(e) = self.0.reload(env_filter(level)) {
      warn!(err = %e, level, "Failed to apply configured log level");
    }
  }
}

fn cli_subscriber<W>(writer: W) -> (impl tracing::Subscriber + Send + Sync + 'static, LogLevelHandle)
where
  W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
  let (filter, handle) = reload::Layer::new(env_filter(STARTUP_LEVEL));
  let subscriber = tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_target(false));
  (subscriber, LogLevelHandle(handle))
}

/// Initialize console logging on stderr, so stdout stays clean for `--json`.
///
/// Installed before the config is loaded so config warnings are visible; call
/// [`LogLevelHandle::set`] with `logging.level` afterwards.
pub fn init_cli_logging() -> LogLevelHandle {
  let (subscriber, handle) = cli_subscriber(std::io::stderr);
  subscriber.init();
  handle
}
