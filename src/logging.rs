//! Stderr log subscriber for the skillgap binary.
//!
//! The subscriber is installed before configuration is read so warnings
//! raised while loading config layers are not lost. It starts at the
//! `SKILLGAP_LOG` directive (or `warn`) and is re-filtered to the configured
//! level once config is known, unless `SKILLGAP_LOG` pinned it.

use std::env;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::config::{LoggingConfig, DEFAULT_LOG_LEVEL};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "SKILLGAP_LOG";

/// Handle for re-filtering the installed subscriber.
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    env_directive: Option<String>,
}

impl LogHandle {
    /// Switch the filter to the configured level.
    ///
    /// A valid `SKILLGAP_LOG` directive keeps precedence over config.
    pub fn apply_config(&self, logging: &LoggingConfig) {
        let directive = resolve_directive(self.env_directive.as_deref(), &logging.level);
        let filter = match EnvFilter::try_new(&directive) {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new(DEFAULT_LOG_LEVEL),
        };
        if let Err(e) = self.handle.reload(filter) {
            eprintln!("Warning: could not apply log level '{}': {}", directive, e);
        }
    }
}

/// Pick the filter directive: a usable `env` value, else `configured`.
pub fn resolve_directive(env: Option<&str>, configured: &str) -> String {
    match env.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directive) if EnvFilter::try_new(directive).is_ok() => directive.to_string(),
        _ => configured.to_string(),
    }
}

/// Install the global stderr subscriber.
pub fn init() -> LogHandle {
    let (subscriber, handle) = build(std::io::stderr, env::var(LOG_ENV).ok());
    if let Err(e) = subscriber.try_init() {
        eprintln!("Warning: log subscriber already installed: {}", e);
    }
    handle
}

/// Build the subscriber at its bootstrap level without installing it.
fn build<W>(
    make_writer: W,
    env_directive: Option<String>,
) -> (impl Subscriber + Send + Sync + 'static, LogHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let directive = resolve_directive(env_directive.as_deref(), DEFAULT_LOG_LEVEL);
    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let (filter_layer, handle) = reload::Layer::new(filter);

    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(make_writer).with_ansi(false));

    (
        subscriber,
        LogHandle {
            handle,
            env_directive,
        },
    )
}
