//! Tracing subscriber initialization.

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG` if set, otherwise falls back to `log_level`. `json`
/// selects the machine-readable formatting layer used in production;
/// pretty formatting is meant for local development.
pub fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = Registry::default().with(env_filter);

    if json {
        registry
            .with(json_layer())
            .try_init()
            .context("failed to initialize tracing subscriber")?;
    } else {
        registry
            .with(pretty_layer())
            .try_init()
            .context("failed to initialize tracing subscriber")?;
    }

    Ok(())
}

fn json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
}

fn pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .pretty()
        .with_target(true)
        .with_level(true)
        .with_span_events(FmtSpan::CLOSE)
}
