use crate::utils::error::Result;
use std::fs::File;
use std::future::Future;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub fn init_cli_logger(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    cli_subscriber(verbose, log_file)?.init();
    Ok(())
}

/// JSON lines on stdout; `log_file` still gets the plain-text copy.
pub fn init_json_logger(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    json_subscriber(verbose, log_file)?.init();
    Ok(())
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "cities_etl=debug,info"
    } else {
        "cities_etl=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// The log file is truncated on every run.
fn file_layer<S>(log_file: Option<&Path>) -> Result<Option<impl Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let Some(path) = log_file else {
        return Ok(None);
    };
    let file = File::create(path)?;
    Ok(Some(
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false),
    ))
}

fn cli_subscriber(
    verbose: bool,
    log_file: Option<&Path>,
) -> Result<impl Subscriber + Send + Sync + for<'a> LookupSpan<'a>> {
    let registry = tracing_subscriber::registry().with(env_filter(verbose)).with(
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact(),
    );
    let file = file_layer(log_file)?;
    Ok(registry.with(file))
}

fn json_subscriber(
    verbose: bool,
    log_file: Option<&Path>,
) -> Result<impl Subscriber + Send + Sync + for<'a> LookupSpan<'a>> {
    let registry = tracing_subscriber::registry().with(env_filter(verbose)).with(
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .json(),
    );
    let file = file_layer(log_file)?;
    Ok(registry.with(file))
}

/// Runs `fut` between an entry and an exit log line carrying the elapsed time.
pub async fn timed<F, T>(name: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    tracing::info!("Entered step: {}", name);
    let started = Instant::now();
    let output = fut.await;
    tracing::info!(
        "Exited step: {} with running time: {:.4} seconds",
        name,
        started.elapsed().as_secs_f64()
    );
    output
}
