use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

/// Route `log` output to `path`, filtered by `RUST_LOG` (default `info`).
///
/// stdout/stderr are taken by the terminal UI, so nothing is written there.
pub fn init(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("installing logger")?;

    log::info!("logging to {}", path.display());
    Ok(())
}
