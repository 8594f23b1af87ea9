use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Log file used when none is given on the command line.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("yancca.log")
}

pub fn level(debug: bool) -> LevelFilter {
    if debug { LevelFilter::Debug } else { LevelFilter::Info }
}

/// Sends `log` records to `path`; the terminal belongs to the UI. `RUST_LOG`
/// overrides the level chosen from the debug flag.
pub fn init(path: &Path, debug: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let default_filter = level(debug).as_str().to_lowercase();
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("installing logger")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_raises_level() {
        assert_eq!(level(false), LevelFilter::Info);
        assert_eq!(level(true), LevelFilter::Debug);
    }
}
