// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;

pub const LOG_ENV: &str = "CHAPTERDASH_LOG";

/// Routes `log` output to `path`. The terminal belongs to the dashboard, so
/// nothing is written to stderr.
pub fn init(path: &Path, configured_level: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].path to a writable location",
                path.display()
            )
        })?;

    let filters = effective_filters(configured_level, env::var(LOG_ENV).ok());
    Builder::new()
        .parse_filters(&filters)
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("initialize logger")?;
    Ok(())
}

fn effective_filters(configured_level: &str, env_override: Option<String>) -> String {
    env_override
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| configured_level.to_owned())
}

#[cfg(test)]
mod tests {
    use super::effective_filters;

    #[test]
    fn env_filter_overrides_configured_level() {
        assert_eq!(
            effective_filters("warn", Some("chapterdash_client=debug".to_owned())),
            "chapterdash_client=debug"
        );
    }

    #[test]
    fn blank_env_filter_falls_back_to_config() {
        assert_eq!(effective_filters("info", Some("  ".to_owned())), "info");
        assert_eq!(effective_filters("warn", None), "warn");
    }
}
