use std::path::Path;

use serde::Deserialize;

/// Settings read from `glot.toml`. Everything is optional; CLI flags win
/// over config values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlotConfig {
    /// Default catalog path used when `--catalog` is not given.
    pub catalog: Option<String>,
    /// Load catalogs strictly by default.
    pub strict: Option<bool>,
    /// Cap for listing output (dump/find).
    pub list_limit: Option<usize>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Other(String),
}

/// Merge of `CWD/glot.toml` and `<config dir>/glot/glot.toml`, CWD first.
/// Missing or unparsable files are skipped.
pub fn load_config() -> Result<GlotConfig, ConfigError> {
    let mut merged = GlotConfig::default();
    if let Ok(cwd) = std::env::current_dir() {
        merged = merge(merged, load_from(&cwd.join("glot.toml")));
    }
    if let Some(base) = dirs::config_dir() {
        merged = merge(merged, load_from(&base.join("glot").join("glot.toml")));
    }
    Ok(merged)
}

fn load_from(path: &Path) -> GlotConfig {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| toml::from_str(&s).ok())
        .unwrap_or_default()
}

fn merge(mut a: GlotConfig, b: GlotConfig) -> GlotConfig {
    if a.catalog.is_none() {
        a.catalog = b.catalog;
    }
    if a.strict.is_none() {
        a.strict = b.strict;
    }
    if a.list_limit.is_none() {
        a.list_limit = b.list_limit;
    }
    a
}
