//! `.env` files and environment lookup

use std::collections::HashMap;
use std::path::Path;

use crate::error::{FolioError, Result};

/// Name of the env file in the project root
pub const ENV_FILE: &str = ".env";

pub type EnvMap = HashMap<String, String>;

/// Parse `KEY=VALUE` lines.
///
/// Blank lines and `#` comments are skipped, the line splits at the first
/// `=`, and key and value are trimmed. Lines without `=` or with an empty
/// key are ignored. Later lines win.
pub fn parse_env(content: &str) -> EnvMap {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Read `<root>/.env`. A missing file is an empty map.
pub async fn load_env_file(root: &Path) -> Result<EnvMap> {
    let path = root.join(ENV_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            let values = parse_env(&content);
            tracing::debug!(path = %path.display(), keys = values.len(), "loaded env file");
            Ok(values)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EnvMap::new()),
        Err(e) => Err(FolioError::io(path, e)),
    }
}

/// Snapshot of the process environment
pub fn process_env() -> EnvMap {
    std::env::vars().collect()
}

/// `primary` overlaid with `overrides`; override entries replace primary
/// ones even when empty.
pub fn overlay(primary: &EnvMap, overrides: &EnvMap) -> EnvMap {
    let mut merged = primary.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// First non-empty value for `key`, or an empty string.
pub fn first_non_empty<'a>(key: &str, sources: &[&'a EnvMap]) -> &'a str {
    sources
        .iter()
        .filter_map(|map| map.get(key))
        .find(|value| !value.is_empty())
        .map(String::as_str)
        .unwrap_or("")
}
