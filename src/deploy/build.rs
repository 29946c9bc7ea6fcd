//! Build step: fill deployment placeholders into the web sources
//!
//! Values come from the process environment with `.env` entries taking
//! precedence. Empty values are never substituted, so a missing setting
//! leaves its placeholder in place for preflight to catch.

use serde::Serialize;
use std::path::Path;

use super::env::{load_env_file, overlay, EnvMap};
use crate::error::{FolioError, Result};

/// Placeholder text and the variable that replaces it
pub const PLACEHOLDERS: [(&str, &str); 5] = [
    ("%SUPABASE_URL%", "SUPABASE_URL"),
    ("%SUPABASE_ANON_KEY%", "SUPABASE_ANON_KEY"),
    ("%ADMIN_PASSWORD%", "ADMIN_PASSWORD"),
    ("%CLOUDINARY_CLOUD_NAME%", "CLOUDINARY_CLOUD_NAME"),
    ("%CLOUDINARY_UPLOAD_PRESET%", "CLOUDINARY_UPLOAD_PRESET"),
];

/// Files rewritten by the build, relative to the project root
pub const BUILD_FILES: [&str; 2] = ["supabase.js", "admin.html"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutcome {
    /// At least one placeholder was replaced and the file rewritten
    Updated,
    /// Nothing to replace; the file was left alone
    Skipped,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub files: Vec<(String, FileOutcome)>,
}

impl BuildReport {
    pub fn outcome(&self, file: &str) -> Option<FileOutcome> {
        self.files
            .iter()
            .find(|(name, _)| name == file)
            .map(|(_, outcome)| *outcome)
    }
}

/// Replace every occurrence of every placeholder that has a non-empty value.
///
/// Returns `None` when nothing changed.
pub fn substitute(content: &str, values: &EnvMap) -> Option<String> {
    let mut output = content.to_string();
    let mut changed = false;

    for (placeholder, key) in PLACEHOLDERS {
        let Some(value) = values.get(key).filter(|v| !v.is_empty()) else {
            continue;
        };
        if output.contains(placeholder) {
            output = output.replace(placeholder, value);
            changed = true;
        }
    }

    changed.then_some(output)
}

/// Run the build in `root`.
pub async fn run_build(root: &Path, process: &EnvMap) -> Result<BuildReport> {
    let file_values = load_env_file(root).await?;
    let values = overlay(process, &file_values);

    let mut files = Vec::with_capacity(BUILD_FILES.len());
    for name in BUILD_FILES {
        let path = root.join(name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(file = name, "file not found, skipping");
                files.push((name.to_string(), FileOutcome::NotFound));
                continue;
            }
            Err(e) => return Err(FolioError::io(path, e)),
        };

        let outcome = match substitute(&content, &values) {
            Some(updated) => {
                tokio::fs::write(&path, updated)
                    .await
                    .map_err(|e| FolioError::io(&path, e))?;
                tracing::info!(file = name, "updated placeholders");
                FileOutcome::Updated
            }
            None => {
                tracing::info!(file = name, "no placeholders to fill");
                FileOutcome::Skipped
            }
        };
        files.push((name.to_string(), outcome));
    }

    Ok(BuildReport { files })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_all_occurrences() {
        let env = values(&[("SUPABASE_URL", "https://x.co"), ("SUPABASE_ANON_KEY", "")]);
        let out = substitute("a=%SUPABASE_URL%;b=%SUPABASE_URL%;k=%SUPABASE_ANON_KEY%", &env).unwrap();
        assert_eq!(out, "a=https://x.co;b=https://x.co;k=%SUPABASE_ANON_KEY%");
        assert!(substitute("plain text", &env).is_none());
        assert!(substitute("%SUPABASE_ANON_KEY%", &env).is_none());
    }

    #[tokio::test]
    async fn test_build_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("supabase.js"),
            "const url = '%SUPABASE_URL%';\nconst key = '%SUPABASE_ANON_KEY%';\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "SUPABASE_URL=https://from-file.co\nSUPABASE_ANON_KEY=anon\n",
        )
        .unwrap();
        let process = values(&[("SUPABASE_URL", "https://from-process.co")]);

        let report = run_build(dir.path(), &process).await.unwrap();
        assert_eq!(report.outcome("supabase.js"), Some(FileOutcome::Updated));
        assert_eq!(report.outcome("admin.html"), Some(FileOutcome::NotFound));

        let written = std::fs::read_to_string(dir.path().join("supabase.js")).unwrap();
        assert_eq!(
            written,
            "const url = 'https://from-file.co';\nconst key = 'anon';\n"
        );

        // Second run has nothing left to fill
        let report = run_build(dir.path(), &process).await.unwrap();
        assert_eq!(report.outcome("supabase.js"), Some(FileOutcome::Skipped));
    }
}
