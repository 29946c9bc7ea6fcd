//! Preflight checks before packaging the mobile wrapper
//!
//! Confirms the deployment variables are set to real values, the native
//! project files exist, the web sources still carry their placeholders for
//! the build step, and the iOS plist declares the permission strings.

use serde::Serialize;
use std::path::Path;

use super::env::{first_non_empty, load_env_file, EnvMap};
use crate::error::Result;

/// Variables that must hold real values
pub const REQUIRED_ENV: [&str; 4] = [
    "SUPABASE_URL",
    "SUPABASE_ANON_KEY",
    "CLOUDINARY_CLOUD_NAME",
    "CLOUDINARY_UPLOAD_PRESET",
];

/// Files that must exist, relative to the project root
pub const REQUIRED_FILES: [&str; 5] = [
    "capacitor.config.json",
    "ios/App/App.xcodeproj/project.pbxproj",
    "ios/App/App/Info.plist",
    "admin.html",
    "supabase.js",
];

const INFO_PLIST: &str = "ios/App/App/Info.plist";
const USAGE_KEYS: [&str; 2] = ["NSCameraUsageDescription", "NSPhotoLibraryUsageDescription"];

/// Empty or still a template value
pub fn is_placeholder(value: &str) -> bool {
    value.is_empty() || value.contains('%') || value.contains("YOUR_")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    pub successes: Vec<String>,
    pub failures: Vec<String>,
}

impl PreflightReport {
    fn check(&mut self, passed: bool, ok: String, failed: String) {
        if passed {
            self.successes.push(ok);
        } else {
            self.failures.push(failed);
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary: successes first, then failures.
    pub fn summary(&self) -> String {
        let mut lines = vec![String::new(), "Preflight summary:".to_string()];
        lines.extend(self.successes.iter().map(|s| format!("  + {s}")));
        lines.extend(self.failures.iter().map(|f| format!("  - {f}")));
        lines.join("\n")
    }
}

/// Read a file, treating any failure as absent.
async fn read_optional(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path).await.ok()
}

/// Run every check against `root`. The process environment wins over `.env`.
pub async fn run_preflight(root: &Path, process: &EnvMap) -> Result<PreflightReport> {
    let file_values = load_env_file(root).await?;
    let mut report = PreflightReport::default();

    for key in REQUIRED_ENV {
        let value = first_non_empty(key, &[process, &file_values]);
        report.check(
            !is_placeholder(value),
            format!("Env var present: {key}"),
            format!("Missing or invalid env var: {key}"),
        );
    }

    for file in REQUIRED_FILES {
        let exists = tokio::fs::try_exists(root.join(file)).await.unwrap_or(false);
        report.check(
            exists,
            format!("File exists: {file}"),
            format!("Required file missing: {file}"),
        );
    }

    let admin = read_optional(&root.join("admin.html")).await.unwrap_or_default();
    report.check(
        admin.contains("%CLOUDINARY_CLOUD_NAME%") && admin.contains("%CLOUDINARY_UPLOAD_PRESET%"),
        "admin.html uses Cloudinary placeholders".to_string(),
        "admin.html should contain Cloudinary placeholders".to_string(),
    );

    let supabase = read_optional(&root.join("supabase.js")).await.unwrap_or_default();
    report.check(
        supabase.contains("%SUPABASE_URL%") && supabase.contains("%SUPABASE_ANON_KEY%"),
        "supabase.js uses Supabase placeholders".to_string(),
        "supabase.js should contain Supabase placeholders".to_string(),
    );

    let plist = read_optional(&root.join(INFO_PLIST)).await.unwrap_or_default();
    for key in USAGE_KEYS {
        report.check(
            plist.contains(&format!("<key>{key}</key>")),
            format!("Info.plist has {key}"),
            format!("Info.plist missing {key}"),
        );
    }

    tracing::debug!(
        passed = report.successes.len(),
        failed = report.failures.len(),
        "preflight finished"
    );
    Ok(report)
}
