//! Loading application lists produced by external inventory tools.
//!
//! Two formats are accepted, picked by file extension:
//!
//! - `.json`: an array of descriptors
//! - `.toml`: an `[[applications]]` array of tables
//!
//! ```toml
//! [[applications]]
//! name = "Firefox"
//! publisher = "Mozilla"
//! version = "128.0"
//! path = "/usr/lib/firefox/firefox"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::model::ApplicationDescriptor;

#[derive(Deserialize)]
struct TomlInventory {
    #[serde(default)]
    applications: Vec<ApplicationDescriptor>,
}

/// Reads application descriptors from a JSON or TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unknown extension,
/// or does not parse.
pub fn load_applications(path: &Path) -> Result<Vec<ApplicationDescriptor>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let applications = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid application list {}", path.display()))?,
        Some("toml") => {
            let inventory: TomlInventory = toml::from_str(&content)
                .with_context(|| format!("Invalid application list {}", path.display()))?;
            inventory.applications
        }
        _ => bail!(
            "Unsupported application list {}. Use a .json or .toml file",
            path.display()
        ),
    };

    Ok(applications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "apps.json",
            r#"[
                {"name": "Firefox", "publisher": "Mozilla", "version": "128.0", "path": "/usr/bin/firefox"},
                {"name": "Tool", "path": "/opt/tool"}
            ]"#,
        );

        let apps = load_applications(&path).unwrap();

        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].publisher, "Mozilla");
        assert!(apps[1].version.is_empty());
    }

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "apps.toml",
            r#"
            [[applications]]
            name = "PyCharm"
            publisher = "JetBrains s.r.o."
            version = "2024.1"
            path = "/opt/pycharm"
            "#,
        );

        let apps = load_applications(&path).unwrap();

        assert_eq!(apps, vec![ApplicationDescriptor::new(
            "PyCharm",
            "JetBrains s.r.o.",
            "2024.1",
            "/opt/pycharm"
        )]);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "apps.csv", "name,path");

        assert!(load_applications(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(load_applications(Path::new("/nonexistent/apps.json")).is_err());
    }
}
