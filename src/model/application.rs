use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity and installed version of a tracked application.
///
/// Produced outside this crate (file or registry inspection). `path` is the
/// unique key used for caching decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDescriptor {
    pub name: String,
    #[serde(default = "default_publisher")]
    pub publisher: String,
    /// Installed version. Missing in the input means unknown and stays empty.
    #[serde(default)]
    pub version: String,
    pub path: PathBuf,
}

fn default_publisher() -> String {
    "Unknown".to_string()
}

impl ApplicationDescriptor {
    pub fn new(
        name: impl Into<String>,
        publisher: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            publisher: publisher.into(),
            version: version.into(),
            path: path.into(),
        }
    }

    /// Query used by the search fallback.
    pub fn search_query(&self) -> String {
        format!("{} {} latest version download", self.name, self.publisher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query() {
        let app = ApplicationDescriptor::new("Blender", "Blender Foundation", "3.6", "/opt/blender");
        assert_eq!(
            app.search_query(),
            "Blender Blender Foundation latest version download"
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let app: ApplicationDescriptor =
            serde_json::from_str(r#"{"name": "Tool", "path": "/opt/tool"}"#).unwrap();

        assert_eq!(app.publisher, "Unknown");
        assert!(app.version.is_empty());
        assert_eq!(app.path, PathBuf::from("/opt/tool"));
    }
}
