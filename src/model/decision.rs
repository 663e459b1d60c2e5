use crate::version::{self, SemanticVersion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Note attached when the session check budget is exhausted.
pub const SKIPPED_NOTE: &str = "Version check skipped - maximum checks reached";

/// Whether, and to what version, an application can be updated.
///
/// `note` is set exactly when resolution could not complete. It is
/// informational and never signals an error to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDecision {
    pub has_update: bool,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<SemanticVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl UpdateDecision {
    /// Builds a decision from an installed and an upstream version string.
    ///
    /// Both sides are normalized; `has_update` holds only if the upstream
    /// version is strictly newer.
    pub fn resolved(current: &str, latest: &str, download_url: Option<String>) -> Self {
        Self {
            has_update: version::is_newer(latest, current),
            current_version: version::normalize(current).to_string(),
            latest_version: Some(version::normalize(latest)),
            download_url,
            note: None,
            checked_at: Utc::now(),
        }
    }

    /// A decision for a resolution that could not complete.
    pub fn unresolved(current: &str, note: impl Into<String>) -> Self {
        Self {
            has_update: false,
            current_version: current.to_string(),
            latest_version: None,
            download_url: None,
            note: Some(note.into()),
            checked_at: Utc::now(),
        }
    }

    /// A decision for an application that was never checked.
    pub fn skipped(current: &str) -> Self {
        Self::unresolved(current, SKIPPED_NOTE)
    }

    pub fn is_resolved(&self) -> bool {
        self.note.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_with_update() {
        let decision = UpdateDecision::resolved("100.0.0", "115.0", None);

        assert!(decision.has_update);
        assert!(decision.is_resolved());
        assert_eq!(decision.current_version, "100.0.0");
        assert_eq!(decision.latest_version, Some(SemanticVersion::new(115, 0, 0)));
    }

    #[test]
    fn test_resolved_same_version() {
        let decision = UpdateDecision::resolved("v2.1", "2.1.0", None);

        assert!(!decision.has_update);
        assert_eq!(decision.current_version, "2.1.0");
    }

    #[test]
    fn test_resolved_older_upstream() {
        let decision = UpdateDecision::resolved("3.0.0", "2.9.9", None);
        assert!(!decision.has_update);
    }

    #[test]
    fn test_unresolved_keeps_raw_version() {
        let decision = UpdateDecision::unresolved("1.0 beta", "offline");

        assert!(!decision.has_update);
        assert!(!decision.is_resolved());
        assert_eq!(decision.current_version, "1.0 beta");
        assert_eq!(decision.note.as_deref(), Some("offline"));
        assert!(decision.latest_version.is_none());
    }

    #[test]
    fn test_skipped_note() {
        let decision = UpdateDecision::skipped("1.0");
        assert_eq!(decision.note.as_deref(), Some(SKIPPED_NOTE));
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let json = serde_json::to_value(UpdateDecision::skipped("1.0")).unwrap();

        assert_eq!(json["has_update"], false);
        assert!(json.get("latest_version").is_none());
        assert!(json.get("download_url").is_none());
    }
}
