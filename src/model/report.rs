use super::{ApplicationDescriptor, UpdateDecision};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One application together with its resolved decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckedApplication {
    pub application: ApplicationDescriptor,
    pub decision: UpdateDecision,
}

/// Decisions for a batch of applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub checked_at: DateTime<Utc>,
    pub results: Vec<CheckedApplication>,
}

impl CheckReport {
    pub fn new(results: Vec<CheckedApplication>) -> Self {
        Self {
            checked_at: Utc::now(),
            results,
        }
    }

    /// Applications with a newer upstream version.
    pub fn updates(&self) -> impl Iterator<Item = &CheckedApplication> {
        self.results.iter().filter(|r| r.decision.has_update)
    }

    /// Applications whose check did not complete.
    pub fn unresolved(&self) -> impl Iterator<Item = &CheckedApplication> {
        self.results.iter().filter(|r| !r.decision.is_resolved())
    }

    pub fn has_updates(&self) -> bool {
        self.updates().next().is_some()
    }
}
