use thiserror::Error;

/// Failure inside a single scrape strategy.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("No version found on {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No usable version in search results")]
    NoCandidates,
}

/// Why a resolution could not produce a version.
///
/// The `Display` text is what ends up in [`UpdateDecision::note`].
///
/// [`UpdateDecision::note`]: crate::model::UpdateDecision::note
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unable to determine latest version online (timeout)")]
    Timeout,

    #[error("Unable to determine latest version online (no matching source)")]
    NoStrategy,

    #[error("Unable to determine latest version online")]
    FetchFailure,

    #[error("Unable to determine latest version online (no version found)")]
    ParseFailure,

    #[error("Unable to determine latest version online (invalid version '{0}')")]
    InvalidVersion(String),
}

impl From<ScrapeError> for ResolveError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::Network(_) | ScrapeError::Status { .. } => ResolveError::FetchFailure,
            ScrapeError::NotFound(_) | ScrapeError::InvalidResponse(_) => {
                ResolveError::ParseFailure
            }
            ScrapeError::NoCandidates => ResolveError::NoStrategy,
        }
    }
}
