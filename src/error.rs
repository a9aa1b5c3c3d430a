use thiserror::Error;

/// Failures detected before any impact record is produced. The calculator
/// returns either a complete `OverrideImpact` or one of these, never a
/// partially populated record.
#[derive(Debug, Error)]
pub enum OverrideError {
    /// A site carries a non-positive capacity; utilization is undefined.
    #[error("invalid site data for {site_id}: capacity must be >= 1")]
    InvalidSiteData { site_id: String },

    /// The opportunity has no original site or no proposed site was given.
    #[error("insufficient input: {reason}")]
    InsufficientInput { reason: String },

    /// The external quality estimator failed or exceeded its deadline.
    /// Recovered locally by falling back to the baseline quality; surfaced
    /// only so the estimator seam can report it.
    #[error("quality estimator timed out after {timeout_ms}ms")]
    EstimatorTimeout { timeout_ms: u64 },
}

impl OverrideError {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientInput {
            reason: reason.into(),
        }
    }

    pub fn invalid_site(site_id: impl Into<String>) -> Self {
        Self::InvalidSiteData {
            site_id: site_id.into(),
        }
    }
}
