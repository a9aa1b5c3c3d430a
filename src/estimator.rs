use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::error::OverrideError;
use crate::types::{CollectionOpportunity, Site};

/// Predicts the match quality (0..=100) an opportunity would see if served
/// from the given site. Implementations must be deterministic: identical
/// inputs yield identical estimates, so impact computation stays
/// referentially transparent.
#[async_trait]
pub trait QualityEstimator: Send + Sync {
    async fn estimate_quality(
        &self,
        opportunity: &CollectionOpportunity,
        proposed_site: &Site,
    ) -> Result<f64>;
}

/// Default estimator: the proposed site is assumed to match the current
/// baseline, giving a zero quality delta.
pub struct BaselineEstimator;

#[async_trait]
impl QualityEstimator for BaselineEstimator {
    async fn estimate_quality(
        &self,
        opportunity: &CollectionOpportunity,
        _proposed_site: &Site,
    ) -> Result<f64> {
        Ok(opportunity.baseline_quality())
    }
}

/// Applies a fixed offset to the baseline, clamped to the 0..=100 band.
/// Configured through `[estimator] quality_offset`; also handy in tests.
pub struct FixedOffsetEstimator {
    pub offset: f64,
}

impl FixedOffsetEstimator {
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }
}

#[async_trait]
impl QualityEstimator for FixedOffsetEstimator {
    async fn estimate_quality(
        &self,
        opportunity: &CollectionOpportunity,
        _proposed_site: &Site,
    ) -> Result<f64> {
        Ok((opportunity.baseline_quality() + self.offset).clamp(0.0, 100.0))
    }
}

/// Picks the estimator the configuration asks for. A zero offset keeps the
/// baseline behavior.
pub fn estimator_for_offset(offset: f64) -> Box<dyn QualityEstimator> {
    if offset == 0.0 {
        Box::new(BaselineEstimator)
    } else {
        Box::new(FixedOffsetEstimator::new(offset))
    }
}

/// Runs the estimator under a deadline. Failure or timeout degrades to the
/// baseline quality: the workflow keeps going and the condition is logged,
/// never shown to the operator as an error.
pub async fn estimate_with_fallback(
    estimator: &dyn QualityEstimator,
    opportunity: &CollectionOpportunity,
    proposed_site: &Site,
    timeout: Duration,
) -> f64 {
    let deadline = tokio::time::timeout(
        timeout,
        estimator.estimate_quality(opportunity, proposed_site),
    );
    match deadline.await {
        Ok(Ok(estimate)) => estimate.clamp(0.0, 100.0),
        Ok(Err(err)) => {
            warn!("quality estimator failed, using baseline: {err}");
            opportunity.baseline_quality()
        }
        Err(_) => {
            let absorbed = OverrideError::EstimatorTimeout {
                timeout_ms: timeout.as_millis() as u64,
            };
            warn!("{absorbed}, using baseline");
            opportunity.baseline_quality()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn opportunity(match_quality: Option<f64>) -> CollectionOpportunity {
        CollectionOpportunity {
            id: "opp-1".to_string(),
            name: "Pass 1".to_string(),
            satellite: "sat-1".to_string(),
            allocated_sites: vec![Site::new("gs-1", "Fairbanks", 100, 50)],
            priority: Priority::Medium,
            match_quality,
        }
    }

    struct SlowEstimator;

    #[async_trait]
    impl QualityEstimator for SlowEstimator {
        async fn estimate_quality(
            &self,
            _opportunity: &CollectionOpportunity,
            _proposed_site: &Site,
        ) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0.0)
        }
    }

    #[tokio::test]
    async fn baseline_estimator_gives_zero_delta() {
        let opp = opportunity(Some(82.0));
        let site = Site::new("gs-2", "Svalbard", 80, 10);
        let estimate =
            estimate_with_fallback(&BaselineEstimator, &opp, &site, Duration::from_millis(50))
                .await;
        assert_eq!(estimate, 82.0);
    }

    #[tokio::test]
    async fn timeout_falls_back_to_baseline() {
        let opp = opportunity(None);
        let site = Site::new("gs-2", "Svalbard", 80, 10);
        let estimate =
            estimate_with_fallback(&SlowEstimator, &opp, &site, Duration::from_millis(10)).await;
        assert_eq!(estimate, 75.0);
    }

    #[tokio::test]
    async fn offset_estimator_clamps_to_band() {
        let opp = opportunity(Some(95.0));
        let site = Site::new("gs-2", "Svalbard", 80, 10);
        let estimate = estimate_with_fallback(
            &FixedOffsetEstimator::new(20.0),
            &opp,
            &site,
            Duration::from_millis(50),
        )
        .await;
        assert_eq!(estimate, 100.0);
    }
}
