use crate::error::OverrideError;
use crate::impact::CapacityImpact;
use crate::types::Site;

/// Computes the utilization change of moving one opportunity onto the
/// proposed site. The proposed load counts the opportunity as added before
/// the original allocation is removed, which keeps the estimate
/// conservative. A zero capacity on either site is a caller error.
pub fn capacity_impact(
    original_site: &Site,
    proposed_site: &Site,
) -> Result<CapacityImpact, OverrideError> {
    if original_site.capacity == 0 {
        return Err(OverrideError::invalid_site(&original_site.id));
    }
    if proposed_site.capacity == 0 {
        return Err(OverrideError::invalid_site(&proposed_site.id));
    }

    let original_pct =
        f64::from(original_site.allocated) / f64::from(original_site.capacity) * 100.0;
    let proposed_pct =
        f64::from(proposed_site.allocated + 1) / f64::from(proposed_site.capacity) * 100.0;

    Ok(CapacityImpact {
        original_pct,
        proposed_pct,
        delta: proposed_pct - original_pct,
    })
}
