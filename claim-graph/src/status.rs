//! Derived per-entry aggregates (E, §4.4): `max_friction`, `needs_review`,
//! `integration_status`. Pure functions of the entry's current comparison set and
//! `claims_status` — recomputation is triggered whenever a comparison touching the entry
//! is inserted or updated, never on a timer.
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::comparison::Comparison;
use common::storage::types::entry::{ClaimsStatus, IntegrationStatus};

#[derive(Clone, Copy, Debug)]
pub struct StatusThresholds {
    pub review_threshold: f32,
    pub contested_threshold: f32,
    pub integrated_threshold: f32,
    pub min_comparisons: u32,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            review_threshold: 0.2,
            contested_threshold: 0.5,
            integrated_threshold: 0.2,
            min_comparisons: 1,
        }
    }
}

pub fn max_friction(comparisons: &[Comparison]) -> f32 {
    comparisons
        .iter()
        .map(|c| c.friction)
        .fold(0.0_f32, f32::max)
}

pub fn needs_review(max_friction: f32, thresholds: StatusThresholds) -> bool {
    max_friction > thresholds.review_threshold
}

pub fn integration_status(
    claims_status: ClaimsStatus,
    comparison_count: u32,
    max_friction: f32,
    thresholds: StatusThresholds,
) -> IntegrationStatus {
    if max_friction >= thresholds.contested_threshold {
        IntegrationStatus::Contested
    } else if claims_status == ClaimsStatus::Distilled
        && comparison_count >= thresholds.min_comparisons
        && max_friction < thresholds.integrated_threshold
    {
        IntegrationStatus::Integrated
    } else {
        IntegrationStatus::Probation
    }
}

/// Recomputes and persists `max_friction`/`integration_status` for `entry_id` from its
/// current comparison set. Runs under the notebook write lock per §5, so the caller is
/// responsible for acquiring it before calling this.
pub async fn recompute_and_persist(
    db: &SurrealDbClient,
    entry_id: &str,
    claims_status: ClaimsStatus,
    comparisons: &[Comparison],
    thresholds: StatusThresholds,
) -> Result<IntegrationStatus, AppError> {
    let friction = max_friction(comparisons);
    let status = integration_status(claims_status, comparisons.len() as u32, friction, thresholds);

    db.client
        .query("UPDATE type::thing('entry', $id) SET max_friction = $friction, integration_status = $status")
        .bind(("id", entry_id.to_string()))
        .bind(("friction", friction))
        .bind(("status", status))
        .await?;

    Ok(status)
}
