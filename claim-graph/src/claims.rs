//! Claim storage (E, §4.4): claims keyed by `(entry_id, ordinal)`, created once by
//! DISTILL_CLAIMS completion and never edited afterwards (§3 lifecycles).
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::claim::Claim;
use common::storage::types::job::DistillResult;

pub async fn claims_for_entry(db: &SurrealDbClient, entry_id: &str) -> Result<Vec<Claim>, AppError> {
    let mut claims: Vec<Claim> = db
        .client
        .query("SELECT * FROM claim WHERE entry_id = $entry_id")
        .bind(("entry_id", entry_id.to_string()))
        .await?
        .take(0)?;
    claims.sort_by_key(|c| c.ordinal);
    Ok(claims)
}

/// Replaces `entry_id`'s claims with `result`'s. At-least-once delivery means DISTILL
/// completion can be handled more than once (§4.3): deleting before inserting makes a
/// re-delivery idempotent rather than appending duplicate claims.
pub async fn store_distilled_claims(
    db: &SurrealDbClient,
    entry_id: &str,
    result: &DistillResult,
) -> Result<Vec<Claim>, AppError> {
    db.client
        .query("DELETE claim WHERE entry_id = $entry_id")
        .bind(("entry_id", entry_id.to_string()))
        .await?;

    let mut stored = Vec::with_capacity(result.claims.len());
    for (ordinal, distilled) in result.claims.iter().enumerate() {
        let claim = Claim::new(
            entry_id.to_string(),
            ordinal as u32,
            distilled.text.clone(),
            distilled.confidence,
        );
        db.store_item(claim.clone()).await?;
        stored.push(claim);
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::job::DistilledClaim;

    async fn test_db() -> SurrealDbClient {
        let db = SurrealDbClient::memory("test", &uuid::Uuid::new_v4().to_string())
            .await
            .unwrap();
        db.ensure_schema().await.unwrap();
        db
    }

    #[tokio::test]
    async fn storing_twice_is_idempotent_in_count() {
        let db = test_db().await;
        let result = DistillResult {
            claims: vec![
                DistilledClaim {
                    text: "Earth is round".into(),
                    confidence: 0.95,
                },
                DistilledClaim {
                    text: "Earth orbits the sun".into(),
                    confidence: 0.9,
                },
            ],
        };
        store_distilled_claims(&db, "entry-1", &result).await.unwrap();
        store_distilled_claims(&db, "entry-1", &result).await.unwrap();

        let claims = claims_for_entry(&db, "entry-1").await.unwrap();
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].ordinal, 0);
        assert_eq!(claims[1].ordinal, 1);
    }
}
