//! Database operations for the `scan_history` table.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use okapiq_core::MarketScanResult;

use crate::DbError;

/// A row from the `scan_history` table. `result_json` is the full
/// [`MarketScanResult`], stored verbatim.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanHistoryRow {
    pub id: i64,
    pub public_id: String,
    pub location: String,
    pub industry: String,
    pub total_businesses: i64,
    pub hhi_index: f64,
    pub partial: bool,
    pub result_json: String,
    pub scanned_at: DateTime<Utc>,
}

/// Insert payload derived from a finished scan.
#[derive(Debug)]
pub struct NewScanRecord {
    pub public_id: Uuid,
    pub result_json: String,
}

impl NewScanRecord {
    /// # Errors
    ///
    /// Returns [`DbError::Serialize`] if the result cannot be serialized.
    pub fn from_result(result: &MarketScanResult) -> Result<Self, DbError> {
        Ok(Self {
            public_id: Uuid::new_v4(),
            result_json: serde_json::to_string(result)?,
        })
    }
}

/// Records one completed scan. Returns the new row id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_scan(
    pool: &SqlitePool,
    record: &NewScanRecord,
    result: &MarketScanResult,
) -> Result<i64, DbError> {
    #[allow(clippy::cast_possible_wrap)]
    let total = result.total_businesses as i64;

    let row = sqlx::query_scalar::<_, i64>(
        "INSERT INTO scan_history \
         (public_id, location, industry, total_businesses, hhi_index, partial, result_json, scanned_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         RETURNING id",
    )
    .bind(record.public_id.to_string())
    .bind(&result.location)
    .bind(&result.industry)
    .bind(total)
    .bind(result.analytics.hhi_index)
    .bind(result.provenance.partial)
    .bind(&record.result_json)
    .bind(result.scanned_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// The most recent scans, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn recent_scans(pool: &SqlitePool, limit: i64) -> Result<Vec<ScanHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanHistoryRow>(
        "SELECT id, public_id, location, industry, total_businesses, hhi_index, \
                partial, result_json, scanned_at \
         FROM scan_history \
         ORDER BY scanned_at DESC, id DESC \
         LIMIT ?1",
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Total rows in `scan_history`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn scan_count(pool: &SqlitePool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scan_history")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use okapiq_core::{AggregateStats, ScanProvenance, SourceId};

    fn result(location: &str, scanned_at: DateTime<Utc>) -> MarketScanResult {
        MarketScanResult {
            location: location.to_owned(),
            industry: "hvac".to_owned(),
            businesses: vec![],
            total_businesses: 3,
            analytics: AggregateStats {
                hhi_index: 3_333.3,
                concentration_label: "Highly Concentrated".to_owned(),
                fragmentation_score: 66.7,
                business_density: None,
                avg_succession_risk: 55.0,
                ad_spend_to_dominate_usd: 930.0,
                total_market_revenue_usd: 2_550_000.0,
            },
            provenance: ScanProvenance {
                sources_used: vec![SourceId::Yelp],
                sources_failed: vec![SourceId::GooglePlaces],
                partial: true,
            },
            map_center: None,
            top_zips: vec![],
            demographics: None,
            scanned_at,
        }
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let pool = crate::connect("sqlite::memory:").await.expect("connect");
        let scanned_at = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let res = result("94102", scanned_at);
        let record = NewScanRecord::from_result(&res).expect("serialize");

        let id = insert_scan(&pool, &record, &res).await.expect("insert");
        assert!(id > 0);

        let rows = recent_scans(&pool, 10).await.expect("query");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, "94102");
        assert_eq!(rows[0].total_businesses, 3);
        assert!(rows[0].partial);

        let stored: MarketScanResult =
            serde_json::from_str(&rows[0].result_json).expect("round trip");
        assert_eq!(stored.industry, "hvac");
    }

    #[tokio::test]
    async fn recent_scans_orders_newest_first() {
        let pool = crate::connect("sqlite::memory:").await.expect("connect");

        for (loc, day) in [("old-town", 10), ("mid-town", 15), ("new-town", 20)] {
            let scanned_at = Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap();
            let res = result(loc, scanned_at);
            let record = NewScanRecord::from_result(&res).expect("serialize");
            insert_scan(&pool, &record, &res).await.expect("insert");
        }

        let rows = recent_scans(&pool, 2).await.expect("query");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].location, "new-town");
        assert_eq!(rows[1].location, "mid-town");
        assert_eq!(scan_count(&pool).await.expect("count"), 3);
    }
}
