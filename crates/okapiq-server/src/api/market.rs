//! Market scan handlers.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use okapiq_core::{all_profiles, IndustryProfile, MarketScanResult};
use okapiq_scan::{ScanError, ScanRequest, DEFAULT_MAX_RESULTS};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_RADIUS_MILES: f64 = 25.0;
const DEFAULT_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub(super) struct ScanBody {
    pub location: String,
    pub industry: Option<String>,
    pub max_businesses: Option<usize>,
    pub radius_miles: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScanHistoryItem {
    public_id: String,
    location: String,
    industry: String,
    total_businesses: i64,
    hhi_index: f64,
    partial: bool,
    scanned_at: DateTime<Utc>,
}

pub(super) async fn scan_market(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScanBody>,
) -> Result<Json<ApiResponse<MarketScanResult>>, ApiError> {
    let request = ScanRequest {
        location: body.location,
        industry: body.industry,
        max_results: body.max_businesses.unwrap_or(DEFAULT_MAX_RESULTS),
        radius_miles: body.radius_miles.unwrap_or(DEFAULT_RADIUS_MILES),
    };

    let result = state
        .orchestrator
        .scan(&request)
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    record_scan(&state, &result).await;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_industries(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<&'static [IndustryProfile]>> {
    Json(ApiResponse {
        data: all_profiles(),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn list_scan_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<ScanHistoryItem>>>, ApiError> {
    // No configured database means no history, not an error.
    let Some(pool) = &state.pool else {
        return Ok(Json(ApiResponse {
            data: Vec::new(),
            meta: ResponseMeta::new(req_id.0),
        }));
    };

    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 200);
    let rows = okapiq_db::recent_scans(pool, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ScanHistoryItem {
            public_id: row.public_id,
            location: row.location,
            industry: row.industry,
            total_businesses: row.total_businesses,
            hhi_index: row.hhi_index,
            partial: row.partial,
            scanned_at: row.scanned_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Best-effort history write; a storage failure never fails the scan.
async fn record_scan(state: &AppState, result: &MarketScanResult) {
    let Some(pool) = &state.pool else {
        return;
    };
    let record = match okapiq_db::NewScanRecord::from_result(result) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize scan for history");
            return;
        }
    };
    if let Err(e) = okapiq_db::insert_scan(pool, &record, result).await {
        tracing::warn!(error = %e, "failed to record scan history");
    }
}

fn map_scan_error(request_id: String, error: &ScanError) -> ApiError {
    match error {
        ScanError::InvalidRequest { reason } => {
            ApiError::new(request_id, "validation_error", reason.clone())
        }
        ScanError::NoSourcesConfigured => ApiError::new(
            request_id,
            "unavailable",
            "no data sources are configured",
        ),
        ScanError::AllSourcesUnavailable { .. } => {
            tracing::error!(error = %error, "scan failed: all sources unavailable");
            ApiError::new(request_id, "unavailable", "all data sources failed")
        }
    }
}

fn map_db_error(request_id: String, error: &okapiq_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}
