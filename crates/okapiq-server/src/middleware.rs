//! Request middleware: request IDs, API-key checks, and load shedding.
//!
//! Every scan that reaches the orchestrator can fan out to paid providers,
//! so the throttle sits in front of the protected routes and answers
//! over-budget callers with a `Retry-After` hint instead of spending quota.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Request ID carried through extensions and echoed as `x-request-id`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Honors a caller-supplied `x-request-id` so upstream proxies can correlate
/// logs; otherwise mints a fresh UUID.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = match req.headers().get("x-request-id").and_then(|v| v.to_str().ok()) {
        Some(given) => given.to_owned(),
        None => Uuid::new_v4().to_string(),
    };
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", value);
    }
    res
}

/// The set of API keys accepted on protected routes.
///
/// An empty set means open access. That state is only constructible in
/// development; outside it, `from_env` refuses to start without keys.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    accepted: Arc<HashSet<String>>,
}

impl ApiKeys {
    /// Reads comma-separated keys from `OKAPIQ_API_KEYS`.
    ///
    /// # Errors
    ///
    /// Fails when no keys are configured outside development.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("OKAPIQ_API_KEYS").unwrap_or_default();
        let accepted: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if accepted.is_empty() && !is_development {
            anyhow::bail!(
                "OKAPIQ_API_KEYS is required outside development; provide comma-separated keys"
            );
        }
        if accepted.is_empty() {
            tracing::warn!("OKAPIQ_API_KEYS not set; API auth disabled for development");
        }

        Ok(Self {
            accepted: Arc::new(accepted),
        })
    }

    fn open(&self) -> bool {
        self.accepted.is_empty()
    }

    fn accepts(&self, key: &str) -> bool {
        self.accepted.contains(key)
    }

    /// Deterministic construction for handler tests; no keys means open access.
    #[cfg(test)]
    pub(crate) fn for_tests(keys: &[&str]) -> Self {
        Self {
            accepted: Arc::new(keys.iter().map(|k| (*k).to_owned()).collect()),
        }
    }
}

/// Rejects requests on protected routes that do not present an accepted key
/// as `Authorization: Bearer <key>`.
pub async fn require_api_key(State(keys): State<ApiKeys>, req: Request, next: Next) -> Response {
    if keys.open() {
        return next.run(req).await;
    }

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match presented_key(authorization) {
        Some(key) if keys.accepts(key) => next.run(req).await,
        _ => reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid API key",
            None,
        ),
    }
}

fn presented_key(authorization: Option<&str>) -> Option<&str> {
    let key = authorization?.strip_prefix("Bearer ")?.trim();
    (!key.is_empty()).then_some(key)
}

/// Fixed-window request budget shared by the protected routes.
///
/// One shared window rather than per-client buckets: the resource being
/// protected is the upstream provider quota, which is global to the process.
#[derive(Debug, Clone)]
pub struct ScanThrottle {
    budget: usize,
    window: Duration,
    ledger: Arc<Mutex<WindowLedger>>,
}

#[derive(Debug)]
struct WindowLedger {
    opened_at: Instant,
    spent: usize,
}

impl ScanThrottle {
    #[must_use]
    pub fn new(budget: usize, window: Duration) -> Self {
        Self {
            budget,
            window,
            ledger: Arc::new(Mutex::new(WindowLedger {
                opened_at: Instant::now(),
                spent: 0,
            })),
        }
    }

    /// Spends one unit of budget, or reports how many seconds remain until
    /// the window rolls over.
    async fn try_acquire(&self) -> Result<(), u64> {
        let mut ledger = self.ledger.lock().await;
        let elapsed = ledger.opened_at.elapsed();
        if elapsed >= self.window {
            ledger.opened_at = Instant::now();
            ledger.spent = 0;
        } else if ledger.spent >= self.budget {
            let wait = self.window.saturating_sub(elapsed);
            return Err(wait.as_secs().max(1));
        }
        ledger.spent += 1;
        Ok(())
    }
}

pub async fn shed_excess_load(
    State(throttle): State<ScanThrottle>,
    req: Request,
    next: Next,
) -> Response {
    match throttle.try_acquire().await {
        Ok(()) => next.run(req).await,
        Err(retry_after_secs) => reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "request budget exhausted for this window",
            Some(retry_after_secs),
        ),
    }
}

fn reject(
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    retry_after_secs: Option<u64>,
) -> Response {
    let body = serde_json::json!({
        "error": { "code": code, "message": message }
    });
    let mut res = (status, Json(body)).into_response();
    if let Some(secs) = retry_after_secs {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            res.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    res
}
