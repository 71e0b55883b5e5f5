use crate::server::config::ServerConfig;
use crate::server::error::ApiError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tower_http::trace::TraceLayer;
use uidgen::{Clock, IssuerPool, TimeSource, Uid};

/// State shared by every request: the issuer pool plus request limits.
pub struct AppState<T = Clock>
where
    T: TimeSource,
{
    pool: Arc<IssuerPool<T>>,
    max_ids_per_request: i64,
    acquire_timeout: Option<Duration>,
    serving: Arc<AtomicBool>,
}

// Derived `Clone` would require `T: Clone`.
impl<T> Clone for AppState<T>
where
    T: TimeSource,
{
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            max_ids_per_request: self.max_ids_per_request,
            acquire_timeout: self.acquire_timeout,
            serving: Arc::clone(&self.serving),
        }
    }
}

impl<T> AppState<T>
where
    T: TimeSource + Clone,
{
    /// Builds the issuer pool for `config.node_id` with `config.num_issuers`
    /// issuers reading from `time`.
    ///
    /// # Errors
    ///
    /// Fails if the node id or pool size is out of range.
    pub fn new(config: &ServerConfig, time: T) -> uidgen::Result<Self> {
        let pool = IssuerPool::with_size(config.node_id, time, config.num_issuers)?;
        Ok(Self {
            pool: Arc::new(pool),
            max_ids_per_request: config.max_ids_per_request,
            acquire_timeout: config.acquire_timeout,
            serving: Arc::new(AtomicBool::new(true)),
        })
    }
}

impl<T> AppState<T>
where
    T: TimeSource,
{
    /// Flag read by `/health`; cleared when shutdown starts.
    ///
    /// The listener stops accepting as soon as shutdown starts, so the `503`
    /// from `/health` is only observable on connections that were already
    /// open (keep-alive) while in-flight requests drain.
    pub fn serving(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.serving)
    }
}

pub fn router<T>(state: AppState<T>) -> Router
where
    T: TimeSource + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(generate_ids::<T>))
        .route("/health", get(health::<T>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    #[serde(rename = "numberOfIds")]
    number_of_ids: Option<String>,
}

impl GenerateParams {
    /// Absent or unparsable counts mean a single ID. Non-positive counts are
    /// passed through and coerced to one by the issuer.
    fn count(&self) -> i64 {
        self.number_of_ids
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(1)
    }
}

#[derive(Debug, Serialize)]
pub struct IdsResponse {
    ids: Vec<Uid>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

async fn generate_ids<T>(
    State(state): State<AppState<T>>,
    Query(params): Query<GenerateParams>,
) -> Result<Json<IdsResponse>, ApiError>
where
    T: TimeSource + Send + Sync + 'static,
{
    let count = params.count();
    if count > state.max_ids_per_request {
        return Err(ApiError::TooManyIds {
            requested: count,
            max: state.max_ids_per_request,
        });
    }

    let pool = Arc::clone(&state.pool);
    let timeout = state.acquire_timeout;

    // Acquiring may block on the pool and generating may sleep for the next
    // tick, so both stay off the async workers.
    let ids = tokio::task::spawn_blocking(move || -> uidgen::Result<Vec<Uid>> {
        let issuer = match timeout {
            Some(timeout) => pool.acquire_timeout(timeout)?,
            None => pool.acquire()?,
        };
        tracing::debug!(issuer_id = issuer.issuer_id(), count, "generating ids");
        issuer.generate(count)
    })
    .await??;

    Ok(Json(IdsResponse { ids }))
}

async fn health<T>(State(state): State<AppState<T>>) -> (StatusCode, Json<HealthResponse>)
where
    T: TimeSource + Send + Sync + 'static,
{
    if state.serving.load(Ordering::Acquire) {
        (StatusCode::OK, Json(HealthResponse { status: "ok" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "shutting down",
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::LogFormat;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicI64;
    use tower::ServiceExt;
    use uidgen::{ClockKind, Layout};

    #[derive(Clone)]
    struct MockTime {
        now: Arc<AtomicI64>,
    }

    impl MockTime {
        fn at(tick: i64) -> Self {
            Self {
                now: Arc::new(AtomicI64::new(tick)),
            }
        }

        fn set(&self, tick: i64) {
            self.now.store(tick, Ordering::SeqCst);
        }
    }

    impl TimeSource for MockTime {
        fn current_time(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }

    fn config(num_issuers: usize, max_ids_per_request: i64) -> ServerConfig {
        ServerConfig {
            server_addr: "127.0.0.1:0".into(),
            node_id: 5,
            clock_kind: ClockKind::Epoch,
            offset: ClockKind::Epoch.default_offset(),
            num_issuers,
            max_ids_per_request,
            acquire_timeout: Some(Duration::from_millis(50)),
            log_format: LogFormat::Pretty,
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn ids_of(body: &serde_json::Value) -> Vec<u64> {
        body["ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|id| id.as_u64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn returns_the_requested_number_of_ids() {
        let state = AppState::new(&config(31, 1_000), MockTime::at(42)).unwrap();
        let (status, body) = get_json(router(state), "/?numberOfIds=3").await;

        assert_eq!(status, StatusCode::OK);
        let ids = ids_of(&body);
        assert_eq!(ids.len(), 3);

        let layout = Layout::DEFAULT;
        for (sequence, id) in ids.iter().enumerate() {
            assert_eq!(layout.timestamp_of(*id), 42);
            assert_eq!(layout.node_id_of(*id), 5);
            assert_eq!(layout.sequence_of(*id), sequence as u64);
        }
    }

    #[tokio::test]
    async fn lenient_count_parsing() {
        let state = AppState::new(&config(31, 1_000), MockTime::at(1)).unwrap();

        for uri in ["/", "/?numberOfIds=", "/?numberOfIds=abc", "/?numberOfIds=0", "/?numberOfIds=-4"] {
            let (status, body) = get_json(router(state.clone()), uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(ids_of(&body).len(), 1, "{uri}");
        }
    }

    #[tokio::test]
    async fn ids_are_unique_across_requests() {
        let state = AppState::new(&config(31, 1_000), MockTime::at(7)).unwrap();
        let mut seen = HashSet::new();

        for _ in 0..20 {
            let (status, body) = get_json(router(state.clone()), "/?numberOfIds=5").await;
            assert_eq!(status, StatusCode::OK);
            for id in ids_of(&body) {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 100);
    }

    #[tokio::test]
    async fn rejects_batches_above_the_limit() {
        let state = AppState::new(&config(31, 10), MockTime::at(1)).unwrap();
        let (status, body) = get_json(router(state.clone()), "/?numberOfIds=11").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("limit of 10"));

        let (status, _) = get_json(router(state), "/?numberOfIds=10").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn clock_regression_is_a_server_error() {
        let time = MockTime::at(100);
        let state = AppState::new(&config(1, 1_000), time.clone()).unwrap();

        let (status, _) = get_json(router(state.clone()), "/").await;
        assert_eq!(status, StatusCode::OK);

        time.set(99);
        let (status, body) = get_json(router(state.clone()), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("clock moved backwards"));

        // The issuer went back to the pool and works once time catches up.
        time.set(101);
        let (status, _) = get_json(router(state), "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn exhausted_pool_times_out_with_503() {
        let state = AppState::new(&config(1, 1_000), MockTime::at(1)).unwrap();
        let held = state.pool.acquire().unwrap();

        let (status, body) = get_json(router(state.clone()), "/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());

        held.release();
        let (status, _) = get_json(router(state), "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reflects_shutdown() {
        let state = AppState::new(&config(31, 1_000), MockTime::at(1)).unwrap();

        let (status, body) = get_json(router(state.clone()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        state.serving().store(false, Ordering::Release);
        let (status, _) = get_json(router(state), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
