//! HTTP service implementation for concurrent URL fan-out.
//!
//! This module defines [`FetchService`], which owns the admission gate and the
//! fan-out engine, and [`router`], which exposes it as a single `POST /`
//! endpoint.
//!
//! ## Responsibilities
//!
//! - Admit or refuse each request before reading its body.
//! - Decode and validate the batch.
//! - Run the fan-out under the request timeout and the service-wide shutdown
//!   scope.
//! - Drain in-flight batches on shutdown, then cancel whatever remains.

use crate::server::{
    config::ServerConfig,
    service::error::ApiError,
    telemetry::{
        decrement_batches_inflight, increment_admission_rejected, increment_batch_errors,
        increment_batches_inflight, increment_requests, increment_urls_fetched,
        record_batch_duration, record_urls_per_batch,
    },
};
use axum::{Json, Router, extract::State, routing::post};
use bytes::Bytes;
use core::time::Duration;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use urlfan_core::{AdmissionGate, Batch, FanOut, FetchedContent, HttpFetcher};

/// How often shutdown re-checks the number of outstanding batches.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared request-handling state.
///
/// Cloning is cheap: the gate and the engine are reference counted and the
/// shutdown token is a handle to the same cancellation tree.
#[derive(Clone)]
pub struct FetchService {
    config: ServerConfig,
    gate: Arc<AdmissionGate>,
    fan_out: Arc<FanOut<HttpFetcher>>,
    shutdown_token: CancellationToken,
}

impl FetchService {
    /// Builds the gate and an HTTP fetcher configured from `config`.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout)?;

        Ok(Self {
            gate: Arc::new(AdmissionGate::new(config.max_clients)),
            fan_out: Arc::new(FanOut::new(fetcher, config.num_workers)),
            shutdown_token: CancellationToken::new(),
            config,
        })
    }

    /// Gracefully shuts the service down.
    ///
    /// New requests are refused immediately. Batches already admitted get up
    /// to `shutdown_timeout` to finish, after which every remaining batch is
    /// cancelled.
    pub async fn shutdown(&self) {
        // Phase 0: stop admitting
        self.gate.close();

        // Phase 1: drain
        let drained = tokio::time::timeout(self.config.shutdown_timeout, async {
            while self.gate.outstanding() > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await;

        if drained.is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "{} batches still in flight after {:?}, cancelling",
                self.gate.outstanding(),
                self.config.shutdown_timeout
            );
        }

        // Phase 2: cancel stragglers
        self.shutdown_token.cancel();

        #[cfg(feature = "tracing")]
        tracing::info!("Fetch service stopped");
    }

    /// Processes one raw request body end to end.
    ///
    /// If `metrics` is enabled, emits telemetry for:
    /// - request rate
    /// - admission refusals
    /// - URLs per batch and URLs fetched
    /// - concurrent batch count
    /// - batch duration
    /// - batch errors
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(bytes = body.len())))]
    pub async fn fetch_batch(&self, body: &[u8]) -> Result<FetchedContent, ApiError> {
        increment_requests();

        // Admission precedes decoding so refused requests cost nothing.
        let _permit = self.gate.try_admit().inspect_err(|_e| {
            increment_admission_rejected();
            #[cfg(feature = "tracing")]
            tracing::debug!("Refusing request: {_e}");
        })?;

        let result = self.admitted(body).await;
        if result.is_err() {
            increment_batch_errors();
        }
        result
    }

    async fn admitted(&self, body: &[u8]) -> Result<FetchedContent, ApiError> {
        let urls: Vec<String> =
            serde_json::from_slice(body).map_err(|_| ApiError::MalformedJson)?;
        let batch = Batch::new(urls)?;
        let total = batch.len();
        record_urls_per_batch(total as f64);

        let _inflight = InflightBatch::start();
        let start = std::time::Instant::now();

        let scope = self.shutdown_token.child_token();
        let outcome =
            tokio::time::timeout(self.config.request_timeout, self.fan_out.fan_out(&scope, batch))
                .await;

        record_batch_duration(start.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok(Ok(content)) => {
                increment_urls_fetched(total as u64);
                #[cfg(feature = "tracing")]
                tracing::debug!("Fetched {total} URLs in {:?}", start.elapsed());
                Ok(content)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Batch of {total} URLs exceeded {:?}",
                    self.config.request_timeout
                );
                Err(ApiError::Timeout)
            }
        }
    }
}

/// Keeps the in-flight gauge balanced on every exit path, including dropped
/// futures.
struct InflightBatch;

impl InflightBatch {
    fn start() -> Self {
        increment_batches_inflight();
        Self
    }
}

impl Drop for InflightBatch {
    fn drop(&mut self) {
        decrement_batches_inflight();
    }
}

/// Builds the public router: `POST /` with permissive CORS.
pub fn router(service: FetchService) -> Router {
    Router::new()
        .route("/", post(fetch_urls))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(service)
}

/// Accepts a JSON array of URLs and answers with a URL → body object.
///
/// The body is taken as raw bytes so admission can run before any parsing.
/// If the client disconnects, this future is dropped and the batch's workers
/// are aborted with it.
async fn fetch_urls(
    State(service): State<FetchService>,
    body: Bytes,
) -> Result<Json<FetchedContent>, ApiError> {
    service.fetch_batch(&body).await.map(Json)
}
