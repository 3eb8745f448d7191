//! Single-URL fetching.
//!
//! [`Fetch`] is the seam between the worker pool and the network. The pool only
//! cares whether a fetch produced content or failed; every failure kind is
//! folded into one [`Error`] value with a readable cause.
//!
//! [`HttpFetcher`] is the production implementation backed by a shared
//! `reqwest` client. Each fetch is bounded by the client's per-request timeout
//! and raced against the batch scope, so an in-flight request is abandoned as
//! soon as the scope is cancelled. Fetches are never retried.

use crate::{Error, Result};
use core::time::Duration;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;

/// Performs one fetch of one identifier.
pub trait Fetch: Send + Sync {
    /// Returns the body of `url`, or an error if the request failed, timed
    /// out, returned a status other than `200 OK`, or `scope` was cancelled.
    fn fetch(
        &self,
        scope: &CancellationToken,
        url: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// HTTP `GET` fetcher with a fixed per-fetch timeout.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend or resolver cannot be initialized.
    pub fn new(timeout: Duration) -> core::result::Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client. The client's own timeout applies.
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(url, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::BadResponse {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Error::from_reqwest(url, &e))
    }
}

impl Fetch for HttpFetcher {
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, scope)))]
    async fn fetch(&self, scope: &CancellationToken, url: &str) -> Result<String> {
        if scope.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;

            () = scope.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Abandoning fetch of {url}: scope cancelled");
                Err(Error::Cancelled)
            }
            res = self.get(url) => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode as UpstreamStatus, routing::get};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn spawn_upstream() -> SocketAddr {
        let app = Router::new()
            .route("/ok", get(|| async { "hello" }))
            .route(
                "/missing",
                get(|| async { (UpstreamStatus::NOT_FOUND, "nope") }),
            )
            .route("/empty", get(|| async { UpstreamStatus::NO_CONTENT }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn returns_body_on_200() {
        let addr = spawn_upstream().await;
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let body = fetcher
            .fetch(&CancellationToken::new(), &format!("http://{addr}/ok"))
            .await
            .unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn non_ok_status_is_a_bad_response() {
        let addr = spawn_upstream().await;
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let scope = CancellationToken::new();

        for (path, status) in [("missing", 404), ("empty", 204)] {
            let url = format!("http://{addr}/{path}");
            let err = fetcher.fetch(&scope, &url).await.unwrap_err();
            assert_eq!(err, Error::BadResponse { url, status });
        }
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let addr = spawn_upstream().await;
        let fetcher = HttpFetcher::new(Duration::from_millis(100)).unwrap();
        let url = format!("http://{addr}/slow");
        let err = fetcher
            .fetch(&CancellationToken::new(), &url)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Timeout { url });
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let err = fetcher
            .fetch(&CancellationToken::new(), &format!("http://{addr}/ok"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn cancelled_scope_short_circuits() {
        let addr = spawn_upstream().await;
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let scope = CancellationToken::new();
        scope.cancel();
        let err = fetcher
            .fetch(&scope, &format!("http://{addr}/ok"))
            .await
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
    }

    #[tokio::test]
    async fn cancellation_interrupts_in_flight_fetch() {
        let addr = spawn_upstream().await;
        let fetcher = HttpFetcher::new(Duration::from_secs(10)).unwrap();
        let scope = CancellationToken::new();

        let canceller = scope.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let err = fetcher
            .fetch(&scope, &format!("http://{addr}/slow"))
            .await
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
