//! Bounded-concurrency batch fetching.
//!
//! [`fetch_batch`] issues every request of a batch with at most
//! `concurrency_limit` in flight and returns one [`FetchResult`] per request,
//! in request order regardless of which response arrived first. A failing
//! request is recorded at its index and never aborts the rest of the batch.
//!
//! The transport sits behind [`HttpGet`] so the pipeline can run against a
//! real [`HttpFetcher`] or an in-memory stand-in.
//!
//! No retries are attempted. Each request is bounded by the client timeout,
//! and dropping the batch future cancels every request still in flight.

use crate::error::ScrapeError;
use crate::models::{FetchFailure, FetchRequest, FetchResult};
use futures::stream::{self, StreamExt};
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A single HTTP GET that never fails outright.
///
/// Implementors turn every transport problem into a
/// [`FetchResult::Failure`] instead of an error.
pub trait HttpGet {
    async fn get(&self, request: &FetchRequest) -> FetchResult;
}

/// [`HttpGet`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with a per-request `timeout` and the given user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpGet for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(url = %request.url))]
    async fn get(&self, request: &FetchRequest) -> FetchResult {
        let response = match self
            .client
            .get(&request.url)
            .query(&request.query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return FetchResult::Failure {
                    reason: classify(&e),
                };
            }
        };

        let status = response.status().as_u16();
        if status >= 400 {
            return FetchResult::Failure {
                reason: FetchFailure::HttpStatus(status),
            };
        }

        match response.text().await {
            Ok(body) => FetchResult::Success {
                status_code: status,
                body,
            },
            Err(e) => FetchResult::Failure {
                reason: classify(&e),
            },
        }
    }
}

fn classify(e: &reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if let Some(status) = e.status() {
        FetchFailure::HttpStatus(status.as_u16())
    } else {
        FetchFailure::Network(e.to_string())
    }
}

/// Fetch every request with at most `concurrency_limit` in flight.
///
/// The returned vector has the same length as `requests` and `results[i]`
/// always belongs to `requests[i]`.
#[instrument(level = "info", skip_all, fields(requests = requests.len(), limit = concurrency_limit.get()))]
pub async fn fetch_batch<G: HttpGet>(
    getter: &G,
    requests: &[FetchRequest],
    concurrency_limit: NonZeroUsize,
) -> Vec<FetchResult> {
    if requests.is_empty() {
        return Vec::new();
    }

    let results: Vec<FetchResult> = stream::iter(requests.iter().enumerate())
        .map(|(index, request)| async move {
            let result = getter.get(request).await;
            match &result {
                FetchResult::Success { status_code, body } => {
                    debug!(index, url = %request.url, status_code, bytes = body.len(), "Fetched");
                }
                FetchResult::Failure { reason } => {
                    warn!(index, url = %request.url, %reason, "Fetch failed");
                }
            }
            result
        })
        .buffered(concurrency_limit.get())
        .collect()
        .await;

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!(
        total = results.len(),
        succeeded,
        failed = results.len() - succeeded,
        "Batch complete"
    );
    results
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory [`HttpGet`] used by unit tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Key a request by its URL and query string.
    pub fn key(request: &FetchRequest) -> String {
        if request.query.is_empty() {
            return request.url.clone();
        }
        let query = request
            .query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", request.url, query)
    }

    /// Serves canned responses; anything unrouted is a 404.
    #[derive(Default)]
    pub struct MockHttp {
        routes: HashMap<String, (FetchResult, u64)>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl MockHttp {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(self, key: &str, body: &str) -> Self {
            self.ok_after(key, body, 0)
        }

        pub fn ok_after(mut self, key: &str, body: &str, delay_ms: u64) -> Self {
            self.routes.insert(
                key.to_string(),
                (
                    FetchResult::Success {
                        status_code: 200,
                        body: body.to_string(),
                    },
                    delay_ms,
                ),
            );
            self
        }

        pub fn fail(mut self, key: &str, reason: FetchFailure) -> Self {
            self.routes
                .insert(key.to_string(), (FetchResult::Failure { reason }, 0));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }
    }

    impl HttpGet for MockHttp {
        async fn get(&self, request: &FetchRequest) -> FetchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            let (result, delay_ms) = self.routes.get(&key(request)).cloned().unwrap_or((
                FetchResult::Failure {
                    reason: FetchFailure::HttpStatus(404),
                },
                0,
            ));
            // Always yield once so concurrent requests overlap.
            tokio::time::sleep(Duration::from_millis(delay_ms.max(1))).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockHttp;
    use super::*;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn requests(n: usize) -> Vec<FetchRequest> {
        (0..n)
            .map(|i| FetchRequest::new(format!("https://example.com/{i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let http = MockHttp::new();
        let results = fetch_batch(&http, &[], limit(4)).await;
        assert!(results.is_empty());
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn test_results_follow_request_order() {
        // Earlier requests answer later, so completion order is reversed.
        let http = MockHttp::new()
            .ok_after("https://example.com/0", "zero", 40)
            .ok_after("https://example.com/1", "one", 20)
            .ok_after("https://example.com/2", "two", 1);

        let results = fetch_batch(&http, &requests(3), limit(3)).await;
        let bodies: Vec<_> = results.iter().map(|r| r.body().unwrap()).collect();
        assert_eq!(bodies, vec!["zero", "one", "two"]);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let http = MockHttp::new()
            .ok("https://example.com/0", "a")
            .ok("https://example.com/2", "c")
            .ok("https://example.com/4", "e");

        let results = fetch_batch(&http, &requests(5), limit(2)).await;
        assert_eq!(results.len(), 5);
        for i in [0, 2, 4] {
            assert!(results[i].is_success(), "position {i} should succeed");
        }
        for i in [1, 3] {
            assert_eq!(
                results[i],
                FetchResult::Failure {
                    reason: FetchFailure::HttpStatus(404)
                }
            );
        }
    }

    #[tokio::test]
    async fn test_failure_reasons_are_preserved() {
        let http = MockHttp::new()
            .fail("https://example.com/0", FetchFailure::Timeout)
            .fail(
                "https://example.com/1",
                FetchFailure::Network("connection refused".into()),
            );

        let results = fetch_batch(&http, &requests(2), limit(1)).await;
        assert_eq!(
            results[0],
            FetchResult::Failure {
                reason: FetchFailure::Timeout
            }
        );
        assert!(matches!(
            &results[1],
            FetchResult::Failure { reason: FetchFailure::Network(msg) } if msg == "connection refused"
        ));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut http = MockHttp::new();
        for i in 0..12 {
            http = http.ok_after(&format!("https://example.com/{i}"), "x", 10);
        }

        let results = fetch_batch(&http, &requests(12), limit(3)).await;
        assert_eq!(results.len(), 12);
        assert_eq!(http.calls(), 12);
        assert!(http.peak_in_flight() <= 3);
        assert!(http.peak_in_flight() >= 2);
    }

    #[test]
    fn test_mock_key_includes_query() {
        let req = FetchRequest::new("https://example.com/api").with_param("page", 1);
        assert_eq!(mock::key(&req), "https://example.com/api?page=1");
    }
}
