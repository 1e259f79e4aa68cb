//! Request lifecycle hooks
//!
//! Sync closures implement `PrepareHook`, `ErrorHook` and `FinishHook`. The
//! success hook consumes the response body and is async, so it is
//! implemented on a type; one-off success handling goes through
//! `HttpClient::execute_with` instead.

use crate::dump::ResponseSummary;
use crate::error::{HttpError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::{Request, Response};
use std::time::Duration;
use tracing::{debug, error, info};

/// Runs on every request before it is sent
pub trait PrepareHook: Send + Sync + 'static {
    fn prepare(&self, request: &mut Request);
}

/// Consumes a 200 response
#[async_trait]
pub trait SuccessHook: Send + Sync + 'static {
    async fn on_success(&self, response: Response) -> Result<()>;
}

/// Runs when sending fails or the status is not 200
///
/// `response` is `None` when no response arrived.
pub trait ErrorHook: Send + Sync + 'static {
    fn on_error(&self, response: Option<&ResponseSummary>, error: &HttpError);
}

/// Runs last, on every path
pub trait FinishHook: Send + Sync + 'static {
    fn on_finish(&self, response: Option<&ResponseSummary>, elapsed: Duration);
}

impl<F> PrepareHook for F
where
    F: Fn(&mut Request) + Send + Sync + 'static,
{
    fn prepare(&self, request: &mut Request) {
        self(request)
    }
}

impl<F> ErrorHook for F
where
    F: Fn(Option<&ResponseSummary>, &HttpError) + Send + Sync + 'static,
{
    fn on_error(&self, response: Option<&ResponseSummary>, error: &HttpError) {
        self(response, error)
    }
}

impl<F> FinishHook for F
where
    F: Fn(Option<&ResponseSummary>, Duration) + Send + Sync + 'static,
{
    fn on_finish(&self, response: Option<&ResponseSummary>, elapsed: Duration) {
        self(response, elapsed)
    }
}

/// Default prepare hook: disables caching
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl PrepareHook for NoCache {
    fn prepare(&self, request: &mut Request) {
        let headers = request.headers_mut();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    }
}

/// Default success hook: logs the full response
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSuccess;

#[async_trait]
impl SuccessHook for LogSuccess {
    async fn on_success(&self, response: Response) -> Result<()> {
        let mut summary = ResponseSummary::from_response(&response);
        summary.body = Some(response.text().await?);
        info!("[http] success, content:\n{}", summary.dump());
        Ok(())
    }
}

/// Default error hook
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailure;

impl ErrorHook for LogFailure {
    fn on_error(&self, response: Option<&ResponseSummary>, error: &HttpError) {
        let content = response.map(ResponseSummary::dump).unwrap_or_default();
        error!("[http] failure, content: {}: {}", content, error);
    }
}

/// Default finish hook: records the elapsed time
#[derive(Debug, Clone, Copy, Default)]
pub struct LogElapsed;

impl FinishHook for LogElapsed {
    fn on_finish(&self, response: Option<&ResponseSummary>, elapsed: Duration) {
        match response {
            Some(response) => debug!(
                "[http] time [{:.3} s], response:\n{}",
                elapsed.as_secs_f64(),
                response.dump()
            ),
            None => debug!(
                "[http] time [{:.3} s], not response",
                elapsed.as_secs_f64()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cache_sets_both_headers() {
        let mut request = reqwest::Client::new()
            .get("http://localhost/ticker")
            .header(CACHE_CONTROL, "max-age=60")
            .build()
            .unwrap();
        NoCache.prepare(&mut request);
        assert_eq!(request.headers()[CACHE_CONTROL], "no-cache");
        assert_eq!(request.headers()[PRAGMA], "no-cache");
        assert_eq!(request.headers().get_all(CACHE_CONTROL).iter().count(), 1);
    }

    #[test]
    fn closures_are_hooks() {
        fn assert_prepare(_: impl PrepareHook) {}
        fn assert_error(_: impl ErrorHook) {}
        fn assert_finish(_: impl FinishHook) {}

        assert_prepare(|request: &mut Request| {
            request.headers_mut().clear();
        });
        assert_error(|_: Option<&ResponseSummary>, _: &HttpError| {});
        assert_finish(|_: Option<&ResponseSummary>, _: Duration| {});
    }
}
