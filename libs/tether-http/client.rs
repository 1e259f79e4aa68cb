use crate::dump::{dump_request, ResponseSummary};
use crate::error::{HttpError, Result};
use crate::hooks::*;
use reqwest::{Client, IntoUrl, Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// HTTP client with pluggable lifecycle hooks
///
/// Only a 200 response counts as success; anything else goes to the error
/// hook and is returned as `HttpError::Status`.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    prepare: Arc<dyn PrepareHook>,
    success: Arc<dyn SuccessHook>,
    error: Arc<dyn ErrorHook>,
    finish: Arc<dyn FinishHook>,
    dump: bool,
}

impl HttpClient {
    /// Wrap an existing `reqwest::Client` with the default hooks
    pub fn new(client: Client) -> Self {
        Self {
            client,
            prepare: Arc::new(NoCache),
            success: Arc::new(LogSuccess),
            error: Arc::new(LogFailure),
            finish: Arc::new(LogElapsed),
            dump: false,
        }
    }

    /// Log every request before it is sent
    pub fn dump(mut self) -> Self {
        self.dump = true;
        self
    }

    pub fn is_dump(&self) -> bool {
        self.dump
    }

    pub fn on_prepare(mut self, hook: impl PrepareHook) -> Self {
        self.prepare = Arc::new(hook);
        self
    }

    pub fn on_success(mut self, hook: impl SuccessHook) -> Self {
        self.success = Arc::new(hook);
        self
    }

    pub fn on_error(mut self, hook: impl ErrorHook) -> Self {
        self.error = Arc::new(hook);
        self
    }

    pub fn on_finish(mut self, hook: impl FinishHook) -> Self {
        self.finish = Arc::new(hook);
        self
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.client.request(method, url)
    }

    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: impl IntoUrl) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send a request and hand a 200 response to the success hook
    pub async fn execute(&self, request: Request) -> Result<()> {
        let success = Arc::clone(&self.success);
        self.execute_with(request, move |response| async move {
            success.on_success(response).await
        })
        .await
    }

    /// Send a request and hand a 200 response to `next` instead of the
    /// success hook
    pub async fn execute_with<T, F, Fut>(&self, mut request: Request, next: F) -> Result<T>
    where
        F: FnOnce(Response) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        self.prepare.prepare(&mut request);
        if self.dump {
            info!("[http] request\n{}", dump_request(&request));
        }

        let (summary, result) = self.send(request, next).await;
        self.finish.on_finish(summary.as_ref(), started.elapsed());
        result
    }

    /// Send a request and decode a 200 response body as JSON
    pub async fn result<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        self.execute_with(request, |response| async move {
            response
                .json::<T>()
                .await
                .map_err(|e| HttpError::DeserializeFailed(e.to_string()))
        })
        .await
    }

    async fn send<T, F, Fut>(
        &self,
        request: Request,
        next: F,
    ) -> (Option<ResponseSummary>, Result<T>)
    where
        F: FnOnce(Response) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                let err = HttpError::from(e);
                self.error.on_error(None, &err);
                return (None, Err(err));
            }
        };

        let mut summary = ResponseSummary::from_response(&response);
        if response.status() != StatusCode::OK {
            summary.body = response.text().await.ok();
            let err = HttpError::Status {
                status: summary.status,
                body: summary.body.clone(),
            };
            self.error.on_error(Some(&summary), &err);
            return (Some(summary), Err(err));
        }

        (Some(summary), next(response).await)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}
