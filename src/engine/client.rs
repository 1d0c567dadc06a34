//! Pull and build entry points.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::watch;

use super::handle::{OperationHandle, OperationObserver, OperationSnapshot};
use super::registry::{OperationRegistry, OperationToken};
use super::request::{BuildRequest, ImageReference};
use super::runner::{EngineRequest, Operation};
use crate::adapters::ReqwestHttpClient;
use crate::archive::build_context;
use crate::config::EngineConfig;
use crate::error::{classify_http_error, BerthResult};
use crate::progress::{BuildAggregator, BuildStatus, ProgressAggregator, PullAggregator, PullStatus};
use crate::traits::{Headers, HttpClient};

const TAR_CONTENT_TYPE: &str = "application/x-tar";

/// Client for the engine's pull and build endpoints.
///
/// Each started operation runs on its own tokio task and is tracked in a
/// registry until it ends. Pulls and builds use separate registries, so a
/// pull token never cancels a build.
///
/// # Example
///
/// ```ignore
/// let engine = EngineClient::from_config(EngineConfig::from_env())?;
/// let handle = engine.start_pull("nginx:alpine", ())?;
/// let status = handle.wait().await?;
/// println!("{}% of {} layers", status.overall.percent, status.layers.len());
/// ```
pub struct EngineClient<C: HttpClient> {
    http: Arc<C>,
    config: EngineConfig,
    pulls: OperationRegistry,
    builds: OperationRegistry,
}

impl<C: HttpClient> Clone for EngineClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            config: self.config.clone(),
            pulls: self.pulls.clone(),
            builds: self.builds.clone(),
        }
    }
}

impl EngineClient<ReqwestHttpClient> {
    /// Client talking HTTP to `config.base_url`.
    pub fn from_config(config: EngineConfig) -> BerthResult<Self> {
        let http = ReqwestHttpClient::from_config(&config)
            .map_err(|err| classify_http_error(err, &config.base_url))?;
        Ok(Self::new(http, config))
    }
}

impl<C: HttpClient + 'static> EngineClient<C> {
    pub fn new(http: C, config: EngineConfig) -> Self {
        Self::with_shared(Arc::new(http), config)
    }

    /// Client reusing an HTTP client that is shared elsewhere.
    pub fn with_shared(http: Arc<C>, config: EngineConfig) -> Self {
        Self {
            http,
            config,
            pulls: OperationRegistry::new(),
            builds: OperationRegistry::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registry of pulls still running.
    pub fn active_pulls(&self) -> &OperationRegistry {
        &self.pulls
    }

    /// Registry of builds still running.
    pub fn active_builds(&self) -> &OperationRegistry {
        &self.builds
    }

    /// Start pulling `image` and return immediately.
    ///
    /// Only an unparseable reference fails here. Everything after that,
    /// including connection errors, is reported through the observer and
    /// the handle.
    pub fn start_pull<O>(
        &self,
        image: &str,
        observer: O,
    ) -> BerthResult<OperationHandle<PullStatus>>
    where
        O: OperationObserver<PullStatus>,
    {
        let image = ImageReference::parse(image)?;
        let aggregator =
            PullAggregator::new(Instant::now()).with_speed_window(self.config.speed_window);
        let request = EngineRequest {
            url: self.config.endpoint(&image.pull_path()),
            body: Bytes::new(),
            headers: Headers::new(),
            error_display_limit: self.config.error_display_limit,
        };

        Ok(self.spawn("pull", image.to_string(), &self.pulls, aggregator, observer, request))
    }

    /// Cancel a running pull. `false` if the token is unknown or finished.
    pub fn cancel_pull(&self, token: &OperationToken) -> bool {
        let cancelled = self.pulls.cancel(token);
        tracing::debug!(%token, cancelled, "Cancel pull requested");
        cancelled
    }

    /// Start a build of `request` and return immediately.
    pub fn build_image<O>(&self, request: BuildRequest, observer: O) -> OperationHandle<BuildStatus>
    where
        O: OperationObserver<BuildStatus>,
    {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), TAR_CONTENT_TYPE.to_string());
        let body = Bytes::from(build_context(&request.recipe_text));
        tracing::debug!(bytes = body.len(), tag = %request.tag, "Built context archive");

        let engine_request = EngineRequest {
            url: self.config.endpoint(&request.build_path()),
            body,
            headers,
            error_display_limit: self.config.error_display_limit,
        };

        self.spawn(
            "build",
            request.tag.trim().to_string(),
            &self.builds,
            BuildAggregator::new(),
            observer,
            engine_request,
        )
    }

    /// Cancel a running build. `false` if the token is unknown or finished.
    pub fn cancel_build(&self, token: &OperationToken) -> bool {
        let cancelled = self.builds.cancel(token);
        tracing::debug!(%token, cancelled, "Cancel build requested");
        cancelled
    }

    fn spawn<A, O>(
        &self,
        kind: &'static str,
        subject: String,
        registry: &OperationRegistry,
        aggregator: A,
        observer: O,
        request: EngineRequest,
    ) -> OperationHandle<A::Status>
    where
        A: ProgressAggregator,
        O: OperationObserver<A::Status>,
    {
        let (token, cancel) = registry.register();
        let (state, state_rx) = watch::channel(OperationSnapshot {
            status: aggregator.status().clone(),
            outcome: None,
        });

        let operation = Operation {
            token,
            kind,
            subject,
            aggregator,
            observer,
            registry: registry.clone(),
            state,
        };
        tokio::spawn(operation.run(Arc::clone(&self.http), request, cancel));

        OperationHandle::new(token, state_rx)
    }
}
