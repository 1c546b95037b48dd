//! HTTP client for the BOSH director API
//!
//! Submit calls (deploy, delete, errand runs) answer with a redirect to the
//! task they created; redirects are therefore never followed and the task id
//! is read from the `Location` header.

use crate::auth::AuthHeaderBuilder;
use crate::director::Director;
use crate::error::DirectorError;
use crate::task::{normalise, Task};
use crate::CONTEXT_ID_HEADER;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Director client configuration
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    /// Director base URL, e.g. `https://10.0.0.6:25555`
    pub url: String,
    /// Skip TLS certificate verification
    pub disable_ssl_cert_verification: bool,
    /// PEM CA certificate trusted in addition to the system roots
    pub trusted_cert: Option<String>,
    /// Pause between retries of transient failures
    pub polling_interval: Duration,
    /// Attempts per idempotent request, including the first
    pub max_attempts: u32,
}

impl DirectorConfig {
    /// Create configuration for the director at `url`
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            disable_ssl_cert_verification: false,
            trusted_cert: None,
            polling_interval: Duration::from_secs(5),
            max_attempts: 3,
        }
    }

    /// With trusted CA certificate
    #[inline]
    #[must_use]
    pub fn with_trusted_cert(mut self, pem: impl Into<String>) -> Self {
        self.trusted_cert = Some(pem.into());
        self
    }

    /// With TLS verification disabled
    #[inline]
    #[must_use]
    pub fn with_ssl_cert_verification_disabled(mut self) -> Self {
        self.disable_ssl_cert_verification = true;
        self
    }

    /// With retry pause
    #[inline]
    #[must_use]
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// With attempts per idempotent request
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// `Director` over HTTP
pub struct HttpDirector {
    base: Url,
    http: reqwest::Client,
    auth: Arc<dyn AuthHeaderBuilder>,
    polling_interval: Duration,
    max_attempts: u32,
}

impl std::fmt::Debug for HttpDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDirector")
            .field("url", &self.base.as_str())
            .field("polling_interval", &self.polling_interval)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl HttpDirector {
    /// Create a client
    ///
    /// # Errors
    /// - `DirectorError::Configuration` if the URL is not a valid base URL,
    ///   the trusted certificate is not valid PEM or the HTTP client cannot
    ///   be built
    pub fn new(
        config: DirectorConfig,
        auth: Arc<dyn AuthHeaderBuilder>,
    ) -> Result<Self, DirectorError> {
        let base = Url::parse(&config.url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                DirectorError::Configuration(format!("invalid director url '{}'", config.url))
            })?;

        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.disable_ssl_cert_verification);

        if let Some(pem) = config.trusted_cert.as_deref() {
            let cert = reqwest::Certificate::from_pem(pem.as_bytes()).map_err(|e| {
                DirectorError::Configuration(format!("invalid trusted certificate: {e}"))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(|e| {
            DirectorError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            base,
            http,
            auth,
            polling_interval: config.polling_interval,
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Base URL extended by `segments`, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, DirectorError> {
        let header = self.auth.build().await?;
        request
            .header(AUTHORIZATION, header)
            .send()
            .await
            .map_err(|source| DirectorError::Transport {
                url: url.to_string(),
                source,
            })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, DirectorError> {
        let url = self.endpoint(segments);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.try_get_json(&url, query).await {
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(url = %url, attempt, error = %err, "transient director error, retrying");
                    tokio::time::sleep(self.polling_interval).await;
                }
                result => return result,
            }
        }
    }

    async fn try_get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<T, DirectorError> {
        let response = self.send(self.http.get(url.clone()).query(query), url).await?;
        let response = expect_status(response, "GET", url, &[StatusCode::OK]).await?;
        response
            .json()
            .await
            .map_err(|e| DirectorError::invalid_response(url.as_str(), e.to_string()))
    }

    async fn submit(
        &self,
        request: RequestBuilder,
        method: &str,
        url: &Url,
    ) -> Result<u64, DirectorError> {
        let response = self.send(request, url).await?;
        let response =
            expect_status(response, method, url, &[StatusCode::FOUND, StatusCode::SEE_OTHER])
                .await?;
        task_id_from_location(&response, url)
    }
}

#[async_trait::async_trait]
impl Director for HttpDirector {
    async fn get_task(&self, task_id: u64) -> Result<Task, DirectorError> {
        let id = task_id.to_string();
        self.get_json(&["tasks", id.as_str()], &[]).await
    }

    async fn get_normalised_tasks_by_context(
        &self,
        deployment_name: &str,
        context_id: &str,
    ) -> Result<Vec<Task>, DirectorError> {
        let tasks: Vec<Task> = self
            .get_json(
                &["tasks"],
                &[
                    ("deployment", deployment_name),
                    ("context_id", context_id),
                    ("verbose", "1"),
                ],
            )
            .await?;

        tracing::debug!(deployment = deployment_name, context_id, count = tasks.len(), "fetched tasks by context");
        Ok(normalise(tasks))
    }

    async fn deploy(&self, manifest: &[u8], context_id: Option<&str>) -> Result<u64, DirectorError> {
        let url = self.endpoint(&["deployments"]);
        let mut request = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "text/yaml")
            .body(manifest.to_vec());
        if let Some(context_id) = context_id {
            request = request.header(CONTEXT_ID_HEADER, context_id);
        }

        let task_id = self.submit(request, "POST", &url).await?;
        tracing::info!(task_id, context_id, "submitted deployment");
        Ok(task_id)
    }

    async fn delete_deployment(
        &self,
        deployment_name: &str,
        context_id: &str,
    ) -> Result<u64, DirectorError> {
        let url = self.endpoint(&["deployments", deployment_name]);
        let request = self
            .http
            .delete(url.clone())
            .header(CONTEXT_ID_HEADER, context_id);

        let task_id = self.submit(request, "DELETE", &url).await?;
        tracing::info!(deployment = deployment_name, task_id, context_id, "submitted deployment deletion");
        Ok(task_id)
    }

    async fn run_errand(
        &self,
        deployment_name: &str,
        errand_name: &str,
        context_id: &str,
    ) -> Result<u64, DirectorError> {
        let url = self.endpoint(&["deployments", deployment_name, "errands", errand_name, "runs"]);
        let request = self
            .http
            .post(url.clone())
            .header(CONTEXT_ID_HEADER, context_id)
            .json(&serde_json::json!({}));

        let task_id = self.submit(request, "POST", &url).await?;
        tracing::info!(deployment = deployment_name, errand = errand_name, task_id, context_id, "submitted errand run");
        Ok(task_id)
    }
}

async fn expect_status(
    response: Response,
    method: &str,
    url: &Url,
    accepted: &[StatusCode],
) -> Result<Response, DirectorError> {
    let status = response.status();
    if accepted.contains(&status) {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(DirectorError::NotFound(url.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(DirectorError::UnexpectedStatus {
        method: method.to_string(),
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

fn task_id_from_location(response: &Response, url: &Url) -> Result<u64, DirectorError> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DirectorError::invalid_response(url.as_str(), "missing Location header"))?;

    parse_task_id(location).ok_or_else(|| {
        DirectorError::invalid_response(
            url.as_str(),
            format!("cannot read task id from Location '{location}'"),
        )
    })
}

fn parse_task_id(location: &str) -> Option<u64> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_task_id_from_location() {
        assert_eq!(parse_task_id("/tasks/42"), Some(42));
        assert_eq!(parse_task_id("https://director:25555/tasks/7/"), Some(7));
        assert_eq!(parse_task_id("/tasks/"), None);
        assert_eq!(parse_task_id("/tasks/abc"), None);
    }

    #[test]
    fn config_builder() {
        let config = DirectorConfig::new("https://director:25555")
            .with_polling_interval(Duration::ZERO)
            .with_max_attempts(5)
            .with_ssl_cert_verification_disabled();

        assert_eq!(config.polling_interval, Duration::ZERO);
        assert_eq!(config.max_attempts, 5);
        assert!(config.disable_ssl_cert_verification);
        assert!(config.trusted_cert.is_none());
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let director = HttpDirector::new(
            DirectorConfig::new("https://director:25555/"),
            Arc::new(crate::auth::BasicAuthHeaderBuilder::new("a", "b")),
        )
        .unwrap();
        assert_eq!(
            director.endpoint(&["tasks", "1"]).as_str(),
            "https://director:25555/tasks/1"
        );
    }

    #[test]
    fn endpoint_encodes_names() {
        let director = HttpDirector::new(
            DirectorConfig::new("https://director:25555"),
            Arc::new(crate::auth::BasicAuthHeaderBuilder::new("a", "b")),
        )
        .unwrap();
        assert_eq!(
            director
                .endpoint(&["deployments", "my dep/1", "errands", "smoke?tests", "runs"])
                .as_str(),
            "https://director:25555/deployments/my%20dep%2F1/errands/smoke%3Ftests/runs"
        );
    }

    #[test]
    fn invalid_url_is_a_configuration_error() {
        let err = HttpDirector::new(
            DirectorConfig::new("director:25555"),
            Arc::new(crate::auth::BasicAuthHeaderBuilder::new("a", "b")),
        )
        .unwrap_err();
        assert!(matches!(err, DirectorError::Configuration(_)), "got {err:?}");
    }
}
