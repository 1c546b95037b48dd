//! HTTP client for the broker's management API

use crate::config::BrokerApiConfig;
use async_trait::async_trait;
use odb_core::{
    BrokerError, BrokerServices, InstanceLister, LastOperation, OperationData, UpgradeOperation,
    UpgradeOperationType,
};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

const BROKER_API_VERSION_HEADER: &str = "X-Broker-API-Version";
const BROKER_API_VERSION: &str = "2.13";

#[derive(Debug, Deserialize)]
struct ServiceInstance {
    instance_id: String,
}

/// `InstanceLister` and `BrokerServices` over the broker's HTTP API
pub struct HttpBroker {
    http: reqwest::Client,
    base: Url,
    config: BrokerApiConfig,
}

impl std::fmt::Debug for HttpBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBroker")
            .field("url", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpBroker {
    /// Create a client; every request times out after `request_timeout`
    ///
    /// # Errors
    /// - `BrokerError::Request` if the URL is not a valid base URL or the
    ///   HTTP client cannot be built
    pub fn new(config: BrokerApiConfig, request_timeout: Duration) -> Result<Self, BrokerError> {
        let base = Url::parse(&config.url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| BrokerError::Request(format!("invalid broker url '{}'", config.url)))?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BrokerError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            config,
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

    fn request(&self, method: reqwest::Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let auth = self.config.basic_auth();
        self.http
            .request(method, self.endpoint(segments))
            .basic_auth(&auth.username, Some(&auth.password))
            .header(BROKER_API_VERSION_HEADER, BROKER_API_VERSION)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, String), BrokerError> {
        let response = request
            .send()
            .await
            .map_err(|e| BrokerError::Request(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BrokerError::Request(format!("error reading response body: {e}")))?;
        Ok((status, body))
    }
}

#[async_trait]
impl InstanceLister for HttpBroker {
    async fn instances(&self) -> Result<Vec<String>, BrokerError> {
        let (status, body) = self
            .send(self.request(reqwest::Method::GET, &["mgmt", "service_instances"]))
            .await?;
        if status != StatusCode::OK {
            return Err(BrokerError::InvalidResponse(format!(
                "listing service instances returned {status}: {body}"
            )));
        }

        let instances: Vec<ServiceInstance> = serde_json::from_str(&body)
            .map_err(|e| BrokerError::InvalidResponse(format!("cannot parse service instances: {e}")))?;
        Ok(instances.into_iter().map(|i| i.instance_id).collect())
    }
}

#[async_trait]
impl BrokerServices for HttpBroker {
    async fn upgrade_instance(&self, instance_id: &str) -> Result<UpgradeOperation, BrokerError> {
        let (status, body) = self
            .send(self.request(
                reqwest::Method::PATCH,
                &["mgmt", "service_instances", instance_id],
            ))
            .await?;

        let operation = classify_upgrade_response(status.as_u16(), &body)?;
        if operation.kind == UpgradeOperationType::Unexpected {
            tracing::warn!(instance_id, status = status.as_u16(), %body, "unexpected upgrade response");
        }
        Ok(operation)
    }

    async fn last_operation(
        &self,
        instance_id: &str,
        operation_data: &OperationData,
    ) -> Result<LastOperation, BrokerError> {
        let operation = serde_json::to_string(operation_data)
            .map_err(|e| BrokerError::Other(format!("cannot serialize operation data: {e}")))?;
        let request = self
            .request(
                reqwest::Method::GET,
                &["v2", "service_instances", instance_id, "last_operation"],
            )
            .query(&[("operation", operation.as_str())]);

        let (status, body) = self.send(request).await?;
        if status != StatusCode::OK {
            return Err(BrokerError::InvalidResponse(format!(
                "last operation for {instance_id} returned {status}: {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| BrokerError::InvalidResponse(format!("cannot parse last operation: {e}")))
    }
}

/// Classify the broker's answer to an upgrade request
///
/// # Errors
/// - `BrokerError::InvalidResponse` if an accepted upgrade carries no operation data
pub fn classify_upgrade_response(status: u16, body: &str) -> Result<UpgradeOperation, BrokerError> {
    let kind = match status {
        202 => {
            let data: OperationData = serde_json::from_str(body).map_err(|e| {
                BrokerError::InvalidResponse(format!("cannot parse upgrade operation data: {e}"))
            })?;
            return Ok(UpgradeOperation::accepted(data));
        }
        404 => UpgradeOperationType::InstanceDeleted,
        410 => UpgradeOperationType::NotFound,
        409 => UpgradeOperationType::OperationInProgress,
        _ => UpgradeOperationType::Unexpected,
    };
    Ok(UpgradeOperation::of_kind(kind))
}
