//! Values exchanged with the adapter as JSON

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// VM addresses per instance group of a deployment
pub type BoshVms = BTreeMap<String, Vec<String>>;

/// Release uploaded to the director for a service deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRelease {
    /// Release name
    pub name: String,
    /// Release version
    pub version: String,
    /// Jobs provided by the release
    #[serde(default)]
    pub jobs: Vec<String>,
}

/// Stemcell used by a service deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stemcell {
    /// Operating system
    pub stemcell_os: String,
    /// Version
    pub stemcell_version: String,
}

/// Deployment the adapter generates a manifest for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDeployment {
    /// Deployment name
    pub deployment_name: String,
    /// Releases to use
    pub releases: Vec<ServiceRelease>,
    /// Stemcell to use
    pub stemcell: Stemcell,
}

/// Credentials returned by `create-binding`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Credentials handed to the bound application
    pub credentials: serde_json::Value,
    /// Syslog drain for the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog_drain_url: Option<String>,
    /// Route service for the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_service_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DashboardUrl {
    pub(crate) dashboard_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_without_optional_urls() {
        let binding: Binding =
            serde_json::from_str(r#"{"credentials":{"password":"secret"}}"#).unwrap();
        assert_eq!(binding.credentials["password"], "secret");
        assert!(binding.syslog_drain_url.is_none());
        assert!(binding.route_service_url.is_none());
    }

    #[test]
    fn service_deployment_wire_names() {
        let deployment = ServiceDeployment {
            deployment_name: "service-instance_1".to_string(),
            releases: vec![ServiceRelease {
                name: "redis".to_string(),
                version: "9".to_string(),
                jobs: vec!["redis-server".to_string()],
            }],
            stemcell: Stemcell {
                stemcell_os: "ubuntu-jammy".to_string(),
                stemcell_version: "1.1".to_string(),
            },
        };

        let json = serde_json::to_value(&deployment).unwrap();
        assert_eq!(json["deployment_name"], "service-instance_1");
        assert_eq!(json["releases"][0]["jobs"][0], "redis-server");
        assert_eq!(json["stemcell"]["stemcell_os"], "ubuntu-jammy");
    }
}
