//! Adapter actions
//!
//! Each action is one process invocation. Structured arguments are passed as
//! JSON documents, manifests as raw YAML text.

use crate::error::AdapterError;
use crate::outcome::{AdapterOutcome, SUCCESS_EXIT_CODE};
use crate::runner::CommandRunner;
use crate::types::{Binding, BoshVms, DashboardUrl, ServiceDeployment};
use serde::Serialize;
use std::sync::Arc;

const GENERATE_MANIFEST: &str = "generate-manifest";
const CREATE_BINDING: &str = "create-binding";
const DELETE_BINDING: &str = "delete-binding";
const DASHBOARD_URL: &str = "dashboard-url";

/// Client for one adapter executable
#[derive(Clone)]
pub struct Adapter {
    external_bin_path: String,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("external_bin_path", &self.external_bin_path)
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// Create a client for the executable at `external_bin_path`
    #[must_use]
    pub fn new(external_bin_path: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            external_bin_path: external_bin_path.into(),
            runner,
        }
    }

    /// Path of the adapter executable
    #[inline]
    #[must_use]
    pub fn external_bin_path(&self) -> &str {
        &self.external_bin_path
    }

    /// Generate the deployment manifest for a service instance
    ///
    /// `previous_manifest` and `previous_plan` are set when updating an
    /// existing deployment.
    ///
    /// # Errors
    /// - `AdapterError` for invocation failures and non-zero exit codes
    pub async fn generate_manifest(
        &self,
        deployment: &ServiceDeployment,
        plan: &serde_json::Value,
        request_params: &serde_json::Value,
        previous_manifest: Option<&str>,
        previous_plan: Option<&serde_json::Value>,
    ) -> Result<String, AdapterError> {
        let args = vec![
            to_json("service deployment", deployment)?,
            to_json("plan", plan)?,
            to_json("request parameters", request_params)?,
            previous_manifest.unwrap_or_default().to_string(),
            to_json("previous plan", &previous_plan)?,
        ];

        self.invoke(GENERATE_MANIFEST, args).await
    }

    /// Create a binding
    ///
    /// # Errors
    /// - `AdapterError::BindingAlreadyExists`, `AdapterError::AppGuidNotProvided`
    ///   for the matching exit codes
    /// - `AdapterError::InvalidOutput` if stdout is not a binding document
    pub async fn create_binding(
        &self,
        binding_id: &str,
        vms: &BoshVms,
        manifest: &str,
        request_params: &serde_json::Value,
    ) -> Result<Binding, AdapterError> {
        let args = binding_args(binding_id, vms, manifest, request_params)?;
        let stdout = self.invoke(CREATE_BINDING, args).await?;

        serde_json::from_str(&stdout).map_err(|e| AdapterError::InvalidOutput {
            action: CREATE_BINDING.to_string(),
            message: e.to_string(),
        })
    }

    /// Delete a binding
    ///
    /// # Errors
    /// - `AdapterError::BindingNotFound` when the adapter does not know the binding
    pub async fn delete_binding(
        &self,
        binding_id: &str,
        vms: &BoshVms,
        manifest: &str,
        request_params: &serde_json::Value,
    ) -> Result<(), AdapterError> {
        let args = binding_args(binding_id, vms, manifest, request_params)?;
        self.invoke(DELETE_BINDING, args).await.map(drop)
    }

    /// Dashboard URL for a service instance
    ///
    /// # Errors
    /// - `AdapterError::NotImplemented` when the adapter has no dashboard
    pub async fn generate_dashboard_url(
        &self,
        instance_id: &str,
        plan: &serde_json::Value,
        manifest: &str,
    ) -> Result<String, AdapterError> {
        let args = vec![
            instance_id.to_string(),
            to_json("plan", plan)?,
            manifest.to_string(),
        ];
        let stdout = self.invoke(DASHBOARD_URL, args).await?;

        let parsed: DashboardUrl =
            serde_json::from_str(&stdout).map_err(|e| AdapterError::InvalidOutput {
                action: DASHBOARD_URL.to_string(),
                message: e.to_string(),
            })?;
        Ok(parsed.dashboard_url)
    }

    async fn invoke(&self, action: &str, args: Vec<String>) -> Result<String, AdapterError> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        argv.push(self.external_bin_path.clone());
        argv.push(action.to_string());
        argv.extend(args);

        tracing::debug!(path = %self.external_bin_path, action, "invoking external service adapter");

        let output = match self.runner.run(argv).await {
            Ok(output) => output,
            Err(err) => return Err(self.invocation_error(err.to_string(), String::new(), String::new())),
        };
        let stdout = output.stdout_str();
        let stderr = output.stderr_str();

        let Some(exit_code) = output.exit_code else {
            return Err(self.invocation_error("no exit code".to_string(), stdout, stderr));
        };

        if exit_code != SUCCESS_EXIT_CODE {
            tracing::error!(
                action,
                exit_code,
                "external service adapter exited with {exit_code} at {}: stdout: '{stdout}', stderr: '{stderr}'",
                self.external_bin_path
            );
        }

        AdapterOutcome::classify(exit_code, &stdout).into_result()?;
        Ok(stdout)
    }

    fn invocation_error(&self, reason: String, stdout: String, stderr: String) -> AdapterError {
        AdapterError::Invocation {
            path: self.external_bin_path.clone(),
            reason,
            stdout,
            stderr,
        }
    }
}

fn binding_args(
    binding_id: &str,
    vms: &BoshVms,
    manifest: &str,
    request_params: &serde_json::Value,
) -> Result<Vec<String>, AdapterError> {
    Ok(vec![
        binding_id.to_string(),
        to_json("bosh VMs", vms)?,
        manifest.to_string(),
        to_json("request parameters", request_params)?,
    ])
}

fn to_json<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<String, AdapterError> {
    serde_json::to_string(value).map_err(|source| AdapterError::Argument { what, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, MockCommandRunner};
    use crate::types::{ServiceRelease, Stemcell};
    use serde_json::json;

    const BIN: &str = "/thing";

    fn adapter_expecting(expected: Vec<String>, output: CommandOutput) -> Adapter {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(move |args: &Vec<String>| *args == expected)
            .times(1)
            .returning(move |_| Ok(output.clone()));
        Adapter::new(BIN, Arc::new(runner))
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn delete_binding_argv() {
        let params = json!({"plan_id": "some-plan-id", "service_id": "some-service-id"});
        let adapter = adapter_expecting(
            strings(&[
                BIN,
                "delete-binding",
                "the-binding",
                "{}",
                "a-manifest",
                &params.to_string(),
            ]),
            CommandOutput::new("", "", 0),
        );

        adapter
            .delete_binding("the-binding", &BoshVms::new(), "a-manifest", &params)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_binding_parses_stdout() {
        let mut vms = BoshVms::new();
        vms.insert("redis".to_string(), vec!["10.0.0.1".to_string()]);
        let adapter = adapter_expecting(
            strings(&[
                BIN,
                "create-binding",
                "binding-1",
                r#"{"redis":["10.0.0.1"]}"#,
                "a-manifest",
                "{}",
            ]),
            CommandOutput::new(
                r#"{"credentials":{"host":"10.0.0.1"},"syslog_drain_url":"syslog://drain"}"#,
                "",
                0,
            ),
        );

        let binding = adapter
            .create_binding("binding-1", &vms, "a-manifest", &json!({}))
            .await
            .unwrap();

        assert_eq!(binding.credentials, json!({"host": "10.0.0.1"}));
        assert_eq!(binding.syslog_drain_url.as_deref(), Some("syslog://drain"));
    }

    #[tokio::test]
    async fn create_binding_already_exists() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(CommandOutput::new("exists", "", 49)));
        let adapter = Adapter::new(BIN, Arc::new(runner));

        let err = adapter
            .create_binding("binding-1", &BoshVms::new(), "", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::BindingAlreadyExists));
    }

    #[tokio::test]
    async fn create_binding_rejects_invalid_stdout() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(CommandOutput::new("not json", "", 0)));
        let adapter = Adapter::new(BIN, Arc::new(runner));

        let err = adapter
            .create_binding("binding-1", &BoshVms::new(), "", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidOutput { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn generate_manifest_for_new_deployment() {
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
        let plan = json!({"instance_groups": []});
        let expected = vec![
            BIN.to_string(),
            "generate-manifest".to_string(),
            serde_json::to_string(&deployment).unwrap(),
            plan.to_string(),
            "{}".to_string(),
            String::new(),
            "null".to_string(),
        ];
        let adapter = adapter_expecting(expected, CommandOutput::new("name: service-instance_1", "", 0));

        let manifest = adapter
            .generate_manifest(&deployment, &plan, &json!({}), None, None)
            .await
            .unwrap();
        assert_eq!(manifest, "name: service-instance_1");
    }

    #[tokio::test]
    async fn dashboard_url() {
        let plan = json!({"name": "small"});
        let adapter = adapter_expecting(
            strings(&[BIN, "dashboard-url", "instance-1", &plan.to_string(), "a-manifest"]),
            CommandOutput::new(r#"{"dashboard_url":"https://dashboard/instance-1"}"#, "", 0),
        );

        let url = adapter
            .generate_dashboard_url("instance-1", &plan, "a-manifest")
            .await
            .unwrap();
        assert_eq!(url, "https://dashboard/instance-1");
    }

    #[tokio::test]
    async fn signal_termination_is_an_invocation_error() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|_| {
            Ok(CommandOutput {
                stdout: b"partial".to_vec(),
                stderr: b"killed".to_vec(),
                exit_code: None,
            })
        });
        let adapter = Adapter::new(BIN, Arc::new(runner));

        let err = adapter
            .generate_dashboard_url("instance-1", &json!({}), "")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "an error occurred running external service adapter at /thing: 'no exit code'. stdout: 'partial', stderr: 'killed'"
        );
    }
}
