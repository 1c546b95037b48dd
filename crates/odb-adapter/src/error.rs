//! Error types for adapter invocation

/// Adapter invocation errors
///
/// Errors for the semantic exit codes carry no adapter output; that output is
/// only written to the operator log.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Non-zero exit without a specific meaning, message is the adapter's stdout
    #[error("{message}")]
    UnknownFailure {
        /// Adapter stdout
        message: String,
    },

    /// The adapter does not implement the action
    #[error("command not implemented by service adapter")]
    NotImplemented,

    /// Unbinding a binding the adapter does not know about
    #[error("binding not found")]
    BindingNotFound,

    /// Binding with this id already exists
    #[error("binding already exists")]
    BindingAlreadyExists,

    /// Binding requires an application GUID that was not supplied
    #[error("app GUID not provided")]
    AppGuidNotProvided,

    /// The process could not be run or did not report an exit code
    #[error("an error occurred running external service adapter at {path}: '{reason}'. stdout: '{stdout}', stderr: '{stderr}'")]
    Invocation {
        /// Adapter executable
        path: String,
        /// Why the run failed
        reason: String,
        /// Captured stdout
        stdout: String,
        /// Captured stderr
        stderr: String,
    },

    /// An argument could not be serialized for the adapter
    #[error("error marshalling {what} for service adapter: {source}")]
    Argument {
        /// Argument name
        what: &'static str,
        /// Serialization failure
        #[source]
        source: serde_json::Error,
    },

    /// Successful exit but stdout could not be interpreted
    #[error("external service adapter returned invalid output for {action}: {message}")]
    InvalidOutput {
        /// Adapter action
        action: String,
        /// Parse failure
        message: String,
    },
}

impl AdapterError {
    /// Whether the error came from the adapter's exit code rather than from running it
    #[inline]
    #[must_use]
    pub fn is_adapter_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownFailure { .. }
                | Self::NotImplemented
                | Self::BindingNotFound
                | Self::BindingAlreadyExists
                | Self::AppGuidNotProvided
        )
    }
}
