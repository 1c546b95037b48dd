//! Exit code classification

use crate::error::AdapterError;

/// Adapter exited successfully
pub const SUCCESS_EXIT_CODE: i32 = 0;
/// Generic failure, stdout is the user facing message
pub const ERROR_EXIT_CODE: i32 = 1;
/// Action not implemented by the adapter
pub const NOT_IMPLEMENTED_EXIT_CODE: i32 = 10;
/// Binding to delete does not exist
pub const BINDING_NOT_FOUND_EXIT_CODE: i32 = 41;
/// Binding requires an app GUID
pub const APP_GUID_NOT_PROVIDED_EXIT_CODE: i32 = 42;
/// Binding to create already exists
pub const BINDING_ALREADY_EXISTS_EXIT_CODE: i32 = 49;

/// What an adapter exit code means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterOutcome {
    /// Exit code 0
    Success,
    /// Exit code 10
    NotImplemented,
    /// Exit code 41
    BindingNotFound,
    /// Exit code 42
    AppGuidNotProvided,
    /// Exit code 49
    BindingAlreadyExists,
    /// Any other non-zero exit code
    UnknownFailure {
        /// Adapter stdout
        message: String,
    },
}

impl AdapterOutcome {
    /// Classify an exit code; `stdout` becomes the message of unknown failures
    #[must_use]
    pub fn classify(exit_code: i32, stdout: &str) -> Self {
        match exit_code {
            SUCCESS_EXIT_CODE => Self::Success,
            NOT_IMPLEMENTED_EXIT_CODE => Self::NotImplemented,
            BINDING_NOT_FOUND_EXIT_CODE => Self::BindingNotFound,
            APP_GUID_NOT_PROVIDED_EXIT_CODE => Self::AppGuidNotProvided,
            BINDING_ALREADY_EXISTS_EXIT_CODE => Self::BindingAlreadyExists,
            _ => Self::UnknownFailure {
                message: stdout.to_string(),
            },
        }
    }

    /// Whether the adapter succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Convert into the caller facing result
    ///
    /// # Errors
    /// - The `AdapterError` matching any outcome other than `Success`
    pub fn into_result(self) -> Result<(), AdapterError> {
        match self {
            Self::Success => Ok(()),
            Self::NotImplemented => Err(AdapterError::NotImplemented),
            Self::BindingNotFound => Err(AdapterError::BindingNotFound),
            Self::AppGuidNotProvided => Err(AdapterError::AppGuidNotProvided),
            Self::BindingAlreadyExists => Err(AdapterError::BindingAlreadyExists),
            Self::UnknownFailure { message } => Err(AdapterError::UnknownFailure { message }),
        }
    }
}
