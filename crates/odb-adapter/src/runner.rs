//! Running the adapter executable

use std::io;

/// Captured result of one adapter process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process stdout
    pub stdout: Vec<u8>,
    /// Process stderr
    pub stderr: Vec<u8>,
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Output of a process that exited with `exit_code`
    #[inline]
    #[must_use]
    pub fn new(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    /// Stdout as text
    #[must_use]
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr as text
    #[must_use]
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs a command line and captures its output
///
/// `args[0]` is the executable, the rest are its arguments.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion
    async fn run(&self, args: Vec<String>) -> io::Result<CommandOutput>;
}

/// `CommandRunner` spawning real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: Vec<String>) -> io::Result<CommandOutput> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

        let output = tokio::process::Command::new(program)
            .args(rest)
            .stdin(std::process::Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let output = ProcessRunner
            .run(vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf out; printf err >&2; exit 41".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(output.stdout_str(), "out");
        assert_eq!(output.stderr_str(), "err");
        assert_eq!(output.exit_code, Some(41));
    }

    #[tokio::test]
    async fn missing_executable_is_an_io_error() {
        let result = ProcessRunner
            .run(vec!["/no/such/adapter".to_string()])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_command_line_is_rejected() {
        let err = ProcessRunner.run(Vec::new()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
