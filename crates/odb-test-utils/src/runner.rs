use odb_adapter::{CommandOutput, CommandRunner};
use parking_lot::Mutex;
use std::io;

/// `CommandRunner` returning a configured result and recording argv
#[derive(Debug)]
pub struct FakeCommandRunner {
    result: Mutex<Result<CommandOutput, String>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl Default for FakeCommandRunner {
    fn default() -> Self {
        Self {
            result: Mutex::new(Ok(CommandOutput::new("", "", 0))),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returns(&self, stdout: &str, stderr: &str, exit_code: i32) {
        *self.result.lock() = Ok(CommandOutput::new(stdout, stderr, exit_code));
    }

    pub fn returns_output(&self, output: CommandOutput) {
        *self.result.lock() = Ok(output);
    }

    pub fn fails(&self, message: &str) {
        *self.result.lock() = Err(message.to_string());
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(&self, args: Vec<String>) -> io::Result<CommandOutput> {
        self.calls.lock().push(args);
        self.result
            .lock()
            .clone()
            .map_err(|message| io::Error::new(io::ErrorKind::Other, message))
    }
}
