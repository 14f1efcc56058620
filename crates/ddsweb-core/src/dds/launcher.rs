use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Child;

use super::command::DdsCommand;
use crate::error::RelayError;

/// Result of a `dds` run that exited successfully
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// A `dds` process left running in the background
///
/// The process is killed when the handle is stopped or dropped.
#[derive(Debug)]
pub struct RunningDds {
    program: String,
    child: Child,
}

impl RunningDds {
    /// Wrap a spawned child; it must have been spawned with `kill_on_drop`
    pub fn new(program: impl Into<String>, child: Child) -> Self {
        Self {
            program: program.into(),
            child,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the process and wait for it to exit
    pub async fn stop(mut self) {
        let pid = self.pid();
        match self.child.kill().await {
            Ok(()) => tracing::info!("Stopped {} (pid {:?})", self.program, pid),
            Err(e) => tracing::warn!("Failed to stop {} (pid {:?}): {}", self.program, pid, e),
        }
    }
}

/// How a launch ended up
#[derive(Debug)]
pub enum Launched {
    /// The program ran to completion
    Exited(InvocationOutcome),
    /// A continuous command is still running
    Running(RunningDds),
}

/// Runs a built `dds` command and reports how it went
pub trait Launcher: Send + Sync {
    /// Run `command`; continuous commands may be left running
    fn launch(
        &self,
        command: &DdsCommand,
    ) -> impl Future<Output = Result<Launched, RelayError>> + Send;
}

/// Launcher that spawns a child process per command
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    timeout: Duration,
    startup_grace: Duration,
}

impl ProcessLauncher {
    /// Create a launcher that gives up on a run after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            startup_grace: Duration::from_millis(300),
        }
    }

    /// How long a continuous command must survive to count as started
    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    fn spawn(command: &DdsCommand, stdout: Stdio) -> Result<Child, RelayError> {
        tokio::process::Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RelayError::Spawn {
                program: command.program().to_string(),
                source,
            })
    }

    /// Run to completion within the timeout
    async fn run(&self, command: &DdsCommand) -> Result<InvocationOutcome, RelayError> {
        let program = command.program().to_string();
        let child = Self::spawn(command, Stdio::piped())?;

        // The child is killed when the timed-out future drops it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(RelayError::Wait { program, source }),
            Err(_) => {
                return Err(RelayError::Timeout {
                    program,
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if !output.status.success() {
            return Err(RelayError::Exit {
                program,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(InvocationOutcome {
            code: output.status.code(),
            stdout,
            stderr,
        })
    }

    /// Start a command that does not exit on its own
    ///
    /// Argument errors make `dds` exit right away, so a process that is
    /// still alive after the startup grace is reported as running.
    async fn start(&self, command: &DdsCommand) -> Result<Launched, RelayError> {
        let program = command.program().to_string();
        let mut child = Self::spawn(command, Stdio::null())?;

        let waited = tokio::time::timeout(self.startup_grace, child.wait()).await;
        let status = match waited {
            Err(_) => return Ok(Launched::Running(RunningDds::new(program, child))),
            Ok(Err(source)) => return Err(RelayError::Wait { program, source }),
            Ok(Ok(status)) => status,
        };

        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr).await;
        }
        let stderr = stderr.trim_end().to_string();

        if !status.success() {
            return Err(RelayError::Exit {
                program,
                status: status.to_string(),
                stderr,
            });
        }

        Ok(Launched::Exited(InvocationOutcome {
            code: status.code(),
            stdout: String::new(),
            stderr,
        }))
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Launcher for ProcessLauncher {
    async fn launch(&self, command: &DdsCommand) -> Result<Launched, RelayError> {
        if command.is_continuous() {
            self.start(command).await
        } else {
            self.run(command).await.map(Launched::Exited)
        }
    }
}
