use std::time::Duration;

use thiserror::Error;

/// Error type for a failed `dds` invocation
#[derive(Debug, Error)]
pub enum RelayError {
    /// The program could not be started (missing binary, permissions)
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program started but waiting on it failed
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran to completion with a non-zero exit status
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    /// The program did not finish within the configured timeout
    #[error("{program} timed out after {secs}s", secs = .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_message_includes_stderr() {
        let err = RelayError::Exit {
            program: "./dds".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "Frequency needs to be between 0.0 and 200000000.0".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("./dds exited with exit status: 1"));
        assert!(message.contains("Frequency needs to be"));
    }

    #[test]
    fn test_timeout_message() {
        let err = RelayError::Timeout {
            program: "./dds".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "./dds timed out after 10s");
    }
}
