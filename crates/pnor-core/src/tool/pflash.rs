//! `pflash` subprocess runner

use super::{process, FlashTool, ToolOutput};
use crate::config::ToolConfig;
use crate::error::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Runs the flash tool as a child process
///
/// With a timeout set, a child that does not exit in time is killed and
/// the call fails with [`Error::ToolTimeout`](crate::Error::ToolTimeout).
#[derive(Debug, Clone)]
pub struct PflashTool {
    program: PathBuf,
    display_name: String,
    timeout: Option<Duration>,
}

impl PflashTool {
    /// Run `program` with no deadline
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let display_name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.to_string_lossy().into_owned());
        Self {
            program,
            display_name,
            timeout: None,
        }
    }

    /// Build from the `[tool]` config section
    pub fn from_config(config: &ToolConfig) -> Self {
        let tool = Self::new(&config.path);
        match config.timeout_secs {
            0 => tool,
            secs => tool.with_timeout(Duration::from_secs(secs)),
        }
    }

    /// Kill the tool if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Configured deadline, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl FlashTool for PflashTool {
    fn name(&self) -> &str {
        &self.display_name
    }

    fn run(&self, args: &[&str]) -> Result<ToolOutput> {
        process::run(&self.program, &self.display_name, args, self.timeout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_display_name_is_basename() {
        let tool = PflashTool::new("/usr/sbin/pflash");
        assert_eq!(tool.name(), "pflash");
        assert!(tool.timeout().is_none());
    }

    #[test]
    fn test_from_config_zero_timeout_disables_deadline() {
        let config = ToolConfig {
            path: PathBuf::from("pflash"),
            timeout_secs: 0,
        };
        assert!(PflashTool::from_config(&config).timeout().is_none());

        let config = ToolConfig {
            path: PathBuf::from("pflash"),
            timeout_secs: 30,
        };
        assert_eq!(
            PflashTool::from_config(&config).timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_captures_output_and_status() {
        let tool = PflashTool::new("sh");
        let out = tool.run(&["-c", "echo ID=00 part; exit 0"]).unwrap();
        assert!(out.success());
        assert_eq!(out.output, "ID=00 part\n");

        let out = tool.run(&["-c", "exit 4"]).unwrap();
        assert_eq!(out.status, 4);
    }

    #[test]
    fn test_captures_output_with_deadline() {
        let tool = PflashTool::new("sh").with_timeout(Duration::from_secs(10));
        let out = tool.run(&["-c", "echo hello"]).unwrap();
        assert!(out.success());
        assert_eq!(out.output, "hello\n");
    }

    #[test]
    fn test_deadline_expiry_is_error() {
        let tool = PflashTool::new("sleep").with_timeout(Duration::from_millis(200));
        match tool.run(&["5"]) {
            Err(Error::ToolTimeout { command, .. }) => assert_eq!(command, "sleep 5"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let tool = PflashTool::new("/nonexistent/pflash");
        assert!(matches!(tool.run(&["-i"]), Err(Error::ToolSpawn { .. })));
    }
}
