//! Flash tool gateway
//!
//! All flash access goes through an external tool (`pflash` on a real
//! system) that takes an argument vector and returns an exit status plus
//! captured text. [`FlashTool`] is that contract; [`Pnor`] builds the
//! handful of command lines the engines need on top of it, similar to how a
//! `FlashHandle` hides the programmer behind read/erase calls.

mod pflash;
pub(crate) mod process;

pub use pflash::PflashTool;

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Status and text captured from one tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit status (0 = success)
    pub status: i32,
    /// Captured standard output
    pub output: String,
}

impl ToolOutput {
    /// Create a successful result carrying `output`
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            status: 0,
            output: output.into(),
        }
    }

    /// Create a failed result with the given status
    pub fn failed(status: i32) -> Self {
        Self {
            status,
            output: String::new(),
        }
    }

    /// Whether the tool reported success
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// An external flash tool: argv in, status and text out
///
/// `Err` is reserved for the tool not running at all (spawn or wait
/// failures, deadline expiry). A tool that ran and failed returns
/// `Ok` with a non-zero [`ToolOutput::status`].
pub trait FlashTool {
    /// Short name used when formatting command lines for logs
    fn name(&self) -> &str;

    /// Run the tool with the given arguments
    fn run(&self, args: &[&str]) -> Result<ToolOutput>;
}

impl<T: FlashTool + ?Sized> FlashTool for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&self, args: &[&str]) -> Result<ToolOutput> {
        (**self).run(args)
    }
}

impl<T: FlashTool + ?Sized> FlashTool for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&self, args: &[&str]) -> Result<ToolOutput> {
        (**self).run(args)
    }
}

impl<T: FlashTool + ?Sized> FlashTool for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&self, args: &[&str]) -> Result<ToolOutput> {
        (**self).run(args)
    }
}

/// How a partition is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Clear while keeping the ECC formatting intact
    Ecc,
    /// Raw erase of the whole partition
    Erase,
}

impl ClearMode {
    /// Pick the mode for a partition that does or does not need ECC
    pub fn for_ecc(requires_ecc: bool) -> Self {
        if requires_ecc {
            Self::Ecc
        } else {
            Self::Erase
        }
    }

    fn flag(self) -> &'static str {
        match self {
            Self::Ecc => "-c",
            Self::Erase => "-e",
        }
    }
}

impl fmt::Display for ClearMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ecc => write!(f, "ecc-clear"),
            Self::Erase => write!(f, "erase"),
        }
    }
}

/// Partition-level access to the PNOR through a [`FlashTool`]
pub struct Pnor<T> {
    tool: T,
}

impl<T: FlashTool> Pnor<T> {
    /// Wrap a flash tool
    pub fn new(tool: T) -> Self {
        Self { tool }
    }

    /// Read partition `name` into the file at `dest`
    pub fn read_partition(&self, name: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        self.run_checked(&["-P", name, "-r", &dest]).map(|_| ())
    }

    /// Clear partition `name` using the given mode
    ///
    /// `-f` skips the tool's interactive confirmation.
    pub fn clear_partition(&self, name: &str, mode: ClearMode) -> Result<()> {
        self.run_checked(&["-P", name, mode.flag(), "-f"]).map(|_| ())
    }

    /// Dump the partition table listing
    ///
    /// The status is returned as-is so callers can decide whether partial
    /// output is still useful.
    pub fn partition_info(&self) -> Result<ToolOutput> {
        self.tool.run(&["-i"])
    }

    fn run_checked(&self, args: &[&str]) -> Result<ToolOutput> {
        let out = self.tool.run(args)?;
        if !out.success() {
            return Err(Error::ToolFailed {
                command: command_line(self.tool.name(), args),
                status: out.status,
            });
        }
        Ok(out)
    }
}

/// Format a command line for log and error messages
pub(crate) fn command_line(program: &str, args: &[&str]) -> String {
    let mut cmd = String::from(program);
    for arg in args {
        cmd.push(' ');
        cmd.push_str(arg);
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every argv and answers with a fixed status
    struct Recorder {
        status: i32,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl Recorder {
        fn new(status: i32) -> Self {
            Self {
                status,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl FlashTool for Recorder {
        fn name(&self) -> &str {
            "pflash"
        }

        fn run(&self, args: &[&str]) -> Result<ToolOutput> {
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|a| a.to_string()).collect());
            Ok(ToolOutput {
                status: self.status,
                output: String::new(),
            })
        }
    }

    #[test]
    fn test_clear_mode_selection() {
        assert_eq!(ClearMode::for_ecc(true), ClearMode::Ecc);
        assert_eq!(ClearMode::for_ecc(false), ClearMode::Erase);
    }

    #[test]
    fn test_clear_partition_args() {
        let rec = Recorder::new(0);
        let pnor = Pnor::new(&rec);
        pnor.clear_partition("MVPD", ClearMode::Ecc).unwrap();
        pnor.clear_partition("HBEL", ClearMode::Erase).unwrap();

        assert_eq!(
            rec.calls(),
            vec![
                vec!["-P", "MVPD", "-c", "-f"],
                vec!["-P", "HBEL", "-e", "-f"],
            ]
        );
    }

    #[test]
    fn test_read_partition_args() {
        let rec = Recorder::new(0);
        let pnor = Pnor::new(&rec);
        pnor.read_partition("VERSION", Path::new("/tmp/v/version"))
            .unwrap();
        assert_eq!(rec.calls(), vec![vec!["-P", "VERSION", "-r", "/tmp/v/version"]]);
    }

    #[test]
    fn test_nonzero_status_is_error() {
        let rec = Recorder::new(3);
        let pnor = Pnor::new(&rec);
        match pnor.clear_partition("GUARD", ClearMode::Ecc) {
            Err(Error::ToolFailed { command, status }) => {
                assert_eq!(command, "pflash -P GUARD -c -f");
                assert_eq!(status, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_partition_info_keeps_status() {
        let rec = Recorder::new(1);
        let pnor = Pnor::new(&rec);
        let out = pnor.partition_info().unwrap();
        assert!(!out.success());
        assert_eq!(rec.calls(), vec![vec!["-i"]]);
    }
}
