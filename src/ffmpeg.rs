use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::{debug, error};

use crate::error::{Result, SubburnError};

/// Flags passed on every invocation: no banner, never read stdin, overwrite
/// outputs, and only report real errors on stderr.
const COMMON_ARGS: [&str; 5] = ["-hide_banner", "-nostdin", "-y", "-loglevel", "error"];

/// Handle to the media tool binary.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Ffmpeg {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn tool_name(&self) -> String {
        self.binary.display().to_string()
    }

    /// Check that the binary can be launched.
    pub async fn check(&self) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SubburnError::ToolLaunch {
                tool: format!(
                    "{} (install it with: brew install ffmpeg (macOS) or apt install ffmpeg (Linux))",
                    self.tool_name()
                ),
                source,
            })?;

        if !output.status.success() {
            return Err(SubburnError::ToolFailed {
                tool: self.tool_name(),
                status: output.status.to_string(),
                diagnostics: combined_output(&output),
            });
        }

        if let Some(version) = String::from_utf8_lossy(&output.stdout).lines().next() {
            debug!("{}", version);
        }
        Ok(())
    }

    /// Run the tool with `args`, capturing stdout and stderr.
    ///
    /// Captured text is logged at debug level on success and at error level
    /// on failure; it is never echoed straight to the terminal.
    pub async fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.binary);
        command
            .args(COMMON_ARGS)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Running {:?}", command.as_std());

        let output = command
            .output()
            .await
            .map_err(|source| SubburnError::ToolLaunch {
                tool: self.tool_name(),
                source,
            })?;

        let diagnostics = combined_output(&output);

        if !output.status.success() {
            error!(
                "{} exited with {}:\n{}",
                self.tool_name(),
                output.status,
                diagnostics
            );
            return Err(SubburnError::ToolFailed {
                tool: self.tool_name(),
                status: output.status.to_string(),
                diagnostics,
            });
        }

        if !diagnostics.is_empty() {
            debug!("{} output:\n{}", self.tool_name(), diagnostics);
        }

        Ok(diagnostics)
    }
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
