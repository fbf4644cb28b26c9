//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and reachability are in place before starting
//! work that would otherwise fail partway through.

use std::process::Command;

use crate::error::{PipelineError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Running the pipeline requires ffmpeg/ffprobe on PATH.
    Run,
}

/// Run pre-flight checks for the given operation.
///
/// Returns `Ok(())` if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Run => {
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
    }
    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(PipelineError::ToolFailed(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PipelineError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(PipelineError::ToolFailed(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_missing_tool_reports_tool_not_found() {
        match check_tool("definitely-not-a-real-binary") {
            Err(PipelineError::ToolNotFound(name)) => assert_eq!(name, "definitely-not-a-real-binary"),
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
    }
}
