//! Running external command-line tools.

use tokio::process::Command;

use crate::error::ReciteError;
use crate::extraction::EngineError;

pub const TESSERACT_HINT: &str =
    "Install tesseract: brew install tesseract (macOS) or apt install tesseract-ocr (Linux)";
pub const HEIF_CONVERT_HINT: &str =
    "Install libheif: brew install libheif (macOS) or apt install libheif-examples (Linux)";
pub const ESPEAK_HINT: &str =
    "Install eSpeak NG: brew install espeak-ng (macOS) or apt install espeak-ng (Linux)";

/// Run a command to completion and return its stdout.
///
/// A missing binary becomes [`ReciteError::ToolNotFound`]; a non-zero exit
/// becomes [`ReciteError::ToolFailed`] with stderr attached.
pub async fn run(command: &mut Command, tool: &str, hint: &'static str) -> Result<Vec<u8>, ReciteError> {
    let output = command.output().await.map_err(|e| spawn_error(tool, hint, e))?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ReciteError::ToolFailed {
            tool: tool.to_string(),
            code,
            stderr,
        });
    }

    Ok(output.stdout)
}

pub(crate) fn spawn_error(tool: &str, hint: &'static str, e: std::io::Error) -> ReciteError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ReciteError::ToolNotFound {
            tool: tool.to_string(),
            hint,
        }
    } else {
        ReciteError::Io(e)
    }
}

/// Check whether a tool can be started at all.
pub async fn is_available(binary: &str, version_arg: &str) -> bool {
    Command::new(binary)
        .arg(version_arg)
        .output()
        .await
        .map(|o| o.status.success() || !o.stderr.is_empty())
        .unwrap_or(false)
}

impl From<ReciteError> for EngineError {
    fn from(e: ReciteError) -> Self {
        EngineError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool_maps_to_not_found() {
        let mut cmd = Command::new("recite-no-such-tool-xyz");
        let err = run(&mut cmd, "recite-no-such-tool-xyz", TESSERACT_HINT)
            .await
            .unwrap_err();
        match err {
            ReciteError::ToolNotFound { tool, hint } => {
                assert_eq!(tool, "recite-no-such-tool-xyz");
                assert!(hint.contains("tesseract"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        assert!(!is_available("recite-no-such-tool-xyz", "--version").await);
    }
}
