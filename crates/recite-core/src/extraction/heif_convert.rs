use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::extraction::{Blob, EngineError, ImageConverter};
use crate::tool::{self, HEIF_CONVERT_HINT};

/// HEIC converter backend using libheif's `heif-convert`.
///
/// The output format is chosen by the output file extension.
pub struct HeifConvert {
    binary: String,
}

impl HeifConvert {
    pub fn new(binary: impl Into<String>) -> Self {
        HeifConvert {
            binary: binary.into(),
        }
    }

    pub async fn is_available(&self) -> bool {
        tool::is_available(&self.binary, "--version").await
    }
}

impl Default for HeifConvert {
    fn default() -> Self {
        Self::new("heif-convert")
    }
}

/// File extension `heif-convert` needs to produce `media_type`.
pub fn extension_for(media_type: &str) -> Option<&'static str> {
    match media_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

#[async_trait]
impl ImageConverter for HeifConvert {
    async fn convert(&self, blob: &Blob, target_type: &str) -> Result<Blob, EngineError> {
        let ext = extension_for(target_type)
            .ok_or_else(|| EngineError::new(format!("unsupported target type '{target_type}'")))?;

        let dir = tempfile::Builder::new().prefix("recite_heic_").tempdir()?;
        let input = dir.path().join("input.heic");
        let output = dir.path().join(format!("output.{ext}"));
        tokio::fs::write(&input, &blob.bytes).await?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg(&input).arg(&output);
        debug!(binary = %self.binary, target_type, "running heif-convert");
        tool::run(&mut cmd, &self.binary, HEIF_CONVERT_HINT).await?;

        let bytes = tokio::fs::read(&output).await?;
        Ok(Blob::new(bytes, target_type))
    }

    fn backend_name(&self) -> &str {
        "heif-convert"
    }
}
