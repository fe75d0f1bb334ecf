use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::extraction::{EngineError, OcrEngine, OcrProgress, RasterImage, RECOGNIZING_TEXT};
use crate::tool::{self, TESSERACT_HINT};

/// OCR backend using the `tesseract` command-line tool.
///
/// The CLI has no progress stream, so progress is reported as 0 before
/// the run and 1 after it.
pub struct TesseractOcr {
    binary: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>) -> Self {
        TesseractOcr {
            binary: binary.into(),
        }
    }

    pub async fn is_available(&self) -> bool {
        tool::is_available(&self.binary, "--version").await
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(
        &self,
        image: &RasterImage,
        language: &str,
        progress: &(dyn Fn(OcrProgress) + Send + Sync),
    ) -> Result<String, EngineError> {
        let png = image.spawn_encode_png().await?;
        let tmpfile = tempfile::Builder::new()
            .prefix("recite_ocr_")
            .suffix(".png")
            .tempfile()?;
        tokio::fs::write(tmpfile.path(), &png).await?;

        progress(OcrProgress::new(RECOGNIZING_TEXT, 0.0));

        let mut cmd = Command::new(&self.binary);
        cmd.arg(tmpfile.path()).arg("stdout").arg("-l").arg(language);
        debug!(binary = %self.binary, language, "running tesseract");
        let stdout = tool::run(&mut cmd, &self.binary, TESSERACT_HINT).await?;

        progress(OcrProgress::new(RECOGNIZING_TEXT, 1.0));
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageOrigin;
    use image::DynamicImage;

    #[tokio::test]
    async fn test_missing_binary_reports_install_hint() {
        let ocr = TesseractOcr::new("recite-missing-tesseract");
        assert!(!ocr.is_available().await);
        let image = RasterImage::from_image(DynamicImage::new_luma8(2, 2), ImageOrigin::Upload);
        let err = ocr
            .recognize(&image, "eng", &|_: OcrProgress| {})
            .await
            .unwrap_err();
        assert!(err.0.contains("not found"), "{}", err.0);
        assert!(err.0.contains("tesseract"));
    }
}
