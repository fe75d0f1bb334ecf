use std::sync::Arc;
use tracing::debug;

use crate::error::{ExtractionError, ImageOrigin};
use crate::extraction::{Blob, ImageConverter, ProgressFn, RasterImage};
use crate::model::{ExtractionProgress, Phase};

pub const HEIC_MEDIA_TYPE: &str = "image/heic";
pub const DEFAULT_TARGET_TYPE: &str = "image/jpeg";

/// Turns HEIC bytes into a raster image via an external [`ImageConverter`].
pub struct HeicConverter {
    converter: Arc<dyn ImageConverter>,
    target_type: String,
}

impl HeicConverter {
    pub fn new(converter: Arc<dyn ImageConverter>, target_type: impl Into<String>) -> Self {
        HeicConverter {
            converter,
            target_type: target_type.into(),
        }
    }

    /// Convert and decode. The original bytes never leave this function
    /// except inside the HEIC-typed blob given to the converter.
    pub async fn convert(
        &self,
        bytes: &[u8],
        progress: ProgressFn<'_>,
    ) -> Result<RasterImage, ExtractionError> {
        progress(ExtractionProgress::phase(Phase::Decoding));

        let blob = Blob::new(bytes.to_vec(), HEIC_MEDIA_TYPE);
        let converted = self
            .converter
            .convert(&blob, &self.target_type)
            .await
            .map_err(|e| ExtractionError::HeicConversion(e.0))?;
        debug!(
            backend = self.converter.backend_name(),
            media_type = %converted.media_type,
            bytes = converted.bytes.len(),
            "HEIC converted"
        );

        RasterImage::spawn_decode(converted.bytes, ImageOrigin::Converted).await
    }
}
