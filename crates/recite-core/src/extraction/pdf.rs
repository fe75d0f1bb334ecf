use std::sync::Arc;
use tracing::debug;

use crate::error::ExtractionError;
use crate::extraction::{EngineError, PdfEngine, ProgressFn};
use crate::model::{ExtractionProgress, Phase};

/// Appended after every page, including the last.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Walks a PDF's pages in order through a [`PdfEngine`].
pub struct PdfExtractor {
    engine: Arc<dyn PdfEngine>,
}

impl PdfExtractor {
    pub fn new(engine: Arc<dyn PdfEngine>) -> Self {
        PdfExtractor { engine }
    }

    /// Extract all page text, in page order.
    ///
    /// Pages are requested one at a time; page `n + 1` is not touched until
    /// page `n` has resolved. Any page failure discards the partial text.
    pub async fn extract(
        &self,
        bytes: &[u8],
        progress: ProgressFn<'_>,
    ) -> Result<String, ExtractionError> {
        progress(ExtractionProgress::phase(Phase::Loading));

        let document = self
            .engine
            .load(bytes)
            .await
            .map_err(|e| ExtractionError::PdfLoad(e.0))?;
        let page_count = document.page_count();
        debug!(backend = self.engine.backend_name(), page_count, "PDF loaded");

        let mut text = String::new();
        for number in 1..=page_count {
            let page = document
                .page(number)
                .await
                .map_err(|e| page_failure(number, e))?;
            let tokens = page.text().await.map_err(|e| page_failure(number, e))?;

            text.push_str(&tokens.join(" "));
            text.push_str(PAGE_SEPARATOR);
            debug!(page = number, tokens = tokens.len(), "page text appended");
            progress(ExtractionProgress::paging(number, page_count));
        }

        Ok(text)
    }
}

fn page_failure(page: usize, e: EngineError) -> ExtractionError {
    ExtractionError::PdfPage { page, detail: e.0 }
}
