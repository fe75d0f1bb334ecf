use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::extraction::orchestrator::Extraction;
use crate::format::{classify, Strategy};
use crate::model::{ExtractionProgress, Phase};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOutcome {
    Text,
    Skipped,
    Failed,
}

/// User-facing and internal views of one failure, kept side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureTrace {
    pub kind: String,
    pub user_message: String,
    pub diagnostic: String,
}

/// Serializable summary of one extraction attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub report_schema_version: String,
    pub file_name: String,
    pub media_type: String,
    pub strategy: Strategy,
    pub outcome: ReportOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureTrace>,
}

/// Summarize an extraction. `last_progress` supplies the page count for PDFs.
pub fn build_report(
    file_name: &str,
    media_type: &str,
    result: &Result<Extraction, ExtractionError>,
    last_progress: Option<&ExtractionProgress>,
) -> ExtractionReport {
    let page_count = last_progress
        .filter(|p| p.phase == Phase::Paging)
        .and_then(|p| p.page_count);

    let mut report = ExtractionReport {
        report_schema_version: REPORT_SCHEMA_VERSION.to_string(),
        file_name: file_name.to_string(),
        media_type: media_type.to_string(),
        strategy: classify(media_type, file_name),
        outcome: ReportOutcome::Skipped,
        page_count,
        char_count: None,
        text: None,
        failure: None,
    };

    match result {
        Ok(Extraction::Text(text)) => {
            report.outcome = ReportOutcome::Text;
            report.char_count = Some(text.chars().count());
            report.text = Some(text.clone());
        }
        Ok(Extraction::Skipped { .. }) => {}
        Err(e) => {
            report.outcome = ReportOutcome::Failed;
            report.failure = Some(FailureTrace {
                kind: e.kind().to_string(),
                user_message: e.user_message().to_string(),
                diagnostic: e.to_string(),
            });
        }
    }

    report
}
