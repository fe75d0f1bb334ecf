use recite_core::error::ReciteError;
use recite_core::report::ExtractionReport;

pub fn print(report: &ExtractionReport) -> Result<(), ReciteError> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}
