//! Boundary to the external word-problem analyzer
//!
//! Natural-language understanding lives outside this crate. Whatever an
//! analyzer returns is untrusted and goes through `scenario::validate`.

use crate::configuration::config::RawScenario;
use crate::error::AnalysisError;

pub trait ScenarioAnalyzer {
    fn analyze(&self, problem_text: &str) -> Result<RawScenario, AnalysisError>;
}

/// Analyzer that emits JSON text, e.g. a remote model response
impl<F> ScenarioAnalyzer for F
where
    F: Fn(&str) -> Result<String, AnalysisError>,
{
    fn analyze(&self, problem_text: &str) -> Result<RawScenario, AnalysisError> {
        let body = self(problem_text)?;
        serde_json::from_str(&body).map_err(|e| AnalysisError(format!("malformed scenario json: {e}")))
    }
}
