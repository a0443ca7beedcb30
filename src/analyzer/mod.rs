use crate::error::AnalysisError;
use crate::models::{ClauseAssessment, LicenseBlock, ObligationClause, SourceText};

pub mod llm;
pub mod rules;

pub use llm::LlmAnalyzer;
pub use rules::RuleAnalyzer;

/// Locates license text and checks obligation clauses against it.
///
/// Implementations keep no state between calls.
pub trait LicenseAnalyzer {
    async fn extract(&self, source: &SourceText) -> Result<LicenseBlock, AnalysisError>;

    /// One assessment per clause, in input order.
    async fn verify(
        &self,
        license_text: &str,
        obligations: &[ObligationClause],
    ) -> Result<Vec<ClauseAssessment>, AnalysisError>;
}
