use crate::config::Config;
use crate::error::AnalysisError;
use crate::license::extractor::BlockExtractor;
use crate::license::verifier::ClauseVerifier;
use crate::models::{ClauseAssessment, LicenseBlock, ObligationClause, SourceText};

/// Offline analyzer backed by the vocabulary scorer and the topic verifier.
pub struct RuleAnalyzer {
    extractor: BlockExtractor,
    verifier: ClauseVerifier,
}

impl RuleAnalyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            extractor: BlockExtractor::new(config.extract.clone()),
            verifier: ClauseVerifier::new(config.verify.clone()),
        }
    }
}

impl super::LicenseAnalyzer for RuleAnalyzer {
    async fn extract(&self, source: &SourceText) -> Result<LicenseBlock, AnalysisError> {
        Ok(self.extractor.extract(source))
    }

    async fn verify(
        &self,
        license_text: &str,
        obligations: &[ObligationClause],
    ) -> Result<Vec<ClauseAssessment>, AnalysisError> {
        Ok(self.verifier.verify(license_text, obligations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::LicenseAnalyzer;
    use crate::models::ClauseResult;

    const FILE: &str = "// initialize buffer\n\
// Copyright (c) 2021 Jane Doe\n\
// Permission is hereby granted, free of charge, to any person obtaining a copy\n\
// of this software, to deal in the Software without restriction, including\n\
// the rights to use, copy, modify, merge, publish, distribute, sublicense,\n\
// and/or sell copies of the Software.\n\
// THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND.\n\
fn main() {\n\
    let x = 1;\n\
}\n";

    #[tokio::test]
    async fn test_extract_then_verify() {
        let analyzer = RuleAnalyzer::new(&Config::default());
        let block = analyzer
            .extract(&SourceText::new(FILE, false))
            .await
            .unwrap();
        let text = block.as_text().expect("license block found");
        assert!(FILE.contains(text));
        assert!(!text.contains("initialize buffer"));
        assert!(!text.contains("fn main"));

        let clauses = vec![
            ObligationClause::new("You may sell copies of the software"),
            ObligationClause::new("The software is provided without warranty"),
        ];
        let assessments = analyzer.verify(text, &clauses).await.unwrap();
        assert_eq!(assessments.len(), 2);
        assert!(assessments.iter().all(|a| a.result == ClauseResult::Valid));
    }

    #[tokio::test]
    async fn test_verify_without_obligations() {
        let analyzer = RuleAnalyzer::new(&Config::default());
        assert!(analyzer.verify(FILE, &[]).await.unwrap().is_empty());
    }
}
