use std::time::Instant;

use crate::backend::{prompts, response, ReasoningBackend};
use crate::error::AnalysisError;
use crate::license::verifier::EMPTY_LICENSE_EXPLANATION;
use crate::license::vocabulary;
use crate::models::{ClauseAssessment, ClauseResult, LicenseBlock, ObligationClause, SourceText};

/// Analyzer that delegates judgement to a reasoning backend.
///
/// Each operation makes at most one backend call. Inputs that cannot contain
/// an answer are settled locally.
pub struct LlmAnalyzer<B> {
    backend: B,
}

impl<B: ReasoningBackend> LlmAnalyzer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    async fn ask(&self, operation: &str, prompt: &str) -> Result<String, AnalysisError> {
        let started = Instant::now();
        tracing::debug!(operation, prompt_chars = prompt.len(), "Calling reasoning backend");
        let reply = self.backend.complete(prompt).await?;
        tracing::debug!(
            operation,
            reply_chars = reply.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend replied"
        );
        Ok(reply)
    }
}

impl<B: ReasoningBackend> super::LicenseAnalyzer for LlmAnalyzer<B> {
    async fn extract(&self, source: &SourceText) -> Result<LicenseBlock, AnalysisError> {
        if !vocabulary::has_license_vocabulary(&source.content) {
            return Ok(LicenseBlock::NotFound);
        }

        let prompt = prompts::extraction_prompt(&source.content, source.is_comment_extract);
        let reply = self.ask("extract", &prompt).await?;
        response::parse_license_block(&reply, &source.content)
    }

    async fn verify(
        &self,
        license_text: &str,
        obligations: &[ObligationClause],
    ) -> Result<Vec<ClauseAssessment>, AnalysisError> {
        if obligations.is_empty() {
            return Ok(Vec::new());
        }
        if license_text.trim().is_empty() {
            return Ok(obligations
                .iter()
                .map(|clause| ClauseAssessment {
                    clause_text: clause.text().to_string(),
                    result: ClauseResult::Invalid,
                    explanation: EMPTY_LICENSE_EXPLANATION.to_string(),
                })
                .collect());
        }

        let prompt = prompts::verification_prompt(license_text, obligations);
        let reply = self.ask("verify", &prompt).await?;
        response::parse_assessments(&reply, obligations)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::analyzer::LicenseAnalyzer;

    /// Replies with a fixed answer and records every prompt it receives.
    struct ScriptedBackend {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl ReasoningBackend for ScriptedBackend {
        async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(AnalysisError::Backend)
        }
    }

    const MIT_COMMENTS: &str = "// initialize buffer\n\
// Copyright (c) 2021 Jane Doe\n\
// Permission is hereby granted, free of charge, to any person obtaining a copy\n\
// of this software. THE SOFTWARE IS PROVIDED \"AS IS\".\n";

    #[tokio::test]
    async fn test_extract_grounds_reply() {
        let reply = "```\n// Copyright (c) 2021 Jane Doe\n// Permission is hereby granted, free of charge, to any person obtaining a copy\n// of this software. THE SOFTWARE IS PROVIDED \"AS IS\".\n```";
        let analyzer = LlmAnalyzer::new(ScriptedBackend::replying(reply));
        let block = analyzer
            .extract(&SourceText::new(MIT_COMMENTS, true))
            .await
            .unwrap();

        let text = block.as_text().unwrap();
        assert!(text.starts_with("// Copyright"));
        assert!(MIT_COMMENTS.contains(text));

        let prompts = analyzer.backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("File Comments:\n// initialize buffer"));
    }

    #[tokio::test]
    async fn test_extract_keyword_free_skips_backend() {
        let analyzer = LlmAnalyzer::new(ScriptedBackend::replying("unused"));
        let block = analyzer
            .extract(&SourceText::new("// initialize buffer\n// then loop", true))
            .await
            .unwrap();
        assert_eq!(block, LicenseBlock::NotFound);

        let empty = analyzer.extract(&SourceText::new("", false)).await.unwrap();
        assert_eq!(empty, LicenseBlock::NotFound);
        assert_eq!(analyzer.backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_extract_malformed_reply() {
        let analyzer = LlmAnalyzer::new(ScriptedBackend::replying("The license is MIT."));
        let err = analyzer
            .extract(&SourceText::new(MIT_COMMENTS, true))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedBackendResponse(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let analyzer = LlmAnalyzer::new(ScriptedBackend::failing("503 Service Unavailable"));
        let err = analyzer
            .extract(&SourceText::new(MIT_COMMENTS, true))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Backend(_)));
    }

    #[tokio::test]
    async fn test_verify_parses_reply() {
        let reply = "Clause: Users must retain the copyright notice and must open-source derivative works\n\
Result: partially valid\n\
Explanation: Notice retention is required; no source disclosure is required.\n";
        let analyzer = LlmAnalyzer::new(ScriptedBackend::replying(reply));
        let clauses = vec![ObligationClause::new(
            "Users must retain the copyright notice and must open-source derivative works",
        )];
        let out = analyzer.verify(MIT_COMMENTS, &clauses).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].result, ClauseResult::PartiallyValid);
        assert_eq!(analyzer.backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_verify_count_mismatch_is_malformed() {
        let reply = "Clause: A\nResult: valid\nExplanation: fine\n";
        let analyzer = LlmAnalyzer::new(ScriptedBackend::replying(reply));
        let clauses = vec![ObligationClause::new("A"), ObligationClause::new("B")];
        assert!(analyzer.verify(MIT_COMMENTS, &clauses).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_short_circuits() {
        let analyzer = LlmAnalyzer::new(ScriptedBackend::replying("unused"));
        assert!(analyzer.verify(MIT_COMMENTS, &[]).await.unwrap().is_empty());

        let clauses = vec![ObligationClause::new("Attribution is required")];
        let out = analyzer.verify("  \n", &clauses).await.unwrap();
        assert_eq!(out[0].result, ClauseResult::Invalid);
        assert_eq!(out[0].explanation, EMPTY_LICENSE_EXPLANATION);
        assert_eq!(analyzer.backend.calls(), 0);
    }
}
