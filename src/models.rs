use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sentinel carried inside the fenced block when no license text was located.
pub const NOT_FOUND_SENTINEL: &str = "No license information found.";

/// Raw text submitted for license-block extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceText {
    pub content: String,
    /// `true` when `content` was already isolated as comment text from a code file.
    pub is_comment_extract: bool,
}

impl SourceText {
    pub fn new(content: impl Into<String>, is_comment_extract: bool) -> Self {
        Self {
            content: content.into(),
            is_comment_extract,
        }
    }
}

/// Outcome of extraction. `Found` always holds a verbatim slice of the source content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum LicenseBlock {
    Found(String),
    NotFound,
}

impl LicenseBlock {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LicenseBlock::Found(text) => Some(text),
            LicenseBlock::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LicenseBlock::Found(_))
    }

    /// Wrap the block (or the not-found sentinel) in triple backticks.
    pub fn to_fenced(&self) -> String {
        let body = self.as_text().unwrap_or(NOT_FOUND_SENTINEL);
        format!("```\n{}\n```", body)
    }
}

/// One claim about what a license requires or permits. Opaque to the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObligationClause(pub String);

impl ObligationClause {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObligationClause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseResult {
    Valid,
    Invalid,
    PartiallyValid,
}

impl std::fmt::Display for ClauseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClauseResult::Valid => write!(f, "valid"),
            ClauseResult::Invalid => write!(f, "invalid"),
            ClauseResult::PartiallyValid => write!(f, "partially valid"),
        }
    }
}

/// Verdict for a single obligation clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseAssessment {
    pub clause_text: String,
    pub result: ClauseResult,
    pub explanation: String,
}

/// License risk, ordered from least to most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LicenseRisk {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Proprietary,
    Unknown,
}

impl std::fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseRisk::Permissive => write!(f, "Permissive"),
            LicenseRisk::WeakCopyleft => write!(f, "Weak Copyleft"),
            LicenseRisk::StrongCopyleft => write!(f, "Strong Copyleft"),
            LicenseRisk::Proprietary => write!(f, "Proprietary"),
            LicenseRisk::Unknown => write!(f, "Unknown"),
        }
    }
}

/// The license named inside a located block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseIdentity {
    pub spdx: String,
    pub risk: LicenseRisk,
}

/// Everything the CLI learned about one input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub block: LicenseBlock,
    pub identity: Option<LicenseIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessments: Option<Vec<ClauseAssessment>>,
}

impl FileReport {
    pub fn has_invalid(&self) -> bool {
        self.assessments
            .as_deref()
            .is_some_and(|a| a.iter().any(|c| c.result == ClauseResult::Invalid))
    }
}
