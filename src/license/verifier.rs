use std::sync::LazyLock;

use regex::Regex;

use crate::config::VerifyConfig;
use crate::license::topics::{self, Topic};
use crate::license::vocabulary::strip_comment_marker;
use crate::models::{ClauseAssessment, ClauseResult, ObligationClause};

pub const EMPTY_LICENSE_EXPLANATION: &str =
    "The license text was empty, so nothing in it supports this clause.";

const CITATION_MAX_CHARS: usize = 220;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?;](?:\s+|$)|\n[ \t]*(?:(?://+|#+|\*+)[ \t]*)?\n").expect("valid sentence regex")
});

// "and" only splits when it introduces a new obligation: a modal or an obligation
// verb follows. That word stays with the second part.
static CLAIM_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*;\s*|,?\s+and\s+also\s+|,?\s+as\s+well\s+as\s+|,?\s+and\s+((?:(?:they|you|users?|licensees?|the\s+licensee)\s+)?(?:must|shall|should|may|can|cannot|is|are|has|have|needs?|requires?|grants?|permits?|allows?|does|do)\b|(?:open[\s-]?sourc\w*|disclos\w*|releas\w*|publish\w*|includ\w*|stat(?:e|es|ing)|provid\w*|retain\w*|keep\w*|preserv\w*|share|sharing|distribut\w*|redistribut\w*|giv(?:e|es|ing)|display\w*|document(?:s|ing)?|indicat\w*|credit\w*|sublicens\w*|sell\w*)\b)",
    )
    .expect("valid claim split regex")
});

static NEGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:not|no|never|without|neither|nor|none|cannot|prohibit\w*|forbid\w*)\b|n't\b")
        .expect("valid negation regex")
});

// Phrases containing a negator that do not negate the claim.
static NEUTRAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bwithout\s+(?:restriction|limitation|fee|charge|royalt\w*)|\bfree\s+of\s+charge\b|\bnot\s+limited\s+to\b|\bno\s+later\s+than\b",
    )
    .expect("valid neutral regex")
});

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "these", "those", "any", "all", "its", "from",
    "are", "was", "were", "been", "must", "shall", "should", "may", "can", "cannot", "will",
    "not", "also", "user", "users", "you", "your", "they", "their", "them", "software", "license",
    "licence", "code", "work", "works", "which", "such", "into", "under", "other", "has", "have",
    "does", "use", "used",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Finding {
    Supported,
    Contradicted,
    Unsupported,
    Uncertain,
}

struct SubClaim {
    text: String,
    finding: Finding,
    note: String,
}

/// A license sentence with comment markers and line breaks flattened away.
struct Sentence {
    flat: String,
}

/// Rule-based clause verifier.
pub struct ClauseVerifier {
    config: VerifyConfig,
}

impl ClauseVerifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    pub fn verify(
        &self,
        license_text: &str,
        obligations: &[ObligationClause],
    ) -> Vec<ClauseAssessment> {
        if license_text.trim().is_empty() {
            return obligations
                .iter()
                .map(|clause| ClauseAssessment {
                    clause_text: clause.text().to_string(),
                    result: ClauseResult::Invalid,
                    explanation: EMPTY_LICENSE_EXPLANATION.to_string(),
                })
                .collect();
        }

        let sentences = split_sentences(license_text);
        obligations
            .iter()
            .map(|clause| self.assess(clause, &sentences))
            .collect()
    }

    fn assess(&self, clause: &ObligationClause, sentences: &[Sentence]) -> ClauseAssessment {
        let parts: Vec<SubClaim> = split_claims(clause.text())
            .into_iter()
            .flat_map(|part| self.judge(part, sentences))
            .collect();

        let result = joint_result(&parts);
        let explanation = match parts.as_slice() {
            [] => "The clause states no checkable claim.".to_string(),
            [single] => single.note.clone(),
            many => {
                let mut text: Vec<String> = many
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("Part {} (\"{}\"): {}", i + 1, p.text, p.note))
                    .collect();
                text.push(format!("Taken together the clause is {}.", result));
                text.join(" ")
            }
        };

        tracing::debug!(
            clause = %clause,
            parts = parts.len(),
            result = %result,
            "Assessed clause"
        );

        ClauseAssessment {
            clause_text: clause.text().to_string(),
            result,
            explanation,
        }
    }

    /// One finding per topic the claim touches, or a lexical finding when it
    /// touches none.
    fn judge(&self, claim: &str, sentences: &[Sentence]) -> Vec<SubClaim> {
        let negated = is_negated(claim);
        let topics = topics::topics_for(claim);

        let findings = if topics.is_empty() {
            vec![self.judge_lexically(claim, negated, sentences)]
        } else {
            topics
                .into_iter()
                .map(|topic| judge_topic(topic, negated, sentences))
                .collect()
        };

        findings
            .into_iter()
            .map(|(finding, note)| SubClaim {
                text: claim.to_string(),
                finding,
                note,
            })
            .collect()
    }

    fn judge_lexically(
        &self,
        claim: &str,
        negated: bool,
        sentences: &[Sentence],
    ) -> (Finding, String) {
        let words = content_words(claim);
        if words.is_empty() {
            return (
                Finding::Unsupported,
                "Unsupported: the claim has no terms that can be checked against the license."
                    .to_string(),
            );
        }

        let best = sentences
            .iter()
            .map(|s| {
                let lower = s.flat.to_lowercase();
                let hits = words.iter().filter(|w| lower.contains(w.as_str())).count();
                (hits as f64 / words.len() as f64, s)
            })
            .max_by(|a, b| a.0.total_cmp(&b.0));

        match best {
            Some((ratio, s)) if ratio >= self.config.support_ratio && !negated => (
                Finding::Supported,
                format!("Supported by the license passage \"{}\".", cite(s)),
            ),
            Some((ratio, s)) if ratio >= self.config.partial_ratio => (
                Finding::Uncertain,
                format!(
                    "Open to interpretation: the closest license passage is \"{}\", which does not settle the claim.",
                    cite(s)
                ),
            ),
            _ => (
                Finding::Unsupported,
                "Unsupported: no passage of the license addresses this claim.".to_string(),
            ),
        }
    }
}

fn judge_topic(topic: &Topic, negated: bool, sentences: &[Sentence]) -> (Finding, String) {
    let negated = negated && !topic.restriction;

    if let Some(s) = sentences.iter().find(|s| topic.denied_by(&s.flat)) {
        let finding = if negated {
            Finding::Supported
        } else {
            Finding::Contradicted
        };
        return (finding, describe(finding, topic, Some(s)));
    }

    if let Some(s) = sentences.iter().find(|s| topic.affirmed_by(&s.flat)) {
        let finding = if negated {
            Finding::Contradicted
        } else {
            Finding::Supported
        };
        return (finding, describe(finding, topic, Some(s)));
    }

    let finding = if negated {
        Finding::Uncertain
    } else {
        Finding::Unsupported
    };
    (finding, describe(finding, topic, None))
}

fn describe(finding: Finding, topic: &Topic, sentence: Option<&Sentence>) -> String {
    match (finding, sentence) {
        (Finding::Supported, Some(s)) => format!(
            "Supported: on {} the license states \"{}\".",
            topic.label,
            cite(s)
        ),
        (Finding::Contradicted, Some(s)) => format!(
            "Contradicted: on {} the license states \"{}\".",
            topic.label,
            cite(s)
        ),
        (Finding::Uncertain, _) => format!(
            "Open to interpretation: the license does not address {} either way.",
            topic.label
        ),
        _ => format!(
            "Unsupported: the license text says nothing about {}.",
            topic.label
        ),
    }
}

/// Valid only when every part is supported; invalid when nothing is.
fn joint_result(parts: &[SubClaim]) -> ClauseResult {
    let supported = parts
        .iter()
        .filter(|p| p.finding == Finding::Supported)
        .count();
    let uncertain = parts
        .iter()
        .filter(|p| p.finding == Finding::Uncertain)
        .count();

    if !parts.is_empty() && supported == parts.len() {
        ClauseResult::Valid
    } else if supported == 0 && uncertain == 0 {
        ClauseResult::Invalid
    } else {
        ClauseResult::PartiallyValid
    }
}

fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        push_sentence(&mut sentences, &text[start..m.end()]);
        start = m.end();
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<Sentence>, raw: &str) {
    let flat = raw
        .lines()
        .map(strip_comment_marker)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !flat.is_empty() {
        sentences.push(Sentence { flat });
    }
}

/// Split a clause into its sub-claims.
pub fn split_claims(clause: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for caps in CLAIM_SPLIT.captures_iter(clause) {
        let Some(whole) = caps.get(0) else { continue };
        parts.push(&clause[start..whole.start()]);
        start = caps.get(1).map_or(whole.end(), |kept| kept.start());
    }
    parts.push(&clause[start..]);

    parts
        .into_iter()
        .map(|p| p.trim().trim_end_matches(['.', ',']).trim())
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_negated(claim: &str) -> bool {
    let masked = NEUTRAL.replace_all(claim, " ");
    NEGATION.is_match(&masked)
}

fn content_words(claim: &str) -> Vec<String> {
    claim
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .map(stem)
        .collect()
}

fn stem(word: &str) -> String {
    for suffix in ["ing", "ed", "es", "s"] {
        if word.len() > suffix.len() + 3 {
            if let Some(root) = word.strip_suffix(suffix) {
                return root.to_string();
            }
        }
    }
    word.to_string()
}

fn cite(sentence: &Sentence) -> String {
    let flat = sentence.flat.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= CITATION_MAX_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(CITATION_MAX_CHARS).collect();
    format!("{}...", cut.trim_end())
}
