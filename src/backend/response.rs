//! Strict parsing of reasoning-backend replies.
//!
//! Extraction replies must carry one triple-backtick fenced block; verification
//! replies must be a list of `Clause:` / `Result:` / `Explanation:` entries in
//! that order, one per input clause. Anything else is a
//! [`AnalysisError::MalformedBackendResponse`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::AnalysisError;
use crate::models::{
    ClauseAssessment, ClauseResult, LicenseBlock, ObligationClause, NOT_FOUND_SENTINEL,
};

const FENCE: &str = "```";

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*•]\s+|\d+[.)]\s+)?\**\s*(clause|result|explanation)\s*(?:\*\*\s*:|:\s*\*\*|:)\s*(.*)$",
    )
    .expect("valid field regex")
});

static ECHO_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*").expect("valid numbering regex"));

fn malformed(msg: impl Into<String>) -> AnalysisError {
    AnalysisError::MalformedBackendResponse(msg.into())
}

// ---------------------------------------------------------------------------
// License block
// ---------------------------------------------------------------------------

/// Parse an extraction reply and ground the returned block in `content`.
pub fn parse_license_block(reply: &str, content: &str) -> Result<LicenseBlock, AnalysisError> {
    let (with_info, without_info) =
        fenced_body(reply).ok_or_else(|| malformed("reply has no fenced block"))?;

    if without_info.trim() == NOT_FOUND_SENTINEL || with_info.trim() == NOT_FOUND_SENTINEL {
        return Ok(LicenseBlock::NotFound);
    }
    if with_info.trim().is_empty() {
        return Err(malformed("fenced block is empty"));
    }

    locate_verbatim(content, without_info)
        .or_else(|| locate_verbatim(content, with_info))
        .map(|slice| LicenseBlock::Found(slice.to_string()))
        .ok_or_else(|| malformed("returned block does not occur in the input text"))
}

/// Body of the first fenced block, as `(raw, without_info_string)`.
///
/// The two differ only when text follows the opening fence on its own line,
/// which is either a language tag or the first line of the block.
fn fenced_body(reply: &str) -> Option<(&str, &str)> {
    let open = reply.find(FENCE)? + FENCE.len();
    let after = &reply[open..];
    let close = after.find(FENCE)?;
    let body = &after[..close];

    let raw = strip_fence_newlines(body);
    let without_info = match body.find('\n') {
        Some(i) => strip_fence_newlines(&body[i..]),
        None => raw,
    };
    Some((raw, without_info))
}

fn strip_fence_newlines(body: &str) -> &str {
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    body.strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body)
}

/// Find `block` in `content` and return the matching slice of `content`.
///
/// An exact occurrence is returned as is. Otherwise tokens are compared with
/// whitespace and comment markers ignored, and the slice runs from the start
/// of the first matched line to the end of the last matched token.
pub fn locate_verbatim<'a>(content: &'a str, block: &str) -> Option<&'a str> {
    if block.is_empty() {
        return None;
    }
    if let Some(at) = content.find(block) {
        return Some(&content[at..at + block.len()]);
    }

    let wanted: Vec<&str> = block
        .split_whitespace()
        .filter(|t| !is_comment_marker(t))
        .collect();
    if wanted.is_empty() {
        return None;
    }

    let tokens: Vec<(usize, usize)> = token_spans(content)
        .into_iter()
        .filter(|&(s, e)| !is_comment_marker(&content[s..e]))
        .collect();

    let first = tokens.windows(wanted.len()).position(|window| {
        window
            .iter()
            .zip(&wanted)
            .all(|(&(s, e), w)| &content[s..e] == *w)
    })?;

    let last = tokens[first + wanted.len() - 1].1;
    let start = line_start(content, tokens[first].0);
    Some(&content[start..last])
}

fn token_spans(content: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in content.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, content.len()));
    }
    spans
}

/// Start of the line holding `at`: the first matched token, unless only
/// indentation and comment markers precede it on its line.
fn line_start(content: &str, at: usize) -> usize {
    let line_begin = content[..at].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &content[line_begin..at];
    if prefix
        .split_whitespace()
        .all(is_comment_marker)
    {
        line_begin
    } else {
        at
    }
}

fn is_comment_marker(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| matches!(c, '/' | '*' | '#' | '-' | ';'))
}

// ---------------------------------------------------------------------------
// Clause assessments
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Entry {
    clause: String,
    result: Option<ClauseResult>,
    explanation: Option<String>,
}

/// Parse a verification reply into exactly one assessment per obligation.
///
/// Entries must come back in input order and echo their clause; numbering,
/// case and punctuation differences in the echo are tolerated.
pub fn parse_assessments(
    reply: &str,
    obligations: &[ObligationClause],
) -> Result<Vec<ClauseAssessment>, AnalysisError> {
    let mut entries: Vec<Entry> = Vec::new();

    for line in reply.lines() {
        if line.trim_start().starts_with(FENCE) {
            continue;
        }

        let Some(caps) = FIELD.captures(line) else {
            append_continuation(&mut entries, line)?;
            continue;
        };
        let value = caps[2].trim().to_string();
        let n = entries.len();

        match caps[1].to_lowercase().as_str() {
            "clause" => {
                if let Some(prev) = entries.last() {
                    if prev.explanation.is_none() {
                        return Err(malformed(format!("entry {} has no Explanation", n)));
                    }
                }
                entries.push(Entry {
                    clause: value,
                    ..Entry::default()
                });
            }
            "result" => {
                let entry = entries
                    .last_mut()
                    .filter(|e| e.result.is_none())
                    .ok_or_else(|| malformed(format!("Result out of order near entry {}", n)))?;
                entry.result = Some(parse_result(&value)?);
            }
            _ => {
                let entry = entries
                    .last_mut()
                    .filter(|e| e.result.is_some() && e.explanation.is_none())
                    .ok_or_else(|| {
                        malformed(format!("Explanation out of order near entry {}", n))
                    })?;
                entry.explanation = Some(value);
            }
        }
    }

    if entries.len() != obligations.len() {
        return Err(malformed(format!(
            "expected {} assessments, got {}",
            obligations.len(),
            entries.len()
        )));
    }

    entries
        .into_iter()
        .zip(obligations)
        .enumerate()
        .map(|(i, (entry, clause))| {
            let result = entry
                .result
                .ok_or_else(|| malformed(format!("entry {} has no Result", i + 1)))?;
            let explanation = entry
                .explanation
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .ok_or_else(|| malformed(format!("entry {} has no Explanation", i + 1)))?;

            if !echo_matches(&entry.clause, clause.text()) {
                return Err(malformed(format!(
                    "entry {} answers '{}' instead of '{}'",
                    i + 1,
                    entry.clause.trim(),
                    clause
                )));
            }

            Ok(ClauseAssessment {
                clause_text: clause.text().to_string(),
                result,
                explanation,
            })
        })
        .collect()
}

fn append_continuation(entries: &mut [Entry], line: &str) -> Result<(), AnalysisError> {
    let text = line.trim();
    let Some(entry) = entries.last_mut() else {
        if !text.is_empty() {
            tracing::debug!(line = text, "Ignoring text before the first clause");
        }
        return Ok(());
    };

    match (&mut entry.explanation, entry.result) {
        (Some(explanation), _) => {
            if !text.is_empty() {
                explanation.push(' ');
                explanation.push_str(text);
            }
        }
        (None, None) => {
            if !text.is_empty() {
                entry.clause.push(' ');
                entry.clause.push_str(text);
            }
        }
        (None, Some(_)) if text.is_empty() => {}
        (None, Some(_)) => {
            return Err(malformed(format!(
                "unexpected text between Result and Explanation: '{}'",
                text
            )))
        }
    }
    Ok(())
}

fn parse_result(value: &str) -> Result<ClauseResult, AnalysisError> {
    let normalized = value
        .trim_matches(|c: char| matches!(c, '*' | '[' | ']' | '(' | ')' | '.' | '`' | '"'))
        .to_lowercase()
        .replace(['-', '_'], " ");
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    match normalized.as_str() {
        "valid" => Ok(ClauseResult::Valid),
        "invalid" => Ok(ClauseResult::Invalid),
        "partially valid" | "partiallyvalid" | "partial" => Ok(ClauseResult::PartiallyValid),
        _ => Err(malformed(format!("unknown result '{}'", value))),
    }
}

fn echo_matches(echoed: &str, expected: &str) -> bool {
    let squash = |s: &str| -> String {
        ECHO_NUMBERING
            .replace(s, "")
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect()
    };
    let (a, b) = (squash(echoed), squash(expected));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

/// Render assessments in the same entry format the backend is asked to produce.
pub fn render_assessments(assessments: &[ClauseAssessment]) -> String {
    assessments
        .iter()
        .map(|a| {
            format!(
                "Clause: {}\nResult: {}\nExplanation: {}\n",
                a.clause_text, a.result, a.explanation
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clauses(texts: &[&str]) -> Vec<ObligationClause> {
        texts.iter().map(|t| ObligationClause::new(*t)).collect()
    }

    #[test]
    fn test_block_exact() {
        let content = "// init\n// Copyright (c) 2020 Foo\n//   All rights reserved.\n";
        let reply = "```\n// Copyright (c) 2020 Foo\n//   All rights reserved.\n```";
        assert_eq!(
            parse_license_block(reply, content).unwrap(),
            LicenseBlock::Found("// Copyright (c) 2020 Foo\n//   All rights reserved.".into())
        );
    }

    #[test]
    fn test_block_with_language_tag() {
        let content = "Copyright 2020 Foo\nLicensed under MIT";
        let reply = "Here you go:\n```text\nCopyright 2020 Foo\nLicensed under MIT\n```\n";
        assert_eq!(
            parse_license_block(reply, content).unwrap().as_text(),
            Some("Copyright 2020 Foo\nLicensed under MIT")
        );
    }

    #[test]
    fn test_block_sentinel() {
        let reply = "```\nNo license information found.\n```";
        assert_eq!(
            parse_license_block(reply, "whatever").unwrap(),
            LicenseBlock::NotFound
        );
        let inline = "```No license information found.```";
        assert_eq!(
            parse_license_block(inline, "whatever").unwrap(),
            LicenseBlock::NotFound
        );
    }

    #[test]
    fn test_block_without_fence_is_malformed() {
        let err = parse_license_block("Copyright 2020 Foo", "Copyright 2020 Foo").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedBackendResponse(_)));

        let unclosed = parse_license_block("```\nCopyright 2020 Foo\n", "Copyright 2020 Foo");
        assert!(unclosed.is_err());
    }

    #[test]
    fn test_block_reflowed_by_backend_is_recovered() {
        let content = "/*\n *    Copyright (c) 2020 Foo\n *\n *    Licensed under the MIT License.\n */\nint x;\n";
        // Backend dropped the comment markers and indentation.
        let reply = "```\nCopyright (c) 2020 Foo\n\nLicensed under the MIT License.\n```";
        let block = parse_license_block(reply, content).unwrap();
        assert_eq!(
            block.as_text(),
            Some(" *    Copyright (c) 2020 Foo\n *\n *    Licensed under the MIT License.")
        );
        assert!(content.contains(block.as_text().unwrap()));
    }

    #[test]
    fn test_block_not_in_input_is_malformed() {
        let reply = "```\nApache License, Version 2.0\n```";
        assert!(parse_license_block(reply, "Copyright 2020 Foo").is_err());
    }

    #[test]
    fn test_assessments_plain() {
        let reply = "Clause: Attribution is required\n\
                     Result: invalid\n\
                     Explanation: The license grants redistribution without attribution.\n\
                     \n\
                     Clause: You may sell copies\n\
                     Result: valid\n\
                     Explanation: \"sell copies of the Software\".\n";
        let out = parse_assessments(
            reply,
            &clauses(&["Attribution is required", "You may sell copies"]),
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].result, ClauseResult::Invalid);
        assert_eq!(out[1].result, ClauseResult::Valid);
        assert_eq!(out[1].clause_text, "You may sell copies");
    }

    #[test]
    fn test_assessments_markdown_and_multiline() {
        let reply = "1. **Clause:** Retain the notice and open-source derivatives\n\
                     **Result:** Partially Valid\n\
                     **Explanation:** Notice retention is required.\n\
                     Nothing requires releasing derivative source.\n";
        let out = parse_assessments(
            reply,
            &clauses(&["Retain the notice and open-source derivatives"]),
        )
        .unwrap();
        assert_eq!(out[0].result, ClauseResult::PartiallyValid);
        assert_eq!(
            out[0].explanation,
            "Notice retention is required. Nothing requires releasing derivative source."
        );
    }

    #[test]
    fn test_assessments_count_mismatch() {
        let reply = "Clause: A\nResult: valid\nExplanation: ok\n";
        let err = parse_assessments(reply, &clauses(&["A", "B"])).unwrap_err();
        assert!(err.to_string().contains("expected 2 assessments, got 1"));
    }

    #[test]
    fn test_assessments_unknown_result() {
        let reply = "Clause: A\nResult: probably\nExplanation: hmm\n";
        assert!(parse_assessments(reply, &clauses(&["A"])).is_err());
    }

    #[test]
    fn test_assessments_missing_explanation() {
        let reply = "Clause: A\nResult: valid\nClause: B\nResult: valid\nExplanation: ok\n";
        assert!(parse_assessments(reply, &clauses(&["A", "B"])).is_err());
    }

    #[test]
    fn test_assessments_out_of_order() {
        let reply = "Clause: A\nExplanation: ok\nResult: valid\n";
        assert!(parse_assessments(reply, &clauses(&["A"])).is_err());
    }

    #[test]
    fn test_assessments_swapped_order_rejected() {
        let reply = "Clause: You may sell copies\n\
                     Result: valid\n\
                     Explanation: \"sell copies of the Software\".\n\
                     Clause: Attribution is required\n\
                     Result: invalid\n\
                     Explanation: No attribution requirement.\n";
        let err = parse_assessments(
            reply,
            &clauses(&["Attribution is required", "You may sell copies"]),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedBackendResponse(_)));
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_assessments_empty_echo_rejected() {
        let reply = "Clause:\nResult: valid\nExplanation: fine\n";
        assert!(parse_assessments(reply, &clauses(&["Attribution is required"])).is_err());
    }

    #[test]
    fn test_assessments_echo_tolerates_numbering_and_case() {
        let reply = "Clause: 1. ATTRIBUTION is required!\nResult: valid\nExplanation: fine\n";
        let out = parse_assessments(reply, &clauses(&["Attribution is required"])).unwrap();
        assert_eq!(out[0].clause_text, "Attribution is required");
    }

    #[test]
    fn test_empty_reply_for_no_obligations() {
        assert!(parse_assessments("", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_render_matches_parser() {
        let assessments = vec![ClauseAssessment {
            clause_text: "A".into(),
            result: ClauseResult::PartiallyValid,
            explanation: "because".into(),
        }];
        let rendered = render_assessments(&assessments);
        assert_eq!(rendered, "Clause: A\nResult: partially valid\nExplanation: because\n");
        assert_eq!(parse_assessments(&rendered, &clauses(&["A"])).unwrap(), assessments);
    }
}
