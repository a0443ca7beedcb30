//! Prompts sent to the reasoning backend.
//!
//! Both prompts pin the reply format that [`super::response`] parses.

use crate::models::{ObligationClause, NOT_FOUND_SENTINEL};

/// Build the license-block extraction prompt.
pub fn extraction_prompt(content: &str, is_comment_extract: bool) -> String {
    let header = if is_comment_extract {
        "File Comments:"
    } else {
        "File Text:"
    };

    format!(
        r#"Task: locate the license text in a source artifact.

The input below is either comment text extracted from a source code file, or
the full text of a file that normally carries no comments (README, NOTICE, ...).

Find the single contiguous block of text that most likely states licensing terms.

Signals of license text:
- vocabulary such as "copyright", "license", "permission", "terms",
  "distribution", "modification", "warranty", "liability", "attribution";
- named licenses or notices such as "MIT License", "Apache License, Version 2.0",
  "GNU General Public License", "All rights reserved", SPDX-License-Identifier tags;
- a legalistic register about rights and permissions rather than code commentary.

Rules:
1. Score contiguous blocks by the density of these signals and pick the best one.
2. Prefer blocks naming a specific license and resembling canonical license wording.
3. For comment text, prefer blocks near the start of the file.
4. Ignore passing mentions of licenses in unrelated discussion.
5. Reject blocks that are a single keyword or the whole remaining file when a
   shorter, denser block exists.
6. Copy the selected block VERBATIM: keep every space, tab, blank line and line
   break exactly as in the input. Do not re-wrap, re-indent or trim it.
7. Reply with the block enclosed in triple backticks (```) and nothing else.
8. If no block qualifies, reply with exactly:
```
{sentinel}
```

{header}
{content}
"#,
        sentinel = NOT_FOUND_SENTINEL,
        header = header,
        content = content,
    )
}

/// Build the obligation-clause verification prompt.
///
/// Clauses are numbered so the reply can be checked entry by entry.
pub fn verification_prompt(license_text: &str, obligations: &[ObligationClause]) -> String {
    let numbered = obligations
        .iter()
        .enumerate()
        .map(|(i, clause)| format!("{}. {}", i + 1, clause))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"[Task]
Check each obligation clause below against the open-source license text.
Classify every clause as:
- valid: fully supported by the license;
- invalid: contradicted by, or unsupported by, the license;
- partially valid: partly supported, or open to reasonable interpretation.

[Rules]
1. Compare each clause with the license sections relevant to it.
2. If a clause bundles several claims, check each claim on its own and then the
   clause as a whole. A clause is valid only when every claim in it is supported.
3. Cite the specific license wording behind each verdict.
4. Assess all {count} clauses, in the given order, one entry per clause.
   Do not merge, skip or reorder clauses.
5. Reply with entries in exactly this format and no other text:

Clause: <clause text>
Result: <valid | invalid | partially valid>
Explanation: <explanation citing the license text>

[License Text]
{license}

[Obligations]
{numbered}
"#,
        count = obligations.len(),
        license = license_text,
        numbered = numbered,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_framing() {
        let comments = extraction_prompt("// Copyright 2020", true);
        assert!(comments.contains("File Comments:\n// Copyright 2020"));

        let text = extraction_prompt("Copyright 2020", false);
        assert!(text.contains("File Text:\nCopyright 2020"));
        assert!(text.contains(NOT_FOUND_SENTINEL));
    }

    #[test]
    fn test_verification_prompt_numbers_clauses() {
        let clauses = vec![
            ObligationClause::new("Attribution is required"),
            ObligationClause::new("You may sell copies"),
        ];
        let prompt = verification_prompt("MIT License ...", &clauses);
        assert!(prompt.contains("1. Attribution is required\n2. You may sell copies"));
        assert!(prompt.contains("Assess all 2 clauses"));
        assert!(prompt.contains("[License Text]\nMIT License ..."));
    }
}
