use std::sync::LazyLock;

use regex::Regex;

use crate::models::ObligationClause;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•+]|\d+[.)]|\(\d+\)|[a-z][.)])\s+").expect("valid list marker regex")
});

/// Split a block of obligation text into clauses.
///
/// Accepts a JSON array of strings, or a plain list with one clause per
/// line or list item. Indented lines without a list marker continue the
/// previous clause. Order and duplicates are preserved.
pub fn parse_obligations(text: &str) -> Vec<ObligationClause> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(text.trim()) {
        return items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(ObligationClause)
            .collect();
    }

    let mut clauses: Vec<String> = Vec::new();
    let mut open = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            open = false;
            continue;
        }

        let is_item = LIST_MARKER.is_match(line);
        let is_continuation = open && !is_item && line.starts_with([' ', '\t']);

        let body = LIST_MARKER.replace(line, "");
        let body = body.trim();

        match clauses.last_mut() {
            Some(last) if is_continuation => {
                last.push(' ');
                last.push_str(body);
            }
            _ => clauses.push(body.to_string()),
        }
        open = true;
    }

    clauses.into_iter().map(ObligationClause).collect()
}
