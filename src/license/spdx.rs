use std::sync::LazyLock;

use regex::Regex;

use crate::models::{LicenseIdentity, LicenseRisk};

/// Map a canonical SPDX identifier to its risk level.
pub fn risk_of(id: &str) -> LicenseRisk {
    match id.trim() {
        "MIT" | "MIT-0" | "Apache-2.0" | "BSD-2-Clause" | "BSD-3-Clause" | "BSD-4-Clause"
        | "ISC" | "0BSD" | "Unlicense" | "Zlib" | "CC0-1.0" | "WTFPL" | "CC-BY-4.0"
        | "BSL-1.0" | "PSF-2.0" | "Python-2.0" | "BlueOak-1.0.0" | "Artistic-2.0" => {
            LicenseRisk::Permissive
        }

        "LGPL-2.0" | "LGPL-2.0-only" | "LGPL-2.0-or-later" | "LGPL-2.1" | "LGPL-2.1-only"
        | "LGPL-2.1-or-later" | "LGPL-3.0" | "LGPL-3.0-only" | "LGPL-3.0-or-later"
        | "MPL-2.0" | "EPL-1.0" | "EPL-2.0" | "CDDL-1.0" | "EUPL-1.2" | "OSL-3.0" => {
            LicenseRisk::WeakCopyleft
        }

        "GPL-2.0" | "GPL-2.0-only" | "GPL-2.0-or-later" | "GPL-3.0" | "GPL-3.0-only"
        | "GPL-3.0-or-later" | "AGPL-3.0" | "AGPL-3.0-only" | "AGPL-3.0-or-later" => {
            LicenseRisk::StrongCopyleft
        }

        "LicenseRef-Proprietary" | "Proprietary" | "PROPRIETARY" | "Commercial"
        | "COMMERCIAL" => LicenseRisk::Proprietary,

        _ => LicenseRisk::Unknown,
    }
}

/// Risk of an SPDX expression.
///
/// `OR` picks the least restrictive side, `AND` the most restrictive one.
/// `AND` binds tighter than `OR` and parentheses override both.
/// `WITH` exceptions are ignored and `/` is read as `OR`.
pub fn expression_risk(expr: &str) -> LicenseRisk {
    let tokens = tokenize(&expr.replace('/', " OR "));
    RiskParser { tokens, pos: 0 }.parse_or()
}

#[derive(Debug, PartialEq, Clone)]
enum Token {
    Id(String),
    And,
    Or,
    With,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(match word.as_str() {
                    "AND" | "and" => Token::And,
                    "OR" | "or" => Token::Or,
                    "WITH" | "with" => Token::With,
                    _ => Token::Id(word),
                });
            }
        }
    }
    tokens
}

/// Recursive descent over the grammar
///
/// ```text
/// or_expr  := and_expr ( "OR" and_expr )*
/// and_expr := atom ( "AND" atom )*
/// atom     := "(" or_expr ")" | id ( "WITH" id )?
/// ```
struct RiskParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl RiskParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> LicenseRisk {
        let mut risk = self.parse_and();
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            risk = least_restrictive(risk, self.parse_and());
        }
        risk
    }

    fn parse_and(&mut self) -> LicenseRisk {
        let mut risk = self.parse_atom();
        while matches!(self.peek(), Some(Token::And)) {
            self.bump();
            risk = risk.max(self.parse_atom());
        }
        risk
    }

    fn parse_atom(&mut self) -> LicenseRisk {
        match self.bump() {
            Some(Token::LParen) => {
                let risk = self.parse_or();
                if matches!(self.peek(), Some(Token::RParen)) {
                    self.bump();
                }
                risk
            }
            Some(Token::Id(id)) => {
                // The exception never changes the base license's risk.
                if matches!(self.peek(), Some(Token::With)) {
                    self.bump();
                    self.bump();
                }
                risk_of(&id)
            }
            _ => LicenseRisk::Unknown,
        }
    }
}

/// Unknown sorts last so any recognised alternative wins an `OR`.
fn least_restrictive(a: LicenseRisk, b: LicenseRisk) -> LicenseRisk {
    match (a, b) {
        (LicenseRisk::Unknown, other) | (other, LicenseRisk::Unknown) => other,
        (a, b) => a.min(b),
    }
}

static SPDX_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)SPDX-License-Identifier:\s*([A-Za-z0-9.+\-() /]+?)\s*(?:\*/|-->|$)")
        .expect("valid SPDX tag regex")
});

/// Named-license phrases and the SPDX identifier they stand for, most specific first.
static NAMED_LICENSES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)GNU\s+Affero\s+General\s+Public\s+License", "AGPL-3.0"),
        (r"(?i)GNU\s+Lesser\s+General\s+Public\s+License[^.]*?version\s+3", "LGPL-3.0"),
        (r"(?i)GNU\s+(?:Lesser|Library)\s+General\s+Public\s+License", "LGPL-2.1"),
        (r"(?i)GNU\s+General\s+Public\s+License[^.]*?version\s+3", "GPL-3.0"),
        (r"(?i)GNU\s+General\s+Public\s+License[^.]*?version\s+2", "GPL-2.0"),
        (r"(?i)GNU\s+General\s+Public\s+License", "GPL-3.0"),
        (r"(?i)Apache\s+License,?\s+Version\s+2\.0|Apache\s+License\s+2\.0|Apache-2\.0", "Apache-2.0"),
        (r"(?i)Mozilla\s+Public\s+License,?\s+(?:v\.?\s*|version\s+)?2\.0", "MPL-2.0"),
        (r"(?i)Eclipse\s+Public\s+License\s*-?\s*v?\s*2\.0", "EPL-2.0"),
        (r"(?i)Eclipse\s+Public\s+License", "EPL-1.0"),
        (r"(?i)Boost\s+Software\s+License", "BSL-1.0"),
        (r"(?i)\bISC\s+License\b", "ISC"),
        (r"(?i)This\s+is\s+free\s+and\s+unencumbered\s+software|The\s+Unlicense", "Unlicense"),
        (r"(?i)CC0\s+1\.0|Creative\s+Commons\s+Zero", "CC0-1.0"),
        (r"(?i)\bzlib\s+License\b|This\s+notice\s+may\s+not\s+be\s+removed\s+or\s+altered", "Zlib"),
        (r"(?i)\bMIT\s+License\b|Permission\s+is\s+hereby\s+granted,\s+free\s+of\s+charge", "MIT"),
        (
            r"(?i)Neither\s+the\s+name\s+of[^.]*?may\s+be\s+used\s+to\s+endorse|BSD\s+3-Clause",
            "BSD-3-Clause",
        ),
        (
            r"(?i)Redistribution\s+and\s+use\s+in\s+source\s+and\s+binary\s+forms|BSD\s+2-Clause",
            "BSD-2-Clause",
        ),
        (
            r"(?i)\bproprietary\s+and\s+confidential\b|\bunauthori[sz]ed\s+copying\b[^.]*\bprohibited\b",
            "LicenseRef-Proprietary",
        ),
    ]
    .into_iter()
    .map(|(pattern, id)| (Regex::new(pattern).expect("valid license name regex"), id))
    .collect()
});

/// Identify the license stated in `text`.
///
/// An explicit SPDX-License-Identifier tag wins; otherwise the first
/// matching license name or canonical phrase is used.
pub fn identify(text: &str) -> Option<LicenseIdentity> {
    if let Some(caps) = SPDX_TAG.captures(text) {
        let spdx = caps[1].trim().to_string();
        if !spdx.is_empty() {
            let risk = expression_risk(&spdx);
            return Some(LicenseIdentity { spdx, risk });
        }
    }

    NAMED_LICENSES
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, id)| LicenseIdentity {
            spdx: id.to_string(),
            risk: risk_of(id),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_of_ids() {
        assert_eq!(risk_of("MIT"), LicenseRisk::Permissive);
        assert_eq!(risk_of("MPL-2.0"), LicenseRisk::WeakCopyleft);
        assert_eq!(risk_of("AGPL-3.0"), LicenseRisk::StrongCopyleft);
        assert_eq!(risk_of("CUSTOM-1"), LicenseRisk::Unknown);
    }

    #[test]
    fn test_expression_or_and_with() {
        assert_eq!(expression_risk("MIT OR GPL-3.0"), LicenseRisk::Permissive);
        assert_eq!(expression_risk("MIT AND GPL-3.0"), LicenseRisk::StrongCopyleft);
        assert_eq!(expression_risk("MIT/Apache-2.0"), LicenseRisk::Permissive);
        assert_eq!(
            expression_risk("GPL-2.0 WITH Classpath-exception-2.0"),
            LicenseRisk::StrongCopyleft
        );
        assert_eq!(expression_risk("LGPL-2.1 OR CUSTOM"), LicenseRisk::WeakCopyleft);
    }

    #[test]
    fn test_expression_parentheses_group() {
        assert_eq!(
            expression_risk("(MIT OR Apache-2.0) AND GPL-3.0"),
            LicenseRisk::StrongCopyleft
        );
        assert_eq!(
            expression_risk("MIT OR (Apache-2.0 AND GPL-3.0)"),
            LicenseRisk::Permissive
        );
        assert_eq!(
            expression_risk("GPL-2.0-only AND (MIT OR LGPL-2.1)"),
            LicenseRisk::StrongCopyleft
        );
        assert_eq!(expression_risk("(MPL-2.0)"), LicenseRisk::WeakCopyleft);
    }

    #[test]
    fn test_proprietary_notices() {
        assert_eq!(risk_of("LicenseRef-Proprietary"), LicenseRisk::Proprietary);

        let tag = identify("// SPDX-License-Identifier: LicenseRef-Proprietary").unwrap();
        assert_eq!(tag.risk, LicenseRisk::Proprietary);

        let notice = "Copyright (c) 2023 Acme Corp. Proprietary and confidential.\n\
                      Unauthorized copying of this file, via any medium, is strictly prohibited.";
        let id = identify(notice).unwrap();
        assert_eq!(id.spdx, "LicenseRef-Proprietary");
        assert_eq!(id.risk, LicenseRisk::Proprietary);
    }

    #[test]
    fn test_identify_spdx_tag() {
        let id = identify("// SPDX-License-Identifier: MIT OR Apache-2.0\n").unwrap();
        assert_eq!(id.spdx, "MIT OR Apache-2.0");
        assert_eq!(id.risk, LicenseRisk::Permissive);

        let id = identify("/* SPDX-License-Identifier: GPL-2.0-only */").unwrap();
        assert_eq!(id.spdx, "GPL-2.0-only");
    }

    #[test]
    fn test_identify_named_license() {
        let apache = "Licensed under the Apache License, Version 2.0 (the \"License\");";
        assert_eq!(identify(apache).unwrap().spdx, "Apache-2.0");

        let gpl = "under the terms of the GNU General Public License as published by\n\
                   the Free Software Foundation, either version 3 of the License";
        assert_eq!(identify(gpl).unwrap().spdx, "GPL-3.0");

        let mit = "Permission is hereby granted, free of charge, to any person";
        assert_eq!(identify(mit).unwrap().risk, LicenseRisk::Permissive);
    }

    #[test]
    fn test_identify_nothing() {
        assert!(identify("just some notes about buffers").is_none());
    }
}
