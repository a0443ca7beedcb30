//! Vocabulary used to weigh lines of text for license language.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// Terms that on their own point at licensing terms.
const STRONG_TERMS: &[&str] = &[
    r"\bcopyright(?:s|ed)?\b",
    r"©",
    r"\(c\)",
    r"\blicen[cs](?:e|es|ed|ing|or|ee)\b",
    r"\bpermission\b",
    r"\bwarrant(?:y|ies)\b",
    r"\bliab(?:le|ility|ilities)\b",
    r"\bredistribut\w*",
    r"\bdistribut\w*",
    r"\bsublicens\w*",
    r"\bmerchantability\b",
    r"\binfring\w*",
    r"\battribution\b",
    r"\ball\s+rights\s+reserved\b",
    r"spdx-license-identifier",
    r"\bpublic\s+domain\b",
    r"\bterms\s+and\s+conditions\b",
    r"\bopen\s+source\b",
];

/// Words typical of legal register but too common to count as license evidence.
const REGISTER_TERMS: &[&str] = &[
    r"\bshall\b",
    r"\bhereby\b",
    r"\bherein\b",
    r"\bthereof\b",
    r"\bwhether\b",
    r"\bwithout\b",
    r"\blimit(?:ed|ation)\b",
    r"\bincluding\b",
    r"\bprovided\b",
    r"\bconditions?\b",
    r"\brights?\b",
    r"\bholders?\b",
    r"\bcontributors?\b",
    r"\bdamages?\b",
    r"\bexpress(?:ly)?\b",
    r"\bimplied\b",
    r"\bsoftware\b",
    r"\bcopies\b",
    r"\bnotices?\b",
    r"\bpermitted\b",
    r"\bgranted\b",
    r"\bterms\b",
    r"\bmodify\b",
    r"\bmerge\b",
    r"\bpublish\b",
    r"\bsell\b",
    r"\bfitness\b",
    r"\bpurpose\b",
    r"\bauthors?\b",
    r"\bbinary\s+forms?\b",
    r"\bdocumentation\b",
    r"\bcompliance\b",
    r"\bapplicable\s+law\b",
    r"\bagreed\b",
    r"\bconsequential\b",
    r"\bincidental\b",
    r"\btort\b",
    r"\bcontract\b",
    r"\bnegligence\b",
    r"\bwhatsoever\b",
    r"\bendorse\b",
    r"\bas\s+is\b",
];

/// Phrases that only show up in actual license bodies or notices.
const CANONICAL_PHRASES: &[&str] = &[
    r"permission\s+is\s+hereby\s+granted",
    r"licensed\s+under\s+the",
    r"redistribution\s+and\s+use\s+in\s+source\s+and\s+binary\s+forms",
    r"provided\s+that\s+the\s+following\s+conditions\s+are\s+met",
    r"without\s+warrant(?:y|ies)\s+(?:or\s+conditions\s+)?of\s+any\s+kind",
    r"provided\s+.?as\s+is.?",
    r"all\s+rights\s+reserved",
    r"you\s+may\s+not\s+use\s+this\s+file\s+except\s+in\s+compliance",
    r"distributed\s+in\s+the\s+hope\s+that\s+it\s+will\s+be\s+useful",
    r"free\s+software;?\s+you\s+can\s+redistribute\s+it",
    r"above\s+copyright\s+notice\s+and\s+this\s+permission\s+notice",
    r"in\s+no\s+event\s+shall",
    r"spdx-license-identifier:",
];

static STRONG: LazyLock<RegexSet> = LazyLock::new(|| case_insensitive_set(STRONG_TERMS));
static REGISTER: LazyLock<RegexSet> = LazyLock::new(|| case_insensitive_set(REGISTER_TERMS));
static CANONICAL: LazyLock<RegexSet> = LazyLock::new(|| case_insensitive_set(CANONICAL_PHRASES));

static COMMENT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:<!--|-->|/\*+|\*+/|//+!?|#+!?|\*+|--+|;+|!+|'|rem\s)?")
        .expect("valid marker regex")
});

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-=*#/_~+]*$").expect("valid separator regex"));

static CODE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:fn|let|def|class|struct|enum|impl|import|return|const|var|pub|use|public|private|function)\s+[\w:.]+\s*[=(:;{<]|^\s*(?:if|for|while)\s*\(|\{\s*$|^\s*[}\])]",
    )
    .expect("valid code regex")
});

fn case_insensitive_set(patterns: &[&str]) -> RegexSet {
    let patterns: Vec<String> = patterns.iter().map(|p| format!("(?i){}", p)).collect();
    RegexSet::new(patterns).expect("valid vocabulary regex set")
}

/// Weight of a single line of candidate text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSignal {
    pub weight: f64,
    /// Distinct strong terms on the line (uncapped, for specificity checks).
    pub strong: usize,
    pub blank: bool,
}

const STRONG_WEIGHT: f64 = 1.0;
const STRONG_CAP: usize = 3;
const REGISTER_WEIGHT: f64 = 0.25;
const REGISTER_CAP: f64 = 1.0;
const CODE_PENALTY: f64 = -1.5;
const UNRELATED_PENALTY: f64 = -1.0;
const BLANK_PENALTY: f64 = -0.25;

/// Strip a leading comment marker so the remainder can be scored.
pub fn strip_comment_marker(line: &str) -> &str {
    let start = COMMENT_MARKER.find(line).map(|m| m.end()).unwrap_or(0);
    line[start..].trim()
}

pub fn line_signal(line: &str) -> LineSignal {
    let text = strip_comment_marker(line);
    if SEPARATOR.is_match(text) {
        return LineSignal {
            weight: BLANK_PENALTY,
            strong: 0,
            blank: true,
        };
    }

    let strong = STRONG.matches(text).iter().count();
    let register = REGISTER.matches(text).iter().count();

    let mut weight = strong.min(STRONG_CAP) as f64 * STRONG_WEIGHT
        + (register as f64 * REGISTER_WEIGHT).min(REGISTER_CAP);

    if CODE_LINE.is_match(text) {
        weight += CODE_PENALTY;
    } else if strong == 0 && register == 0 {
        weight = UNRELATED_PENALTY;
    }

    LineSignal {
        weight,
        strong,
        blank: false,
    }
}

/// Distinct strong terms anywhere in `text`.
pub fn strong_terms(text: &str) -> usize {
    STRONG.matches(text).iter().count()
}

/// Distinct canonical license phrases in `text`, whitespace-insensitive.
pub fn canonical_phrases(text: &str) -> usize {
    let flat = text
        .lines()
        .map(strip_comment_marker)
        .collect::<Vec<_>>()
        .join(" ");
    CANONICAL.matches(&flat).iter().count()
}

/// Whether `text` contains any license vocabulary at all.
pub fn has_license_vocabulary(text: &str) -> bool {
    STRONG.is_match(text)
}
