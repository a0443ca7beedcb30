//! Obligation topics the rule-based verifier knows how to adjudicate.
//!
//! A topic recognises sub-claims about one kind of obligation or permission
//! and knows which license sentences affirm or deny it. Each `affirms` /
//! `denies` entry is a conjunction: every pattern must match the same sentence.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

pub struct Topic {
    /// Human-readable subject used in explanations.
    pub label: &'static str,
    /// The topic states a restriction, so negators in the claim do not flip it.
    pub restriction: bool,
    claim: Vec<Regex>,
    affirms: Vec<Vec<Regex>>,
    denies: Vec<Vec<Regex>>,
}

impl Topic {
    /// Byte range of the leftmost claim pattern match.
    fn claim_span(&self, claim: &str) -> Option<(usize, usize)> {
        self.claim
            .iter()
            .filter_map(|re| re.find(claim))
            .map(|m| (m.start(), m.end()))
            .min()
    }

    pub fn affirmed_by(&self, sentence: &str) -> bool {
        matches_any(&self.affirms, sentence)
    }

    pub fn denied_by(&self, sentence: &str) -> bool {
        matches_any(&self.denies, sentence)
    }
}

fn matches_any(alternatives: &[Vec<Regex>], sentence: &str) -> bool {
    alternatives
        .iter()
        .any(|all| all.iter().all(|re| re.is_match(sentence)))
}

struct TopicDef {
    label: &'static str,
    restriction: bool,
    claim: &'static [&'static str],
    affirms: &'static [&'static [&'static str]],
    denies: &'static [&'static [&'static str]],
}

// Order matters: the first topic whose claim pattern matches wins.
const TOPIC_DEFS: &[TopicDef] = &[
    TopicDef {
        label: "endorsement using contributor names",
        restriction: true,
        claim: &[r"\bendors\w*", r"\bpromot\w*[^.]*\bnames?\b", r"\bnames?\b[^.]*\bpromot\w*"],
        affirms: &[&[r"\bendorse\b|\bpromote\b", r"\bnames?\b"]],
        denies: &[],
    },
    TopicDef {
        label: "trademarks",
        restriction: true,
        claim: &[r"\btrademarks?\b", r"\btrade\s+names?\b"],
        affirms: &[&[r"\btrademarks?\b|\btrade\s+names?\b", r"\b(?:not|no|nor|except)\b"]],
        denies: &[],
    },
    TopicDef {
        label: "the warranty disclaimer",
        restriction: true,
        claim: &[r"\bwarrant\w*", r"\bas[\s-]+is\b"],
        affirms: &[
            &[r"\bas[\s-]+is\b"],
            &[r"\bwithout\b|\bdisclaim\w*|\bno\b", r"\bwarrant\w*"],
        ],
        denies: &[],
    },
    TopicDef {
        label: "limitation of liability",
        restriction: true,
        claim: &[r"\bliab\w*"],
        affirms: &[&[r"\bliab\w*", r"\bno\b|\bnot\b|\bin\s+no\s+event\b|\bdisclaim\w*|\blimit\w*"]],
        denies: &[],
    },
    TopicDef {
        label: "patent rights",
        restriction: false,
        claim: &[r"\bpatents?\b"],
        affirms: &[&[r"\bpatents?\b", r"\bgrant\w*"]],
        denies: &[&[
            r"\b(?:no|not|nor|without)\b[^.]*\bpatent|\bpatent[^.]*\bnot\s+(?:be\s+)?grant\w*",
        ]],
    },
    TopicDef {
        label: "notices of changes",
        restriction: false,
        claim: &[
            r"\bchanges?\b[^.]*\b(?:stat|notic|mark|indicat|document)\w*",
            r"\b(?:stat|mark|indicat|document)\w*\b[^.]*\b(?:changes?|modifications?)\b",
        ],
        affirms: &[&[
            r"\bprominent\s+notices?|\bindicate\s+if\s+changes|\bstating\s+that\s+you\s+changed|\bmark\w*\s+[^.]*\b(?:changed|modified)\b",
        ]],
        denies: &[],
    },
    TopicDef {
        label: "including a copy of the license",
        restriction: false,
        claim: &[
            r"\b(?:copy|copies|text)\s+of\s+(?:the|this)\s+licen[cs]e\b",
            r"\blicen[cs]e\s+text\b",
            r"\b(?:includ|provid|ship|bundl)\w*\s+(?:the\s+|a\s+)?licen[cs]e\b",
            r"\bpermission\s+notice\b",
        ],
        affirms: &[&[
            r"\bcopy\s+of\s+this\s+licen[cs]e\b|\bpermission\s+notice\s+shall\s+be\s+included|\baccompanied\s+by\s+(?:a\s+copy\s+of\s+)?this\s+licen[cs]e|\blicen[cs]e\s+(?:text|notice)\s+(?:must|shall)\s+be\s+included",
        ]],
        denies: &[],
    },
    TopicDef {
        label: "attribution and copyright notices",
        restriction: false,
        claim: &[
            r"\battribut\w*",
            r"\bcredit\b",
            r"\b(?:retain|keep|preserv|includ|reproduc|display)\w*\b[^.]*\b(?:copyright|notices?)\b",
            r"\bcopyright\s+notices?\b",
        ],
        affirms: &[
            &[
                r"\b(?:retain|keep|preserv|includ|reproduc|display)\w*",
                r"\b(?:notices?|credit|attribution)\b",
                r"\b(?:must|shall|provided|required?|conditions?)\b",
            ],
            &[r"\bgive\s+appropriate\s+credit\b|\bmust\s+(?:give|provide)\s+attribution\b"],
        ],
        denies: &[&[
            r"\bwithout\s+(?:any\s+)?(?:attribution|credit)\b|\battribution\s+(?:is\s+)?not\s+required|\bno\s+attribution\b|\bnot\s+(?:required|necessary|obliged)\s+to\s+(?:give\s+)?(?:credit|attribut)|\bwithout\s+retaining\b",
        ]],
    },
    TopicDef {
        label: "disclosing source code of derivative works",
        restriction: false,
        claim: &[
            r"\bopen[\s-]?sourc\w*",
            r"\bcopyleft\b",
            r"\bshare[\s-]?alike\b",
            r"\b(?:disclos|releas|publish|provid|mak)\w*\b[^.]*\bsource\b",
            r"\b(?:derivative|modified)\s+works?\b[^.]*\b(?:same|this)\s+licen[cs]e\b",
            r"\bsame\s+licen[cs]e\b",
        ],
        affirms: &[
            &[
                r"\b(?:derivative|modified|based\s+on|modifications|work)\b",
                r"\b(?:same|this|these)\s+(?:licen[cs]e|terms)\b",
                r"\b(?:must|shall|required?)\b",
            ],
            &[r"\bcorresponding\s+source\b"],
            &[
                r"\bsource\s+code\b",
                r"\b(?:must|shall)\b",
                r"\b(?:available|provide|disclos|offer)\w*",
            ],
            &[r"\bshare[\s-]?alike\b"],
        ],
        denies: &[
            &[r"\bwithout\s+restriction\b"],
            &[r"\bproprietary\b|\bclosed[\s-]source\b"],
            &[
                r"\b(?:any|different|other|additional)\s+(?:or\s+different\s+)?licen[cs]e\s+terms\b|\bunder\s+(?:any|different)\s+licen[cs]e\b",
                r"\b(?:may|can)\b",
            ],
        ],
    },
    TopicDef {
        label: "sublicensing",
        restriction: false,
        claim: &[r"\bsublicens\w*"],
        affirms: &[&[r"\bsublicens\w*"]],
        denies: &[&[r"\b(?:not|no)\b[^.]*\bsublicens\w*"]],
    },
    TopicDef {
        label: "commercial use",
        restriction: false,
        claim: &[r"\bcommercial\w*", r"\bsell\b", r"\bsale\b"],
        affirms: &[&[r"\bsell\b|\bcommercial(?:ly)?\b|\bany\s+purpose\b"]],
        denies: &[&[
            r"\bnon[\s-]?commercial\s+(?:use|purposes)\s+only\b|\bonly\s+for\s+non[\s-]?commercial\b|\bmay\s+not\b[^.]*\bcommercial|\bnot\s+for\s+commercial\b",
        ]],
    },
    TopicDef {
        label: "modification",
        restriction: false,
        claim: &[r"\bmodif\w*", r"\bderivative\s+works?\b", r"\badapt\w*"],
        affirms: &[&[r"\bmodify\b|\bmodifications?\b|\bderivative\s+works?\b|\bmerge\b|\badapt\w*"]],
        denies: &[&[r"\bno\s+derivatives?\b|\bmay\s+not\s+(?:modify|adapt)\b|\bnot\s+(?:be\s+)?modif\w*"]],
    },
    TopicDef {
        label: "redistribution",
        restriction: false,
        claim: &[r"\b(?:re)?distribut\w*", r"\bcop(?:y|ies)\b", r"\bshare\b"],
        affirms: &[&[
            r"\b(?:re)?distribut\w*|\bcop(?:y|ies)\b",
            r"\b(?:may|permitted|permission|granted|right|free)\w*",
        ]],
        denies: &[&[r"\bmay\s+not\s+(?:be\s+)?(?:re)?distribut\w*|\bnot\s+(?:be\s+)?(?:re)?distribut\w*"]],
    },
    TopicDef {
        label: "use of the software",
        restriction: false,
        claim: &[r"\b(?:use|using|run|execute)\s+(?:the\s+|this\s+)?(?:software|code|work|library|program)\b"],
        affirms: &[&[r"\buse\b", r"\b(?:may|permitted|permission|granted|right|free)\w*"]],
        denies: &[],
    },
];

pub static TOPICS: LazyLock<Vec<Topic>> = LazyLock::new(|| {
    TOPIC_DEFS
        .iter()
        .map(|def| Topic {
            label: def.label,
            restriction: def.restriction,
            claim: compile(def.claim),
            affirms: def.affirms.iter().map(|all| compile(all)).collect(),
            denies: def.denies.iter().map(|all| compile(all)).collect(),
        })
        .collect()
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .unwrap_or_else(|e| panic!("invalid topic pattern {:?}: {}", p, e))
        })
        .collect()
}

/// Every topic the claim is about, in table order.
///
/// A later topic is only kept when its wording does not overlap the wording
/// already claimed by an earlier one, so "derivative works under the same
/// license" stays a single copyleft claim while "retain notices, open-source
/// derivative works" yields two.
pub fn topics_for(claim: &str) -> Vec<&'static Topic> {
    let mut taken: Vec<(usize, usize)> = Vec::new();
    let mut found = Vec::new();
    for topic in TOPICS.iter() {
        let Some((start, end)) = topic.claim_span(claim) else {
            continue;
        };
        if taken.iter().any(|&(s, e)| start < e && s < end) {
            continue;
        }
        taken.push((start, end));
        found.push(topic);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_for(claim: &str) -> Option<&'static Topic> {
        topics_for(claim).into_iter().next()
    }

    #[test]
    fn test_all_topics_compile() {
        assert_eq!(TOPICS.len(), TOPIC_DEFS.len());
        for (topic, def) in TOPICS.iter().zip(TOPIC_DEFS) {
            assert_eq!(topic.claim.len(), def.claim.len(), "{}", def.label);
            assert_eq!(topic.affirms.len(), def.affirms.len(), "{}", def.label);
            assert_eq!(topic.denies.len(), def.denies.len(), "{}", def.label);
        }
    }

    const GPL_CONVEY: &str = "You may make, run and propagate covered works that you do not \
convey, without conditions so long as your license otherwise remains in force.";
    const GPL_LICENSE_WHOLE: &str = "You must license the entire work, as a whole, under this \
License to anyone who comes into possession of a copy.";
    const GPL_NOTICES: &str = "You must keep intact all notices stating that this License applies \
and keep the copyright notices intact.";

    #[test]
    fn test_copyleft_text_does_not_deny_notice_retention() {
        let topic = topic_for("users must keep the copyright notices intact").unwrap();
        assert_eq!(topic.label, "attribution and copyright notices");
        assert!(!topic.denied_by(GPL_CONVEY));
        assert!(!topic.denied_by(GPL_LICENSE_WHOLE));
        assert!(topic.affirmed_by(GPL_NOTICES));
    }

    #[test]
    fn test_source_disclosure_against_copyleft_and_permissive() {
        let topic = topic_for("derivative works must be open-sourced").unwrap();
        assert!(topic.affirmed_by(GPL_LICENSE_WHOLE));
        assert!(!topic.denied_by(GPL_CONVEY));
        assert!(topic.denied_by(
            "Permission is granted to deal in the Software without restriction."
        ));
    }

    #[test]
    fn test_topic_routing() {
        assert_eq!(
            topic_for("users must retain the copyright notice").unwrap().label,
            "attribution and copyright notices"
        );
        assert_eq!(
            topic_for("must open-source derivative works").unwrap().label,
            "disclosing source code of derivative works"
        );
        assert_eq!(
            topic_for("the names of contributors may not be used to endorse products")
                .unwrap()
                .label,
            "endorsement using contributor names"
        );
        assert!(topic_for("licensees get a pony").is_none());
    }

    #[test]
    fn test_topics_for_compound_claim() {
        let labels = |claim: &str| -> Vec<&str> {
            topics_for(claim).iter().map(|t| t.label).collect()
        };
        assert_eq!(
            labels("users must retain the copyright notice, open-source derivative works"),
            vec![
                "attribution and copyright notices",
                "disclosing source code of derivative works",
                "modification"
            ]
        );
        assert_eq!(
            labels("Derivative works must be released under the same license"),
            vec!["disclosing source code of derivative works"]
        );
        assert!(labels("licensees get a pony").is_empty());
    }

    #[test]
    fn test_attribution_affirmed_by_retention_proviso() {
        let topic = topic_for("attribution is required").unwrap();
        assert!(topic.affirmed_by(
            "Redistribution is permitted provided the copyright notice is retained."
        ));
        assert!(topic.denied_by("You may redistribute it without attribution."));
    }
}
