use crate::config::ExtractConfig;
use crate::license::spdx;
use crate::license::vocabulary::{self, LineSignal};
use crate::models::{LicenseBlock, SourceText};

const NAMED_LICENSE_BONUS: f64 = 3.0;
const CANONICAL_PHRASE_BONUS: f64 = 1.5;
const DENSITY_WEIGHT: f64 = 2.0;
const MIN_DISTINCT_TERMS: usize = 2;

/// A line of the source with its byte range (line terminator excluded).
struct Line {
    start: usize,
    end: usize,
    signal: LineSignal,
}

/// Contiguous run of lines `first..=last` with the summed line weight.
#[derive(Debug, Clone, Copy)]
struct Span {
    first: usize,
    last: usize,
    weight: f64,
}

/// Rule-based license block extractor.
///
/// Lines are weighed by license vocabulary, candidate blocks are the
/// maximal-weight runs between stretches of unrelated text, and the best
/// candidate is returned if it clears the specificity bar.
pub struct BlockExtractor {
    config: ExtractConfig,
}

impl BlockExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, source: &SourceText) -> LicenseBlock {
        let content = source.content.as_str();
        let lines = split_lines(content);
        let spans = candidate_spans(&lines);

        let mut best: Option<(Span, f64)> = None;
        for span in spans {
            let score = self.score(source, &lines, span);
            tracing::debug!(
                first_line = span.first + 1,
                last_line = span.last + 1,
                weight = span.weight,
                score,
                "Candidate license block"
            );
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((span, score));
            }
        }

        let Some((span, score)) = best else {
            return LicenseBlock::NotFound;
        };

        let text = &content[lines[span.first].start..lines[span.last].end];
        if score < self.config.min_score || vocabulary::strong_terms(text) < MIN_DISTINCT_TERMS {
            tracing::debug!(score, "Best candidate below specificity bar");
            return LicenseBlock::NotFound;
        }

        LicenseBlock::Found(text.to_string())
    }

    fn score(&self, source: &SourceText, lines: &[Line], span: Span) -> f64 {
        let block = &lines[span.first..=span.last];
        let text = &source.content[block[0].start..block[block.len() - 1].end];

        let non_blank = block.iter().filter(|l| !l.signal.blank).count().max(1);
        let strong_hits: usize = block.iter().map(|l| l.signal.strong).sum();
        let density = strong_hits as f64 / non_blank as f64;

        let mut score = span.weight
            + DENSITY_WEIGHT * density
            + CANONICAL_PHRASE_BONUS * vocabulary::canonical_phrases(text) as f64;

        if spdx::identify(text).is_some() {
            score += NAMED_LICENSE_BONUS;
        }

        // Notices conventionally open a file, so favour early comment blocks.
        if source.is_comment_extract {
            let position = span.first as f64 / lines.len() as f64;
            score += self.config.header_bonus * (1.0 - position);
        }

        if non_blank > self.config.max_block_lines {
            score *= 0.5;
        }

        score
    }
}

fn split_lines(content: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut pos = 0;
    for raw in content.split_inclusive('\n') {
        let body = raw.trim_end_matches(['\n', '\r']);
        lines.push(Line {
            start: pos,
            end: pos + body.len(),
            signal: vocabulary::line_signal(body),
        });
        pos += raw.len();
    }
    lines
}

/// Best run of each region in which the running weight stays positive.
///
/// Every returned span starts and ends on a positively weighted line, so
/// blank, unrelated and code lines are never at a block edge.
fn candidate_spans(lines: &[Line]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut run = 0.0;
    let mut run_start = 0;
    let mut best: Option<Span> = None;

    for (i, line) in lines.iter().enumerate() {
        if run <= 0.0 {
            run = 0.0;
            run_start = i;
        }
        run += line.signal.weight;

        if run > 0.0 {
            if best.map_or(true, |b| run > b.weight) {
                best = Some(Span {
                    first: run_start,
                    last: i,
                    weight: run,
                });
            }
        } else if let Some(span) = best.take() {
            spans.push(span);
        }
    }

    spans.extend(best);
    spans
}
