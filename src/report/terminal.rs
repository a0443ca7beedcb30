use std::collections::HashMap;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{ClauseAssessment, ClauseResult, FileReport, LicenseRisk};

/// Lines of a license block shown without `--verbose`.
const PREVIEW_LINES: usize = 12;

#[derive(Debug, Default, PartialEq)]
struct Tally {
    files: usize,
    found: usize,
    valid: usize,
    partial: usize,
    invalid: usize,
}

fn tally(reports: &[FileReport]) -> Tally {
    let mut t = Tally {
        files: reports.len(),
        ..Tally::default()
    };
    for report in reports {
        if report.block.is_found() {
            t.found += 1;
        }
        for a in report.assessments.iter().flatten() {
            match a.result {
                ClauseResult::Valid => t.valid += 1,
                ClauseResult::PartiallyValid => t.partial += 1,
                ClauseResult::Invalid => t.invalid += 1,
            }
        }
    }
    t
}

/// Render a colored terminal report.
pub fn render(reports: &[FileReport], show_block: bool, verbose: bool, quiet: bool) -> Result<()> {
    let t = tally(reports);
    let checked = reports.iter().any(|r| r.assessments.is_some());

    if quiet {
        let mut line = format!(
            "Files: {}  Found: {}  Not found: {}",
            t.files,
            t.found.to_string().green(),
            (t.files - t.found).to_string().red(),
        );
        if checked {
            line.push_str(&format!(
                "  Valid: {}  Partial: {}  Invalid: {}",
                t.valid.to_string().green(),
                t.partial.to_string().yellow(),
                t.invalid.to_string().red(),
            ));
        }
        println!("{}", line);
        return Ok(());
    }

    println!(
        "\n {} v{}\n",
        "clause-checkr".bold(),
        env!("CARGO_PKG_VERSION")
    );

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Files analyzed     : {}", t.files));
    if show_block {
        println!(
            " │  {:<48} │",
            format!(
                "{}  License found   : {:>4}  {}",
                "✓".green(),
                t.found,
                summarize_licenses(reports)
            )
        );
        println!(
            " │  {:<48} │",
            format!("{}  Not found       : {:>4}", "✗".red(), t.files - t.found)
        );
    }
    if checked {
        println!(
            " │  {:<48} │",
            format!("{}  Valid           : {:>4}", "✓".green(), t.valid)
        );
        println!(
            " │  {:<48} │",
            format!("{}  Partially valid : {:>4}", "⚠".yellow(), t.partial)
        );
        println!(
            " │  {:<48} │",
            format!("{}  Invalid         : {:>4}", "✗".red(), t.invalid)
        );
    }
    println!(" └────────────────────────────────────────────────────┘\n");

    for report in reports {
        println!(" {}", report.path.display().to_string().bold());

        if let Some(identity) = &report.identity {
            println!(
                "   License: {} ({})",
                identity.spdx,
                risk_label(identity.risk)
            );
        }

        if show_block {
            match report.block.as_text() {
                Some(text) => print_block(text, verbose),
                None => println!("   {} No license information found.", "[NOT FOUND]".red().bold()),
            }
        }

        if let Some(assessments) = &report.assessments {
            println!();
            if assessments.is_empty() {
                println!("   No obligation clauses to check.");
            } else {
                render_table(assessments);
            }
        }
        println!();
    }

    Ok(())
}

fn print_block(text: &str, verbose: bool) {
    let lines: Vec<&str> = text.lines().collect();
    let shown = if verbose {
        lines.len()
    } else {
        lines.len().min(PREVIEW_LINES)
    };

    println!("   {}", "┄".repeat(40).dimmed());
    for line in &lines[..shown] {
        println!("   {}", line);
    }
    if shown < lines.len() {
        println!(
            "   {}",
            format!("… {} more lines (use --verbose)", lines.len() - shown).dimmed()
        );
    }
    println!("   {}", "┄".repeat(40).dimmed());
}

fn render_table(assessments: &[ClauseAssessment]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Clause").add_attribute(Attribute::Bold),
            Cell::new("Result").add_attribute(Attribute::Bold),
            Cell::new("Explanation").add_attribute(Attribute::Bold),
        ]);

    for (i, a) in assessments.iter().enumerate() {
        let (result_str, result_color) = match a.result {
            ClauseResult::Valid => ("✓ valid", Color::Green),
            ClauseResult::PartiallyValid => ("⚠ partial", Color::Yellow),
            ClauseResult::Invalid => ("✗ invalid", Color::Red),
        };

        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&a.clause_text),
            Cell::new(result_str)
                .fg(result_color)
                .set_alignment(CellAlignment::Center),
            Cell::new(&a.explanation),
        ]);
    }

    println!("{}", table);
}

fn risk_label(risk: LicenseRisk) -> ColoredString {
    let label = risk.to_string();
    match risk {
        LicenseRisk::Permissive => label.green(),
        LicenseRisk::WeakCopyleft => label.yellow(),
        LicenseRisk::StrongCopyleft => label.red(),
        LicenseRisk::Proprietary => label.magenta(),
        LicenseRisk::Unknown => label.dimmed(),
    }
}

/// Top three identified licenses with their file counts, e.g. `[MIT (3), Apache-2.0 (1)]`.
fn summarize_licenses(reports: &[FileReport]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for identity in reports.iter().filter_map(|r| r.identity.as_ref()) {
        *counts.entry(identity.spdx.as_str()).or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(lic, cnt)| format!("{} ({})", lic, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}
