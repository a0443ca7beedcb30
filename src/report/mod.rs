//! Report renderers for analysis results.
//!
//! - [`terminal`]: colored summary box and clause tables; respects `--verbose` / `--quiet`.
//! - [`render_raw`]: the fenced block and clause entries in the reasoning-backend
//!   wire format, for piping into other tools.
//!
//! JSON output is plain `serde_json` over [`FileReport`] and lives in `main`.

pub mod terminal;

use crate::backend::response::render_assessments;
use crate::models::FileReport;

/// Render reports in wire format. Multiple files are separated by a
/// `==> path <==` header line.
pub fn render_raw(reports: &[FileReport], show_block: bool) -> String {
    let headed = reports.len() > 1;
    let mut out = String::new();

    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if headed {
            out.push_str(&format!("==> {} <==\n", report.path.display()));
        }
        if show_block {
            out.push_str(&report.block.to_fenced());
            out.push('\n');
        }
        if let Some(assessments) = &report.assessments {
            if show_block && !assessments.is_empty() {
                out.push('\n');
            }
            out.push_str(&render_assessments(assessments));
        }
    }

    out
}
