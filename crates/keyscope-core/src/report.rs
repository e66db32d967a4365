//! Text rendering for the big-key report.
//!
//! Rendering is a pure function of the [`ScanReport`], so the same state
//! always produces the same text. Color is applied through `colored` and
//! follows its global override.

use colored::Colorize;

use crate::format::{display_key, sanitize};
use crate::scanner::{ScanOutcome, ScanReport};

/// Width of the key-name column in the ranked lists.
const NAME_WIDTH: usize = 60;

/// Renders the statistics section followed by the per-type rankings.
///
/// Types appear in canonical order. Types with no keys are left out of
/// both sections.
pub fn render_big_keys(report: &ScanReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{}\n",
        format!(
            "Scanned {} keys in {} batches",
            report.total_scanned, report.batches
        )
        .bold()
    ));

    match &report.outcome {
        ScanOutcome::Complete => {}
        ScanOutcome::BatchFailed { cursor, error } => {
            out.push_str(&format!(
                "{}\n",
                format!("[WARN] scan interrupted at cursor {cursor}: {error}; results are partial")
                    .yellow()
            ));
        }
        ScanOutcome::KeyFailed { key, error } => {
            out.push_str(&format!(
                "{}\n",
                format!(
                    "[WARN] strict scan stopped at key {}: {error}; results are partial",
                    display_key(key)
                )
                .yellow()
            ));
        }
    }

    render_stats(&mut out, report);
    render_rankings(&mut out, report);
    out
}

fn render_stats(out: &mut String, report: &ScanReport) {
    out.push_str(&format!("\n{}\n", "Key type statistics:".bold()));

    let mut any = false;
    for bucket in &report.buckets {
        let stats = &bucket.stats;
        if stats.count == 0 {
            continue;
        }
        any = true;
        let unit = bucket.data_type.unit();
        let mut line = format!(
            "  {:<6} : {} keys, {} {unit} total",
            bucket.data_type.type_name(),
            stats.count,
            stats.total_size
        );
        if let Some(pct) = stats.percentage(report.total_scanned) {
            line.push_str(&format!(", {pct:.2}% of keys"));
        }
        if let Some(avg) = stats.average() {
            line.push_str(&format!(", avg {avg:.2} {unit}"));
        }
        out.push_str(&line);
        out.push('\n');
    }
    if !any {
        out.push_str(&format!("  {}\n", "(no keys)".dimmed()));
    }

    if report.skipped > 0 {
        out.push_str(&format!(
            "  {}\n",
            format!(
                "{} keys skipped (deleted during scan or lookup failed)",
                report.skipped
            )
            .dimmed()
        ));
    }

    if !report.unrecognized.is_empty() {
        let detail: Vec<String> = report
            .unrecognized
            .iter()
            .map(|(name, count)| format!("{} ({count})", sanitize(name)))
            .collect();
        out.push_str(&format!(
            "  {}\n",
            format!(
                "{} keys of untracked types: {}",
                report.total_unrecognized(),
                detail.join(", ")
            )
            .dimmed()
        ));
    }
}

fn render_rankings(out: &mut String, report: &ScanReport) {
    let top_n = report
        .buckets
        .first()
        .map(|b| b.top.capacity())
        .unwrap_or_default();
    out.push_str(&format!(
        "\n{}\n",
        format!("Top {top_n} biggest keys per type:").bold()
    ));

    for bucket in &report.buckets {
        if bucket.top.is_empty() {
            continue;
        }
        let label = bucket.data_type.type_name().to_uppercase();
        out.push_str(&format!("\n{}\n", format!("[{label}]").cyan()));

        let unit = bucket.data_type.unit();
        for (i, record) in bucket.top.sorted().iter().enumerate() {
            out.push_str(&format!(
                "{:>2}. {:<width$} ({} {unit})\n",
                i + 1,
                display_key(&record.name),
                record.size.to_string().yellow(),
                width = NAME_WIDTH
            ));
        }
    }
}
