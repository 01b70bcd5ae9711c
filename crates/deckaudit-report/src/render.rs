//! Format-specific serialization of the report view.

use std::fmt::Write as _;

use tracing::error;

use deckaudit_common::config::OutputFormat;
use deckaudit_engine::models::AnalysisResult;

use crate::view::{CategoryView, ReportView, SummaryView};

/// Render an analysis result in the requested format. Pure: identical
/// input yields byte-identical output.
pub fn render(result: &AnalysisResult, format: OutputFormat) -> String {
    let view = ReportView::from_result(result);
    match format {
        OutputFormat::Yaml => render_yaml(&view),
        OutputFormat::Markdown => render_markdown(&view),
        OutputFormat::Text => render_text(&view),
    }
}

/// Render a run-level failure in the requested format, so scripted
/// consumers see a parseable document either way.
pub fn render_error(message: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Yaml => format!("error: {}\n", yaml_quote(message)),
        OutputFormat::Markdown => format!("# Deck Audit\n\n**Error:** {message}\n"),
        OutputFormat::Text => format!("ERROR: {message}\n"),
    }
}

fn render_yaml(view: &ReportView) -> String {
    match serde_yaml::to_string(view) {
        Ok(yaml) => yaml,
        Err(e) => {
            error!(error = %e, "yaml serialization failed");
            format!("error: report serialization failed: {e}\n")
        }
    }
}

fn yaml_quote(s: &str) -> String {
    serde_yaml::to_string(s).map_or_else(
        |_| format!("\"{s}\""),
        |y| y.trim_end().to_string(),
    )
}

fn render_markdown(view: &ReportView) -> String {
    let mut out = String::from("# Deck Audit Report\n\n");
    write_markdown_summary(&mut out, &view.summary);

    if view.inconsistencies.is_empty() {
        out.push_str("No cross-slide inconsistencies detected.\n");
        return out;
    }
    for category in &view.inconsistencies {
        let _ = writeln!(out, "## {}\n", category.category);
        for f in &category.findings {
            let _ = writeln!(
                out,
                "- **[{}]** slides {}: {}",
                f.severity,
                slide_list(&f.slides),
                f.description
            );
        }
        out.push('\n');
    }
    out
}

fn write_markdown_summary(out: &mut String, summary: &SummaryView) {
    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "- Slides: {} total, {} analyzed", summary.total_slides, summary.slides_analyzed);
    let _ = writeln!(out, "- Inconsistencies found: {}", summary.inconsistencies_found);
    let _ = writeln!(
        out,
        "- Severity: {} high, {} medium, {} low",
        summary.severity_breakdown.high,
        summary.severity_breakdown.medium,
        summary.severity_breakdown.low
    );
    let _ = writeln!(out, "- Analysis time: {}", summary.analysis_time);
    if !summary.unanalyzed_slides.is_empty() {
        let _ = writeln!(out, "- Unanalyzed slides: {}", summary.unanalyzed_slides.join(", "));
    }
    out.push('\n');
}

fn render_text(view: &ReportView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DECK AUDIT REPORT");
    let _ = writeln!(out, "=================");
    let _ = writeln!(
        out,
        "Slides: {} total, {} analyzed",
        view.summary.total_slides, view.summary.slides_analyzed
    );
    let _ = writeln!(out, "Inconsistencies: {}", view.summary.inconsistencies_found);
    let _ = writeln!(
        out,
        "Severity: {} high / {} medium / {} low",
        view.summary.severity_breakdown.high,
        view.summary.severity_breakdown.medium,
        view.summary.severity_breakdown.low
    );
    let _ = writeln!(out, "Analysis time: {}", view.summary.analysis_time);
    if !view.summary.unanalyzed_slides.is_empty() {
        let _ = writeln!(
            out,
            "Unanalyzed slides: {}",
            view.summary.unanalyzed_slides.join(", ")
        );
    }
    out.push('\n');

    if view.inconsistencies.is_empty() {
        let _ = writeln!(out, "No cross-slide inconsistencies detected.");
        return out;
    }
    for category in &view.inconsistencies {
        write_text_category(&mut out, category);
    }
    out
}

fn write_text_category(out: &mut String, category: &CategoryView) {
    let _ = writeln!(out, "{}", category.category.to_uppercase());
    let _ = writeln!(out, "{}", "-".repeat(category.category.len()));
    for f in &category.findings {
        let _ = writeln!(
            out,
            "  [{}] slides {}: {}",
            f.severity,
            slide_list(&f.slides),
            f.description
        );
    }
    out.push('\n');
}

fn slide_list(slides: &[u32]) -> String {
    slides
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
