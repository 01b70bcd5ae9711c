//! Rule-based detection pass.
//!
//! A deterministic complement to the reasoning engine: regex-extracted
//! figures grouped by metric context, a fixed table of contradictory
//! phrase pairs, and schedule keywords paired with temporal figures. Its
//! findings are merged with the engine's before deduplication, so the
//! obvious conflicts are caught even when an engine call fails.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;

use deckaudit_ingestion::categorize::{
    count_figures, currency_figures, percent_figures, temporal_figures,
};
use deckaudit_ingestion::models::Corpus;

use crate::models::{Finding, FindingCategory, Severity};

/// Metric contexts for numerical conflicts: a keyword group, the figure
/// extractor that applies, and the severity of a conflict in that context.
struct MetricContext {
    label: &'static str,
    keywords: &'static [&'static str],
    figures: fn(&str) -> Vec<String>,
    severity: Severity,
}

const METRIC_CONTEXTS: [MetricContext; 3] = [
    MetricContext {
        label: "revenue",
        keywords: &["revenue", "sales", "income", "earnings"],
        figures: currency_figures,
        severity: Severity::High,
    },
    MetricContext {
        label: "percentage",
        keywords: &["market share", "growth", "increase", "decrease"],
        figures: percent_figures,
        severity: Severity::High,
    },
    MetricContext {
        label: "quantity",
        keywords: &["employees", "customers", "users", "units"],
        figures: count_figures,
        severity: Severity::Medium,
    },
];

/// Phrase pairs that cannot both be true of the same deck.
const CONTRADICTION_PAIRS: [(&str, &str, &str); 10] = [
    ("highly competitive", "few competitors", "market competition"),
    ("growing market", "declining market", "market growth"),
    ("market leader", "small player", "market position"),
    ("increasing revenue", "decreasing revenue", "revenue trend"),
    ("profitable", "unprofitable", "profitability"),
    ("strong performance", "weak performance", "performance"),
    ("cost reduction", "heavy investment", "strategy"),
    ("conservative", "aggressive", "strategy"),
    ("phase 1 complete", "phase 1 ongoing", "project status"),
    ("ahead of schedule", "behind schedule", "project timeline"),
];

/// Schedule keywords: slides carrying one of these plus a temporal figure
/// participate in timeline conflict checks.
const SCHEDULE_KEYWORDS: [&str; 6] =
    ["launch", "release", "ship", "deadline", "deliver", "go live"];

/// Run the rule-based pass over the corpus. Output satisfies the same
/// invariants validation enforces on engine findings: at least two
/// distinct slides, category and severity from the closed sets.
pub fn rule_based_findings(corpus: &Corpus) -> Vec<Finding> {
    let slide_text = collect_slide_text(corpus);
    let mut findings = Vec::new();
    findings.extend(numerical_conflicts(&slide_text));
    findings.extend(contradictory_statements(&slide_text));
    findings.extend(timeline_conflicts(&slide_text));
    debug!(findings = findings.len(), "rule-based pass complete");
    findings
}

/// One text blob per slide, markers excluded. Keywords match against the
/// lowercased form; figure extraction needs the original casing (quarter
/// tokens are case-sensitive).
struct SlideText {
    raw: String,
    lower: String,
}

impl SlideText {
    fn has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.lower.contains(k))
    }
}

fn collect_slide_text(corpus: &Corpus) -> BTreeMap<u32, SlideText> {
    let mut by_slide: BTreeMap<u32, SlideText> = BTreeMap::new();
    for item in corpus.items().iter().filter(|i| !i.is_marker()) {
        let entry = by_slide
            .entry(item.slide_number)
            .or_insert_with(|| SlideText { raw: String::new(), lower: String::new() });
        if !entry.raw.is_empty() {
            entry.raw.push(' ');
            entry.lower.push(' ');
        }
        entry.raw.push_str(&item.text);
        entry.lower.push_str(&item.text.to_lowercase());
    }
    by_slide
}

/// Different figures for the same metric context on different slides.
fn numerical_conflicts(slide_text: &BTreeMap<u32, SlideText>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for context in &METRIC_CONTEXTS {
        // figure value -> slides stating it
        let mut by_value: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for (&slide, text) in slide_text {
            if !text.has_any(context.keywords) {
                continue;
            }
            for figure in (context.figures)(&text.raw) {
                by_value.entry(figure).or_default().insert(slide);
            }
        }
        if by_value.len() < 2 {
            continue;
        }
        let slides: BTreeSet<u32> = by_value.values().flatten().copied().collect();
        if slides.len() < 2 {
            continue;
        }
        let values: Vec<&str> = by_value.keys().map(String::as_str).collect();
        findings.push(Finding {
            category: FindingCategory::Numerical,
            slide_numbers: slides.into_iter().collect(),
            description: format!(
                "Conflicting {} figures across slides: {}",
                context.label,
                values.join(" vs ")
            ),
            severity: context.severity,
        });
    }
    findings
}

/// Opposing phrases from the fixed pair table on different slides.
fn contradictory_statements(slide_text: &BTreeMap<u32, SlideText>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (first, second, topic) in CONTRADICTION_PAIRS {
        let with_first: BTreeSet<u32> = slides_containing(slide_text, first);
        let with_second: BTreeSet<u32> = slides_containing(slide_text, second);
        if with_first.is_empty() || with_second.is_empty() {
            continue;
        }
        let slides: BTreeSet<u32> = with_first.union(&with_second).copied().collect();
        if slides.len() < 2 {
            continue;
        }
        findings.push(Finding {
            category: FindingCategory::Contradiction,
            slide_numbers: slides.into_iter().collect(),
            description: format!("Contradictory {topic}: '{first}' vs '{second}'"),
            severity: Severity::High,
        });
    }
    findings
}

/// Different temporal figures attached to schedule language on different
/// slides.
fn timeline_conflicts(slide_text: &BTreeMap<u32, SlideText>) -> Vec<Finding> {
    // temporal figure -> slides stating it alongside schedule language
    let mut by_value: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    for (&slide, text) in slide_text {
        if !text.has_any(&SCHEDULE_KEYWORDS) {
            continue;
        }
        for figure in temporal_figures(&text.raw) {
            by_value.entry(figure).or_default().insert(slide);
        }
    }
    if by_value.len() < 2 {
        return Vec::new();
    }
    let slides: BTreeSet<u32> = by_value.values().flatten().copied().collect();
    if slides.len() < 2 {
        return Vec::new();
    }
    let values: Vec<&str> = by_value.keys().map(String::as_str).collect();
    vec![Finding {
        category: FindingCategory::Timeline,
        slide_numbers: slides.into_iter().collect(),
        description: format!(
            "Conflicting schedule dates across slides: {}",
            values.join(" vs ")
        ),
        severity: Severity::Medium,
    }]
}

fn slides_containing(slide_text: &BTreeMap<u32, SlideText>, phrase: &str) -> BTreeSet<u32> {
    slide_text
        .iter()
        .filter(|(_, text)| text.lower.contains(phrase))
        .map(|(&slide, _)| slide)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckaudit_ingestion::models::{ContentCategory, ContentItem};

    fn corpus_of(slides: &[(u32, &str)]) -> Corpus {
        let mut corpus = Corpus::new(slides.len() as u32);
        for (n, text) in slides {
            corpus.push_slide(vec![ContentItem::native(
                *n,
                ContentCategory::Body,
                text.to_string(),
            )]);
        }
        corpus
    }

    #[test]
    fn differing_revenue_figures_conflict() {
        let findings = rule_based_findings(&corpus_of(&[
            (1, "Revenue reached $1.2M this quarter"),
            (2, "Quarterly revenue totals $1.5M"),
        ]));
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.category, FindingCategory::Numerical);
        assert_eq!(f.slide_numbers, vec![1, 2]);
        assert_eq!(f.severity, Severity::High);
        assert!(f.description.contains("$1.2M"));
        assert!(f.description.contains("$1.5M"));
    }

    #[test]
    fn repeated_figure_is_not_a_conflict() {
        let findings = rule_based_findings(&corpus_of(&[
            (1, "Revenue reached $1.2M"),
            (2, "Revenue held at $1.2M"),
        ]));
        assert!(findings.is_empty());
    }

    #[test]
    fn figures_without_metric_context_are_ignored() {
        let findings = rule_based_findings(&corpus_of(&[
            (1, "The total came to $1.2M"),
            (2, "The total came to $1.5M"),
        ]));
        assert!(findings.is_empty());
    }

    #[test]
    fn opposing_phrases_on_different_slides_contradict() {
        let findings = rule_based_findings(&corpus_of(&[
            (1, "The market is highly competitive"),
            (4, "We face few competitors today"),
        ]));
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.category, FindingCategory::Contradiction);
        assert_eq!(f.slide_numbers, vec![1, 4]);
        assert!(f.description.contains("market competition"));
    }

    #[test]
    fn opposing_phrases_on_one_slide_do_not_fire() {
        let findings = rule_based_findings(&corpus_of(&[(
            2,
            "Once highly competitive, the space now has few competitors",
        )]));
        assert!(findings.is_empty());
    }

    #[test]
    fn schedule_language_with_differing_quarters_conflicts() {
        let findings = rule_based_findings(&corpus_of(&[
            (1, "Launch scheduled for Q2 2025"),
            (2, "Product launches in Q4 2025"),
            (3, "Team photo"),
        ]));
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.category, FindingCategory::Timeline);
        assert_eq!(f.slide_numbers, vec![1, 2]);
        assert_eq!(f.severity, Severity::Medium);
    }

    #[test]
    fn dates_without_schedule_language_do_not_fire() {
        let findings = rule_based_findings(&corpus_of(&[
            (1, "Founded in Q2 2018"),
            (2, "Series A closed Q4 2019"),
        ]));
        assert!(findings.is_empty());
    }
}
