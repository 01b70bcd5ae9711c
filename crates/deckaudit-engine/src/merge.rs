//! Finding deduplication and stable ordering.
//!
//! The rule-based, per-chunk, and cross-chunk passes can report the same
//! inconsistency more than once. Two findings are duplicates when they
//! share a category and slide set and either their descriptions say
//! substantially the same thing or they cite the same key figures; the
//! surviving copy keeps the graver severity and the richer description.

use std::collections::BTreeSet;

use strsim::sorensen_dice;
use tracing::debug;

use deckaudit_ingestion::categorize::extract_figures;

use crate::models::Finding;

/// Sørensen–Dice similarity above which two descriptions of the same
/// category and slide set count as the same finding.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

const FIGURE_CAP: usize = 8;

fn figure_set(description: &str) -> BTreeSet<String> {
    extract_figures(description, FIGURE_CAP)
        .into_iter()
        .map(|f| f.to_lowercase())
        .collect()
}

fn is_duplicate(a: &Finding, b: &Finding) -> bool {
    if a.category != b.category || a.slide_numbers != b.slide_numbers {
        return false;
    }
    if sorensen_dice(&a.description.to_lowercase(), &b.description.to_lowercase())
        >= SIMILARITY_THRESHOLD
    {
        return true;
    }
    // Differently phrased descriptions of the same figures on the same
    // slides are the same inconsistency.
    let figures = figure_set(&a.description);
    !figures.is_empty() && figures == figure_set(&b.description)
}

/// Fold `b` into `a`: graver severity wins, the longer description wins.
fn absorb(a: &mut Finding, b: Finding) {
    if b.severity > a.severity {
        a.severity = b.severity;
    }
    if b.description.len() > a.description.len() {
        a.description = b.description;
    }
}

/// Deduplicate findings from all passes and order them deterministically
/// by (category, slide numbers, description).
pub fn merge_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let before = findings.len();
    let mut merged: Vec<Finding> = Vec::with_capacity(findings.len());

    for mut finding in findings {
        finding.normalize();
        match merged.iter_mut().find(|m| is_duplicate(m, &finding)) {
            Some(existing) => absorb(existing, finding),
            None => merged.push(finding),
        }
    }

    merged.sort_by(|a, b| {
        (a.category, &a.slide_numbers, &a.description)
            .cmp(&(b.category, &b.slide_numbers, &b.description))
    });
    if merged.len() < before {
        debug!(before, after = merged.len(), "deduplicated findings");
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FindingCategory, Severity};

    fn finding(
        category: FindingCategory,
        slides: &[u32],
        description: &str,
        severity: Severity,
    ) -> Finding {
        Finding {
            category,
            slide_numbers: slides.to_vec(),
            description: description.to_string(),
            severity,
        }
    }

    #[test]
    fn near_identical_descriptions_merge_keeping_graver_severity() {
        let merged = merge_findings(vec![
            finding(
                FindingCategory::Numerical,
                &[2, 5],
                "Revenue figure differs between slides",
                Severity::Medium,
            ),
            finding(
                FindingCategory::Numerical,
                &[5, 2],
                "Revenue figures differ between the slides",
                Severity::High,
            ),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::High);
        assert_eq!(merged[0].slide_numbers, vec![2, 5]);
    }

    #[test]
    fn different_slide_sets_never_merge() {
        let merged = merge_findings(vec![
            finding(FindingCategory::Numerical, &[2, 5], "Revenue differs", Severity::Low),
            finding(FindingCategory::Numerical, &[2, 7], "Revenue differs", Severity::Low),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn different_categories_never_merge() {
        let merged = merge_findings(vec![
            finding(FindingCategory::Numerical, &[1, 2], "Figures disagree", Severity::Low),
            finding(FindingCategory::Logical, &[1, 2], "Figures disagree", Severity::Low),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn unrelated_descriptions_survive() {
        let merged = merge_findings(vec![
            finding(
                FindingCategory::Timeline,
                &[3, 8],
                "Launch date moves from Q2 to Q4",
                Severity::Medium,
            ),
            finding(
                FindingCategory::Timeline,
                &[3, 8],
                "Funding round year is inconsistent",
                Severity::Medium,
            ),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn same_figures_merge_despite_different_phrasing() {
        let merged = merge_findings(vec![
            finding(
                FindingCategory::Numerical,
                &[1, 2],
                "Conflicting revenue figures across slides: $1.2M vs $1.5M",
                Severity::High,
            ),
            finding(
                FindingCategory::Numerical,
                &[1, 2],
                "Slide 1 states $1.2M while slide 2 reports $1.5M for the quarter",
                Severity::Medium,
            ),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::High);
    }

    #[test]
    fn figureless_descriptions_fall_back_to_similarity_only() {
        let merged = merge_findings(vec![
            finding(FindingCategory::Logical, &[3, 4], "Strategy reverses", Severity::Low),
            finding(
                FindingCategory::Logical,
                &[3, 4],
                "The claimed market position is impossible",
                Severity::Low,
            ),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn output_order_is_deterministic() {
        let a = finding(FindingCategory::Logical, &[4, 6], "b", Severity::Low);
        let b = finding(FindingCategory::Numerical, &[1, 2], "a", Severity::Low);
        let merged1 = merge_findings(vec![a.clone(), b.clone()]);
        let merged2 = merge_findings(vec![b, a]);
        assert_eq!(merged1, merged2);
        assert_eq!(merged1[0].category, FindingCategory::Numerical);
    }
}
