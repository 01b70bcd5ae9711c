//! Serializable view of an analysis result, shared by all output formats.

use std::time::Duration;

use serde::Serialize;

use deckaudit_engine::models::{AnalysisResult, FindingCategory, Severity};

#[derive(Debug, Serialize)]
pub struct ReportView {
    pub summary: SummaryView,
    /// Categories in fixed order; empty categories omitted.
    pub inconsistencies: Vec<CategoryView>,
}

#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub total_slides: u32,
    pub slides_analyzed: u32,
    pub inconsistencies_found: usize,
    pub analysis_time: String,
    pub severity_breakdown: SeverityBreakdown,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category_breakdown: Vec<CategoryCount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unanalyzed_slides: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SeverityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub category: String,
    pub findings: Vec<FindingView>,
}

#[derive(Debug, Serialize)]
pub struct FindingView {
    pub slides: Vec<u32>,
    pub description: String,
    pub severity: String,
}

impl ReportView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let count_severity =
            |s: Severity| result.findings.iter().filter(|f| f.severity == s).count();

        let mut inconsistencies = Vec::new();
        for category in FindingCategory::ALL {
            let findings: Vec<FindingView> = result
                .findings
                .iter()
                .filter(|f| f.category == category)
                .map(|f| FindingView {
                    slides: f.slide_numbers.clone(),
                    description: f.description.clone(),
                    severity: f.severity.as_str().to_string(),
                })
                .collect();
            if !findings.is_empty() {
                inconsistencies.push(CategoryView {
                    category: category.label().to_string(),
                    findings,
                });
            }
        }

        ReportView {
            summary: SummaryView {
                total_slides: result.total_slides,
                slides_analyzed: result.slides_analyzed,
                inconsistencies_found: result.findings.len(),
                analysis_time: format_duration(result.elapsed),
                severity_breakdown: SeverityBreakdown {
                    high: count_severity(Severity::High),
                    medium: count_severity(Severity::Medium),
                    low: count_severity(Severity::Low),
                },
                category_breakdown: inconsistencies
                    .iter()
                    .map(|c| CategoryCount {
                        category: c.category.clone(),
                        count: c.findings.len(),
                    })
                    .collect(),
                unanalyzed_slides: result.unanalyzed.iter().map(|r| r.to_string()).collect(),
            },
            inconsistencies,
        }
    }
}

/// Human-readable elapsed time: sub-minute runs keep one decimal, longer
/// runs round to whole seconds.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        format!("{}m {}s", (secs / 60.0) as u64, secs as u64 % 60)
    } else {
        format!("{}h {}m", (secs / 3600.0) as u64, (secs as u64 % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckaudit_engine::models::{Finding, SlideRange};

    fn result_with(findings: Vec<Finding>, unanalyzed: Vec<SlideRange>) -> AnalysisResult {
        AnalysisResult {
            total_slides: 10,
            slides_analyzed: 8,
            findings,
            unanalyzed,
            elapsed: Duration::from_millis(12_340),
        }
    }

    fn finding(category: FindingCategory, severity: Severity) -> Finding {
        Finding {
            category,
            slide_numbers: vec![2, 5],
            description: "mismatch".to_string(),
            severity,
        }
    }

    #[test]
    fn empty_categories_are_omitted_and_order_is_fixed() {
        let view = ReportView::from_result(&result_with(
            vec![
                finding(FindingCategory::Logical, Severity::Low),
                finding(FindingCategory::Numerical, Severity::High),
            ],
            vec![],
        ));
        let categories: Vec<&str> =
            view.inconsistencies.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(categories, vec!["Numerical Conflicts", "Logical Inconsistencies"]);
        assert_eq!(view.summary.severity_breakdown.high, 1);
        assert_eq!(view.summary.severity_breakdown.low, 1);
        assert_eq!(view.summary.category_breakdown.len(), 2);
        assert_eq!(view.summary.category_breakdown[0].category, "Numerical Conflicts");
        assert_eq!(view.summary.category_breakdown[0].count, 1);
        assert!(view.summary.unanalyzed_slides.is_empty());
    }

    #[test]
    fn unanalyzed_ranges_render_as_strings() {
        let view = ReportView::from_result(&result_with(
            vec![],
            vec![SlideRange { start: 4, end: 7 }, SlideRange { start: 9, end: 9 }],
        ));
        assert_eq!(view.summary.unanalyzed_slides, vec!["4-7", "9"]);
    }

    #[test]
    fn durations_format_by_magnitude() {
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3700)), "1h 1m");
    }
}
