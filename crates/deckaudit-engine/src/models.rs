//! Finding and result models shared across the engine and the report
//! layer.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Closed set of inconsistency categories, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Numerical,
    Contradiction,
    Timeline,
    Logical,
}

impl FindingCategory {
    pub const ALL: [FindingCategory; 4] = [
        FindingCategory::Numerical,
        FindingCategory::Contradiction,
        FindingCategory::Timeline,
        FindingCategory::Logical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCategory::Numerical     => "numerical",
            FindingCategory::Contradiction => "contradiction",
            FindingCategory::Timeline      => "timeline",
            FindingCategory::Logical       => "logical",
        }
    }

    /// Human-readable label for report headings.
    pub fn label(&self) -> &'static str {
        match self {
            FindingCategory::Numerical     => "Numerical Conflicts",
            FindingCategory::Contradiction => "Contradictory Statements",
            FindingCategory::Timeline      => "Timeline Inconsistencies",
            FindingCategory::Logical       => "Logical Inconsistencies",
        }
    }

    /// Lenient parse for model output: accepts the canonical names plus
    /// the longer synonyms models tend to produce.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "numerical" | "numerical_conflict" | "numerical_conflicts" | "number" => {
                Some(FindingCategory::Numerical)
            }
            "contradiction" | "contradictions" | "contradictory_statements" => {
                Some(FindingCategory::Contradiction)
            }
            "timeline" | "timeline_inconsistency" | "timeline_inconsistencies" | "temporal" => {
                Some(FindingCategory::Timeline)
            }
            "logical" | "logic" | "logical_inconsistency" | "logical_inconsistencies" => {
                Some(FindingCategory::Logical)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity, ordered low to high so `max()` picks the graver of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low    => "low",
            Severity::Medium => "medium",
            Severity::High   => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "minor" => Some(Severity::Low),
            "medium" | "moderate" => Some(Severity::Medium),
            "high" | "critical" | "severe" => Some(Severity::High),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated cross-slide inconsistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    /// At least two distinct slide numbers, sorted ascending.
    pub slide_numbers: Vec<u32>,
    pub description: String,
    pub severity: Severity,
}

impl Finding {
    /// Sort and deduplicate slide references in place.
    pub fn normalize(&mut self) {
        self.slide_numbers.sort_unstable();
        self.slide_numbers.dedup();
        self.description = self.description.trim().to_string();
    }
}

/// An inclusive run of slides the engine could not analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRange {
    pub start: u32,
    pub end: u32,
}

impl fmt::Display for SlideRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Final outcome of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub total_slides: u32,
    pub slides_analyzed: u32,
    pub findings: Vec<Finding>,
    pub unanalyzed: Vec<SlideRange>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_accepts_synonyms() {
        assert_eq!(
            FindingCategory::parse("Numerical_Conflicts"),
            Some(FindingCategory::Numerical)
        );
        assert_eq!(FindingCategory::parse("temporal"), Some(FindingCategory::Timeline));
        assert_eq!(FindingCategory::parse("nonsense"), None);
    }

    #[test]
    fn severity_orders_low_to_high() {
        assert!(Severity::High > Severity::Medium);
        assert_eq!(Severity::parse("critical"), Some(Severity::High));
        assert_eq!(Severity::Medium.max(Severity::High), Severity::High);
    }

    #[test]
    fn normalize_sorts_and_dedups_slides() {
        let mut f = Finding {
            category: FindingCategory::Numerical,
            slide_numbers: vec![5, 2, 5, 3],
            description: "  mismatch  ".to_string(),
            severity: Severity::Low,
        };
        f.normalize();
        assert_eq!(f.slide_numbers, vec![2, 3, 5]);
        assert_eq!(f.description, "mismatch");
    }

    #[test]
    fn slide_range_display() {
        assert_eq!(SlideRange { start: 4, end: 4 }.to_string(), "4");
        assert_eq!(SlideRange { start: 4, end: 7 }.to_string(), "4-7");
    }
}
