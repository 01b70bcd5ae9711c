//! Response recovery and finding validation.
//!
//! Models answer the JSON contract most of the time, but not always:
//! fenced blocks, leading prose, and trailing commentary all show up. The
//! recovery ladder tries progressively harder before declaring a response
//! malformed, and validation drops individual findings rather than failing
//! the whole call.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::EngineError;
use crate::models::{Finding, FindingCategory, Severity};

/// A finding as the model wrote it, before validation.
#[derive(Debug, Deserialize)]
pub struct RawFinding {
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "slide_numbers", alias = "slide_nums")]
    pub slides: Vec<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    findings: Vec<RawFinding>,
}

lazy_static! {
    static ref FENCED: Regex = Regex::new(r"```(?:json)?\s*([\s\S]*?)```").unwrap();
}

/// Recover the findings payload from a model response: direct parse, then
/// fenced-block extraction, then a brace-balanced scan for the first JSON
/// object in the text.
pub fn recover_json(response: &str) -> Result<Vec<RawFinding>, EngineError> {
    let trimmed = response.trim();

    if let Ok(parsed) = serde_json::from_str::<RawResponse>(trimmed) {
        return Ok(parsed.findings);
    }

    if let Some(caps) = FENCED.captures(trimmed) {
        if let Ok(parsed) = serde_json::from_str::<RawResponse>(caps[1].trim()) {
            debug!("recovered findings from fenced block");
            return Ok(parsed.findings);
        }
    }

    if let Some(candidate) = first_balanced_object(trimmed) {
        if let Ok(parsed) = serde_json::from_str::<RawResponse>(candidate) {
            debug!("recovered findings by brace scan");
            return Ok(parsed.findings);
        }
    }

    Err(EngineError::Malformed(format!(
        "no findings object recoverable from {} chars",
        trimmed.len()
    )))
}

/// First brace-balanced `{...}` span, tracking string literals and escapes
/// so braces inside descriptions do not end the scan early.
fn first_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Validate raw findings against the slides that actually carried content.
/// Invalid findings are dropped with a warning; the valid remainder is
/// returned normalized.
pub fn validate_findings(
    raw: Vec<RawFinding>,
    content_slides: &BTreeSet<u32>,
) -> Vec<Finding> {
    let mut findings = Vec::with_capacity(raw.len());
    for rf in raw {
        let Some(category) = FindingCategory::parse(&rf.category) else {
            warn!(category = %rf.category, "dropping finding with unknown category");
            continue;
        };
        let Some(severity) = Severity::parse(&rf.severity) else {
            warn!(severity = %rf.severity, "dropping finding with unknown severity");
            continue;
        };
        let mut finding = Finding {
            category,
            slide_numbers: rf.slides,
            description: rf.description,
            severity,
        };
        finding.normalize();

        if finding.description.is_empty() {
            warn!("dropping finding with empty description");
            continue;
        }
        if finding.slide_numbers.len() < 2 {
            warn!(
                slides = ?finding.slide_numbers,
                "dropping finding referencing fewer than two slides"
            );
            continue;
        }
        if let Some(bad) = finding
            .slide_numbers
            .iter()
            .find(|n| !content_slides.contains(n))
        {
            warn!(slide = bad, "dropping finding referencing a slide with no content");
            continue;
        }
        findings.push(finding);
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slides(ns: &[u32]) -> BTreeSet<u32> {
        ns.iter().copied().collect()
    }

    const CLEAN: &str = r#"{"findings":[{"category":"numerical","slides":[2,5],"description":"Revenue differs","severity":"high"}]}"#;

    #[test]
    fn direct_json_parses() {
        let raw = recover_json(CLEAN).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].slides, vec![2, 5]);
    }

    #[test]
    fn fenced_block_is_recovered() {
        let response = format!("Here is the analysis:\n```json\n{CLEAN}\n```\nDone.");
        let raw = recover_json(&response).unwrap();
        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn embedded_object_is_recovered_by_brace_scan() {
        let response = format!("The result is {CLEAN} as requested.");
        let raw = recover_json(&response).unwrap();
        assert_eq!(raw[0].category, "numerical");
    }

    #[test]
    fn braces_inside_strings_do_not_break_the_scan() {
        let response = r#"note {"findings":[{"category":"logical","slides":[1,2],"description":"uses {weird} text","severity":"low"}]} end"#;
        let raw = recover_json(response).unwrap();
        assert_eq!(raw[0].description, "uses {weird} text");
    }

    #[test]
    fn prose_only_response_is_malformed() {
        assert!(matches!(
            recover_json("I found no issues in this deck."),
            Err(EngineError::Malformed(_))
        ));
    }

    #[test]
    fn slide_numbers_alias_is_accepted() {
        let response = r#"{"findings":[{"category":"timeline","slide_numbers":[3,4],"description":"Dates disagree","severity":"medium"}]}"#;
        let raw = recover_json(response).unwrap();
        assert_eq!(raw[0].slides, vec![3, 4]);
    }

    #[test]
    fn validation_drops_single_slide_and_unknown_slide_findings() {
        let raw = vec![
            RawFinding {
                category: "numerical".to_string(),
                slides: vec![2, 2],
                description: "self-referential".to_string(),
                severity: "low".to_string(),
            },
            RawFinding {
                category: "numerical".to_string(),
                slides: vec![2, 9],
                description: "references missing slide".to_string(),
                severity: "low".to_string(),
            },
            RawFinding {
                category: "contradiction".to_string(),
                slides: vec![5, 2],
                description: "valid".to_string(),
                severity: "high".to_string(),
            },
        ];
        let valid = validate_findings(raw, &slides(&[2, 5]));
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].slide_numbers, vec![2, 5]);
        assert_eq!(valid[0].severity, Severity::High);
    }

    #[test]
    fn unknown_category_is_dropped_not_fatal() {
        let raw = vec![RawFinding {
            category: "stylistic".to_string(),
            slides: vec![1, 2],
            description: "font mismatch".to_string(),
            severity: "low".to_string(),
        }];
        assert!(validate_findings(raw, &slides(&[1, 2])).is_empty());
    }
}
