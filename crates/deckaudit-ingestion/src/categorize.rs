//! Signal categorization for extracted text.
//!
//! Tags feed prompt construction and the condensed cross-chunk summaries;
//! they never alter a `ContentItem`'s own category. The per-kind figure
//! extractors also feed the rule-based detection pass.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What kind of claim a piece of slide text mostly carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Numerical,
    Temporal,
    Statement,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Numerical => "numerical",
            SignalKind::Temporal  => "temporal",
            SignalKind::Statement => "statement",
        }
    }
}

lazy_static! {
    // $1,234.56 / €1,000 / $1.2M
    static ref CURRENCY: Regex =
        Regex::new(r"[$€£¥₹]\s*\d{1,3}(?:,\d{3})*(?:\.\d+)?\s*[KMBkmb]?\b").unwrap();
    // 25% / 12.5 %
    static ref PERCENT: Regex = Regex::new(r"\d+(?:\.\d+)?\s*%").unwrap();
    // bare integers and decimals, thousands separators allowed
    static ref NUMBER: Regex = Regex::new(r"\b\d{1,3}(?:,\d{3})*(?:\.\d+)?\b").unwrap();
    // Q1..Q4, optionally with a year
    static ref QUARTER: Regex = Regex::new(r"\bQ[1-4](?:\s*(?:19|20)\d{2})?\b").unwrap();
    // 12/31/2024, 2024-06-01 and friends
    static ref NUMERIC_DATE: Regex = Regex::new(
        r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b|\b(?:19|20)\d{2}[/-]\d{1,2}[/-]\d{1,2}\b",
    )
    .unwrap();
    // March 3, 2024 / 3 Mar 2024 / January 2025
    static ref MONTH_DATE: Regex = Regex::new(
        r"(?i)\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2}(?:,\s*\d{4})?\b|\b\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{4}\b|(?i)\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+(?:19|20)\d{2}\b",
    )
    .unwrap();
    static ref YEAR: Regex = Regex::new(r"\b(?:19|20)\d{2}\b").unwrap();
}

/// Tag text by its dominant signal. Currency and percentage figures win
/// over dates (a "Q3 revenue was $1.5M" line is a numerical claim about a
/// period, not a timeline claim); bare years fall to temporal.
pub fn classify(text: &str) -> SignalKind {
    if CURRENCY.is_match(text) || PERCENT.is_match(text) {
        return SignalKind::Numerical;
    }
    if QUARTER.is_match(text)
        || NUMERIC_DATE.is_match(text)
        || MONTH_DATE.is_match(text)
        || YEAR.is_match(text)
    {
        return SignalKind::Temporal;
    }
    if NUMBER.is_match(text) {
        return SignalKind::Numerical;
    }
    SignalKind::Statement
}

/// Key figures (currency, percentages, quarters, dates) in order of
/// appearance, deduplicated, capped. Feeds the condensed cross-chunk
/// summaries so they stay within token limits.
pub fn extract_figures(text: &str, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let patterns: [&Regex; 4] = [&CURRENCY, &PERCENT, &QUARTER, &NUMERIC_DATE];
    for pattern in patterns {
        for m in pattern.find_iter(text) {
            let figure = m.as_str().trim().to_string();
            if !out.contains(&figure) {
                out.push(figure);
            }
            if out.len() >= cap {
                return out;
            }
        }
    }
    out
}

fn matches_of(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// All currency figures in the text, in order of appearance.
pub fn currency_figures(text: &str) -> Vec<String> {
    matches_of(&CURRENCY, text)
}

/// All percentage figures in the text, in order of appearance.
pub fn percent_figures(text: &str) -> Vec<String> {
    matches_of(&PERCENT, text)
}

/// Quarter, date, and standalone year figures, in order of appearance.
pub fn temporal_figures(text: &str) -> Vec<String> {
    let mut out = matches_of(&QUARTER, text);
    out.extend(matches_of(&NUMERIC_DATE, text));
    out.extend(matches_of(&MONTH_DATE, text));
    // Years already inside a quarter or date match are not standalone.
    for year in matches_of(&YEAR, text) {
        if !out.iter().any(|f| f.contains(&year)) {
            out.push(year);
        }
    }
    out
}

/// Bare count figures: plain numbers once currency, percentage, and
/// temporal spans are masked out.
pub fn count_figures(text: &str) -> Vec<String> {
    let mut masked = text.to_string();
    for pattern in [&*CURRENCY, &*PERCENT, &*QUARTER, &*NUMERIC_DATE, &*YEAR] {
        masked = pattern.replace_all(&masked, " ").into_owned();
    }
    matches_of(&NUMBER, &masked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_is_numerical() {
        assert_eq!(classify("Revenue: $1.2M"), SignalKind::Numerical);
        assert_eq!(classify("Budget of €1,000.50"), SignalKind::Numerical);
    }

    #[test]
    fn currency_beats_quarter() {
        assert_eq!(classify("Q3 revenue was $1.5M"), SignalKind::Numerical);
    }

    #[test]
    fn quarters_years_and_dates_are_temporal() {
        assert_eq!(classify("Launch planned for Q2 2025"), SignalKind::Temporal);
        assert_eq!(classify("Founded in 2019"), SignalKind::Temporal);
        assert_eq!(classify("Deadline 12/31/2024"), SignalKind::Temporal);
        assert_eq!(classify("Shipping March 3, 2024"), SignalKind::Temporal);
    }

    #[test]
    fn bare_counts_are_numerical() {
        assert_eq!(classify("We serve 4,500 customers"), SignalKind::Numerical);
    }

    #[test]
    fn prose_is_statement() {
        assert_eq!(classify("Our market is highly competitive"), SignalKind::Statement);
    }

    #[test]
    fn figures_are_deduplicated_and_capped() {
        let figs = extract_figures("$1.2M grew to $1.5M, then $1.2M again, up 25%", 3);
        assert_eq!(figs, vec!["$1.2M", "$1.5M", "25%"]);
    }

    #[test]
    fn per_kind_extractors_separate_figure_types() {
        let text = "Revenue of $1.2M, growth of 25%, 4,500 users since Q2 2024";
        assert_eq!(currency_figures(text), vec!["$1.2M"]);
        assert_eq!(percent_figures(text), vec!["25%"]);
        assert_eq!(temporal_figures(text), vec!["Q2 2024"]);
        assert_eq!(count_figures(text), vec!["4,500"]);
    }

    #[test]
    fn count_figures_ignore_currency_and_years() {
        assert_eq!(count_figures("Founded 2019, raised $2M, now 120 employees"),
                   vec!["120"]);
    }
}
