//! Run configuration for the deckaudit pipeline.
//!
//! One immutable `AuditConfig` is built at startup (from the parsed CLI
//! surface) and threaded through every component entry point; no component
//! reads configuration from globals.

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

/// Output representation for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Yaml,
    Markdown,
    Text,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Yaml     => "yaml",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Text     => "text",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml"     => Ok(OutputFormat::Yaml),
            "markdown" => Ok(OutputFormat::Markdown),
            "text"     => Ok(OutputFormat::Text),
            other => Err(format!("unknown output format: {other} (expected yaml|markdown|text)")),
        }
    }
}

/// Immutable configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Minimum OCR confidence (0-100) for an image-text item to be kept.
    #[serde(default = "default_ocr_confidence")]
    pub ocr_confidence_threshold: f32,
    /// Token budget per chunk, also the output-token budget per engine call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Retries per engine call on transient failure (total attempts = max_retries + 1).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First slide to analyze (1-based, inclusive).
    #[serde(default)]
    pub start_slide: Option<u32>,
    /// Last slide to analyze (1-based, inclusive).
    #[serde(default)]
    pub end_slide: Option<u32>,
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
    /// Native-text length (chars) below which a slide falls back to OCR.
    #[serde(default = "default_min_native_text_len")]
    pub min_native_text_len: usize,
    /// Worker bound for per-slide extraction.
    #[serde(default = "default_extract_concurrency")]
    pub extract_concurrency: usize,
    /// Worker bound for per-chunk engine calls.
    #[serde(default = "default_engine_concurrency")]
    pub engine_concurrency: usize,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Per-call timeout for OCR and reasoning-engine invocations.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_ocr_confidence()       -> f32   { 70.0 }
fn default_max_tokens()           -> usize { 4000 }
fn default_max_retries()          -> u32   { 3 }
fn default_output_format()        -> OutputFormat { OutputFormat::Yaml }
fn default_min_native_text_len()  -> usize { 12 }
fn default_extract_concurrency()  -> usize { 4 }
fn default_engine_concurrency()   -> usize { 2 }
fn default_retry_base_delay_ms()  -> u64   { 500 }
fn default_retry_max_delay_ms()   -> u64   { 8_000 }
fn default_request_timeout_secs() -> u64   { 30 }

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            ocr_confidence_threshold: default_ocr_confidence(),
            max_tokens:               default_max_tokens(),
            max_retries:              default_max_retries(),
            start_slide:              None,
            end_slide:                None,
            output_format:            default_output_format(),
            min_native_text_len:      default_min_native_text_len(),
            extract_concurrency:      default_extract_concurrency(),
            engine_concurrency:       default_engine_concurrency(),
            retry_base_delay_ms:      default_retry_base_delay_ms(),
            retry_max_delay_ms:       default_retry_max_delay_ms(),
            request_timeout_secs:     default_request_timeout_secs(),
        }
    }
}

impl AuditConfig {
    /// Reject option combinations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.ocr_confidence_threshold) {
            return Err(AuditError::Config(format!(
                "ocr confidence threshold must be within 0-100, got {}",
                self.ocr_confidence_threshold
            )));
        }
        if self.max_tokens == 0 {
            return Err(AuditError::Config("max tokens must be positive".to_string()));
        }
        if let (Some(start), Some(end)) = (self.start_slide, self.end_slide) {
            if start > end {
                return Err(AuditError::Config(format!(
                    "start slide {start} is after end slide {end}"
                )));
            }
        }
        if self.start_slide == Some(0) || self.end_slide == Some(0) {
            return Err(AuditError::Config("slide numbers are 1-based".to_string()));
        }
        Ok(())
    }
}

/// Environment variables checked, in order, for the reasoning-engine
/// credential.
pub const API_KEY_VARS: [&str; 2] = ["DECKAUDIT_GEMINI_API_KEY", "GEMINI_API_KEY"];

/// Read the reasoning-engine credential once at startup. A missing key is a
/// fatal configuration error, not a per-call failure.
pub fn load_api_key() -> Result<String> {
    dotenvy::dotenv().ok();
    for var in API_KEY_VARS {
        if let Ok(key) = std::env::var(var) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }
    }
    Err(AuditError::Config(format!(
        "no reasoning-engine API key found (set {})",
        API_KEY_VARS.join(" or ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AuditConfig::default();
        assert_eq!(cfg.ocr_confidence_threshold, 70.0);
        assert_eq!(cfg.max_tokens, 4000);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.output_format, OutputFormat::Yaml);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn inverted_slide_range_is_rejected() {
        let cfg = AuditConfig {
            start_slide: Some(9),
            end_slide: Some(3),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AuditError::Config(_))));
    }

    #[test]
    fn zero_slide_is_rejected() {
        let cfg = AuditConfig { start_slide: Some(0), ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
