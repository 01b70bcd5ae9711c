//! OCR collaborator seam and the bundled Tesseract CLI adapter.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::blocks::SlideImage;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR process failed: {0}")]
    Process(String),
    #[error("OCR output unreadable: {0}")]
    Output(String),
    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text plus mean word confidence (0-100) for one image.
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
}

/// Optical-character-recognition collaborator: text plus a confidence score
/// for a rendered slide image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &SlideImage) -> Result<OcrResult, OcrError>;
}

/// Adapter over the `tesseract` binary. Feeds the image over stdin, reads
/// TSV output, and averages per-word confidences the way tesseract's own
/// word-level data reports them.
pub struct TesseractCli {
    pub binary: String,
    pub timeout: Duration,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self { binary: "tesseract".to_string(), timeout: Duration::from_secs(30) }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image: &SlideImage) -> Result<OcrResult, OcrError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| OcrError::Process(format!("failed to spawn {}: {e}", self.binary)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Process("child stdin unavailable".to_string()))?;
        stdin.write_all(&image.data).await?;
        drop(stdin);

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| OcrError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Process(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let result = parse_tsv(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            image = %image.name,
            confidence = result.confidence,
            chars = result.text.len(),
            "OCR complete"
        );
        Ok(result)
    }
}

/// Parse tesseract TSV word data: keep words with a real confidence value
/// (layout rows carry -1) and average their confidences.
fn parse_tsv(tsv: &str) -> Result<OcrResult, OcrError> {
    let mut words: Vec<&str> = Vec::new();
    let mut confidence_sum = 0.0f32;

    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let conf: f32 = cols[10]
            .parse()
            .map_err(|_| OcrError::Output(format!("bad confidence column: {}", cols[10])))?;
        let text = cols[11].trim();
        if conf >= 0.0 && !text.is_empty() {
            words.push(text);
            confidence_sum += conf;
        }
    }

    if words.is_empty() {
        return Ok(OcrResult { text: String::new(), confidence: 0.0 });
    }
    let confidence = confidence_sum / words.len() as f32;
    Ok(OcrResult { text: words.join(" "), confidence })
}
