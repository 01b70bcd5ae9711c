//! deckaudit: detect cross-slide inconsistencies in a presentation deck.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use deckaudit_cli::{deck_json::JsonDeckReader, pipeline};
use deckaudit_common::config::{load_api_key, AuditConfig, OutputFormat};
use deckaudit_engine::backend::GeminiBackend;
use deckaudit_ingestion::blocks::DeckReader;
use deckaudit_ingestion::ocr::TesseractCli;
use deckaudit_report::{render, render_error};

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const MODEL_VAR: &str = "DECKAUDIT_GEMINI_MODEL";

/// Audit a presentation deck for cross-slide inconsistencies.
#[derive(Debug, Parser)]
#[command(name = "deckaudit", version, about)]
struct Args {
    /// Deck to audit (JSON interchange format).
    deck: PathBuf,

    /// Report format: yaml, markdown, or text.
    #[arg(long, default_value = "yaml")]
    output_format: String,

    /// Minimum OCR confidence (0-100) for image text to be kept.
    #[arg(long, default_value_t = 70.0)]
    ocr_confidence: f32,

    /// First slide to analyze (1-based, inclusive).
    #[arg(long)]
    start_slide: Option<u32>,

    /// Last slide to analyze (1-based, inclusive).
    #[arg(long)]
    end_slide: Option<u32>,

    /// Approximate token budget per analysis chunk.
    #[arg(long, default_value_t = 4000)]
    max_tokens: usize,

    /// Retries per engine call on transient failure.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Verbose diagnostics on stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(PathBuf, AuditConfig)> {
        let output_format: OutputFormat = self
            .output_format
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        let cfg = AuditConfig {
            ocr_confidence_threshold: self.ocr_confidence,
            max_tokens: self.max_tokens,
            max_retries: self.max_retries,
            start_slide: self.start_slide,
            end_slide: self.end_slide,
            output_format,
            ..AuditConfig::default()
        };
        cfg.validate()?;
        Ok((self.deck, cfg))
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,deckaudit_cli=debug,deckaudit_ingestion=debug,deckaudit_engine=debug,deckaudit_report=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let (deck_path, cfg) = match args.into_config() {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("deckaudit: {e}");
            return ExitCode::from(1);
        }
    };

    let format = cfg.output_format;
    match run(deck_path, cfg).await {
        Ok(RunOutcome { report, cancelled }) => {
            print!("{report}");
            if cancelled {
                ExitCode::from(130)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!(error = %e, "audit failed");
            print!("{}", render_error(&format!("{e:#}"), format));
            ExitCode::from(1)
        }
    }
}

struct RunOutcome {
    report: String,
    cancelled: bool,
}

async fn run(deck_path: PathBuf, cfg: AuditConfig) -> anyhow::Result<RunOutcome> {
    let api_key = load_api_key().context("reasoning engine credential")?;
    let model = std::env::var(MODEL_VAR).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

    let deck = JsonDeckReader
        .read_deck(&deck_path)
        .with_context(|| format!("loading {}", deck_path.display()))?;

    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    let backend = Arc::new(GeminiBackend::new(api_key, model, timeout)?);
    let ocr = Arc::new(TesseractCli { timeout, ..TesseractCli::default() });

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_on_signal = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight work");
            cancel_on_signal.store(true, Ordering::SeqCst);
        }
    });

    let result = pipeline::run(&deck, ocr, backend, &cfg, Arc::clone(&cancel)).await;
    Ok(RunOutcome {
        report: render(&result, cfg.output_format),
        cancelled: cancel.load(Ordering::SeqCst),
    })
}
