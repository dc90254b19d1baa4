//! Summarize a document to a word target and print the JSON response.
//!
//! Reads the API key from the `OPENROUTER_KEY` environment variable.
//!
//! # Examples
//!
//! ```sh
//! # Summarize a file to about 300 words
//! abridge --file report.md --target-words 300
//!
//! # Let the instruction carry the length
//! abridge --file notes.txt --instruction "Give me the gist in about 150 words"
//!
//! # Pipe content from stdin, return both Markdown and plain text
//! cat transcript.txt | abridge --stdin --format both
//!
//! # Tuned pipeline settings
//! abridge --file book.txt --config abridge.json --concurrency 5 -v
//! ```

use abridge::prelude::*;
use clap::Parser;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Summarize a document to a word target.
///
/// Reads the API key from the OPENROUTER_KEY environment variable.
#[derive(Parser)]
#[command(name = "abridge")]
struct Cli {
    // ── Input ──────────────────────────────────────────────────
    /// Text or Markdown file to summarize
    #[arg(long, conflicts_with_all = ["text", "stdin"])]
    file: Option<PathBuf>,

    /// Document text passed inline
    #[arg(long, conflicts_with = "stdin")]
    text: Option<String>,

    /// Read the document from stdin
    #[arg(long)]
    stdin: bool,

    // ── Target and output ──────────────────────────────────────
    /// Desired summary length in words (non-positive means "decide for me")
    #[arg(long, allow_negative_numbers = true)]
    target_words: Option<i64>,

    /// Output format: structured, plain or both
    #[arg(long, default_value = "structured")]
    format: String,

    /// Free-form instruction, e.g. "focus on risks, about 200 words"
    #[arg(long)]
    instruction: Option<String>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    // ── Model ──────────────────────────────────────────────────
    /// Model to use
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Fallback models, tried in order if the primary is unavailable
    #[arg(long)]
    fallback_models: Vec<String>,

    /// Transport retries per generation call
    #[arg(long, default_value_t = 2)]
    retries: u32,

    // ── Pipeline ───────────────────────────────────────────────
    /// JSON file with pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum chunk summaries in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Acceptance band around the target (0.08 = ±8%)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Helpers ────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "abridge=info",
        1 => "abridge=debug",
        _ => "abridge=trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, String> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => PipelineConfig::default(),
    };
    if let Some(concurrency) = cli.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(tolerance) = cli.tolerance {
        config = config.with_tolerance(tolerance);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn read_stdin_content() -> Result<String, String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(buf)
}

fn build_generator(cli: &Cli) -> Result<OpenRouterGenerator, String> {
    let client = OpenRouterClient::from_env().map_err(|e| e.to_string())?;
    Ok(OpenRouterGenerator::new(client, cli.model.clone())
        .with_fallback_models(cli.fallback_models.clone())
        .with_retry(RetryConfig::with_retries(cli.retries)))
}

async fn run(cli: &Cli) -> Result<String, String> {
    let config = load_config(cli)?;
    let generator = build_generator(cli)?;
    let pipeline =
        SummarizationPipeline::new(&generator, config).with_event_handler(&LoggingHandler);

    let result = if let Some(path) = &cli.file {
        let document = PlainTextExtractor::new()
            .extract(path)
            .map_err(|e| e.to_string())?;
        pipeline
            .summarize_extracted(
                &document,
                cli.target_words,
                &cli.format,
                cli.instruction.as_deref(),
            )
            .await
    } else {
        let (text, source) = match (&cli.text, cli.stdin) {
            (Some(text), _) => (text.clone(), "inline"),
            (None, true) => (read_stdin_content()?, "stdin"),
            (None, false) => return Err("provide --file, --text, or --stdin".to_string()),
        };
        let mut request = SummaryRequest::new(text)
            .with_format(cli.format.clone())
            .with_source(source);
        request.target_words = cli.target_words;
        request.instruction = cli.instruction.clone();
        pipeline.summarize_document(request).await
    };
    let response = result.map_err(|e| e.to_string())?;

    if let Some(warning) = &response.meta.output_format_warning {
        tracing::warn!("{warning}");
    }

    let json = if cli.compact {
        serde_json::to_string(&response)
    } else {
        serde_json::to_string_pretty(&response)
    };
    json.map_err(|e| format!("failed to serialize response: {e}"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
