//! Adaptive long-document summarization with explicit word-count targets.
//!
//! `abridge` turns an arbitrarily long document into a summary that lands on
//! an explicit or inferred word target, without truncation. The core is the
//! [`SummarizationPipeline`](pipeline::SummarizationPipeline):
//!
//! 1. [`TargetResolver`](pipeline::target) decides the word target from the
//!    caller's parameter, a length request embedded in free-form instructions,
//!    or the document size.
//! 2. Small documents go straight to the
//!    [`LengthEnforcer`](pipeline::enforce::LengthEnforcer).
//! 3. Large documents are split by the [`ChunkPlanner`](pipeline::chunking),
//!    compressed chunk-by-chunk with bounded concurrency by the
//!    [`ChunkSummarizer`](pipeline::fanout::ChunkSummarizer), reassembled in
//!    chunk order by the [`Merger`](pipeline::merge), and driven to the final
//!    target by the length enforcer.
//! 4. The [`OutputFormatter`](format) renders Markdown, plain text, or both.
//!
//! Text generation is an external collaborator behind the
//! [`Generator`](api::Generator) trait. [`OpenRouterClient`] plus
//! [`OpenRouterGenerator`](api::OpenRouterGenerator) is the bundled backend;
//! tests plug in scripted generators.
//!
//! # Getting started
//!
//! ```ignore
//! use abridge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_key = std::env::var("OPENROUTER_KEY")?;
//!     let client = OpenRouterClient::new(api_key)?;
//!     let generator = OpenRouterGenerator::new(client, DEFAULT_MODEL);
//!
//!     let pipeline = SummarizationPipeline::new(&generator, PipelineConfig::default())
//!         .with_event_handler(&LoggingHandler);
//!
//!     let request = SummaryRequest::new(std::fs::read_to_string("report.txt")?)
//!         .with_target_words(300)
//!         .with_format("both");
//!     let response = pipeline.summarize_document(request).await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pipeline`] | Target resolution, chunk planning, fan-out, merge, length enforcement, events, config |
//! | [`text`] | Word counting, token estimates, preprocessing, truncation heuristics |
//! | [`format`] | Markdown → plain conversion and response assembly |
//! | [`api`] | [`Generator`](api::Generator) contract, OpenRouter client and adapter, transport retry |
//! | [`ingest`] | Document extraction contract and a plain-text file extractor |
//! | [`error`] | Error taxonomy |

pub mod api;
pub mod error;
pub mod format;
pub mod ingest;
pub mod pipeline;
pub mod prelude;
pub mod text;

pub use api::{DEFAULT_MODEL, OpenRouterClient};
pub use error::{ConfigError, GenerationError, IngestError, SummarizeError};
