//! Command-line front end
//!
//! Run with: cargo run -p pdf-rag -- --docs ./papers --question "What is the main result?"

use anyhow::Context;
use clap::Parser;
use pdf_rag::{Answer, RagConfig, Session};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pdf-rag", version, about = "Ask questions about a folder of PDFs")]
struct Cli {
    /// Directory searched recursively for PDF files
    #[arg(short, long)]
    docs: PathBuf,

    /// Question to answer; repeat for several. Reads stdin when omitted
    #[arg(short, long = "question")]
    questions: Vec<String>,

    /// Config file (TOML); defaults to the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of chunks retrieved per question
    #[arg(long)]
    top_k: Option<usize>,

    /// Generation model identifier
    #[arg(long)]
    model: Option<String>,
}

fn load_config(cli: &Cli) -> anyhow::Result<RagConfig> {
    let config = match &cli.config {
        Some(path) => RagConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => RagConfig::load_or_default()?,
    };
    let mut config = config.with_env_overrides()?;

    if let Some(top_k) = cli.top_k {
        config.retrieval.top_k = top_k;
    }
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.text.trim());
    if answer.is_grounded() {
        println!("Sources:");
        for (i, citation) in answer.citations.iter().enumerate() {
            println!(
                "  [{}] {} (similarity {:.3})",
                i + 1,
                citation.format_inline(),
                citation.similarity_score
            );
        }
    }
}

async fn answer_one(session: &Session, question: &str) {
    match session.ask(question).await {
        Ok(answer) => print_answer(&answer),
        Err(e) => eprintln!("Failed to answer \"{}\": {}", question, e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embeddings: {:?} {}", config.embeddings.backend, config.embeddings.model);
    tracing::info!("  - LLM: {:?} {}", config.llm.backend, config.llm.model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let mut session = Session::from_config(config)?;

    if !session.embedder().health_check().await.unwrap_or(false) {
        tracing::warn!("Embedding backend '{}' is not reachable", session.embedder().name());
    }
    if !session.language_model().health_check().await.unwrap_or(false) {
        tracing::warn!("Language model backend '{}' is not reachable", session.language_model().name());
    }

    let report = session
        .ingest_directory(&cli.docs)
        .await
        .with_context(|| format!("ingesting {}", cli.docs.display()))?;

    for warning in &report.warnings {
        eprintln!("{}", warning);
    }
    println!(
        "Indexed {} chunks from {} documents ({} pages)",
        report.chunks, report.documents, report.pages
    );

    if !cli.questions.is_empty() {
        for question in &cli.questions {
            println!("\nQ: {}", question);
            answer_one(&session, question).await;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }
        answer_one(&session, question).await;
    }

    Ok(())
}
