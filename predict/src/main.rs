use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use tfidf_linear::{Classifier, Model, PatternTokenizer, DEFAULT_PRECISION};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TokenizerKind {
    /// Split on whitespace, keep case
    Whitespace,
    /// Lowercased words of two or more word characters
    Word,
}

#[derive(Parser, Debug)]
#[command(
    name = "predict",
    about = "A program to score documents with a linear n-gram model. Each line is a document."
)]
struct Args {
    /// The model file (JSON, optionally gzip or zstd compressed)
    model: PathBuf,

    /// The documents file, one document per line ("-" reads stdin)
    documents: PathBuf,

    /// Number of decimal places of the scores
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: usize,

    /// How documents are split into tokens
    #[arg(long, value_enum, default_value = "whitespace")]
    tokenizer: TokenizerKind,
}

/// Filter from `RUST_LOG` directives, or `info` when they are unset or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(log_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let args = Args::parse();

    info!(path = %args.model.display(), "Loading model file...");
    let model = Model::read_compressed(File::open(&args.model)?)?;
    info!(%model, "Model loaded");

    let mut classifier = Classifier::new(model).precision(args.precision);
    if let TokenizerKind::Word = args.tokenizer {
        classifier = classifier.tokenizer(PatternTokenizer::word_pattern());
    }

    let rdr: Box<dyn BufRead> = if args.documents.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(&args.documents)?))
    };
    let wtr = BufWriter::new(io::stdout().lock());

    info!("Start scoring");
    let start = Instant::now();
    let n_documents = classifier.score_lines(rdr, wtr)?;
    let duration = start.elapsed();
    info!(
        n_documents,
        elapsed_sec = duration.as_secs_f64(),
        docs_per_sec = n_documents as f64 / duration.as_secs_f64(),
        "Finished scoring"
    );

    Ok(())
}
