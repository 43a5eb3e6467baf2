use std::env;
use std::fs::File;
use std::io::{self, prelude::*, stdin};
use std::path::PathBuf;

use clap::Parser;
use tfidf_linear::evaluation::{parse_labeled_line, ConfusionMatrix};
use tfidf_linear::{Classifier, Model, PatternTokenizer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "evaluate",
    about = "A program to evaluate the accuracy of a linear n-gram model. \
             Reads `<label>\\t<document>` lines from stdin."
)]
struct Args {
    /// The model file (JSON, optionally gzip or zstd compressed)
    #[arg(long)]
    model: PathBuf,

    /// Tokenize documents into lowercased words of two or more word characters instead of
    /// splitting on whitespace.
    #[arg(long)]
    word_tokens: bool,
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

    let n_classes = model.class_count();
    let mut classifier = Classifier::new(model);
    if args.word_tokens {
        classifier = classifier.tokenizer(PatternTokenizer::word_pattern());
    }

    info!("Start evaluation");
    let mut matrix = ConfusionMatrix::new(n_classes);
    for line in stdin().lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (gold, document) = parse_labeled_line(&line)?;
        let (predicted, _) = classifier.score_document(document);
        matrix.add(gold, predicted)?;
    }
    if matrix.total() == 0 {
        warn!("No labeled documents in the input");
        return Ok(());
    }

    println!("Documents: {}", matrix.total());
    println!("Accuracy: {}", matrix.accuracy());
    for class in 0..n_classes {
        println!(
            "Class {}: Precision: {}, Recall: {}, F1: {}",
            class,
            matrix.precision(class),
            matrix.recall(class),
            matrix.f1(class),
        );
    }
    println!("Confusion (rows: gold, columns: predicted):");
    for gold in 0..n_classes {
        let row: Vec<_> = (0..n_classes)
            .map(|predicted| matrix.count(gold, predicted).to_string())
            .collect();
        println!("{}", row.join("\t"));
    }

    Ok(())
}
