use std::env;
use std::fs;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tfidf_linear::compress::{Compression, Encoder};
use tfidf_linear::Model;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "manipulate_model",
    about = "A program to inspect and re-encode linear n-gram models."
)]
struct Args {
    /// Input path of the model file
    #[arg(long)]
    model_in: PathBuf,

    /// Output path of the model file. Compressed with gzip for `.gz` and zstd for `.zst`.
    #[arg(long)]
    model_out: Option<PathBuf>,

    /// Output the vocabulary as CSV with `term`, `index` and `idf` columns.
    #[arg(long)]
    dump_vocab: Option<PathBuf>,
}

#[derive(Serialize)]
struct VocabRecord<'a> {
    term: &'a str,
    index: usize,
    idf: f64,
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

    info!(path = %args.model_in.display(), "Loading model file...");
    let model = Model::read_compressed(fs::File::open(&args.model_in)?)?;
    println!("{}", model);

    if let Some(path) = args.dump_vocab {
        info!(path = %path.display(), "Saving vocabulary file...");
        let mut terms: Vec<_> = model.vocabulary().iter().collect();
        terms.sort_unstable_by_key(|&(_, &index)| index);
        let mut wtr = csv::Writer::from_path(path)?;
        for (term, &index) in terms {
            wtr.serialize(VocabRecord {
                term,
                index,
                idf: model.idf()[index],
            })?;
        }
        wtr.flush()?;
    }

    if let Some(path) = args.model_out {
        let compression = Compression::from_path(&path);
        info!(path = %path.display(), ?compression, "Saving model file...");
        let file = BufWriter::new(fs::File::create(path)?);
        let mut wtr = Encoder::new(file, compression)?;
        model.write(&mut wtr)?;
        wtr.finish()?;
    }

    Ok(())
}
