//! # tfidf_linear
//!
//! Scores free-text documents with a multi-class linear model over n-gram tf-idf features.
//!
//! ## Examples
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{prelude::*, stdin};
//!
//! use tfidf_linear::{Classifier, Model};
//!
//! let model = Model::read_compressed(File::open("model.json.gz").unwrap()).unwrap();
//! let classifier = Classifier::new(model);
//!
//! for line in stdin().lock().lines() {
//!     let line = line.unwrap();
//!     let (predicted, scores) = classifier.score_document(&line);
//!     println!("{} {:?}", predicted, scores);
//! }
//! ```

mod classifier;
mod model;

pub mod compress;
pub mod errors;
pub mod evaluation;
pub mod ngram;
pub mod tfidf;

pub use classifier::{format_score_line, largest, score_document, Classifier, DEFAULT_PRECISION};
pub use model::Model;
pub use ngram::{PatternTokenizer, Tokenizer, WhitespaceTokenizer};
