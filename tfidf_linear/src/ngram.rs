//! Tokenization and n-gram term extraction.

use regex::Regex;

use crate::errors::{Result, TfidfLinearError};

/// Token pattern of the common tf-idf vectorizers: words of two or more word characters.
pub const WORD_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Trait to split a document into tokens.
pub trait Tokenizer: Send + Sync {
    /// Splits the text into tokens.
    ///
    /// # Arguments
    ///
    /// * `text` - A document.
    ///
    /// # Returns
    ///
    /// Tokens in the order they appear in `text`.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Splits on Unicode whitespace without case folding.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Takes every match of a regular expression as a token.
#[derive(Clone, Debug)]
pub struct PatternTokenizer {
    pattern: Regex,
    lowercase: bool,
}

impl PatternTokenizer {
    /// Creates a new tokenizer.
    ///
    /// # Arguments
    ///
    /// * `pattern` - Regular expression matching a single token.
    /// * `lowercase` - Lowercases the text before matching.
    ///
    /// # Errors
    ///
    /// [`TfidfLinearError::InvalidArgument`] will be returned if `pattern` is not a valid
    /// regular expression.
    pub fn new(pattern: &str, lowercase: bool) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| TfidfLinearError::invalid_argument("pattern", e.to_string()))?;
        Ok(Self { pattern, lowercase })
    }

    /// Lowercasing tokenizer using [`WORD_PATTERN`].
    pub fn word_pattern() -> Self {
        Self {
            pattern: Regex::new(WORD_PATTERN).unwrap(),
            lowercase: true,
        }
    }
}

impl Tokenizer for PatternTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        if self.lowercase {
            let text = text.to_lowercase();
            self.pattern
                .find_iter(&text)
                .map(|m| m.as_str().to_string())
                .collect()
        } else {
            self.pattern
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect()
        }
    }
}

/// Extracts n-gram terms from a token sequence.
///
/// For each order `n` in `orders`, every contiguous window of `n` tokens is joined with a single
/// space. Orders longer than the token sequence produce nothing.
///
/// # Arguments
///
/// * `orders` - N-gram lengths. Each must be positive.
/// * `tokens` - Tokens of a document.
///
/// # Returns
///
/// Terms, grouped by order and in document order within each group.
pub fn extract_ngram_terms<S>(orders: &[usize], tokens: &[S]) -> Vec<String>
where
    S: AsRef<str>,
{
    let mut terms = vec![];
    for &n in orders {
        if n == 0 || n > tokens.len() {
            continue;
        }
        for window in tokens.windows(n) {
            let mut term = String::from(window[0].as_ref());
            for token in &window[1..] {
                term.push(' ');
                term.push_str(token.as_ref());
            }
            terms.push(term);
        }
    }
    terms
}
