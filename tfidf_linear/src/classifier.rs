use std::io::{BufRead, Write};

use crate::errors::Result;
use crate::model::Model;
use crate::ngram::{Tokenizer, WhitespaceTokenizer};

/// Number of decimal places of formatted scores.
pub const DEFAULT_PRECISION: usize = 4;

/// Returns the index of the largest score.
///
/// Ties go to the lowest index. Returns 0 for an empty slice.
pub fn largest(scores: &[f64]) -> usize {
    let mut max_index = 0;
    let mut max: Option<f64> = None;
    for (i, &score) in scores.iter().enumerate() {
        let is_larger = match max {
            Some(m) => score > m,
            None => true,
        };
        if is_larger {
            max_index = i;
            max = Some(score);
        }
    }
    max_index
}

/// Scores a document and picks the predicted class.
///
/// # Arguments
///
/// * `model` - A model.
/// * `document` - A document, split on whitespace.
///
/// # Returns
///
/// The predicted class index and the score of every class.
pub fn score_document(model: &Model, document: &str) -> (usize, Vec<f64>) {
    let scores = model.class_log_likelihoods(document);
    (largest(&scores), scores)
}

/// Formats a number with `precision` decimal places, rounding ties away from zero.
fn format_half_up(x: f64, precision: usize) -> String {
    if x.is_finite() && x != 0.0 {
        // A tie needs at most `precision + 1` fractional binary digits.
        let scale = 2f64.powi(i32::try_from(precision + 1).unwrap_or(i32::MAX));
        if (x * scale).fract() == 0.0 && format!("{:.*}", precision + 1, x).ends_with('5') {
            let away = f64::from_bits(x.to_bits() + 1);
            return format!("{:.*}", precision, away);
        }
    }
    format!("{:.*}", precision, x)
}

/// Formats a prediction as a single line without a line terminator.
///
/// The line has three tab-separated columns: the predicted class index, the space-separated
/// scores with `precision` decimal places, and the document.
pub fn format_score_line(
    predicted: usize,
    scores: &[f64],
    document: &str,
    precision: usize,
) -> String {
    let mut line = predicted.to_string();
    line.push('\t');
    for (i, score) in scores.iter().enumerate() {
        if i != 0 {
            line.push(' ');
        }
        line.push_str(&format_half_up(*score, precision));
    }
    line.push('\t');
    line.push_str(document);
    line
}

/// Classifier.
pub struct Classifier {
    model: Model,
    tokenizer: Box<dyn Tokenizer>,
    precision: usize,
}

impl Classifier {
    /// Creates a new classifier.
    ///
    /// Documents are split on whitespace and scores are formatted with [`DEFAULT_PRECISION`]
    /// decimal places unless configured otherwise.
    ///
    /// # Arguments
    ///
    /// * `model` - A model.
    pub fn new(model: Model) -> Self {
        Self {
            model,
            tokenizer: Box::new(WhitespaceTokenizer),
            precision: DEFAULT_PRECISION,
        }
    }

    /// Sets the tokenizer applied to documents.
    pub fn tokenizer<T>(mut self, tokenizer: T) -> Self
    where
        T: Tokenizer + 'static,
    {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// Sets the number of decimal places of formatted scores.
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Returns the model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Scores a document and picks the predicted class.
    ///
    /// # Returns
    ///
    /// The predicted class index and the score of every class.
    pub fn score_document(&self, document: &str) -> (usize, Vec<f64>) {
        let scores = self
            .model
            .class_log_likelihoods_with(self.tokenizer.as_ref(), document);
        (largest(&scores), scores)
    }

    /// Scores a document and formats the result as a line.
    pub fn format_score_line(&self, document: &str) -> String {
        let (predicted, scores) = self.score_document(document);
        format_score_line(predicted, &scores, document, self.precision)
    }

    /// Scores every line of a reader as a separate document.
    ///
    /// One formatted line is written for each input line, in input order. Empty lines are
    /// scored too. Bytes that are not valid UTF-8 are replaced with U+FFFD.
    ///
    /// # Arguments
    ///
    /// * `rdr` - Source of documents, one per line.
    /// * `wtr` - Sink of formatted results.
    ///
    /// # Returns
    ///
    /// The number of documents scored.
    ///
    /// # Errors
    ///
    /// When `rdr` or `wtr` generates an error, it will be returned as is. Lines written before
    /// the error have already been flushed.
    pub fn score_lines<R, W>(&self, mut rdr: R, mut wtr: W) -> Result<usize>
    where
        R: BufRead,
        W: Write,
    {
        let mut n_documents = 0;
        let mut buf = vec![];
        loop {
            buf.clear();
            match rdr.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => (),
                Err(e) => {
                    wtr.flush()?;
                    return Err(e.into());
                }
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(&buf);
            writeln!(wtr, "{}", self.format_score_line(&line))?;
            n_documents += 1;
        }
        wtr.flush()?;
        Ok(n_documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hashbrown::HashMap;

    use crate::ngram::PatternTokenizer;

    fn ab_model(biases: Vec<f64>) -> Model {
        let vocabulary: HashMap<_, _> = [("a".to_string(), 0), ("b".to_string(), 1)]
            .into_iter()
            .collect();
        Model::new(
            vocabulary,
            vec![1],
            vec![1.0, 1.0],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            biases,
        )
        .unwrap()
    }

    #[test]
    fn test_largest() {
        assert_eq!(2, largest(&[-3.0, 1.0, 2.5, -0.5]));
        assert_eq!(0, largest(&[7.0]));
        assert_eq!(0, largest(&[]));
    }

    #[test]
    fn test_largest_tie_takes_lowest_index() {
        assert_eq!(1, largest(&[0.0, 2.0, 1.0, 2.0]));
        assert_eq!(0, largest(&[-1.0, -1.0]));
    }

    #[test]
    fn test_largest_negative_infinity() {
        assert_eq!(0, largest(&[f64::NEG_INFINITY, f64::NEG_INFINITY]));
        assert_eq!(1, largest(&[f64::NEG_INFINITY, -1e300]));
    }

    #[test]
    fn test_score_document() {
        let (predicted, scores) = score_document(&ab_model(vec![0.0, 0.0]), "a a b");
        assert_eq!(0, predicted);
        assert!((scores[0] - 0.894).abs() < 1e-3);
        assert!((scores[1] - 0.447).abs() < 1e-3);

        let (predicted, _) = score_document(&ab_model(vec![0.0, 0.0]), "b b a");
        assert_eq!(1, predicted);
    }

    #[test]
    fn test_score_empty_document() {
        let (predicted, scores) = score_document(&ab_model(vec![-2.0, -0.5]), "");
        assert_eq!(1, predicted);
        assert_eq!(vec![-2.0, -0.5], scores);

        let (predicted, scores) = score_document(&ab_model(vec![-0.5, -0.5]), "");
        assert_eq!(0, predicted);
        assert_eq!(vec![-0.5, -0.5], scores);
    }

    #[test]
    fn test_format_score_line() {
        assert_eq!(
            "1\t-0.6931 0.1235\tthe cat sat",
            format_score_line(1, &[-0.693147, 0.123456], "the cat sat", 4)
        );
        assert_eq!("0\t1.50\t", format_score_line(0, &[1.5], "", 2));
    }

    #[test]
    fn test_classifier_format_score_line() {
        let classifier = Classifier::new(ab_model(vec![0.0, 0.0]));
        assert_eq!(
            "0\t0.8944 0.4472\ta a b",
            classifier.format_score_line("a a b")
        );

        let classifier = classifier.precision(1);
        assert_eq!("1\t0.4 0.9\tb a b", classifier.format_score_line("b a b"));
    }

    #[test]
    fn test_classifier_tokenizer() {
        let classifier = Classifier::new(ab_model(vec![0.0, 0.0]));
        let (_, scores) = classifier.score_document("A, A");
        assert_eq!(vec![0.0, 0.0], scores);

        let tokenizer = PatternTokenizer::new(r"\w+", true).unwrap();
        let classifier = classifier.tokenizer(tokenizer);
        let (predicted, scores) = classifier.score_document("A, A");
        assert_eq!(0, predicted);
        assert_eq!(vec![1.0, 0.0], scores);
    }

    #[test]
    fn test_score_lines() {
        let classifier = Classifier::new(ab_model(vec![0.0, -1.0]));
        let input = "a a b\n\nb\r\nc d\n";
        let mut output = vec![];
        let n = classifier.score_lines(input.as_bytes(), &mut output).unwrap();

        assert_eq!(4, n);
        assert_eq!(
            "0\t0.8944 -0.5528\ta a b\n\
             0\t0.0000 -1.0000\t\n\
             0\t0.0000 0.0000\tb\n\
             0\t0.0000 -1.0000\tc d\n",
            String::from_utf8(output).unwrap()
        );
    }

    #[test]
    fn test_score_lines_empty_input() {
        let classifier = Classifier::new(ab_model(vec![0.0, 0.0]));
        let mut output = vec![];
        let n = classifier.score_lines(&b""[..], &mut output).unwrap();
        assert_eq!(0, n);
        assert!(output.is_empty());
    }

    #[test]
    fn test_score_lines_invalid_utf8() {
        let classifier = Classifier::new(ab_model(vec![0.0, 0.0]));
        let mut output = vec![];
        let n = classifier
            .score_lines(&b"a\ncaf\xe9 a\nb"[..], &mut output)
            .unwrap();
        assert_eq!(3, n);
        assert_eq!(
            "0\t1.0000 0.0000\ta\n\
             0\t1.0000 0.0000\tcaf\u{fffd} a\n\
             1\t0.0000 1.0000\tb\n",
            String::from_utf8(output).unwrap()
        );
    }

    #[test]
    fn test_format_half_up() {
        assert_eq!("0.0313", format_half_up(0.03125, 4));
        assert_eq!("-0.0313", format_half_up(-0.03125, 4));
        assert_eq!("0.13", format_half_up(0.125, 2));
        assert_eq!("1", format_half_up(0.5, 0));
        assert_eq!("3", format_half_up(2.5, 0));
        assert_eq!("0.0312", format_half_up(0.0312, 4));
        assert_eq!("0.1235", format_half_up(0.123456, 4));
        assert_eq!("0.0000", format_half_up(0.0, 4));
        assert_eq!("-inf", format_half_up(f64::NEG_INFINITY, 4));
    }

    #[test]
    fn test_format_score_line_rounds_ties_up() {
        assert_eq!(
            "0\t0.0313 -0.2500\td",
            format_score_line(0, &[0.03125, -0.25], "d", 4)
        );
    }
}
