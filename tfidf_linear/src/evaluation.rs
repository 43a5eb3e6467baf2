//! Accuracy statistics over a labeled corpus.

use crate::errors::{Result, TfidfLinearError};

/// Parses a labeled line: an integer class label, a tab, and the document.
///
/// # Errors
///
/// [`TfidfLinearError::InvalidArgument`] will be returned if the tab is missing or the label is
/// not a non-negative integer.
pub fn parse_labeled_line(line: &str) -> Result<(usize, &str)> {
    let (label, document) = line
        .split_once('\t')
        .ok_or_else(|| TfidfLinearError::invalid_argument("line", "missing a tab"))?;
    let label = label.trim().parse().map_err(|_| {
        TfidfLinearError::invalid_argument("label", format!("{:?} is not a class index", label))
    })?;
    Ok((label, document))
}

/// Confusion matrix of a classifier.
///
/// Rows are gold classes and columns are predicted classes.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Creates an empty matrix for `n_classes` classes.
    pub fn new(n_classes: usize) -> Self {
        Self {
            counts: vec![vec![0; n_classes]; n_classes],
        }
    }

    /// Returns the number of classes.
    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    /// Records a prediction.
    ///
    /// # Errors
    ///
    /// [`TfidfLinearError::InvalidArgument`] will be returned if either class is out of range.
    pub fn add(&mut self, gold: usize, predicted: usize) -> Result<()> {
        let n_classes = self.n_classes();
        if gold >= n_classes {
            return Err(TfidfLinearError::invalid_argument(
                "gold",
                format!("class {} is out of range of {} classes", gold, n_classes),
            ));
        }
        if predicted >= n_classes {
            return Err(TfidfLinearError::invalid_argument(
                "predicted",
                format!("class {} is out of range of {} classes", predicted, n_classes),
            ));
        }
        self.counts[gold][predicted] += 1;
        Ok(())
    }

    /// Returns how many times `gold` was predicted as `predicted`.
    pub fn count(&self, gold: usize, predicted: usize) -> usize {
        self.counts[gold][predicted]
    }

    /// Returns the number of recorded predictions.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Returns the fraction of correct predictions, or NaN if nothing is recorded.
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes()).map(|c| self.counts[c][c]).sum();
        correct as f64 / self.total() as f64
    }

    /// Returns the precision of a class, or NaN if the class was never predicted.
    pub fn precision(&self, class: usize) -> f64 {
        let n_sys: usize = self.counts.iter().map(|row| row[class]).sum();
        self.counts[class][class] as f64 / n_sys as f64
    }

    /// Returns the recall of a class, or NaN if the class never occurs.
    pub fn recall(&self, class: usize) -> f64 {
        let n_ref: usize = self.counts[class].iter().sum();
        self.counts[class][class] as f64 / n_ref as f64
    }

    /// Returns the F1 score of a class.
    pub fn f1(&self, class: usize) -> f64 {
        let precision = self.precision(class);
        let recall = self.recall(class);
        2. * precision * recall / (precision + recall)
    }
}
