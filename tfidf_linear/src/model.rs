use std::fmt;
use std::io::{Read, Write};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::compress;
use crate::errors::{Result, TfidfLinearError};
use crate::ngram::{self, Tokenizer, WhitespaceTokenizer};
use crate::tfidf::{self, Normalization};

/// Serialized form of a model. Field names are shared with existing model files.
#[derive(Deserialize)]
struct ModelData {
    vocabulary: HashMap<String, usize>,
    ngrams: Vec<usize>,
    idf: Vec<f64>,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

#[derive(Serialize)]
struct ModelDataRef<'a> {
    vocabulary: &'a HashMap<String, usize>,
    ngrams: &'a [usize],
    idf: &'a [f64],
    weights: &'a [Vec<f64>],
    biases: &'a [f64],
}

/// Linear n-gram model.
///
/// The vocabulary maps n-gram terms to feature indices. The features of a document are the
/// cosine-normalized tf-idf values of its recognized terms, and each class score is the bias of
/// the class plus the dot product of the features with the weight row of the class.
///
/// A model is validated when it is created and never changes afterwards, so it can be shared
/// across threads freely.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub(crate) vocabulary: HashMap<String, usize>,
    pub(crate) ngrams: Vec<usize>,
    pub(crate) idf: Vec<f64>,
    pub(crate) weights: Vec<Vec<f64>>,
    pub(crate) biases: Vec<f64>,

    // Distinct n-gram orders in the order they first appear in `ngrams`.
    orders: Vec<usize>,
}

impl Model {
    /// Creates a model from its components.
    ///
    /// # Arguments
    ///
    /// * `vocabulary` - Map from a term to its feature index.
    /// * `ngrams` - N-gram orders of the terms. Duplicates are allowed and treated as one.
    /// * `idf` - Inverse document frequency of each feature.
    /// * `weights` - Weight row of each class, one column per feature.
    /// * `biases` - Bias of each class.
    ///
    /// # Errors
    ///
    /// [`TfidfLinearError::InvalidModel`] will be returned if the components are inconsistent
    /// or contain a value that is not finite.
    pub fn new(
        vocabulary: HashMap<String, usize>,
        ngrams: Vec<usize>,
        idf: Vec<f64>,
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        if weights.is_empty() {
            return Err(TfidfLinearError::invalid_model("`weights` is empty"));
        }
        if biases.len() != weights.len() {
            return Err(TfidfLinearError::invalid_model(format!(
                "`biases` has {} entries but `weights` has {} rows",
                biases.len(),
                weights.len(),
            )));
        }
        for (i, row) in weights.iter().enumerate() {
            if row.len() != idf.len() {
                return Err(TfidfLinearError::invalid_model(format!(
                    "row {} of `weights` has {} columns but `idf` has {} entries",
                    i,
                    row.len(),
                    idf.len(),
                )));
            }
        }
        // JSON cannot carry infinities or NaN, so such a model could not be read back.
        if let Some(i) = idf.iter().position(|v| !v.is_finite()) {
            return Err(TfidfLinearError::invalid_model(format!(
                "`idf` has a non-finite value at index {}",
                i,
            )));
        }
        for (i, row) in weights.iter().enumerate() {
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(TfidfLinearError::invalid_model(format!(
                    "row {} of `weights` has a non-finite value at column {}",
                    i, j,
                )));
            }
        }
        if let Some(i) = biases.iter().position(|v| !v.is_finite()) {
            return Err(TfidfLinearError::invalid_model(format!(
                "`biases` has a non-finite value at index {}",
                i,
            )));
        }
        if ngrams.is_empty() {
            return Err(TfidfLinearError::invalid_model("`ngrams` is empty"));
        }
        if ngrams.contains(&0) {
            return Err(TfidfLinearError::invalid_model(
                "`ngrams` must only contain positive orders",
            ));
        }
        if vocabulary.len() != idf.len() {
            return Err(TfidfLinearError::invalid_model(format!(
                "`vocabulary` has {} terms but `idf` has {} entries",
                vocabulary.len(),
                idf.len(),
            )));
        }
        let mut seen = vec![false; idf.len()];
        for (term, &index) in &vocabulary {
            match seen.get_mut(index) {
                Some(true) => {
                    return Err(TfidfLinearError::invalid_model(format!(
                        "feature index {} is assigned to more than one term",
                        index,
                    )));
                }
                Some(s) => *s = true,
                None => {
                    return Err(TfidfLinearError::invalid_model(format!(
                        "feature index {} of {:?} is out of range",
                        index, term,
                    )));
                }
            }
        }

        let mut orders = vec![];
        for &n in &ngrams {
            if !orders.contains(&n) {
                orders.push(n);
            }
        }

        Ok(Self {
            vocabulary,
            ngrams,
            idf,
            weights,
            biases,
            orders,
        })
    }

    /// Returns the number of classes.
    pub fn class_count(&self) -> usize {
        self.biases.len()
    }

    /// Returns the number of features.
    pub fn feature_count(&self) -> usize {
        self.weights[0].len()
    }

    /// Returns the distinct n-gram orders used for term extraction.
    pub fn ngram_orders(&self) -> &[usize] {
        &self.orders
    }

    /// Returns the feature index of a term.
    pub fn feature_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Returns the vocabulary.
    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    /// Returns the idf table, indexed by feature.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Returns the weight rows, one per class.
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// Returns the bias of each class.
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Computes the feature vector of a document.
    ///
    /// # Arguments
    ///
    /// * `tokenizer` - Tokenizer applied to `document` before n-gram extraction.
    /// * `document` - A document.
    ///
    /// # Returns
    ///
    /// Cosine-normalized tf-idf values of the recognized terms as `(feature index, value)` pairs
    /// sorted by index. Terms missing from the vocabulary are dropped.
    pub fn document_features(
        &self,
        tokenizer: &dyn Tokenizer,
        document: &str,
    ) -> Vec<(usize, f64)> {
        let tokens = tokenizer.tokenize(document);
        let terms = ngram::extract_ngram_terms(&self.orders, &tokens);
        let recognized = terms
            .iter()
            .filter_map(|term| self.vocabulary.get(term.as_str()).copied());
        let mut itf: Vec<_> = tfidf::tf(recognized).into_iter().collect();
        itf.sort_unstable_by_key(|&(index, _)| index);
        tfidf::tf_idf(&itf, &self.idf, Normalization::Cosine)
    }

    /// Scores a document, splitting it on whitespace.
    ///
    /// # Arguments
    ///
    /// * `document` - A document.
    ///
    /// # Returns
    ///
    /// Unnormalized log likelihood of each class. A document without recognized terms gets the
    /// biases.
    pub fn class_log_likelihoods(&self, document: &str) -> Vec<f64> {
        self.class_log_likelihoods_with(&WhitespaceTokenizer, document)
    }

    /// Scores a document using the given tokenizer.
    ///
    /// # Arguments
    ///
    /// * `tokenizer` - Tokenizer applied to `document` before n-gram extraction.
    /// * `document` - A document.
    ///
    /// # Returns
    ///
    /// Unnormalized log likelihood of each class.
    pub fn class_log_likelihoods_with(
        &self,
        tokenizer: &dyn Tokenizer,
        document: &str,
    ) -> Vec<f64> {
        let features = self.document_features(tokenizer, document);
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, &bias)| {
                features
                    .iter()
                    .fold(bias, |score, &(index, value)| score + row[index] * value)
            })
            .collect()
    }

    /// Exports the model data as JSON.
    ///
    /// # Arguments
    ///
    /// * `wtr` - Byte-oriented sink object.
    ///
    /// # Errors
    ///
    /// When `wtr` generates an error, it will be returned as is.
    pub fn write<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        let data = ModelDataRef {
            vocabulary: &self.vocabulary,
            ngrams: &self.ngrams,
            idf: &self.idf,
            weights: &self.weights,
            biases: &self.biases,
        };
        serde_json::to_writer(wtr, &data)?;
        Ok(())
    }

    /// Creates a model from a reader of uncompressed JSON.
    ///
    /// # Arguments
    ///
    /// * `rdr` - A data source.
    ///
    /// # Returns
    ///
    /// A validated model read from `rdr`.
    ///
    /// # Errors
    ///
    /// When `rdr` generates an error, it will be returned as is. A payload of another shape is
    /// reported as [`TfidfLinearError::JSONError`], and inconsistent contents as
    /// [`TfidfLinearError::InvalidModel`].
    pub fn read<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let data: ModelData = serde_json::from_reader(rdr)?;
        let model = Self::new(
            data.vocabulary,
            data.ngrams,
            data.idf,
            data.weights,
            data.biases,
        )?;
        tracing::debug!(%model, "model loaded");
        Ok(model)
    }

    /// Creates a model from a reader of JSON that may be gzip or zstd compressed.
    ///
    /// # Errors
    ///
    /// See [`Model::read`]. A corrupt compressed stream is reported as
    /// [`TfidfLinearError::IOError`].
    pub fn read_compressed<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        Self::read(compress::decoder(rdr)?)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "LinearNgramModel<{} features, {} classes, ngrams {:?}>",
            self.feature_count(),
            self.class_count(),
            self.ngrams,
        )
    }
}
