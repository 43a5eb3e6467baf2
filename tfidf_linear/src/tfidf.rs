//! Term frequency and tf-idf weighting.

use std::hash::Hash;

use hashbrown::HashMap;

/// Normalization applied to a tf-idf vector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Normalization {
    /// Leaves the products as they are.
    None,

    /// Scales the vector to unit Euclidean norm.
    Cosine,
}

/// Counts occurrences of each term.
///
/// # Arguments
///
/// * `terms` - Terms of a document. Repeated terms are counted.
///
/// # Returns
///
/// Raw count of every distinct term.
pub fn tf<I, T>(terms: I) -> HashMap<T, f64>
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash,
{
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term).or_insert(0.0) += 1.0;
    }
    counts
}

/// Weights term frequencies with inverse document frequencies.
///
/// # Arguments
///
/// * `tf` - Sparse term frequencies keyed by feature index.
/// * `idf` - Dense idf table indexed by feature index.
/// * `normalization` - Normalization of the resulting vector.
///
/// # Returns
///
/// Sparse tf-idf values in the same order as `tf`. With [`Normalization::Cosine`], a vector
/// whose norm is zero is left as all zeros.
///
/// # Panics
///
/// Panics if an index in `tf` is out of range of `idf`.
pub fn tf_idf(tf: &[(usize, f64)], idf: &[f64], normalization: Normalization) -> Vec<(usize, f64)> {
    let mut result: Vec<_> = tf.iter().map(|&(i, v)| (i, v * idf[i])).collect();
    if normalization == Normalization::Cosine {
        let norm = result.iter().map(|&(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut result {
                *v /= norm;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tf_counts() {
        let counts = tf(["a", "b", "a", "c", "a"]);
        assert_eq!(3, counts.len());
        assert_eq!(3.0, counts["a"]);
        assert_eq!(1.0, counts["b"]);
        assert_eq!(1.0, counts["c"]);
    }

    #[test]
    fn test_tf_empty() {
        let terms: Vec<String> = vec![];
        assert!(tf(terms).is_empty());
    }

    #[test]
    fn test_tf_idf_no_normalization() {
        let v = tf_idf(&[(0, 2.0), (2, 1.0)], &[1.5, 9.0, 0.5], Normalization::None);
        assert_eq!(vec![(0, 3.0), (2, 0.5)], v);
    }

    #[test]
    fn test_tf_idf_cosine() {
        let v = tf_idf(&[(1, 3.0), (0, 4.0)], &[1.0, 1.0], Normalization::Cosine);
        assert_eq!(1, v[0].0);
        assert!((v[0].1 - 0.6).abs() < 1e-12);
        assert_eq!(0, v[1].0);
        assert!((v[1].1 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_tf_idf_cosine_unit_norm() {
        let v = tf_idf(
            &[(0, 1.0), (1, 5.0), (3, 2.0)],
            &[1.2, 0.3, 7.0, 2.5],
            Normalization::Cosine,
        );
        let norm = v.iter().map(|&(_, x)| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tf_idf_cosine_zero_vector() {
        let v = tf_idf(&[(0, 2.0)], &[0.0], Normalization::Cosine);
        assert_eq!(vec![(0, 0.0)], v);

        let v = tf_idf(&[], &[1.0], Normalization::Cosine);
        assert!(v.is_empty());
    }
}
