//! Binary label encoding.
//!
//! One sentinel value maps to the negative class (0) and every other value
//! maps to the positive class (1). The mapping is fixed at ingestion.

/// Binary class label: 0 = negative (benign), 1 = positive.
pub type Label = u8;

/// Negative-class label value.
pub const NEGATIVE: Label = 0;

/// Positive-class label value.
pub const POSITIVE: Label = 1;

/// Map `negative` to 0 and everything else to 1.
///
/// Applying this to an already-binary vector with `negative = 0` is a no-op.
pub fn binarize<T: PartialEq + ?Sized>(values: &[&T], negative: &T) -> Vec<Label> {
    values
        .iter()
        .map(|v| if *v == negative { NEGATIVE } else { POSITIVE })
        .collect()
}

/// Re-encode a label vector under the same convention (0 stays 0, anything else becomes 1).
pub fn binarize_labels(labels: &[Label]) -> Vec<Label> {
    let refs: Vec<&Label> = labels.iter().collect();
    binarize(&refs, &NEGATIVE)
}

/// Count (negatives, positives).
pub fn class_counts(labels: &[Label]) -> (usize, usize) {
    let positives = labels.iter().filter(|&&l| l == POSITIVE).count();
    (labels.len() - positives, positives)
}

/// Fraction of positive labels; 0 for an empty vector.
pub fn positive_prevalence(labels: &[Label]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let (_, positives) = class_counts(labels);
    positives as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_maps_to_negative() {
        let raw = ["1", "0", "ransom", "1"];
        let refs: Vec<&str> = raw.to_vec();
        let encoded = binarize(&refs, "1");
        assert_eq!(encoded, vec![0, 1, 1, 0]);
    }

    #[test]
    fn binary_encoding_is_idempotent() {
        let labels = vec![0, 1, 1, 0, 1];
        let once = binarize_labels(&labels);
        let twice = binarize_labels(&once);
        assert_eq!(once, labels);
        assert_eq!(twice, once);
    }

    #[test]
    fn prevalence_counts_positives() {
        let labels = vec![0, 0, 0, 1];
        assert_eq!(class_counts(&labels), (3, 1));
        assert!((positive_prevalence(&labels) - 0.25).abs() < 1e-12);
        assert_eq!(positive_prevalence(&[]), 0.0);
    }
}
