//! Averaging functions shared by assignments and courses.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::error::{GradeError, GradeResult};

/// One score to average, with the points it is out of.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedItem {
    pub label: String,
    pub score: Option<f64>,
    pub max_points: f64,
}

impl GradedItem {
    pub fn new(label: impl Into<String>, score: Option<f64>, max_points: f64) -> Self {
        Self {
            label: label.into(),
            score,
            max_points,
        }
    }

    /// `score / max_points`, or `None` when the score is missing.
    pub fn fraction(&self) -> Option<f64> {
        self.score.map(|s| s / self.max_points)
    }
}

/// User-supplied averaging function. It should return a value in `[0, 1]`.
pub type CustomScheme = Arc<dyn Fn(&[GradedItem]) -> f64 + Send + Sync>;

/// Per-item weights for [`GradingScheme::Weighted`].
#[derive(Debug, Clone, PartialEq)]
pub enum Weights {
    /// One weight per item, in item order.
    Positional(Vec<f64>),
    /// Weights keyed by item label.
    Named(BTreeMap<String, f64>),
}

impl Weights {
    /// Resolves one weight per item. Every item needs a weight and every
    /// named weight must match an item.
    fn resolve(&self, items: &[GradedItem]) -> GradeResult<Vec<f64>> {
        let weights = match self {
            Weights::Positional(weights) => {
                if weights.len() != items.len() {
                    return Err(GradeError::WeightMismatch(format!(
                        "{} weights for {} items",
                        weights.len(),
                        items.len()
                    )));
                }
                weights.clone()
            }
            Weights::Named(weights) => {
                if let Some(unused) = weights
                    .keys()
                    .find(|k| !items.iter().any(|item| &item.label == *k))
                {
                    return Err(GradeError::WeightMismatch(format!(
                        "weight given for unknown item `{unused}`"
                    )));
                }
                items
                    .iter()
                    .map(|item| {
                        weights.get(&item.label).copied().ok_or_else(|| {
                            GradeError::WeightMismatch(format!("no weight for `{}`", item.label))
                        })
                    })
                    .collect::<GradeResult<Vec<_>>>()?
            }
        };

        if let Some(w) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(GradeError::WeightMismatch(format!(
                "weights must be non-negative numbers, got {w}"
            )));
        }
        Ok(weights)
    }
}

/// How a set of scores is combined into a single fraction.
///
/// Items with a missing score are left out of every built-in mode. Callers
/// that want missed work to count as zero substitute it before applying.
#[derive(Clone, Default)]
pub enum GradingScheme {
    #[default]
    Unweighted,
    Weighted(Weights),
    /// Drops the `k` lowest fractions, then takes the plain mean.
    DropLowest(usize),
    Custom(CustomScheme),
    /// Best result among several schemes.
    BestOf(Vec<GradingScheme>),
}

impl GradingScheme {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[GradedItem]) -> f64 + Send + Sync + 'static,
    {
        GradingScheme::Custom(Arc::new(f))
    }

    pub fn weighted(weights: Vec<f64>) -> Self {
        GradingScheme::Weighted(Weights::Positional(weights))
    }

    pub fn weighted_by_name<K: Into<String>>(weights: impl IntoIterator<Item = (K, f64)>) -> Self {
        GradingScheme::Weighted(Weights::Named(
            weights.into_iter().map(|(k, w)| (k.into(), w)).collect(),
        ))
    }

    /// Averages `items` into a fraction.
    ///
    /// # Errors
    ///
    /// - [`GradeError::InvalidMaxPoints`] if an item is out of zero or fewer points.
    /// - [`GradeError::WeightMismatch`] if weights do not line up with the items.
    /// - [`GradeError::InsufficientItems`] if dropping leaves nothing to average.
    pub fn apply(&self, items: &[GradedItem]) -> GradeResult<f64> {
        if let Some(item) = items
            .iter()
            .find(|i| !(i.max_points.is_finite() && i.max_points > 0.0))
        {
            return Err(GradeError::InvalidMaxPoints {
                test: item.label.clone(),
                value: item.max_points,
            });
        }

        match self {
            GradingScheme::Unweighted => {
                let fractions: Vec<f64> = items.iter().filter_map(GradedItem::fraction).collect();
                Ok(mean(&fractions))
            }
            GradingScheme::Weighted(weights) => {
                let weights = weights.resolve(items)?;
                let (total, weight_sum) = items
                    .iter()
                    .zip(weights)
                    .filter_map(|(item, w)| item.fraction().map(|f| (f * w, w)))
                    .fold((0.0, 0.0), |(t, s), (fw, w)| (t + fw, s + w));

                if weight_sum == 0.0 {
                    Ok(0.0)
                } else {
                    Ok(total / weight_sum)
                }
            }
            GradingScheme::DropLowest(k) => {
                let mut fractions: Vec<f64> =
                    items.iter().filter_map(GradedItem::fraction).collect();
                if *k >= fractions.len() {
                    return Err(GradeError::InsufficientItems {
                        dropped: *k,
                        available: fractions.len(),
                    });
                }
                fractions.sort_by(f64::total_cmp);
                Ok(mean(&fractions[*k..]))
            }
            GradingScheme::Custom(f) => {
                let result = f(items);
                if !(0.0..=1.0).contains(&result) {
                    warn!(result, "Custom grading scheme returned a value outside [0, 1]");
                }
                Ok(result)
            }
            GradingScheme::BestOf(schemes) => {
                if schemes.is_empty() {
                    return Err(GradeError::InsufficientItems {
                        dropped: 0,
                        available: 0,
                    });
                }
                schemes
                    .iter()
                    .map(|s| s.apply(items))
                    .try_fold(f64::NEG_INFINITY, |best, r| r.map(|v| best.max(v)))
            }
        }
    }
}

impl fmt::Debug for GradingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingScheme::Unweighted => f.write_str("Unweighted"),
            GradingScheme::Weighted(w) => f.debug_tuple("Weighted").field(w).finish(),
            GradingScheme::DropLowest(k) => f.debug_tuple("DropLowest").field(k).finish(),
            GradingScheme::Custom(_) => f.write_str("Custom(..)"),
            GradingScheme::BestOf(s) => f.debug_tuple("BestOf").field(s).finish(),
        }
    }
}

/// Arithmetic mean. Returns 0.0 for empty input.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(scores: &[(Option<f64>, f64)]) -> Vec<GradedItem> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &(s, m))| GradedItem::new(format!("Quiz {}", i + 1), s, m))
            .collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn test_unweighted_excludes_missing() {
        let items = items(&[(Some(5.0), 10.0), (None, 10.0), (Some(20.0), 20.0)]);
        assert_close(GradingScheme::Unweighted.apply(&items).unwrap(), 0.75);
    }

    #[test]
    fn test_unweighted_empty_is_zero() {
        assert_eq!(GradingScheme::Unweighted.apply(&[]).unwrap(), 0.0);
    }

    #[test]
    fn test_weighted_normalizes_weights() {
        let items = items(&[(Some(5.0), 10.0), (Some(10.0), 10.0)]);
        let scheme = GradingScheme::weighted(vec![1.0, 3.0]);
        assert_close(scheme.apply(&items).unwrap(), 0.875);
    }

    #[test]
    fn test_weighted_by_name() {
        let items = items(&[(Some(5.0), 10.0), (Some(10.0), 10.0)]);
        let scheme = GradingScheme::weighted_by_name([("Quiz 1", 1.0), ("Quiz 2", 3.0)]);
        assert_close(scheme.apply(&items).unwrap(), 0.875);
    }

    #[test]
    fn test_weighted_missing_weight() {
        let items = items(&[(Some(5.0), 10.0), (Some(10.0), 10.0)]);

        let positional = GradingScheme::weighted(vec![1.0]);
        assert!(matches!(
            positional.apply(&items),
            Err(GradeError::WeightMismatch(_))
        ));

        let named = GradingScheme::weighted_by_name([("Quiz 1", 1.0)]);
        assert!(matches!(named.apply(&items), Err(GradeError::WeightMismatch(_))));

        let typo = GradingScheme::weighted_by_name([("Quiz 1", 1.0), ("Quiz 2", 1.0), ("Qiuz 3", 1.0)]);
        assert!(matches!(typo.apply(&items), Err(GradeError::WeightMismatch(_))));
    }

    #[test]
    fn test_weighted_all_zero_weights() {
        let items = items(&[(Some(5.0), 10.0)]);
        assert_eq!(GradingScheme::weighted(vec![0.0]).apply(&items).unwrap(), 0.0);
    }

    #[test]
    fn test_drop_lowest() {
        let items = items(&[(Some(5.0), 10.0), (Some(8.0), 10.0), (Some(10.0), 10.0)]);
        assert_close(GradingScheme::DropLowest(1).apply(&items).unwrap(), 0.9);
    }

    #[test]
    fn test_drop_lowest_insufficient() {
        let items = items(&[(Some(5.0), 10.0), (Some(8.0), 10.0)]);
        assert_eq!(
            GradingScheme::DropLowest(2).apply(&items),
            Err(GradeError::InsufficientItems {
                dropped: 2,
                available: 2
            })
        );
    }

    #[test]
    fn test_custom_receives_items() {
        let scheme = GradingScheme::custom(|items| {
            items
                .iter()
                .filter_map(GradedItem::fraction)
                .fold(0.0, f64::max)
        });
        let items = items(&[(Some(3.0), 10.0), (Some(7.0), 10.0)]);
        assert_close(scheme.apply(&items).unwrap(), 0.7);
    }

    #[test]
    fn test_best_of_takes_max() {
        let items = items(&[(Some(2.0), 10.0), (Some(10.0), 10.0)]);
        let scheme = GradingScheme::BestOf(vec![
            GradingScheme::Unweighted,
            GradingScheme::weighted(vec![1.0, 4.0]),
        ]);
        assert_close(scheme.apply(&items).unwrap(), 0.84);
    }

    #[test]
    fn test_invalid_max_points() {
        let items = items(&[(Some(2.0), 0.0)]);
        assert!(matches!(
            GradingScheme::Unweighted.apply(&items),
            Err(GradeError::InvalidMaxPoints { .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let items = items(&[(Some(1.0), 3.0), (Some(2.0), 7.0), (Some(5.0), 9.0)]);
        let scheme = GradingScheme::DropLowest(1);
        let a = scheme.apply(&items).unwrap();
        let b = scheme.apply(&items).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
