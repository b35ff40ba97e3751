use serde::Serialize;
use std::cmp::Ordering;

use crate::error::{GradeError, GradeResult};

/// Ordered thresholds mapping a final percentage (0–100) to a letter grade.
///
/// With the default scale:
///
/// | Range   | Grade |
/// |---------|-------|
/// | >= 93   | A     |
/// | >= 90   | A-    |
/// | >= 87   | B+    |
/// | >= 83   | B     |
/// | >= 80   | B-    |
/// | >= 75   | C+    |
/// | >= 65   | C     |
/// | >= 50   | D     |
/// | < 50    | F     |
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterScale {
    thresholds: Vec<f64>,
    letters: Vec<String>,
}

impl LetterScale {
    /// Builds a scale from strictly decreasing thresholds and one letter per threshold.
    /// The last letter also catches every score below the lowest threshold.
    pub fn new<S: Into<String>>(thresholds: Vec<f64>, letters: Vec<S>) -> GradeResult<Self> {
        let letters: Vec<String> = letters.into_iter().map(Into::into).collect();

        if thresholds.len() != letters.len() || letters.is_empty() {
            return Err(GradeError::ThresholdMismatch {
                thresholds: thresholds.len(),
                letters: letters.len(),
            });
        }

        for (position, pair) in thresholds.windows(2).enumerate() {
            if pair[0].partial_cmp(&pair[1]) != Some(Ordering::Greater) {
                return Err(GradeError::UnsortedThresholds {
                    position: position + 1,
                    value: pair[1],
                });
            }
        }

        Ok(Self {
            thresholds,
            letters,
        })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn letters(&self) -> &[String] {
        &self.letters
    }

    /// Letter for the first threshold `score` meets or exceeds, scanning from the top.
    pub fn letter(&self, score: f64) -> &str {
        self.thresholds
            .iter()
            .position(|&t| score >= t)
            .map(|i| self.letters[i].as_str())
            .unwrap_or_else(|| self.fallback())
    }

    /// Failing letter used for scores below every threshold.
    pub fn fallback(&self) -> &str {
        self.letters.last().map(String::as_str).unwrap_or_default()
    }

    /// Converts a letter back to a representative percentage: the midpoint
    /// of its band, rounded down. The top band is capped at 100.
    pub fn midpoint(&self, letter: &str) -> GradeResult<f64> {
        let index = self
            .letters
            .iter()
            .position(|l| l == letter.trim())
            .ok_or_else(|| GradeError::UnknownLetter(letter.to_string()))?;

        let upper = if index == 0 {
            100.0
        } else {
            self.thresholds[index - 1]
        };
        Ok(((self.thresholds[index] + upper) / 2.0).floor())
    }
}

impl Default for LetterScale {
    fn default() -> Self {
        Self {
            thresholds: vec![93.0, 90.0, 87.0, 83.0, 80.0, 75.0, 65.0, 50.0, 0.0],
            letters: ["A", "A-", "B+", "B", "B-", "C+", "C", "D", "F"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
