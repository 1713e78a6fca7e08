//! Classifier Abstraction

use crate::InferenceError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Per-row additive attribution.
///
/// For every row, `base_values[i] + contributions.row(i).sum()` reconstructs
/// the model output in the model's own explanation space.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub base_values: Array1<f64>,
    /// One row per input row, one column per feature
    pub contributions: Array2<f64>,
}

/// Trained binary classifier scoring `P(failure within horizon)`.
///
/// The pipeline knows nothing about the learning algorithm behind it.
pub trait RiskModel: Send + Sync {
    /// Feature columns, in the order used at training time
    fn feature_names(&self) -> &[String];

    /// Positive-class probability per row
    fn predict_probability(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, InferenceError>;

    /// Additive per-feature contributions per row
    fn explain(&self, rows: ArrayView2<'_, f64>) -> Result<Attribution, InferenceError>;
}

/// Serialized form of [`LinearRiskModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Reference point for explanations, typically the training means.
    /// Defaults to all zeros.
    #[serde(default)]
    pub baseline: Option<Vec<f64>>,
}

/// Logistic model `σ(b + w·x)`.
///
/// Explanations are exact in log-odds space:
/// `contribution_i = w_i (x_i - baseline_i)` on top of `b + w·baseline`.
#[derive(Debug, Clone)]
pub struct LinearRiskModel {
    feature_names: Vec<String>,
    intercept: f64,
    coefficients: Array1<f64>,
    baseline: Array1<f64>,
}

impl LinearRiskModel {
    /// Build a model, rejecting duplicate feature names, mismatched lengths
    /// and non-finite parameters
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self, InferenceError> {
        let n = artifact.feature_names.len();
        for (i, name) in artifact.feature_names.iter().enumerate() {
            if artifact.feature_names[..i].contains(name) {
                return Err(InferenceError::ModelLoadError(format!(
                    "feature {name} listed more than once"
                )));
            }
        }
        if artifact.coefficients.len() != n {
            return Err(InferenceError::ModelLoadError(format!(
                "{} coefficients for {} features",
                artifact.coefficients.len(),
                n
            )));
        }
        let baseline = artifact.baseline.unwrap_or_else(|| vec![0.0; n]);
        if baseline.len() != n {
            return Err(InferenceError::ModelLoadError(format!(
                "{} baseline values for {} features",
                baseline.len(),
                n
            )));
        }
        let all_finite = artifact.intercept.is_finite()
            && artifact.coefficients.iter().chain(&baseline).all(|v| v.is_finite());
        if !all_finite {
            return Err(InferenceError::ModelLoadError(
                "model parameters must be finite".into(),
            ));
        }

        Ok(Self {
            feature_names: artifact.feature_names,
            intercept: artifact.intercept,
            coefficients: Array1::from(artifact.coefficients),
            baseline: Array1::from(baseline),
        })
    }

    /// Parse a JSON model artifact
    pub fn from_json_str(json: &str) -> Result<Self, InferenceError> {
        let artifact: LinearModelArtifact = serde_json::from_str(json)
            .map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;
        Self::from_artifact(artifact)
    }

    /// Load a JSON model artifact from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {e}", path.display())))?;
        let model = Self::from_json_str(&json)?;
        info!(
            "Loaded linear risk model from {} ({} features)",
            path.display(),
            model.feature_names.len()
        );
        Ok(model)
    }

    fn check_width(&self, rows: &ArrayView2<'_, f64>) -> Result<(), InferenceError> {
        if rows.ncols() != self.coefficients.len() {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("[_, {}]", self.coefficients.len()),
                actual: format!("{:?}", rows.shape()),
            });
        }
        Ok(())
    }
}

impl RiskModel for LinearRiskModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_probability(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, InferenceError> {
        self.check_width(&rows)?;
        let logits = rows.dot(&self.coefficients) + self.intercept;
        Ok(logits.mapv(sigmoid))
    }

    fn explain(&self, rows: ArrayView2<'_, f64>) -> Result<Attribution, InferenceError> {
        self.check_width(&rows)?;
        let contributions = (&rows - &self.baseline) * &self.coefficients;
        let base = self.intercept + self.coefficients.dot(&self.baseline);
        Ok(Attribution {
            base_values: Array1::from_elem(rows.len_of(Axis(0)), base),
            contributions,
        })
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;

    fn model() -> LinearRiskModel {
        LinearRiskModel::from_artifact(LinearModelArtifact {
            feature_names: vec!["a".into(), "b".into()],
            intercept: -1.0,
            coefficients: vec![2.0, -0.5],
            baseline: Some(vec![1.0, 2.0]),
        })
        .unwrap()
    }

    #[test]
    fn test_probability() {
        let rows = array![[0.5, 0.0], [100.0, 0.0]];
        let p = model().predict_probability(rows.view()).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!(p[1] > 0.999 && p[1] <= 1.0);
    }

    #[test]
    fn test_explanation_is_additive_in_log_odds() {
        let rows = array![[3.0, 4.0], [-1.0, 0.5]];
        let m = model();
        let p = m.predict_probability(rows.view()).unwrap();
        let attr = m.explain(rows.view()).unwrap();
        for i in 0..2 {
            let logit = attr.base_values[i] + attr.contributions.row(i).sum();
            let expected = (p[i] / (1.0 - p[i])).ln();
            assert!((logit - expected).abs() < 1e-9);
        }
        // a: 2 * (3 - 1), b: -0.5 * (4 - 2)
        assert_eq!(attr.contributions[[0, 0]], 4.0);
        assert_eq!(attr.contributions[[0, 1]], -1.0);
    }

    #[test]
    fn test_shape_checked() {
        let rows = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            model().predict_probability(rows.view()),
            Err(InferenceError::InvalidInputShape { .. })
        ));
    }

    #[test]
    fn test_artifact_validation() {
        let bad = LinearModelArtifact {
            feature_names: vec!["a".into()],
            intercept: 0.0,
            coefficients: vec![1.0, 2.0],
            baseline: None,
        };
        assert!(LinearRiskModel::from_artifact(bad).is_err());
    }

    #[test]
    fn test_duplicate_feature_names_rejected() {
        let duplicated = LinearModelArtifact {
            feature_names: vec!["a".into(), "b".into(), "a".into()],
            intercept: 0.0,
            coefficients: vec![1.0, 1.0, 1.0],
            baseline: None,
        };
        assert!(matches!(
            LinearRiskModel::from_artifact(duplicated),
            Err(InferenceError::ModelLoadError(msg)) if msg.contains("more than once")
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"feature_names": ["a"], "intercept": 0.0, "coefficients": [1.0]}}"#
        )
        .unwrap();
        let model = LinearRiskModel::from_path(file.path()).unwrap();
        assert_eq!(model.feature_names(), &["a".to_string()]);
    }
}
