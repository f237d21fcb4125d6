use crate::error::{AppError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column standardization fitted once on the training split.
///
/// A `StandardScaler` only exists in the fitted state; the column list it
/// was fitted on travels with it, and every transform asserts that the
/// incoming layout matches by name and order before touching the numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl StandardScaler {
    /// Fit column means and standard deviations.
    ///
    /// Zero-variance columns scale as 1.0 so they pass through centered
    /// without dividing by zero.
    pub fn fit(x: &Array2<f64>, columns: &[String]) -> Result<Self> {
        if x.ncols() != columns.len() {
            return Err(AppError::Internal(format!(
                "matrix has {} columns but {} names were provided",
                x.ncols(),
                columns.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(AppError::Data("cannot fit scaler on an empty matrix".to_string()));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| AppError::Internal("mean computation failed".to_string()))?;
        let mut std = x.std_axis(Axis(0), 0.0);
        for s in std.iter_mut() {
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }

        Ok(Self {
            columns: columns.to_vec(),
            mean,
            std,
        })
    }

    /// Columns the scaler expects, in fitted order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn check_columns(&self, columns: &[String]) -> Result<()> {
        if columns != self.columns.as_slice() {
            return Err(AppError::Scaling(format!(
                "column layout does not match the fitted scaler (expected {} columns starting with {:?})",
                self.columns.len(),
                self.columns.first()
            )));
        }
        Ok(())
    }

    /// Standardize a matrix whose columns match the fitted layout.
    pub fn transform(&self, x: &Array2<f64>, columns: &[String]) -> Result<Array2<f64>> {
        self.check_columns(columns)?;
        if x.ncols() != self.columns.len() {
            return Err(AppError::Scaling(format!(
                "expected {} columns, got {}",
                self.columns.len(),
                x.ncols()
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Scaling(
                "input contains non-finite values".to_string(),
            ));
        }

        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.mean[j]) / self.std[j];
            }
        }
        Ok(out)
    }

    /// Map standardized values back to the original units.
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.columns.len() {
            return Err(AppError::Scaling(format!(
                "expected {} columns, got {}",
                self.columns.len(),
                x.ncols()
            )));
        }

        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = *value * self.std[j] + self.mean[j];
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_transform_standardizes() {
        let x = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let columns = names(&["a", "b"]);
        let scaler = StandardScaler::fit(&x, &columns).unwrap();

        let scaled = scaler.transform(&x, &columns).unwrap();

        // column a: mean 3, std sqrt(8/3)
        assert!(scaled[[1, 0]].abs() < 1e-12);
        assert!((scaled[[0, 0]] + scaled[[2, 0]]).abs() < 1e-12);
        // zero-variance column passes through centered
        assert_eq!(scaled[[0, 1]], 0.0);
    }

    #[test]
    fn test_round_trip_recovers_input() {
        let x = array![[1.5, 2.0, -3.0], [4.0, 0.5, 9.0], [-2.0, 7.0, 1.0]];
        let columns = names(&["a", "b", "c"]);
        let scaler = StandardScaler::fit(&x, &columns).unwrap();

        let scaled = scaler.transform(&x, &columns).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (orig, back) in x.iter().zip(restored.iter()) {
            assert!((orig - back).abs() < 1e-9);
        }
    }

    #[test]
    fn test_column_mismatch_is_scaling_error() {
        let x = array![[1.0, 2.0]];
        let scaler = StandardScaler::fit(&x, &names(&["a", "b"])).unwrap();

        let err = scaler.transform(&x, &names(&["b", "a"])).unwrap_err();
        assert_eq!(err.error_code(), "SCALING_ERROR");
    }

    #[test]
    fn test_non_finite_input_is_scaling_error() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let columns = names(&["a", "b"]);
        let scaler = StandardScaler::fit(&x, &columns).unwrap();

        let bad = array![[f64::NAN, 2.0]];
        let err = scaler.transform(&bad, &columns).unwrap_err();
        assert_eq!(err.error_code(), "SCALING_ERROR");
    }

    #[test]
    fn test_empty_fit_rejected() {
        let x = Array2::<f64>::zeros((0, 2));
        assert!(StandardScaler::fit(&x, &names(&["a", "b"])).is_err());
    }
}
