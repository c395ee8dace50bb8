//! Feature standardization and ridge regression.

use crate::error::{Result, SanitizeError};
use faer::{Mat, prelude::*, solvers::PartialPivLu};

/// Zero-mean, unit-variance scaling fit on one set of rows
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations.
    ///
    /// A constant column gets a scale of 1 so it maps to zero.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let means: Vec<f64> = (0..width)
            .map(|j| rows.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let scales = (0..width)
            .map(|j| {
                let var = rows.iter().map(|row| (row[j] - means[j]).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect();

        Self { means, scales }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}

/// L2-regularized least squares with an unpenalized intercept
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeRegression {
    alpha: f64,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: Vec::new(),
            intercept: 0.0,
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Solve `(XcᵀXc + αI) w = Xcᵀ yc` on centered data
    pub fn fit(mut self, x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(SanitizeError::configuration(format!(
                "ridge fit needs matching non-empty rows, got {} features rows and {} targets",
                x.len(),
                y.len()
            )));
        }
        let n = x.len() as f64;
        let p = x[0].len();

        let x_means: Vec<f64> = (0..p)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n;

        if p == 0 {
            self.coefficients.clear();
            self.intercept = y_mean;
            return Ok(self);
        }

        let mut gram = vec![vec![0.0; p]; p];
        let mut moment = vec![0.0; p];
        for (row, &target) in x.iter().zip(y) {
            let centered: Vec<f64> = row.iter().zip(&x_means).map(|(v, m)| v - m).collect();
            let yc = target - y_mean;
            for a in 0..p {
                moment[a] += centered[a] * yc;
                for b in 0..p {
                    gram[a][b] += centered[a] * centered[b];
                }
            }
        }
        for (a, row) in gram.iter_mut().enumerate() {
            row[a] += self.alpha;
        }

        let mat = Mat::from_fn(p, p, |i, j| gram[i][j]);
        let rhs = Mat::from_fn(p, 1, |i, _| moment[i]);
        let lu = PartialPivLu::new(mat.as_ref());
        let sol = lu.solve(&rhs);
        let coefficients: Vec<f64> = (0..p).map(|i| sol.read(i, 0)).collect();

        if coefficients.iter().any(|w| !w.is_finite()) {
            return Err(SanitizeError::configuration(
                "ridge system is singular; use a positive alpha",
            ));
        }

        self.intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(w, m)| w * m)
                .sum::<f64>();
        self.coefficients = coefficients;
        Ok(self)
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}
