/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Numerical helpers: sampled integration, interpolation, polynomial fits and roots,
//! and small dense linear systems.

// Index loops mirror the matrix notation of the elimination steps
#![allow(clippy::needless_range_loop)]
use super::errors::{Result, UtilsError};
use num_complex::Complex64;
use std::f64::consts::PI;

/// `n` evenly spaced points from `a` to `b` inclusive
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let h = (b - a) / (n - 1) as f64;
            (0..n).map(|i| a + i as f64 * h).collect()
        }
    }
}

/// Trapezoidal integral of sampled values `y` over abscissae `x`
pub fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    y.windows(2)
        .zip(x.windows(2))
        .map(|(yy, xx)| 0.5 * (yy[0] + yy[1]) * (xx[1] - xx[0]))
        .sum()
}

/// Simpson integral of sampled values on an evenly spaced grid
///
/// Falls back to a trapezoid for the last interval if the number of intervals is odd.
pub fn simpson(y: &[f64], x: &[f64]) -> f64 {
    let n = y.len().min(x.len());
    if n < 3 {
        return trapezoid(&y[..n], &x[..n]);
    }
    let intervals = n - 1;
    let even = intervals - intervals % 2;
    let mut sum = 0.0;
    for i in (0..even).step_by(2) {
        let h = (x[i + 2] - x[i]) / 2.0;
        sum += h / 3.0 * (y[i] + 4.0 * y[i + 1] + y[i + 2]);
    }
    if even < intervals {
        sum += 0.5 * (y[n - 2] + y[n - 1]) * (x[n - 1] - x[n - 2]);
    }
    sum
}

/// Linear interpolation between two points
pub fn linear_interpolate(x: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    if (x1 - x0).abs() < 1e-300 {
        return y0;
    }

    let t = (x - x0) / (x1 - x0);
    y0 * (1.0 - t) + y1 * t
}

/// Linear interpolation on a tabulated function
///
/// Values outside the table are clamped to the first or last entry.
///
/// # Arguments
///
/// * `x` - The x-coordinate at which to interpolate
/// * `x_values` - Array of x coordinates (must be sorted in ascending order)
/// * `y_values` - Array of corresponding y coordinates
///
/// # Returns
///
/// The interpolated y-value at x or an error if inputs are invalid
pub fn interpolate_table(x: f64, x_values: &[f64], y_values: &[f64]) -> Result<f64> {
    if x_values.len() != y_values.len() {
        return Err(UtilsError::InvalidInput(
            "x_values and y_values must have the same length".to_string(),
        ));
    }

    if x_values.is_empty() {
        return Err(UtilsError::InvalidInput(
            "Empty arrays provided for interpolation".to_string(),
        ));
    }

    let last = x_values.len() - 1;
    if x <= x_values[0] {
        return Ok(y_values[0]);
    }
    if x >= x_values[last] {
        return Ok(y_values[last]);
    }

    // first index with x_values[idx] > x
    let idx = x_values.partition_point(|&v| v <= x);

    Ok(linear_interpolate(
        x,
        x_values[idx - 1],
        y_values[idx - 1],
        x_values[idx],
        y_values[idx],
    ))
}

/// Interpolate a table onto many points
pub fn interp(x_new: &[f64], x_values: &[f64], y_values: &[f64]) -> Result<Vec<f64>> {
    x_new
        .iter()
        .map(|&x| interpolate_table(x, x_values, y_values))
        .collect()
}

/// Solve the dense system `a·x = b` by Gaussian elimination with partial pivoting
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(UtilsError::Math(format!(
            "linear system needs a square {n}x{n} matrix"
        )));
    }

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = a[i][i].abs();
        for j in (i + 1)..n {
            if a[j][i].abs() > max_val {
                max_row = j;
                max_val = a[j][i].abs();
            }
        }
        if max_val < 1e-300 || !max_val.is_finite() {
            return Err(UtilsError::Singular(n));
        }
        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }
        for j in (i + 1)..n {
            let factor = a[j][i] / a[i][i];
            for k in i..n {
                a[j][k] -= factor * a[i][k];
            }
            b[j] -= factor * b[i];
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| a[i][j] * x[j]).sum();
        x[i] = (b[i] - sum) / a[i][i];
    }
    Ok(x)
}

/// Least squares polynomial fitting
///
/// # Arguments
///
/// * `x_values` - Array of x coordinates
/// * `y_values` - Array of corresponding y coordinates
/// * `degree` - Degree of the polynomial to fit
///
/// # Returns
///
/// Vector of coefficients (in ascending order of power) or an error if inputs are invalid
pub fn polynomial_fit(x_values: &[f64], y_values: &[f64], degree: usize) -> Result<Vec<f64>> {
    if x_values.len() != y_values.len() {
        return Err(UtilsError::InvalidInput(
            "x_values and y_values must have the same length".to_string(),
        ));
    }

    if x_values.len() <= degree {
        return Err(UtilsError::InvalidInput(
            "Need more data points than polynomial degree".to_string(),
        ));
    }

    let num_coeffs = degree + 1;
    let mut a = vec![vec![0.0; num_coeffs]; num_coeffs];
    let mut b = vec![0.0; num_coeffs];

    // normal equations
    for i in 0..num_coeffs {
        for j in 0..num_coeffs {
            a[i][j] = x_values.iter().map(|&x| x.powi((i + j) as i32)).sum();
        }
        b[i] = x_values
            .iter()
            .zip(y_values.iter())
            .map(|(&x, &y)| y * x.powi(i as i32))
            .sum();
    }

    solve_linear_system(a, b)
}

/// Evaluate a polynomial (coefficients in ascending order of power) by Horner's rule
pub fn evaluate_polynomial(x: f64, coeffs: &[f64]) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

fn horner_with_derivative(z: Complex64, coeffs: &[f64]) -> (Complex64, Complex64) {
    let mut p = Complex64::new(0.0, 0.0);
    let mut dp = Complex64::new(0.0, 0.0);
    for &c in coeffs.iter().rev() {
        dp = dp * z + p;
        p = p * z + c;
    }
    (p, dp)
}

/// All complex roots of a real polynomial
///
/// Coefficients are in ascending order of power. Uses the Aberth-Ehrlich simultaneous
/// iteration followed by a Newton polish of every root on the original polynomial.
/// Vanishing leading coefficients lower the degree.
pub fn polynomial_roots(coeffs: &[f64]) -> Result<Vec<Complex64>> {
    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(UtilsError::Math(
            "polynomial coefficients must be finite".to_string(),
        ));
    }
    let scale = coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if scale == 0.0 {
        return Err(UtilsError::Math("zero polynomial".to_string()));
    }

    let mut c: Vec<f64> = coeffs.iter().map(|v| v / scale).collect();
    while c.len() > 1 && c.last().is_some_and(|v| v.abs() < 1e-14) {
        c.pop();
    }

    let mut roots = Vec::new();
    // exact zero roots
    while c.len() > 1 && c[0] == 0.0 {
        roots.push(Complex64::new(0.0, 0.0));
        c.remove(0);
    }

    let n = c.len() - 1;
    if n == 0 {
        return Ok(roots);
    }
    let lead = c[n];
    let monic: Vec<f64> = c.iter().map(|v| v / lead).collect();

    // Fujiwara bound for the initial circle
    let mut bound = 0.0_f64;
    for i in 0..n {
        let a = monic[i].abs();
        let a = if i == 0 { a / 2.0 } else { a };
        bound = bound.max(a.powf(1.0 / (n - i) as f64));
    }
    let radius = (2.0 * bound).max(1e-3);

    let mut z: Vec<Complex64> = (0..n)
        .map(|k| Complex64::from_polar(radius * 0.5, 2.0 * PI * k as f64 / n as f64 + 0.4))
        .collect();

    let mut converged = false;
    for _ in 0..500 {
        let mut max_step = 0.0_f64;
        for k in 0..n {
            let (p, dp) = horner_with_derivative(z[k], &monic);
            if p.norm() == 0.0 {
                continue;
            }
            let ratio = p / dp;
            let sum: Complex64 = (0..n)
                .filter(|&j| j != k)
                .map(|j| Complex64::new(1.0, 0.0) / (z[k] - z[j]))
                .sum();
            let w = ratio / (Complex64::new(1.0, 0.0) - ratio * sum);
            if w.is_finite() {
                z[k] -= w;
                max_step = max_step.max(w.norm() / z[k].norm().max(1.0));
            }
        }
        if max_step < 1e-15 {
            converged = true;
            break;
        }
    }
    if !converged && z.iter().any(|v| !v.is_finite()) {
        return Err(UtilsError::NoConvergence(
            "polynomial root iteration diverged".to_string(),
        ));
    }

    for root in z.iter_mut() {
        for _ in 0..3 {
            let (p, dp) = horner_with_derivative(*root, &monic);
            if dp.norm() == 0.0 {
                break;
            }
            let step = p / dp;
            if !step.is_finite() {
                break;
            }
            *root -= step;
        }
    }

    roots.extend(z);
    Ok(roots)
}
