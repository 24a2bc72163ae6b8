//! Small numeric helpers shared by extraction and isotope subtraction.

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be ascending. Values left of `xp[0]` yield `left`, right of the
/// last point yield `right`; an empty table yields `left`.
pub fn interp(x: f64, xp: &[f64], fp: &[f64], left: f64, right: f64) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || x.is_nan() {
        return left;
    }
    if x < xp[0] {
        return left;
    }
    if x > xp[n - 1] {
        return right;
    }
    if n == 1 {
        return fp[0];
    }
    let j = xp[..n].partition_point(|&v| v <= x);
    if j >= n {
        return fp[n - 1];
    }
    let i = j - 1;
    let dx = xp[j] - xp[i];
    if dx == 0.0 {
        return fp[j];
    }
    fp[i] + (fp[j] - fp[i]) * (x - xp[i]) / dx
}

/// Trapezoidal integral of `y` over `x`
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
