//! Differencing and integration of equally spaced series

/// Apply `d` rounds of first differencing.
///
/// Each round shortens the series by one value; a series that runs out of
/// values comes back empty.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` rounds of differencing for values that continue `original`.
///
/// `differenced` holds future values on the `d`-times differenced scale; the
/// last observed value at each intermediate level seeds the cumulative sums.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let seed = difference(original, level).last().copied().unwrap_or(0.0);
        let mut running = seed;
        result = result
            .iter()
            .map(|step| {
                running += step;
                running
            })
            .collect();
    }
    result
}

/// Coefficients of `(1 - B)^d` as a lag polynomial, constant term first
pub fn difference_polynomial(d: usize) -> Vec<f64> {
    let mut coefficients = vec![1.0];
    for _ in 0..d {
        let mut next = vec![0.0; coefficients.len() + 1];
        for (i, c) in coefficients.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        coefficients = next;
    }
    coefficients
}

/// Multiply two lag polynomials given constant term first
pub fn multiply_polynomials(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

/// True when every value lies within `tolerance` of the first one
pub fn is_constant(values: &[f64], tolerance: f64) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| (v - first).abs() <= tolerance),
        None => true,
    }
}
