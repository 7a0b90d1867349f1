//! Bounded Nelder-Mead simplex minimization
//!
//! Used for maximum-likelihood parameter estimation where no analytic
//! gradient is available. The search is fully deterministic: the initial
//! simplex is built from the starting point with a fixed step.

use crate::{MathError, Result};
use std::cmp::Ordering;
use std::time::Instant;

/// Why the search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Objective spread or simplex size fell below tolerance
    Converged,
    /// Iteration budget exhausted before convergence
    MaxIterations,
    /// Caller deadline passed
    DeadlineExceeded,
}

/// Configuration for Nelder-Mead optimization
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values
    pub tolerance: f64,
    /// Absolute tolerance on the simplex diameter
    pub x_tolerance: f64,
    /// Initial simplex step for each coordinate
    pub initial_step: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
    /// Optional wall-clock deadline, checked once per iteration
    pub deadline: Option<Instant>,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            tolerance: 1e-9,
            x_tolerance: 1e-9,
            initial_step: 0.1,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            deadline: None,
        }
    }
}

/// Result of a Nelder-Mead run
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Stopping reason
    pub termination: Termination,
}

impl NelderMeadResult {
    /// Whether the search converged
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Minimize `objective` starting from `initial`.
///
/// `bounds`, when given, holds one `(min, max)` pair per coordinate and every
/// trial point is clamped into the box. Non-finite objective values are
/// treated as worse than any finite value.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> Result<NelderMeadResult>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Nelder-Mead needs at least one parameter".to_string(),
        ));
    }
    if let Some(b) = bounds {
        if b.len() != n {
            return Err(MathError::InvalidInput(format!(
                "Expected {} bounds, got {}",
                n,
                b.len()
            )));
        }
    }

    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let start = clamp(initial, bounds);
    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        vertex[i] += config.initial_step;
        // Step the other way if the bound swallowed the move
        if let Some(b) = bounds {
            if vertex[i] > b[i].1 {
                vertex[i] = start[i] - config.initial_step;
            }
        }
        simplex.push(clamp(&vertex, bounds));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut termination = Termination::MaxIterations;

    while iterations < config.max_iter {
        if let Some(deadline) = config.deadline {
            if Instant::now() >= deadline {
                termination = Termination::DeadlineExceeded;
                break;
            }
        }
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let spread = values[worst] - values[best];
        if spread.is_finite() && spread <= config.tolerance * (1.0 + values[best].abs()) {
            termination = Termination::Converged;
            break;
        }

        let centroid = centroid_excluding(&simplex, worst);
        let diameter = simplex
            .iter()
            .map(|v| distance(v, &simplex[best]))
            .fold(0.0, f64::max);
        if diameter < config.x_tolerance {
            termination = Termination::Converged;
            break;
        }

        let reflected = clamp(&towards(&centroid, &simplex[worst], -config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = clamp(&towards(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < values[worst] {
            let outside = clamp(&towards(&centroid, &reflected, config.rho), bounds);
            let value = eval(&outside);
            (outside, value)
        } else {
            let inside = clamp(&towards(&centroid, &simplex[worst], config.rho), bounds);
            let value = eval(&inside);
            (inside, value)
        };

        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink towards the best vertex
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk = towards(&anchor, &simplex[i], config.sigma);
            simplex[i] = clamp(&shrunk, bounds);
            values[i] = eval(&simplex[i]);
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    Ok(NelderMeadResult {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        termination,
    })
}

/// `origin + t * (point - origin)`
fn towards(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn centroid_excluding(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let dims = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; dims];
    for (i, vertex) in simplex.iter().enumerate() {
        if i == exclude {
            continue;
        }
        for (c, v) in centroid.iter_mut().zip(vertex) {
            *c += v;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .zip(b)
            .map(|(x, (lo, hi))| x.clamp(*lo, *hi))
            .collect(),
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
