// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small numeric optimizers used by the layout solver.
//!
//! They work on dense `f64` slices and iterate deterministically (no randomness).

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// Errors reported by [`bisect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BisectError {
    /// `f(a)` and `f(b)` have the same sign, so the interval does not bracket a root.
    SameSign,
}

impl fmt::Display for BisectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameSign => f.write_str("interval endpoints have the same sign"),
        }
    }
}

impl core::error::Error for BisectError {}

/// Options for [`bisect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BisectParams {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Stop once the half-interval is smaller than this.
    pub tolerance: f64,
}

impl Default for BisectParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }
}

/// Finds a root of `f` in `[a, b]` by repeated halving.
///
/// The endpoints must bracket a root: `f(a)` and `f(b)` may not share a sign.
pub fn bisect(
    mut f: impl FnMut(f64) -> f64,
    mut a: f64,
    b: f64,
    params: BisectParams,
) -> Result<f64, BisectError> {
    let fa = f(a);
    let fb = f(b);
    if fa * fb > 0.0 {
        return Err(BisectError::SameSign);
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }

    let mut delta = b - a;
    for _ in 0..params.max_iterations {
        delta /= 2.0;
        let mid = a + delta;
        let fmid = f(mid);
        if fmid * fa >= 0.0 {
            a = mid;
        }
        if delta.abs() < params.tolerance || fmid == 0.0 {
            return Ok(mid);
        }
    }
    Ok(a + delta)
}

/// Options for [`nelder_mead`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NelderMeadParams {
    /// Iteration cap. `None` means `200 * dimension`.
    pub max_iterations: Option<usize>,
    /// Relative offset applied to non-zero coordinates when seeding the simplex.
    pub non_zero_delta: f64,
    /// Absolute offset applied to zero coordinates when seeding the simplex.
    pub zero_delta: f64,
    /// Converged once best and worst values differ by less than this.
    pub min_error_delta: f64,
    /// Converged once the two best vertices are closer than this in every coordinate.
    pub min_tolerance: f64,
    /// Reflection coefficient.
    pub rho: f64,
    /// Expansion coefficient.
    pub chi: f64,
    /// Contraction coefficient.
    pub psi: f64,
    /// Shrink coefficient.
    pub sigma: f64,
}

impl Default for NelderMeadParams {
    fn default() -> Self {
        Self {
            max_iterations: None,
            non_zero_delta: 1.05,
            zero_delta: 0.001,
            min_error_delta: 1e-6,
            min_tolerance: 1e-6,
            rho: 1.0,
            chi: 2.0,
            psi: -0.5,
            sigma: 0.5,
        }
    }
}

impl NelderMeadParams {
    /// Sets the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Sets both convergence thresholds to `delta`.
    pub fn with_convergence(mut self, delta: f64) -> Self {
        self.min_error_delta = delta;
        self.min_tolerance = delta;
        self
    }
}

/// Result of a minimization.
#[derive(Clone, Debug, PartialEq)]
pub struct Minimum {
    /// Best parameters found.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub fx: f64,
    /// Iterations consumed.
    pub iterations: usize,
}

#[derive(Clone, Debug)]
struct Vertex {
    x: Vec<f64>,
    fx: f64,
}

fn combine(w1: f64, v1: &[f64], w2: f64, v2: &[f64]) -> Vec<f64> {
    v1.iter().zip(v2).map(|(a, b)| w1 * a + w2 * b).collect()
}

/// Minimizes `f` starting at `x0` with the downhill simplex method.
pub fn nelder_mead(
    mut f: impl FnMut(&[f64]) -> f64,
    x0: &[f64],
    params: &NelderMeadParams,
) -> Minimum {
    let n = x0.len();
    if n == 0 {
        return Minimum {
            x: Vec::new(),
            fx: f(x0),
            iterations: 0,
        };
    }
    let max_iterations = params.max_iterations.unwrap_or(n * 200);

    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(Vertex {
        x: x0.to_vec(),
        fx: f(x0),
    });
    for i in 0..n {
        let mut x = x0.to_vec();
        x[i] = if x[i] != 0.0 {
            x[i] * params.non_zero_delta
        } else {
            params.zero_delta
        };
        let fx = f(&x);
        simplex.push(Vertex { x, fx });
    }

    let mut centroid = vec![0.0; n];
    let mut iterations = 0;
    while iterations < max_iterations {
        iterations += 1;
        simplex.sort_by(|a, b| a.fx.total_cmp(&b.fx));

        let max_diff = simplex[0]
            .x
            .iter()
            .zip(&simplex[1].x)
            .fold(0.0_f64, |m, (a, b)| m.max((a - b).abs()));
        if (simplex[0].fx - simplex[n].fx).abs() < params.min_error_delta
            && max_diff < params.min_tolerance
        {
            break;
        }

        for (i, c) in centroid.iter_mut().enumerate() {
            *c = simplex[..n].iter().map(|v| v.x[i]).sum::<f64>() / n as f64;
        }

        let worst = simplex[n].clone();
        let reflected_x = combine(1.0 + params.rho, &centroid, -params.rho, &worst.x);
        let reflected = Vertex {
            fx: f(&reflected_x),
            x: reflected_x,
        };

        if reflected.fx < simplex[0].fx {
            let expanded_x = combine(1.0 + params.chi, &centroid, -params.chi, &worst.x);
            let expanded_fx = f(&expanded_x);
            simplex[n] = if expanded_fx < reflected.fx {
                Vertex {
                    x: expanded_x,
                    fx: expanded_fx,
                }
            } else {
                reflected
            };
        } else if reflected.fx >= simplex[n - 1].fx {
            let contracted_x = if reflected.fx > worst.fx {
                combine(1.0 + params.psi, &centroid, -params.psi, &worst.x)
            } else {
                combine(
                    1.0 - params.psi * params.rho,
                    &centroid,
                    params.psi * params.rho,
                    &worst.x,
                )
            };
            let contracted_fx = f(&contracted_x);
            let threshold = if reflected.fx > worst.fx {
                worst.fx
            } else {
                reflected.fx
            };

            if contracted_fx < threshold {
                simplex[n] = Vertex {
                    x: contracted_x,
                    fx: contracted_fx,
                };
            } else {
                if params.sigma >= 1.0 {
                    break;
                }
                let best = simplex[0].x.clone();
                for vertex in &mut simplex[1..] {
                    vertex.x = combine(1.0 - params.sigma, &best, params.sigma, &vertex.x);
                    vertex.fx = f(&vertex.x);
                }
            }
        } else {
            simplex[n] = reflected;
        }
    }

    simplex.sort_by(|a, b| a.fx.total_cmp(&b.fx));
    let best = simplex.swap_remove(0);
    Minimum {
        x: best.x,
        fx: best.fx,
        iterations,
    }
}

/// A point together with the objective value and gradient evaluated there.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientPoint {
    /// Parameters.
    pub x: Vec<f64>,
    /// Objective value.
    pub fx: f64,
    /// Gradient.
    pub fxprime: Vec<f64>,
}

impl GradientPoint {
    fn zeros(n: usize) -> Self {
        Self {
            x: vec![0.0; n],
            fx: 0.0,
            fxprime: vec![0.0; n],
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm2(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Options for [`conjugate_gradient`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConjugateGradientParams {
    /// Iteration cap. `None` means `20 * dimension`.
    pub max_iterations: Option<usize>,
    /// Initial line-search step. `None` means `1`.
    pub learn_rate: Option<f64>,
}

/// Minimizes a differentiable `f` using Polak–Ribière conjugate gradients.
///
/// `f(x, grad)` must return the objective at `x` and write the gradient into `grad`.
pub fn conjugate_gradient(
    mut f: impl FnMut(&[f64], &mut [f64]) -> f64,
    initial: &[f64],
    params: ConjugateGradientParams,
) -> GradientPoint {
    let n = initial.len();
    let max_iterations = params.max_iterations.unwrap_or(n * 20);
    let mut step = params.learn_rate.unwrap_or(1.0);

    let mut current = GradientPoint {
        x: initial.to_vec(),
        fx: 0.0,
        fxprime: vec![0.0; n],
    };
    let mut next = GradientPoint::zeros(n);
    current.fx = f(&current.x, &mut current.fxprime);

    let mut pk: Vec<f64> = current.fxprime.iter().map(|g| -g).collect();
    let mut yk = vec![0.0; n];

    for _ in 0..max_iterations {
        step = wolfe_line_search(&mut f, &pk, &current, &mut next, step);
        if step == 0.0 {
            for (p, g) in pk.iter_mut().zip(&current.fxprime) {
                *p = -g;
            }
        } else {
            for ((y, a), b) in yk.iter_mut().zip(&next.fxprime).zip(&current.fxprime) {
                *y = a - b;
            }
            let delta_k = dot(&current.fxprime, &current.fxprime);
            let beta_k = (dot(&yk, &next.fxprime) / delta_k).max(0.0);
            for (p, g) in pk.iter_mut().zip(&next.fxprime) {
                *p = beta_k * *p - g;
            }
            core::mem::swap(&mut current, &mut next);
        }

        if norm2(&current.fxprime) <= 1e-5 {
            break;
        }
    }
    current
}

const WOLFE_C1: f64 = 1e-6;
const WOLFE_C2: f64 = 0.1;

/// Evaluates `f` at `current.x + a * pk` into `next`, returning the value and the
/// directional derivative.
fn probe(
    f: &mut impl FnMut(&[f64], &mut [f64]) -> f64,
    pk: &[f64],
    current: &GradientPoint,
    next: &mut GradientPoint,
    a: f64,
) -> (f64, f64) {
    for ((nx, cx), p) in next.x.iter_mut().zip(&current.x).zip(pk) {
        *nx = cx + a * p;
    }
    next.fx = f(&next.x, &mut next.fxprime);
    (next.fx, dot(&next.fxprime, pk))
}

fn zoom(
    f: &mut impl FnMut(&[f64], &mut [f64]) -> f64,
    pk: &[f64],
    current: &GradientPoint,
    next: &mut GradientPoint,
    [mut a_lo, mut a_high]: [f64; 2],
    mut phi_lo: f64,
) -> f64 {
    let phi0 = current.fx;
    let phi_prime0 = dot(&current.fxprime, pk);
    for _ in 0..16 {
        let a = (a_lo + a_high) / 2.0;
        let (phi, phi_prime) = probe(f, pk, current, next, a);
        if phi > phi0 + WOLFE_C1 * a * phi_prime0 || phi >= phi_lo {
            a_high = a;
        } else {
            if phi_prime.abs() <= -WOLFE_C2 * phi_prime0 {
                return a;
            }
            if phi_prime * (a_high - a_lo) >= 0.0 {
                a_high = a_lo;
            }
            a_lo = a;
            phi_lo = phi;
        }
    }
    0.0
}

/// Searches along `pk` from `current` for a step satisfying the strong Wolfe conditions.
///
/// On success `next` holds the accepted point and the step length is returned. A return of
/// `0` means no acceptable step was found.
pub fn wolfe_line_search(
    f: &mut impl FnMut(&[f64], &mut [f64]) -> f64,
    pk: &[f64],
    current: &GradientPoint,
    next: &mut GradientPoint,
    step: f64,
) -> f64 {
    let phi0 = current.fx;
    let phi_prime0 = dot(&current.fxprime, pk);

    let mut a0 = 0.0;
    let mut a = if step == 0.0 { 1.0 } else { step };
    let mut phi_old = phi0;
    for iteration in 0..10 {
        let (phi, phi_prime) = probe(f, pk, current, next, a);
        if phi > phi0 + WOLFE_C1 * a * phi_prime0 || (iteration > 0 && phi >= phi_old) {
            return zoom(f, pk, current, next, [a0, a], phi_old);
        }
        if phi_prime.abs() <= -WOLFE_C2 * phi_prime0 {
            return a;
        }
        if phi_prime >= 0.0 {
            return zoom(f, pk, current, next, [a, a0], phi);
        }
        phi_old = phi;
        a0 = a;
        a *= 2.0;
    }
    0.0
}
