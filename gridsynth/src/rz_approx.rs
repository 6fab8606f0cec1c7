//! Search for an exact Clifford+T unitary whose top-left entry is within ε
//! of e^{iθ}.
//!
//! The candidates u/√2ᵏ must lie in the ε-region of the unit circle around
//! e^{iθ} while u• stays in the unit disk scaled by (-√2)ᵏ. After making
//! that pair of regions upright with [optimize_skew], each k becomes a 2D
//! grid problem. For each candidate u the Diophantine solver looks for t
//! with |u|² + |t|² = 2ᵏ, which completes the unitary.

use num::{BigInt, One};
use rand::rngs::SmallRng;

use crate::config::Context;
use crate::diophantine::diophantine_solver;
use crate::error::SynthError;
use crate::grid_op::SpecialGridOperator;
use crate::grid_solvers::{twod_grid_solver, twod_grid_solver_ellipse_fatten};
use crate::matrix::DOmegaMatrix;
use crate::real::{sin_cos, Real};
use crate::regions::Ellipse;
use crate::rings::{ZOmega, ZSqrt2};
use crate::states::{optimize_skew, State};

/// A unitary [[u, -t̄], [t, ū]]/√2ᵏ together with the numerical values of
/// its entries and the target it approximates.
#[derive(Clone, Debug)]
pub struct RzApproximation {
    matrix: DOmegaMatrix,
    eps: Real,
    u_val: (Real, Real),
    t_val: (Real, Real),
    z: (Real, Real),
}

impl RzApproximation {
    fn new(u: ZOmega, t: ZOmega, k: i64, theta: &Real, ctx: &Context) -> Result<RzApproximation, SynthError> {
        let matrix = DOmegaMatrix::new(u, t, k, 0)
            .map_err(|e| SynthError::internal(format!("approximation is not unitary: {e}")))?;
        let scale = ctx.sqrt2.powi(matrix.k());
        let value = |z: &ZOmega| {
            let (re, im) = z.decimal(ctx);
            (re / &scale, im / &scale)
        };
        let (s, c) = sin_cos(theta);
        Ok(RzApproximation {
            u_val: value(matrix.u()),
            t_val: value(matrix.t()),
            matrix,
            eps: ctx.eps.clone(),
            z: (c, s),
        })
    }

    /// The exact answer for θ = 0.
    pub fn identity(theta: &Real, ctx: &Context) -> Result<RzApproximation, SynthError> {
        RzApproximation::new(ZOmega::one(), ZOmega::zero(), 0, theta, ctx)
    }

    pub fn matrix(&self) -> &DOmegaMatrix {
        &self.matrix
    }

    pub fn into_matrix(self) -> DOmegaMatrix {
        self.matrix
    }

    pub fn u(&self) -> &ZOmega {
        self.matrix.u()
    }

    pub fn t(&self) -> &ZOmega {
        self.matrix.t()
    }

    /// u/√2ᵏ as (re, im).
    pub fn u_val(&self) -> &(Real, Real) {
        &self.u_val
    }

    /// t/√2ᵏ as (re, im).
    pub fn t_val(&self) -> &(Real, Real) {
        &self.t_val
    }

    pub fn scale_exponent(&self) -> i64 {
        self.matrix.k()
    }

    pub fn eps(&self) -> &Real {
        &self.eps
    }

    /// Operator norm distance, up to a constant, to diag(e^{iθ}, e^{-iθ}):
    /// √(|u/√2ᵏ - e^{iθ}|² + |t/√2ᵏ|²).
    pub fn error(&self) -> Real {
        let dx = &self.u_val.0 - &self.z.0;
        let dy = &self.u_val.1 - &self.z.1;
        let (tx, ty) = &self.t_val;
        (&dx * &dx + &dy * &dy + tx * tx + ty * ty).sqrt()
    }
}

/// Scale factors (√2ᵏ, (-√2)ᵏ) for the two ellipses at level k.
fn level_scales(k: u32, ctx: &Context) -> (Real, Real) {
    let half = Real::pow2((k / 2) as i64, ctx.prec);
    if k % 2 == 0 {
        (half.clone(), half)
    } else {
        let s = half * &ctx.sqrt2;
        let neg = -&s;
        (s, neg)
    }
}

/// Everything a single grid point is checked against.
struct Target<'a> {
    theta: &'a Real,
    cos: Real,
    sin: Real,
    threshold: Real,
    op: SpecialGridOperator,
    ctx: &'a Context,
}

impl Target<'_> {
    /// Map a scaled grid point back, test it against the ε-region and, if
    /// it passes, try to complete it to a unitary.
    fn try_point(
        &self,
        point: &ZOmega,
        k: u32,
        scale: &Real,
        rng: &mut SmallRng,
    ) -> Result<Option<RzApproximation>, SynthError> {
        let ctx = self.ctx;
        let candidate = &self.op * point;
        let (re, im) = candidate.decimal(ctx);
        let proj = (re * &self.cos + im * &self.sin) / scale;
        if proj <= self.threshold {
            return Ok(None);
        }

        let mut u = candidate;
        let mut k = k as i64;
        while u.is_reducible() {
            u = u.reduce();
            k -= 1;
        }
        if k < 0 {
            return Ok(None);
        }

        let two_k = ZSqrt2::from_int(BigInt::one() << (k as usize));
        let xi = &two_k - &(&u * &u.conj()).to_zsqrt2()?;
        log::trace!("k = {k}: trying xi = {xi}");
        match diophantine_solver(&xi, ctx, rng)? {
            Some(t) => Ok(Some(RzApproximation::new(u, t, k, self.theta, ctx)?)),
            None => Ok(None),
        }
    }
}

fn prepare<'a>(theta: &'a Real, ctx: &'a Context) -> Result<(Target<'a>, State), SynthError> {
    let mut state = State::new(Ellipse::epsilon_region(theta, &ctx.eps, ctx), Ellipse::unit_disk(ctx));
    let op = optimize_skew(&mut state, ctx)?;
    let (sin, cos) = sin_cos(theta);
    let threshold = ctx.one() - (&ctx.eps * &ctx.eps).ldexp(-1);
    Ok((Target { theta, cos, sin, threshold, op, ctx }, state))
}

/// Find a Clifford+T unitary with top-left entry within ε of e^{iθ}, using
/// the grid points of the fattened bounding boxes at each level.
///
/// `Ok(None)` when no level up to `ctx.kmax` produced a solution.
pub fn find_fast_rz_approximation(
    theta: &Real,
    ctx: &Context,
    rng: &mut SmallRng,
) -> Result<Option<RzApproximation>, SynthError> {
    let (target, state) = prepare(theta, ctx)?;
    let bbox_a = state.a.bounding_box();
    let bbox_b = state.b.bounding_box();

    for k in ctx.kmin..=ctx.kmax {
        let (scale_a, scale_b) = level_scales(k, ctx);
        let a = bbox_a.rescale(&scale_a).fatten(&ctx.eps);
        let b = bbox_b.rescale(&scale_b).fatten(&ctx.eps);
        let points = twod_grid_solver(&a, &b, ctx);
        log::debug!("k = {k}: {} grid points", points.len());
        for p in &points {
            if let Some(approx) = target.try_point(p, k, &scale_a, rng)? {
                log::debug!("found approximation at k = {k}");
                return Ok(Some(approx));
            }
        }
    }
    Ok(None)
}

/// As [find_fast_rz_approximation], but filtering the grid points by exact
/// membership in the scaled ellipses. Slower; kept as a reference search.
pub fn find_rz_approximation(
    theta: &Real,
    ctx: &Context,
    rng: &mut SmallRng,
) -> Result<Option<RzApproximation>, SynthError> {
    if theta.abs() < ctx.tol {
        return RzApproximation::identity(theta, ctx).map(Some);
    }
    let (target, state) = prepare(theta, ctx)?;

    for k in ctx.kmin..=ctx.kmax {
        let (scale_a, scale_b) = level_scales(k, ctx);
        let mut scaled = state.clone();
        scaled.a.rescale(&scale_a, ctx);
        scaled.b.rescale(&scale_b, ctx);
        let points = twod_grid_solver_ellipse_fatten(&scaled, &ctx.eps, ctx);
        log::debug!("k = {k}: {} points in region", points.len());
        for p in &points {
            if let Some(approx) = target.try_point(p, k, &scale_a, rng)? {
                return Ok(Some(approx));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::GridSynthOptions;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rstest::rstest;

    fn ctx(digits: u32) -> Context {
        Context::new(&GridSynthOptions { precision: digits, factor_effort: 2000, ..Default::default() }).unwrap()
    }

    fn theta(x: f64, ctx: &Context) -> Real {
        Real::from_f64(x, ctx.prec)
    }

    #[test]
    fn level_scales_alternate_sign() {
        let ctx = ctx(3);
        let (a, b) = level_scales(0, &ctx);
        assert_eq!(a, ctx.one());
        assert_eq!(b, ctx.one());
        let (a, b) = level_scales(3, &ctx);
        assert_abs_diff_eq!(a.to_f64(), 2.0 * std::f64::consts::SQRT_2, epsilon = 1e-12);
        assert_eq!(b, -a);
        let (a, _) = level_scales(4, &ctx);
        assert_eq!(a, ctx.real(4));
    }

    #[rstest]
    #[case(0.31, 3)]
    #[case(-1.1, 3)]
    #[case(2.0, 5)]
    #[case(0.1, 8)]
    fn fast_search_meets_accuracy(#[case] t: f64, #[case] digits: u32) {
        let ctx = ctx(digits);
        let mut rng = SmallRng::seed_from_u64(1);
        let approx = find_fast_rz_approximation(&theta(t, &ctx), &ctx, &mut rng).unwrap().unwrap();
        assert!(approx.error() <= ctx.eps, "error {} > eps", approx.error());
        assert!(approx.matrix().is_unitary());
        // the top-left entry points in direction θ
        let (re, im) = approx.u_val();
        assert_abs_diff_eq!(re.to_f64(), t.cos(), epsilon = 10f64.powi(-(digits as i32)));
        assert_abs_diff_eq!(im.to_f64(), t.sin(), epsilon = 10f64.powi(-(digits as i32)));
    }

    #[test]
    fn exact_search_agrees_on_accuracy() {
        let ctx = ctx(3);
        let mut rng = SmallRng::seed_from_u64(5);
        let approx = find_rz_approximation(&theta(0.7, &ctx), &ctx, &mut rng).unwrap().unwrap();
        assert!(approx.error() <= ctx.eps);
    }

    #[test]
    fn zero_angle_is_exact_identity() {
        let ctx = ctx(3);
        let mut rng = SmallRng::seed_from_u64(0);
        let approx = find_rz_approximation(&ctx.zero(), &ctx, &mut rng).unwrap().unwrap();
        assert_eq!(approx.matrix(), &DOmegaMatrix::identity());
        assert!(approx.error().is_zero());
        assert_eq!(approx.scale_exponent(), 0);
    }

    #[test]
    fn tiny_kmax_exhausts_search() {
        let options = GridSynthOptions { precision: 8, kmax: 2, ..Default::default() };
        let ctx = Context::new(&options).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let found = find_fast_rz_approximation(&theta(0.31, &ctx), &ctx, &mut rng).unwrap();
        assert!(found.is_none());
    }

    #[rstest]
    #[case(0.7, 8)]
    #[case(-2.3, 10)]
    fn high_precision_search_finishes_quickly(#[case] t: f64, #[case] digits: u32) {
        let ctx = ctx(digits);
        let mut rng = SmallRng::seed_from_u64(3);
        let start = std::time::Instant::now();
        let approx = find_fast_rz_approximation(&theta(t, &ctx), &ctx, &mut rng).unwrap().unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed.as_secs() < 60, "{digits} digits took {elapsed:?}");
        assert!(approx.error() <= ctx.eps, "error {} > eps", approx.error());
    }
}
