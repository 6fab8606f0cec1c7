//! Pairs of ellipses and the skew reduction that makes them upright enough
//! for the grid solvers to enumerate efficiently.

use num::{BigInt, One, Signed};

use crate::config::Context;
use crate::error::SynthError;
use crate::grid_op::SpecialGridOperator;
use crate::linalg::Mat2;
use crate::real::Real;
use crate::regions::Ellipse;

/// Upper bound on skew reduction steps in [optimize_skew]. Each step cuts
/// the skew by at least 10%, so this is never reached for sane inputs.
pub const MAX_SKEW_ITERATIONS: usize = 1000;

/// Skew below which a state counts as reduced.
const SKEW_THRESHOLD: i64 = 15;

/// A pair of ellipses (A, B). A grid operator G acts on it as
/// (G·A, G•·B).
#[derive(Clone, Debug)]
pub struct State {
    pub a: Ellipse,
    pub b: Ellipse,
}

impl State {
    pub fn new(a: Ellipse, b: Ellipse) -> State {
        State { a, b }
    }

    /// Sum of the squared off-diagonal entries of both ellipses.
    pub fn skew(&self) -> Real {
        let (x, y) = (self.a.d01(), self.b.d01());
        x * x + y * y
    }

    pub fn bias(&self) -> Real {
        self.b.z() - self.a.z()
    }

    /// The shift exponent that brings the bias into [-1, 1].
    pub fn determine_shift(&self, ctx: &Context) -> i64 {
        let k = ((ctx.one() - self.bias()).ldexp(-1)).floor();
        i64::try_from(k).unwrap_or(0)
    }

    pub fn apply(&self, g: &SpecialGridOperator, ctx: &Context) -> Result<State, SynthError> {
        Ok(State {
            a: g.apply_to_ellipse(&self.a, ctx)?,
            b: g.dot().apply_to_ellipse(&self.b, ctx)?,
        })
    }

    /// Act with k copies of σ on A and of τ on B.
    pub fn shift(&self, k: i64, ctx: &Context) -> Result<State, SynthError> {
        Ok(State {
            a: self.a.transformed(&sigma(k, ctx), ctx)?,
            b: self.b.transformed(&tau(k, ctx), ctx)?,
        })
    }
}

/// σᵏ, where σ = λ^{-1/2}·diag(λ, 1).
pub fn sigma(k: i64, ctx: &Context) -> Mat2 {
    let n = k.abs();
    let s = ctx.sqrt_lambda_inv.powi(n);
    let l = ctx.lambda.powi(n);
    if k < 0 {
        Mat2::diag(ctx.one(), l).scale(&s)
    } else {
        Mat2::diag(l, ctx.one()).scale(&s)
    }
}

/// τᵏ, where τ = λ^{-1/2}·diag(1, -λ).
pub fn tau(k: i64, ctx: &Context) -> Mat2 {
    let n = k.abs();
    let s = ctx.sqrt_lambda_inv.powi(n);
    let l = ctx.lambda.powi(n);
    let sign = if n % 2 == 0 { ctx.one() } else { -ctx.one() };
    if k < 0 {
        Mat2::diag(l, sign).scale(&s)
    } else {
        Mat2::diag(ctx.one(), sign * l).scale(&s)
    }
}

fn in_box(z: &Real, zeta: &Real, bound: &Real, tol: &Real) -> bool {
    let lo = -bound;
    z.ge_tol(&lo, tol) && z.le_tol(bound, tol) && zeta.ge_tol(&lo, tol) && zeta.le_tol(bound, tol)
}

/// max(1, ⌊λ^c / 2⌋) for c the integer part of min(z, ζ) in absolute value.
fn shear_power(z: &Real, zeta: &Real, ctx: &Context) -> BigInt {
    let c = z.min(zeta).trunc().abs();
    let c = i64::try_from(c).unwrap_or(i64::MAX);
    let n = ctx.lambda.powi(c).ldexp(-1).floor();
    n.max(BigInt::one())
}

/// Reduce the skew of `state` by at least 10% and return the operator that
/// did so. States with skew below the threshold are left alone.
pub fn reduce_skew(state: &mut State, ctx: &Context) -> Result<SpecialGridOperator, SynthError> {
    let initial_skew = state.skew();
    if initial_skew < ctx.real(SKEW_THRESHOLD) {
        return Ok(SpecialGridOperator::id());
    }

    let mut k = 0;
    if state.bias().abs() > ctx.one() {
        k = state.determine_shift(ctx);
        *state = state.shift(k, ctx)?;
    }

    let mut g = SpecialGridOperator::id();
    let mut step = |op: SpecialGridOperator, state: &mut State, name: &str| -> Result<(), SynthError> {
        log::trace!("reduce_skew: {name}");
        *state = state.apply(&op, ctx)?;
        g = &g * &op;
        Ok(())
    };

    if (state.b.z() + state.a.z()).is_negative() {
        step(SpecialGridOperator::x(), state, "X")?;
    }
    if state.b.d01().is_negative() {
        step(SpecialGridOperator::z(), state, "Z")?;
    }

    let tol = &ctx.tol;
    let (z, zeta) = (state.a.z().clone(), state.b.z().clone());
    let (p8, p3, m2) = (ctx.ratio(8, 10), ctx.ratio(3, 10), ctx.ratio(-2, 10));
    if !state.a.d01().is_negative() {
        if in_box(&z, &zeta, &p8, tol) {
            step(SpecialGridOperator::r(), state, "R")?;
        } else if z.le_tol(&p3, tol) && zeta.ge_tol(&p8, tol) {
            step(SpecialGridOperator::k(), state, "K")?;
        } else if z.ge_tol(&p3, tol) && zeta.ge_tol(&p3, tol) {
            let n = shear_power(&z, &zeta, ctx);
            step(SpecialGridOperator::a(&n), state, "A")?;
        } else if z.ge_tol(&p8, tol) && zeta.le_tol(&p3, tol) {
            step(SpecialGridOperator::k().dot(), state, "K•")?;
        } else {
            return Err(SynthError::internal(format!(
                "no skew reduction applies to z = {z:.6}, zeta = {zeta:.6}"
            )));
        }
    } else if in_box(&z, &zeta, &p8, tol) {
        step(SpecialGridOperator::r(), state, "R")?;
    } else if z.ge_tol(&m2, tol) && zeta.ge_tol(&m2, tol) {
        let n = shear_power(&z, &zeta, ctx);
        step(SpecialGridOperator::b(&n), state, "B")?;
    } else {
        return Err(SynthError::internal(format!(
            "no skew reduction applies to z = {z:.6}, zeta = {zeta:.6}"
        )));
    }

    *state = state.shift(k, ctx)?;

    let new_skew = state.skew();
    if new_skew > &initial_skew * &ctx.ratio(9, 10) {
        return Err(SynthError::internal(format!(
            "skew went from {initial_skew:.6} to {new_skew:.6}, less than a 10% reduction"
        )));
    }

    Ok(g.shift(k))
}

/// Find a special grid operator G making the state (G·A, G•·B) nearly
/// upright. The state is left transformed by G at its original scale.
pub fn optimize_skew(state: &mut State, ctx: &Context) -> Result<SpecialGridOperator, SynthError> {
    let scale_a = state.a.normalize(ctx);
    let scale_b = state.b.normalize(ctx);

    let threshold = ctx.real(SKEW_THRESHOLD);
    let mut g = SpecialGridOperator::id();
    let mut iterations = 0;
    while state.skew() >= threshold {
        if iterations >= MAX_SKEW_ITERATIONS {
            return Err(SynthError::internal(format!(
                "skew still {:.6} after {MAX_SKEW_ITERATIONS} reductions",
                state.skew()
            )));
        }
        g = &g * &reduce_skew(state, ctx)?;
        iterations += 1;
    }
    log::debug!("skew optimized in {iterations} steps");

    state.a.rescale(&(ctx.one() / scale_a), ctx);
    state.b.rescale(&(ctx.one() / scale_b), ctx);
    Ok(g)
}
