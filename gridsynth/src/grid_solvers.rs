//! Enumeration of the points of Z[√2] and Z[ω] whose two embeddings fall in
//! prescribed regions.
//!
//! A 1D grid problem asks for all x = a + b√2 with x ∈ A and x• ∈ B. Since
//! x - x• = 2b√2, the range of b is fixed by the two intervals, and for each
//! b the range of a follows from A alone. Every candidate is then filtered by
//! exact membership, so the bounds only need to be generous by `tol`.
//!
//! The 2D problems over Z[ω] split into two 1D problems per coordinate, one
//! for each parity of the ω coefficient.

use num::BigInt;

use crate::config::Context;
use crate::linalg::Vec2;
use crate::real::Real;
use crate::regions::{Ellipse, Interval, UprightRectangle};
use crate::rings::{ZOmega, ZSqrt2};
use crate::states::State;

fn lower_bound(x: &Real, tol: &Real) -> BigInt {
    (x - tol).ceil()
}

fn upper_bound(x: &Real, tol: &Real) -> BigInt {
    (x + tol).floor()
}

/// All x ∈ Z[√2] with x ∈ A and x• ∈ B.
pub fn oned_grid_solver(a: &Interval, b: &Interval, ctx: &Context) -> Vec<ZSqrt2> {
    let tol = &ctx.tol;
    let lower_b = lower_bound(&((a.lo() - b.hi()) * &ctx.half_inv_sqrt2), tol);
    let upper_b = upper_bound(&((a.hi() - b.lo()) * &ctx.half_inv_sqrt2), tol);

    let mut solns = vec![];
    let mut y = lower_b;
    while y <= upper_b {
        let y_sqrt2 = Real::from_int(y.clone(), ctx.prec) * &ctx.sqrt2;
        let mut x = lower_bound(&(a.lo() - &y_sqrt2), tol);
        let upper_a = upper_bound(&(a.hi() - &y_sqrt2), tol);
        while x <= upper_a {
            let candidate = ZSqrt2::new(x.clone(), y.clone());
            if a.contains(&candidate.decimal(ctx), tol) && b.contains(&candidate.decimal_dot(ctx), tol) {
                solns.push(candidate);
            }
            x += 1;
        }
        y += 1;
    }
    solns
}

/// The exponent k with λ⁻¹ <= λ⁻ᵏ·width < 1.
fn scale_exponent(width: &Real, ctx: &Context) -> i64 {
    let ratio = width.ln_f64() / ctx.log_lambda.to_f64();
    ratio.floor() as i64 + 1
}

/// Same solutions as [oned_grid_solver], found after rescaling A to width
/// below 1 by a power of λ. The enumeration then visits O(1) values of b
/// per unit of B's scaled width.
pub fn oned_scaled_grid_solver(a: &Interval, b: &Interval, ctx: &Context) -> Vec<ZSqrt2> {
    let width = a.width();
    if !width.is_positive() {
        return oned_grid_solver(a, b, ctx);
    }
    let k = scale_exponent(&width, ctx);
    let scaled_a = a * &ctx.lambda_inv.powi(k);
    let scaled_b = b * &(-&ctx.lambda).powi(k);
    let unscale = ZSqrt2::lambda_pow(k);
    oned_grid_solver(&scaled_a, &scaled_b, ctx)
        .into_iter()
        .map(|x| &x * &unscale)
        .collect()
}

/// Rescales whichever interval is wider, so the number of values of b
/// visited stays proportional to the product of the widths. When B is the
/// wider one the problem is solved for x• and conjugated back.
pub fn oned_optimal_grid_solver(a: &Interval, b: &Interval, ctx: &Context) -> Vec<ZSqrt2> {
    if a.width() >= b.width() {
        oned_scaled_grid_solver(a, b, ctx)
    } else {
        oned_scaled_grid_solver(b, a, ctx).iter().map(ZSqrt2::dot).collect()
    }
}

/// All u ∈ Z[ω] with u ∈ A and u• ∈ B, for upright rectangles A and B.
/// Solutions with an even ω coefficient come first.
pub fn twod_grid_solver(a: &UprightRectangle, b: &UprightRectangle, ctx: &Context) -> Vec<ZOmega> {
    let s = &ctx.inv_sqrt2;
    let mut solns = vec![];
    for w in [false, true] {
        let (ax, bx, ay, by) = if w {
            (&a.x - s, &b.x + s, &a.y - s, &b.y + s)
        } else {
            (a.x.clone(), b.x.clone(), a.y.clone(), b.y.clone())
        };
        let alphas = oned_optimal_grid_solver(&ax, &bx, ctx);
        if alphas.is_empty() {
            continue;
        }
        let betas = oned_optimal_grid_solver(&ay, &by, ctx);
        for alpha in &alphas {
            for beta in &betas {
                solns.push(ZOmega::from_alpha_beta(alpha, beta, w));
            }
        }
    }
    solns
}

fn ellipse_filter(candidates: Vec<ZOmega>, a: &Ellipse, b: &Ellipse, ctx: &Context) -> Vec<ZOmega> {
    let tol = &ctx.tol;
    candidates
        .into_iter()
        .filter(|u| {
            let (x, y) = u.decimal(ctx);
            let (xd, yd) = u.dot().decimal(ctx);
            a.contains(&Vec2::new(x, y), tol) && b.contains(&Vec2::new(xd, yd), tol)
        })
        .collect()
}

/// All u ∈ Z[ω] with u ∈ A and u• ∈ B, for ellipses A and B.
pub fn twod_grid_solver_ellipse(a: &Ellipse, b: &Ellipse, ctx: &Context) -> Vec<ZOmega> {
    let candidates = twod_grid_solver(&a.bounding_box(), &b.bounding_box(), ctx);
    ellipse_filter(candidates, a, b, ctx)
}

pub fn twod_grid_solver_state(state: &State, ctx: &Context) -> Vec<ZOmega> {
    twod_grid_solver_ellipse(&state.a, &state.b, ctx)
}

/// Like [twod_grid_solver_state], but searches bounding boxes widened by
/// `eps` so points on the rim of either ellipse are not lost to rounding.
pub fn twod_grid_solver_ellipse_fatten(state: &State, eps: &Real, ctx: &Context) -> Vec<ZOmega> {
    let bbox_a = state.a.bounding_box().fatten(eps);
    let bbox_b = state.b.bounding_box().fatten(eps);
    let candidates = twod_grid_solver(&bbox_a, &bbox_b, ctx);
    ellipse_filter(candidates, &state.a, &state.b, ctx)
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn ctx() -> Context {
        Context::with_digits(10).unwrap()
    }

    fn interval(lo: f64, hi: f64, ctx: &Context) -> Interval {
        Interval::new(Real::from_f64(lo, ctx.prec), Real::from_f64(hi, ctx.prec)).unwrap()
    }

    fn key(x: &ZSqrt2) -> (String, String) {
        (x.a.to_string(), x.b.to_string())
    }

    fn brute_force(a: &Interval, b: &Interval, ctx: &Context) -> BTreeSet<(String, String)> {
        let mut out = BTreeSet::new();
        for x in -60i64..=60 {
            for y in -60i64..=60 {
                let c = ZSqrt2::new(x, y);
                if a.contains(&c.decimal(ctx), &ctx.tol) && b.contains(&c.decimal_dot(ctx), &ctx.tol) {
                    out.insert(key(&c));
                }
            }
        }
        out
    }

    #[rstest]
    #[case((-1.0, 1.0), (-1.0, 1.0))]
    #[case((0.3, 4.7), (-2.0, -0.5))]
    #[case((10.0, 12.5), (-3.0, 3.0))]
    #[case((-0.1, 0.1), (-20.0, 20.0))]
    #[case((0.25, 0.26), (0.0, 0.1))]
    fn oned_solvers_match_brute_force(#[case] a: (f64, f64), #[case] b: (f64, f64)) {
        let ctx = ctx();
        let (a, b) = (interval(a.0, a.1, &ctx), interval(b.0, b.1, &ctx));
        let expected = brute_force(&a, &b, &ctx);
        let plain: BTreeSet<_> = oned_grid_solver(&a, &b, &ctx).iter().map(key).collect();
        let scaled: BTreeSet<_> = oned_scaled_grid_solver(&a, &b, &ctx).iter().map(key).collect();
        let optimal: BTreeSet<_> = oned_optimal_grid_solver(&a, &b, &ctx).iter().map(key).collect();
        assert_eq!(plain, expected);
        assert_eq!(scaled, expected);
        assert_eq!(optimal, expected);
    }

    #[test]
    fn endpoints_are_included() {
        let ctx = ctx();
        // 1 + √2 sits exactly on the upper end of A
        let a = Interval::new(ctx.one(), &ctx.one() + &ctx.sqrt2).unwrap();
        let b = Interval::new(-&ctx.sqrt2, ctx.zero()).unwrap();
        let solns = oned_grid_solver(&a, &b, &ctx);
        assert!(solns.contains(&ZSqrt2::new(1, 1)));
    }

    #[rstest]
    #[case((0.0, 0.05), (-2000.0, 2000.0))]
    #[case((-300.0, 100.0), (0.4, 0.5))]
    fn lopsided_intervals_match_plain_solver(#[case] a: (f64, f64), #[case] b: (f64, f64)) {
        let ctx = ctx();
        let (a, b) = (interval(a.0, a.1, &ctx), interval(b.0, b.1, &ctx));
        let plain: BTreeSet<_> = oned_grid_solver(&a, &b, &ctx).iter().map(key).collect();
        let optimal: BTreeSet<_> = oned_optimal_grid_solver(&a, &b, &ctx).iter().map(key).collect();
        assert!(!plain.is_empty());
        assert_eq!(optimal, plain);
    }

    #[test]
    fn huge_narrow_pair_is_fast() {
        // the plain solver would visit about 10^9 values of b here
        let ctx = ctx();
        let a = interval(0.5, 0.5 + 1e-6, &ctx);
        let b = interval(-1.5e9, 1.5e9, &ctx);
        let start = std::time::Instant::now();
        let solns = oned_optimal_grid_solver(&a, &b, &ctx);
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
        for x in &solns {
            assert!(a.contains(&x.decimal(&ctx), &ctx.tol));
            assert!(b.contains(&x.decimal_dot(&ctx), &ctx.tol));
        }
    }

    #[test]
    fn empty_problem_is_not_an_error() {
        let ctx = ctx();
        let a = interval(0.1, 0.2, &ctx);
        let b = interval(0.1, 0.2, &ctx);
        assert!(oned_optimal_grid_solver(&a, &b, &ctx).is_empty());
    }

    #[rstest]
    #[case(1.0)]
    #[case(2.5)]
    fn disk_solutions_are_sound_and_complete(#[case] radius: f64) {
        let ctx = ctx();
        let r = Real::from_f64(radius, ctx.prec);
        let disk = Ellipse::from_axes(Vec2::zero(ctx.prec), r.clone(), r, ctx.zero(), &ctx);
        let solns = twod_grid_solver_ellipse(&disk, &disk, &ctx);
        for u in &solns {
            let (x, y) = u.to_f64();
            let (xd, yd) = u.dot().to_f64();
            assert!(x * x + y * y <= radius * radius + 1e-9);
            assert!(xd * xd + yd * yd <= radius * radius + 1e-9);
        }
        // brute force over small coefficients
        let mut count = 0;
        for a in -4i64..=4 {
            for b in -4i64..=4 {
                for c in -4i64..=4 {
                    for d in -4i64..=4 {
                        let u = ZOmega::new(a, b, c, d);
                        let (x, y) = u.to_f64();
                        let (xd, yd) = u.dot().to_f64();
                        if x * x + y * y <= radius * radius - 1e-9 && xd * xd + yd * yd <= radius * radius - 1e-9 {
                            assert!(solns.contains(&u), "missing {u}");
                            count += 1;
                        }
                    }
                }
            }
        }
        assert!(count >= 1);
        // the units ±1, ±i are in the unit disk under both embeddings
        assert!(solns.contains(&ZOmega::one()));
        assert!(solns.contains(&ZOmega::i()));
    }

    #[test]
    fn fattened_search_keeps_rim_points() {
        let ctx = ctx();
        let state = State::new(Ellipse::unit_disk(&ctx), Ellipse::unit_disk(&ctx));
        let plain = twod_grid_solver_state(&state, &ctx);
        let fat = twod_grid_solver_ellipse_fatten(&state, &ctx.eps, &ctx);
        for u in &plain {
            assert!(fat.contains(u));
        }
        // ω has modulus one in both embeddings
        assert!(fat.contains(&ZOmega::new(0, 0, 1, 0)));
    }
}
