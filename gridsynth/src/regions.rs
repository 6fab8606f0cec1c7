// gridsynth - exact Clifford+T approximation of single-qubit Z rotations
// Copyright (C) 2025 - Aleks Kissinger
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Convex regions of the plane used to pose grid problems: closed intervals,
//! upright rectangles and ellipses.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use crate::config::Context;
use crate::error::SynthError;
use crate::linalg::{Mat2, Vec2};
use crate::real::{atan2, sin_cos, Real};

/// A closed interval [lo, hi] with lo <= hi.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    lo: Real,
    hi: Real,
}

impl Interval {
    pub fn new(lo: Real, hi: Real) -> Result<Interval, SynthError> {
        if lo > hi {
            return Err(SynthError::config(format!("interval [{lo}, {hi}] has lo > hi")));
        }
        Ok(Interval { lo, hi })
    }

    /// Interval between two endpoints given in either order.
    pub fn spanning(x: Real, y: Real) -> Interval {
        if x <= y {
            Interval { lo: x, hi: y }
        } else {
            Interval { lo: y, hi: x }
        }
    }

    pub fn lo(&self) -> &Real {
        &self.lo
    }

    pub fn hi(&self) -> &Real {
        &self.hi
    }

    pub fn width(&self) -> Real {
        &self.hi - &self.lo
    }

    /// Membership, treating points within `tol` (in the product
    /// (hi - x)(x - lo)) of an endpoint as inside.
    pub fn contains(&self, x: &Real, tol: &Real) -> bool {
        let p = (&self.hi - x) * (x - &self.lo);
        p.is_positive() || p.abs() < *tol
    }

    /// Widen by `eps` on both sides.
    pub fn fatten(&self, eps: &Real) -> Interval {
        Interval { lo: &self.lo - eps, hi: &self.hi + eps }
    }
}

impl Add<&Real> for &Interval {
    type Output = Interval;
    fn add(self, s: &Real) -> Interval {
        Interval { lo: &self.lo + s, hi: &self.hi + s }
    }
}

impl Sub<&Real> for &Interval {
    type Output = Interval;
    fn sub(self, s: &Real) -> Interval {
        Interval { lo: &self.lo - s, hi: &self.hi - s }
    }
}

impl Mul<&Real> for &Interval {
    type Output = Interval;
    fn mul(self, s: &Real) -> Interval {
        Interval::spanning(&self.lo * s, &self.hi * s)
    }
}

impl Div<&Real> for &Interval {
    type Output = Interval;
    fn div(self, s: &Real) -> Interval {
        Interval::spanning(&self.lo / s, &self.hi / s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// The product of two intervals.
#[derive(Clone, Debug, PartialEq)]
pub struct UprightRectangle {
    pub x: Interval,
    pub y: Interval,
}

impl UprightRectangle {
    pub fn new(x: Interval, y: Interval) -> UprightRectangle {
        UprightRectangle { x, y }
    }

    pub fn area(&self) -> Real {
        self.x.width() * self.y.width()
    }

    pub fn rescale(&self, s: &Real) -> UprightRectangle {
        UprightRectangle { x: &self.x * s, y: &self.y * s }
    }

    pub fn shift(&self, v: &Vec2) -> UprightRectangle {
        UprightRectangle { x: &self.x + &v.x, y: &self.y + &v.y }
    }

    pub fn fatten(&self, eps: &Real) -> UprightRectangle {
        UprightRectangle { x: self.x.fatten(eps), y: self.y.fatten(eps) }
    }

    pub fn contains(&self, p: &Vec2, tol: &Real) -> bool {
        self.x.contains(&p.x, tol) && self.y.contains(&p.y, tol)
    }
}

impl fmt::Display for UprightRectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.x, self.y)
    }
}

/// The ellipse { p : (p - c)ᵀ D (p - c) <= 1 } for a positive definite D.
///
/// Along with D and the center it caches the semi-axes, the tilt of the
/// minor axis and the skew descriptors z = ½·log_λ(D₁₁/D₀₀) and
/// e = √(D₀₀·D₁₁).
#[derive(Clone, Debug)]
pub struct Ellipse {
    d: Mat2,
    center: Vec2,
    semi_major: Real,
    semi_minor: Real,
    angle: Real,
    z: Real,
    e: Real,
}

impl Ellipse {
    pub fn from_matrix(d: Mat2, center: Vec2, ctx: &Context) -> Ellipse {
        let (semi_major, semi_minor) = axes_from_matrix(&d, ctx);
        let angle = angle_from_matrix(&d, ctx);
        let mut e = Ellipse {
            d,
            center,
            semi_major,
            semi_minor,
            angle,
            z: ctx.zero(),
            e: ctx.zero(),
        };
        e.update_z_and_e(ctx);
        e
    }

    /// Ellipse with the minor axis pointing along `angle`.
    pub fn from_axes(center: Vec2, semi_major: Real, semi_minor: Real, angle: Real, ctx: &Context) -> Ellipse {
        let d = matrix_from_axes(&semi_major, &semi_minor, &angle, ctx);
        let mut e = Ellipse {
            d,
            center,
            semi_major,
            semi_minor,
            angle,
            z: ctx.zero(),
            e: ctx.zero(),
        };
        e.update_z_and_e(ctx);
        e
    }

    pub fn unit_disk(ctx: &Context) -> Ellipse {
        Ellipse::from_axes(Vec2::zero(ctx.prec), ctx.one(), ctx.one(), ctx.zero(), ctx)
    }

    /// Smallest-area ellipse around the ε-region of the unit disk in the
    /// direction θ: the points z with |z| <= 1 and Re(z·e^{-iθ}) >= 1 - ε²/2.
    pub fn epsilon_region(theta: &Real, eps: &Real, ctx: &Context) -> Ellipse {
        let eps2 = eps * eps;
        let r0 = (ctx.real(3) - &eps2) / ctx.real(3);
        let (s, c) = sin_cos(theta);
        let center = Vec2::new(&r0 * &c, &r0 * &s);
        let semi_major = (ctx.real(2) / ctx.real(3).sqrt()) * eps * (ctx.one() - eps2.ldexp(-2)).sqrt();
        let semi_minor = &eps2 / &ctx.real(3);
        Ellipse::from_axes(center, semi_major, semi_minor, theta.clone(), ctx)
    }

    fn update_z_and_e(&mut self, ctx: &Context) {
        let (d00, d11) = (self.d.get(0, 0), self.d.get(1, 1));
        self.z = match d11.checked_div(d00).and_then(|ratio| ratio.ln()) {
            Some(l) => l.ldexp(-1) / &ctx.log_lambda,
            // degenerate ellipses have no skew direction
            None => ctx.zero(),
        };
        self.e = (d00 * d11).sqrt();
    }

    pub fn d(&self) -> &Mat2 {
        &self.d
    }

    pub fn d01(&self) -> &Real {
        self.d.get(0, 1)
    }

    pub fn center(&self) -> &Vec2 {
        &self.center
    }

    pub fn semi_major(&self) -> &Real {
        &self.semi_major
    }

    pub fn semi_minor(&self) -> &Real {
        &self.semi_minor
    }

    pub fn angle(&self) -> &Real {
        &self.angle
    }

    pub fn z(&self) -> &Real {
        &self.z
    }

    pub fn e(&self) -> &Real {
        &self.e
    }

    pub fn determinant(&self) -> Real {
        self.d.determinant()
    }

    pub fn area(&self, ctx: &Context) -> Real {
        &ctx.pi * &self.semi_major * &self.semi_minor
    }

    /// Ratio of the ellipse area to that of its bounding box, in (0, π/4].
    pub fn uprightness(&self, ctx: &Context) -> Real {
        let r = self.determinant() / (self.d.get(0, 0) * self.d.get(1, 1));
        ctx.pi.ldexp(-2) * r.sqrt()
    }

    /// Scale the ellipse about the origin by `s`.
    pub fn rescale(&mut self, s: &Real, ctx: &Context) {
        let s2 = s * s;
        self.d = self.d.scale(&(ctx.one() / s2));
        self.semi_major = &self.semi_major * &s.abs();
        self.semi_minor = &self.semi_minor * &s.abs();
        self.center = self.center.scale(s);
        self.update_z_and_e(ctx);
    }

    /// Rescale to unit determinant (area π) and return the factor used.
    pub fn normalize(&mut self, ctx: &Context) -> Real {
        let scale = self.determinant().sqrt().sqrt();
        self.rescale(&scale, ctx);
        scale
    }

    pub fn contains(&self, p: &Vec2, tol: &Real) -> bool {
        let v = p - &self.center;
        let x = self.d.quadratic_form(&v);
        let one = Real::one(x.prec());
        x < one || (&x - &one).abs() < *tol
    }

    pub fn bounding_box(&self) -> UprightRectangle {
        let det = self.determinant();
        let x = (self.d.get(1, 1) / &det).sqrt();
        let y = (self.d.get(0, 0) / &det).sqrt();
        let c = &self.center;
        UprightRectangle::new(
            Interval::spanning(&c.x - &x, &c.x + &x),
            Interval::spanning(&c.y - &y, &c.y + &y),
        )
    }

    /// The set of points p with M·p inside this ellipse.
    pub fn transformed(&self, m: &Mat2, ctx: &Context) -> Result<Ellipse, SynthError> {
        let center = m.inverse()?.apply(&self.center);
        Ok(Ellipse::from_matrix(m.congruence(&self.d), center, ctx))
    }
}

fn axes_from_matrix(d: &Mat2, ctx: &Context) -> (Real, Real) {
    // semi-axes are 1/√λ for the eigenvalues λ of D
    let msq = ctx.one() / d.determinant();
    let t = d.trace();
    let tm = &t * &msq;
    let disc = (&tm * &tm - msq.ldexp(2)).max(ctx.zero()).sqrt();
    let a1 = (&tm + &disc).ldexp(-1).sqrt();
    let a2 = (&tm - &disc).ldexp(-1).sqrt();
    (a1, a2)
}

fn angle_from_matrix(d: &Mat2, ctx: &Context) -> Real {
    // direction of the eigenvector with the larger eigenvalue
    let diff = d.get(0, 0) - d.get(1, 1);
    atan2(&d.get(0, 1).ldexp(1), &diff).with_prec(ctx.prec).ldexp(-1)
}

fn matrix_from_axes(semi_major: &Real, semi_minor: &Real, angle: &Real, ctx: &Context) -> Mat2 {
    let (st, ct) = sin_cos(angle);
    let inva2 = (ctx.one() / semi_minor).powi(2);
    let invb2 = (ctx.one() / semi_major).powi(2);
    let (ct2, st2, cs) = (&ct * &ct, &st * &st, &ct * &st);
    let off = &cs * &(&inva2 - &invb2);
    Mat2::new(
        &ct2 * &inva2 + &st2 * &invb2,
        off.clone(),
        off,
        &st2 * &inva2 + &ct2 * &invb2,
    )
}

impl fmt::Display for Ellipse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "D = {}", self.d)?;
        writeln!(f, "semi-major axis = {:.8}", self.semi_major)?;
        writeln!(f, "semi-minor axis = {:.8}", self.semi_minor)?;
        write!(f, "center = ({:.8}, {:.8})", self.center.x, self.center.y)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn ctx() -> Context {
        Context::with_digits(6).unwrap()
    }

    fn r(x: f64) -> Real {
        Real::from_f64(x, ctx().prec)
    }

    #[test]
    fn interval_construction() {
        assert!(Interval::new(r(1.0), r(0.0)).is_err());
        let i = Interval::new(r(-1.0), r(2.0)).unwrap();
        assert_abs_diff_eq!(i.width().to_f64(), 3.0);
    }

    #[rstest]
    #[case(0.5, true)]
    #[case(-1.0, true)]
    #[case(2.0, true)]
    #[case(2.1, false)]
    #[case(-1.0001, false)]
    fn interval_membership(#[case] x: f64, #[case] inside: bool) {
        let i = Interval::new(r(-1.0), r(2.0)).unwrap();
        assert_eq!(i.contains(&r(x), &ctx().tol), inside);
    }

    #[test]
    fn negative_scale_swaps_ends() {
        let i = Interval::new(r(1.0), r(3.0)).unwrap();
        let j = &i * &r(-2.0);
        assert_abs_diff_eq!(j.lo().to_f64(), -6.0);
        assert_abs_diff_eq!(j.hi().to_f64(), -2.0);
        let k = &i / &r(-0.5);
        assert_abs_diff_eq!(k.lo().to_f64(), -6.0);
        let s = &(&i + &r(1.0)) - &r(0.5);
        assert_abs_diff_eq!(s.lo().to_f64(), 1.5);
        assert_abs_diff_eq!(i.fatten(&r(0.25)).width().to_f64(), 2.5);
    }

    #[test]
    fn unit_disk_descriptors() {
        let ctx = ctx();
        let disk = Ellipse::unit_disk(&ctx);
        assert_abs_diff_eq!(disk.z().to_f64(), 0.0);
        assert_abs_diff_eq!(disk.e().to_f64(), 1.0, epsilon = 1e-20);
        assert!(disk.contains(&Vec2::new(r(0.6), r(0.8)), &ctx.tol));
        assert!(!disk.contains(&Vec2::new(r(0.6), r(0.81)), &ctx.tol));
        let bb = disk.bounding_box();
        assert_abs_diff_eq!(bb.area().to_f64(), 4.0, epsilon = 1e-20);
        assert_abs_diff_eq!(disk.uprightness(&ctx).to_f64(), std::f64::consts::FRAC_PI_4, epsilon = 1e-15);
    }

    #[test]
    fn axes_round_trip_through_matrix() {
        let ctx = ctx();
        let e = Ellipse::from_axes(Vec2::new(r(0.5), r(-1.0)), r(3.0), r(0.5), r(0.3), &ctx);
        let f = Ellipse::from_matrix(e.d().clone(), e.center().clone(), &ctx);
        assert_abs_diff_eq!(f.semi_major().to_f64(), 3.0, epsilon = 1e-20);
        assert_abs_diff_eq!(f.semi_minor().to_f64(), 0.5, epsilon = 1e-20);
        assert_abs_diff_eq!(f.angle().to_f64(), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(e.area(&ctx).to_f64(), 1.5 * std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn descriptors_hold_full_precision() {
        let ctx = ctx();
        let fine = Real::pow2(-200, ctx.prec);
        let e = Ellipse::from_axes(Vec2::zero(ctx.prec), ctx.lambda.powi(3), ctx.one(), ctx.zero(), &ctx);
        assert!((e.z() + &ctx.real(3)).abs() < fine, "z = {}", e.z());

        let e = Ellipse::from_axes(Vec2::zero(ctx.prec), r(3.0), r(0.5), r(0.3), &ctx);
        let f = Ellipse::from_matrix(e.d().clone(), e.center().clone(), &ctx);
        assert!((f.angle() - &r(0.3)).abs() < fine, "angle = {}", f.angle());
    }

    #[test]
    fn singular_transform_is_an_error() {
        let ctx = ctx();
        let e = Ellipse::unit_disk(&ctx);
        let m = Mat2::new(r(1.0), r(2.0), r(0.5), r(1.0));
        assert!(matches!(e.transformed(&m, &ctx), Err(SynthError::Internal(_))));
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.31)]
    #[case(2.5)]
    #[case(-1.2)]
    fn epsilon_region_covers_target_arc(#[case] theta: f64) {
        let ctx = ctx();
        let eps = r(1e-2);
        let e = Ellipse::epsilon_region(&r(theta), &eps, &ctx);
        // points just inside the boundary arc of the ε-region
        let dphi = (1.0f64 - 0.5e-4).acos();
        let rad = 1.0 - 1e-7;
        for phi in [theta - dphi * 0.99, theta, theta + dphi * 0.99] {
            let p = Vec2::new(r(rad * phi.cos()), r(rad * phi.sin()));
            assert!(e.contains(&p, &ctx.tol), "phi = {phi}");
        }
        // the origin does not
        assert!(!e.contains(&Vec2::zero(ctx.prec), &ctx.tol));
    }

    #[test]
    fn normalize_gives_unit_determinant() {
        let ctx = ctx();
        let mut e = Ellipse::epsilon_region(&r(0.7), &r(1e-3), &ctx);
        let before = e.bounding_box();
        let scale = e.normalize(&ctx);
        assert_abs_diff_eq!(e.determinant().to_f64(), 1.0, epsilon = 1e-12);
        e.rescale(&(ctx.one() / scale), &ctx);
        let after = e.bounding_box();
        assert_abs_diff_eq!(before.x.lo().to_f64(), after.x.lo().to_f64(), epsilon = 1e-15);
        assert_abs_diff_eq!(before.y.hi().to_f64(), after.y.hi().to_f64(), epsilon = 1e-15);
    }

    #[test]
    fn transformed_pulls_back_membership() {
        let ctx = ctx();
        let e = Ellipse::from_axes(Vec2::new(r(0.2), r(0.1)), r(2.0), r(0.5), r(0.4), &ctx);
        let m = Mat2::new(r(1.0), r(0.5), r(0.0), r(2.0));
        let f = e.transformed(&m, &ctx).unwrap();
        for (x, y) in [(0.1, 0.0), (0.9, 0.3), (-0.5, -0.2), (1.5, 1.5)] {
            let p = Vec2::new(r(x), r(y));
            assert_eq!(f.contains(&p, &ctx.tol), e.contains(&m.apply(&p), &ctx.tol), "({x}, {y})");
        }
    }
}
