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

//! Exact arithmetic in the rings Z[√2] and Z[ω], where ω = e^{iπ/4}.
//!
//! Both rings are Euclidean with respect to their norms, and the division
//! operators here return the "best quotient": the exact quotient with each
//! coefficient rounded to the nearest integer. The matching `%` satisfies
//! `(a / b) * b + a % b == a`, which is all Euclid's algorithm needs.

use num::{BigInt, Integer, Signed, Zero};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

use crate::config::Context;
use crate::error::SynthError;
use crate::real::{forward_owned_binop, Real};

/// Round `p / q` to the nearest integer, halves going up.
pub(crate) fn round_div(p: &BigInt, q: &BigInt) -> BigInt {
    let (p, q) = if q.is_negative() { (-p, -q) } else { (p.clone(), q.clone()) };
    (&p + &p + &q).div_floor(&(&q + &q))
}

/// An element a + b√2 of Z[√2].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ZSqrt2 {
    pub a: BigInt,
    pub b: BigInt,
}

impl ZSqrt2 {
    pub fn new(a: impl Into<BigInt>, b: impl Into<BigInt>) -> ZSqrt2 {
        ZSqrt2 { a: a.into(), b: b.into() }
    }

    pub fn from_int(n: impl Into<BigInt>) -> ZSqrt2 {
        ZSqrt2::new(n, 0)
    }

    pub fn zero() -> ZSqrt2 {
        ZSqrt2::new(0, 0)
    }

    pub fn one() -> ZSqrt2 {
        ZSqrt2::new(1, 0)
    }

    /// λ = 1 + √2
    pub fn lambda() -> ZSqrt2 {
        ZSqrt2::new(1, 1)
    }

    /// λ⁻¹ = √2 - 1
    pub fn lambda_inv() -> ZSqrt2 {
        ZSqrt2::new(-1, 1)
    }

    /// λ^k for any integer k.
    pub fn lambda_pow(k: i64) -> ZSqrt2 {
        if k >= 0 {
            ZSqrt2::lambda().pow(k as u64)
        } else {
            ZSqrt2::lambda_inv().pow(k.unsigned_abs())
        }
    }

    pub fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }

    /// The Galois conjugate a - b√2.
    pub fn dot(&self) -> ZSqrt2 {
        ZSqrt2 { a: self.a.clone(), b: -&self.b }
    }

    /// a² - 2b², the product of both embeddings.
    pub fn norm(&self) -> BigInt {
        &self.a * &self.a - (&self.b * &self.b) * 2u32
    }

    pub fn scale(&self, n: &BigInt) -> ZSqrt2 {
        ZSqrt2 { a: &self.a * n, b: &self.b * n }
    }

    pub fn pow(&self, mut n: u64) -> ZSqrt2 {
        let mut base = self.clone();
        let mut result = ZSqrt2::one();
        while n > 0 {
            if n & 1 == 1 {
                result = &result * &base;
            }
            n >>= 1;
            if n > 0 {
                base = &base * &base;
            }
        }
        result
    }

    /// Exact sign of a + b√2 as a real number.
    pub fn signum(&self) -> i32 {
        let sa = sign_of(&self.a);
        let sb = sign_of(&self.b);
        if sa == sb || sb == 0 {
            return sa;
        }
        if sa == 0 {
            return sb;
        }
        let a2 = &self.a * &self.a;
        let b2 = (&self.b * &self.b) * 2u32;
        if a2 > b2 {
            sa
        } else {
            sb
        }
    }

    /// Non-negative under both embeddings of Z[√2] into the reals.
    pub fn is_doubly_positive(&self) -> bool {
        self.signum() >= 0 && self.dot().signum() >= 0
    }

    pub fn is_divisible_by_sqrt2(&self) -> bool {
        self.a.is_even()
    }

    /// Divide by √2, assuming [`ZSqrt2::is_divisible_by_sqrt2`].
    pub fn div_sqrt2(&self) -> ZSqrt2 {
        ZSqrt2 { a: self.b.clone(), b: &self.a / 2 }
    }

    /// Exact quotient, if `other` divides `self`.
    pub fn exact_div(&self, other: &ZSqrt2) -> Option<ZSqrt2> {
        let n = other.norm();
        if n.is_zero() {
            return None;
        }
        let p = self * other.dot();
        if p.a.is_multiple_of(&n) && p.b.is_multiple_of(&n) {
            Some(ZSqrt2 { a: &p.a / &n, b: &p.b / &n })
        } else {
            None
        }
    }

    /// Square root within Z[√2].
    pub fn self_sqrt(&self) -> Result<ZSqrt2, SynthError> {
        let not_square = || SynthError::internal(format!("{self} is not a square in Z[√2]"));
        if self.is_zero() {
            return Ok(ZSqrt2::zero());
        }
        // (p + q√2)² = p² + 2q² + 2pq√2, and the norm of a square is a square
        let n = self.norm();
        if n.is_negative() {
            return Err(not_square());
        }
        let s = n.sqrt();
        if &s * &s != n {
            return Err(not_square());
        }
        for s in [s.clone(), -s] {
            let p2 = &self.a + &s;
            let q4 = &self.a - &s;
            if p2.is_odd() || !q4.is_multiple_of(&BigInt::from(4)) || p2.is_negative() || q4.is_negative() {
                continue;
            }
            let p2: BigInt = p2 / BigInt::from(2);
            let q2: BigInt = q4 / BigInt::from(4);
            let p = p2.sqrt();
            let q = q2.sqrt();
            if &p * &p != p2 || &q * &q != q2 {
                continue;
            }
            for cand in [ZSqrt2::new(p.clone(), q.clone()), ZSqrt2::new(-&p, q.clone())] {
                if &(&cand * &cand) == self {
                    return Ok(cand);
                }
            }
        }
        Err(not_square())
    }

    pub fn decimal(&self, ctx: &Context) -> Real {
        Real::from_int(self.a.clone(), ctx.prec) + Real::from_int(self.b.clone(), ctx.prec) * &ctx.sqrt2
    }

    pub fn decimal_dot(&self, ctx: &Context) -> Real {
        Real::from_int(self.a.clone(), ctx.prec) - Real::from_int(self.b.clone(), ctx.prec) * &ctx.sqrt2
    }

    /// Embed as a real element of Z[ω].
    pub fn to_zomega(&self) -> ZOmega {
        ZOmega::new(-&self.b, 0, self.b.clone(), self.a.clone())
    }

    /// Greatest common divisor, up to a unit.
    pub fn gcd(a: &ZSqrt2, b: &ZSqrt2) -> ZSqrt2 {
        let (mut x, mut y) = (a.clone(), b.clone());
        while !y.is_zero() {
            let r = &x % &y;
            x = y;
            y = r;
        }
        x
    }
}

fn sign_of(n: &BigInt) -> i32 {
    if n.is_positive() {
        1
    } else if n.is_negative() {
        -1
    } else {
        0
    }
}

impl fmt::Display for ZSqrt2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}√2", self.a, self.b)
    }
}

impl Add<&ZSqrt2> for &ZSqrt2 {
    type Output = ZSqrt2;
    fn add(self, rhs: &ZSqrt2) -> ZSqrt2 {
        ZSqrt2 { a: &self.a + &rhs.a, b: &self.b + &rhs.b }
    }
}

impl Sub<&ZSqrt2> for &ZSqrt2 {
    type Output = ZSqrt2;
    fn sub(self, rhs: &ZSqrt2) -> ZSqrt2 {
        ZSqrt2 { a: &self.a - &rhs.a, b: &self.b - &rhs.b }
    }
}

impl Mul<&ZSqrt2> for &ZSqrt2 {
    type Output = ZSqrt2;
    fn mul(self, rhs: &ZSqrt2) -> ZSqrt2 {
        ZSqrt2 {
            a: &self.a * &rhs.a + (&self.b * &rhs.b) * 2u32,
            b: &self.a * &rhs.b + &self.b * &rhs.a,
        }
    }
}

impl Div<&ZSqrt2> for &ZSqrt2 {
    type Output = ZSqrt2;
    fn div(self, rhs: &ZSqrt2) -> ZSqrt2 {
        let n = rhs.norm();
        let p = self * rhs.dot();
        ZSqrt2 { a: round_div(&p.a, &n), b: round_div(&p.b, &n) }
    }
}

impl Rem<&ZSqrt2> for &ZSqrt2 {
    type Output = ZSqrt2;
    fn rem(self, rhs: &ZSqrt2) -> ZSqrt2 {
        self - &(&(self / rhs) * rhs)
    }
}

impl Neg for &ZSqrt2 {
    type Output = ZSqrt2;
    fn neg(self) -> ZSqrt2 {
        ZSqrt2 { a: -&self.a, b: -&self.b }
    }
}

impl Neg for ZSqrt2 {
    type Output = ZSqrt2;
    fn neg(self) -> ZSqrt2 {
        -&self
    }
}

forward_owned_binop!(ZSqrt2, Add, add);
forward_owned_binop!(ZSqrt2, Sub, sub);
forward_owned_binop!(ZSqrt2, Mul, mul);
forward_owned_binop!(ZSqrt2, Div, div);
forward_owned_binop!(ZSqrt2, Rem, rem);

/// An element aω³ + bω² + cω + d of Z[ω].
///
/// Equivalently α + βi + wω with α, β ∈ Z[√2] and w ∈ {0, 1}; see
/// [`ZOmega::alpha`], [`ZOmega::beta`] and [`ZOmega::w`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ZOmega {
    pub a: BigInt,
    pub b: BigInt,
    pub c: BigInt,
    pub d: BigInt,
}

impl ZOmega {
    pub fn new(
        a: impl Into<BigInt>,
        b: impl Into<BigInt>,
        c: impl Into<BigInt>,
        d: impl Into<BigInt>,
    ) -> ZOmega {
        ZOmega { a: a.into(), b: b.into(), c: c.into(), d: d.into() }
    }

    pub fn from_int(n: impl Into<BigInt>) -> ZOmega {
        ZOmega::new(0, 0, 0, n)
    }

    pub fn zero() -> ZOmega {
        ZOmega::from_int(0)
    }

    pub fn one() -> ZOmega {
        ZOmega::from_int(1)
    }

    /// The imaginary unit i = ω².
    pub fn i() -> ZOmega {
        ZOmega::new(0, 1, 0, 0)
    }

    /// i√2 = ω + ω³
    pub fn i_sqrt2() -> ZOmega {
        ZOmega::new(1, 0, 1, 0)
    }

    /// Build α + βi + wω.
    pub fn from_alpha_beta(alpha: &ZSqrt2, beta: &ZSqrt2, w: bool) -> ZOmega {
        let w = BigInt::from(w as u8);
        ZOmega {
            a: &beta.b - &alpha.b,
            b: beta.a.clone(),
            c: &beta.b + &alpha.b + w,
            d: alpha.a.clone(),
        }
    }

    pub fn w(&self) -> bool {
        (&self.c + &self.a).is_odd()
    }

    pub fn alpha(&self) -> ZSqrt2 {
        let w = BigInt::from(self.w() as u8);
        ZSqrt2 { a: self.d.clone(), b: (&self.c - &self.a - w) / 2 }
    }

    pub fn beta(&self) -> ZSqrt2 {
        let w = BigInt::from(self.w() as u8);
        ZSqrt2 { a: self.b.clone(), b: (&self.c + &self.a - w) / 2 }
    }

    /// ω^n for any integer n.
    pub fn w_pow(n: i64) -> ZOmega {
        let unit = match n.rem_euclid(4) {
            0 => ZOmega::new(0, 0, 0, 1),
            1 => ZOmega::new(0, 0, 1, 0),
            2 => ZOmega::new(0, 1, 0, 0),
            _ => ZOmega::new(1, 0, 0, 0),
        };
        if n.rem_euclid(8) >= 4 {
            -unit
        } else {
            unit
        }
    }

    pub fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero() && self.c.is_zero() && self.d.is_zero()
    }

    /// Complex conjugate.
    pub fn conj(&self) -> ZOmega {
        ZOmega { a: -&self.c, b: -&self.b, c: -&self.a, d: self.d.clone() }
    }

    /// The √2 ↦ -√2 automorphism, which sends ω to -ω.
    pub fn dot(&self) -> ZOmega {
        ZOmega { a: -&self.a, b: self.b.clone(), c: -&self.c, d: self.d.clone() }
    }

    /// |u|² = u·ū as an element of Z[√2].
    pub fn norm(&self) -> ZSqrt2 {
        let (a, b, c, d) = (&self.a, &self.b, &self.c, &self.d);
        ZSqrt2 {
            a: a * a + b * b + c * c + d * d,
            b: c * b + d * c + b * a - a * d,
        }
    }

    /// Divisible by √2 within Z[ω].
    pub fn is_reducible(&self) -> bool {
        (&self.a + &self.c).is_even() && (&self.b + &self.d).is_even()
    }

    /// Divide by √2, assuming [`ZOmega::is_reducible`].
    pub fn reduce(&self) -> ZOmega {
        let (a, b, c, d) = (&self.a, &self.b, &self.c, &self.d);
        ZOmega {
            a: (b - d) / 2,
            b: (a + c) / 2,
            c: (b + d) / 2,
            d: (c - a) / 2,
        }
    }

    pub fn is_real(&self) -> bool {
        self.b.is_zero() && (&self.a + &self.c).is_zero()
    }

    pub fn to_zsqrt2(&self) -> Result<ZSqrt2, SynthError> {
        if !self.is_real() {
            return Err(SynthError::internal(format!("{self} is not real")));
        }
        Ok(ZSqrt2 { a: self.d.clone(), b: self.c.clone() })
    }

    pub fn pow(&self, mut n: u64) -> ZOmega {
        let mut base = self.clone();
        let mut result = ZOmega::one();
        while n > 0 {
            if n & 1 == 1 {
                result = &result * &base;
            }
            n >>= 1;
            if n > 0 {
                base = &base * &base;
            }
        }
        result
    }

    pub fn real(&self, ctx: &Context) -> Real {
        let p = ctx.prec;
        Real::from_int(self.d.clone(), p) + Real::from_int(&self.c - &self.a, p) * &ctx.inv_sqrt2
    }

    pub fn imag(&self, ctx: &Context) -> Real {
        let p = ctx.prec;
        Real::from_int(self.b.clone(), p) + Real::from_int(&self.c + &self.a, p) * &ctx.inv_sqrt2
    }

    /// Real and imaginary parts.
    pub fn decimal(&self, ctx: &Context) -> (Real, Real) {
        (self.real(ctx), self.imag(ctx))
    }

    /// Complex value as a pair of doubles.
    pub fn to_f64(&self) -> (f64, f64) {
        let (a, b, c, d) = (to_f(&self.a), to_f(&self.b), to_f(&self.c), to_f(&self.d));
        let r = std::f64::consts::FRAC_1_SQRT_2;
        (d + (c - a) * r, b + (c + a) * r)
    }

    /// Greatest common divisor, up to a unit.
    pub fn gcd(a: &ZOmega, b: &ZOmega) -> ZOmega {
        let (mut x, mut y) = (a.clone(), b.clone());
        while !y.is_zero() {
            let r = &x % &y;
            x = y;
            y = r;
        }
        x
    }
}

fn to_f(n: &BigInt) -> f64 {
    num::ToPrimitive::to_f64(n).unwrap_or(f64::NAN)
}

impl From<&ZSqrt2> for ZOmega {
    fn from(x: &ZSqrt2) -> ZOmega {
        x.to_zomega()
    }
}

impl fmt::Display for ZOmega {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ω³ + {}ω² + {}ω + {}", self.a, self.b, self.c, self.d)
    }
}

impl Add<&ZOmega> for &ZOmega {
    type Output = ZOmega;
    fn add(self, rhs: &ZOmega) -> ZOmega {
        ZOmega {
            a: &self.a + &rhs.a,
            b: &self.b + &rhs.b,
            c: &self.c + &rhs.c,
            d: &self.d + &rhs.d,
        }
    }
}

impl Sub<&ZOmega> for &ZOmega {
    type Output = ZOmega;
    fn sub(self, rhs: &ZOmega) -> ZOmega {
        ZOmega {
            a: &self.a - &rhs.a,
            b: &self.b - &rhs.b,
            c: &self.c - &rhs.c,
            d: &self.d - &rhs.d,
        }
    }
}

impl Mul<&ZOmega> for &ZOmega {
    type Output = ZOmega;
    fn mul(self, rhs: &ZOmega) -> ZOmega {
        let (a, b, c, d) = (&self.a, &self.b, &self.c, &self.d);
        let (e, f, g, h) = (&rhs.a, &rhs.b, &rhs.c, &rhs.d);
        ZOmega {
            a: a * h + b * g + c * f + d * e,
            b: b * h + c * g + d * f - a * e,
            c: c * h + d * g - a * f - b * e,
            d: d * h - a * g - b * f - c * e,
        }
    }
}

impl Div<&ZOmega> for &ZOmega {
    type Output = ZOmega;
    fn div(self, rhs: &ZOmega) -> ZOmega {
        // y/z = y·z̄·(z·z̄)• / N(z), with N(z) the absolute norm
        let zz = rhs * &rhs.conj();
        let n = &(self * &rhs.conj()) * &zz.dot();
        let k = rhs.norm().norm();
        ZOmega {
            a: round_div(&n.a, &k),
            b: round_div(&n.b, &k),
            c: round_div(&n.c, &k),
            d: round_div(&n.d, &k),
        }
    }
}

impl Rem<&ZOmega> for &ZOmega {
    type Output = ZOmega;
    fn rem(self, rhs: &ZOmega) -> ZOmega {
        self - &(&(self / rhs) * rhs)
    }
}

impl Neg for &ZOmega {
    type Output = ZOmega;
    fn neg(self) -> ZOmega {
        ZOmega { a: -&self.a, b: -&self.b, c: -&self.c, d: -&self.d }
    }
}

impl Neg for ZOmega {
    type Output = ZOmega;
    fn neg(self) -> ZOmega {
        -&self
    }
}

forward_owned_binop!(ZOmega, Add, add);
forward_owned_binop!(ZOmega, Sub, sub);
forward_owned_binop!(ZOmega, Mul, mul);
forward_owned_binop!(ZOmega, Div, div);
forward_owned_binop!(ZOmega, Rem, rem);

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    fn random_zsqrt2(rng: &mut SmallRng, bound: i64) -> ZSqrt2 {
        ZSqrt2::new(rng.random_range(-bound..=bound), rng.random_range(-bound..=bound))
    }

    fn random_zomega(rng: &mut SmallRng, bound: i64) -> ZOmega {
        let mut c = || rng.random_range(-bound..=bound);
        ZOmega::new(c(), c(), c(), c())
    }

    #[rstest]
    #[case(ZSqrt2::new(17, -5), ZSqrt2::new(3, 2))]
    #[case(ZSqrt2::new(-100, 41), ZSqrt2::new(-7, 1))]
    #[case(ZSqrt2::new(5, 0), ZSqrt2::new(1, 1))]
    fn zsqrt2_division_identity(#[case] x: ZSqrt2, #[case] y: ZSqrt2) {
        let q = &x / &y;
        let r = &x % &y;
        assert_eq!(&(&q * &y) + &r, x);
        // best quotient: remainder is strictly smaller in absolute norm
        assert!(r.norm().abs() < y.norm().abs());
    }

    #[rstest]
    #[case(ZOmega::new(3, -1, 4, 1), ZOmega::new(1, 0, 1, 2))]
    #[case(ZOmega::new(-9, 2, 6, 5), ZOmega::new(0, 1, -1, 1))]
    #[case(ZOmega::new(12, 7, -3, 8), ZOmega::new(2, 0, 0, 1))]
    fn zomega_division_identity(#[case] x: ZOmega, #[case] y: ZOmega) {
        let q = &x / &y;
        let r = &x % &y;
        assert_eq!(&(&q * &y) + &r, x);
        assert!(r.norm().norm() < y.norm().norm());
    }

    #[test]
    fn conjugations_are_involutions() {
        let x = ZOmega::new(1, -2, 3, 7);
        assert_eq!(x.conj().conj(), x);
        assert_eq!(x.dot().dot(), x);
        let y = ZSqrt2::new(4, -9);
        assert_eq!(y.dot().dot(), y);
    }

    #[test]
    fn norms_are_multiplicative() {
        let x = ZOmega::new(1, -2, 3, 7);
        let y = ZOmega::new(-4, 0, 5, 2);
        assert_eq!((&x * &y).norm(), &x.norm() * &y.norm());
        let u = ZSqrt2::new(3, -7);
        let v = ZSqrt2::new(11, 2);
        assert_eq!((&u * &v).norm(), u.norm() * v.norm());
    }

    #[test]
    fn omega_powers() {
        let w = ZOmega::w_pow(1);
        assert_eq!(w.pow(2), ZOmega::i());
        assert_eq!(w.pow(8), ZOmega::one());
        assert_eq!(ZOmega::w_pow(-1), w.pow(7));
        assert_eq!(ZOmega::w_pow(4), -ZOmega::one());
        assert_eq!(&w + &w.pow(3), ZOmega::i_sqrt2());
    }

    #[test]
    fn alpha_beta_round_trip() {
        for x in [ZOmega::new(1, 2, 3, 4), ZOmega::new(-3, 5, 0, 1), ZOmega::new(2, 0, -2, 9)] {
            let y = ZOmega::from_alpha_beta(&x.alpha(), &x.beta(), x.w());
            assert_eq!(x, y);
        }
    }

    #[test]
    fn decimal_embeddings() {
        let ctx = Context::with_digits(5).unwrap();
        let x = ZOmega::new(1, 2, 3, 4);
        let (re, im) = x.to_f64();
        assert_abs_diff_eq!(x.real(&ctx).to_f64(), re, epsilon = 1e-12);
        assert_abs_diff_eq!(x.imag(&ctx).to_f64(), im, epsilon = 1e-12);
        // alpha + beta i + w omega reproduces the same point
        let alpha = x.alpha().decimal(&ctx).to_f64();
        let beta = x.beta().decimal(&ctx).to_f64();
        let w = if x.w() { std::f64::consts::FRAC_1_SQRT_2 } else { 0.0 };
        assert_abs_diff_eq!(alpha + w, re, epsilon = 1e-12);
        assert_abs_diff_eq!(beta + w, im, epsilon = 1e-12);
    }

    #[test]
    fn reduce_divides_by_sqrt2() {
        let x = ZOmega::new(1, -2, 3, 7);
        let sqrt2 = ZSqrt2::new(0, 1).to_zomega();
        let y = &x * &sqrt2;
        assert!(y.is_reducible());
        assert_eq!(y.reduce(), x);
        assert!(!ZOmega::one().is_reducible());
    }

    #[test]
    fn real_round_trip() {
        let x = ZSqrt2::new(-5, 3);
        assert_eq!(x.to_zomega().to_zsqrt2().unwrap(), x);
        assert_eq!(x.to_zomega().norm(), &x * &x);
        assert!(matches!(ZOmega::i().to_zsqrt2(), Err(SynthError::Internal(_))));
    }

    #[rstest]
    #[case(ZSqrt2::new(3, 1), 1, 1)]
    #[case(ZSqrt2::new(1, -1), -1, 1)]
    #[case(ZSqrt2::new(-3, 2), -1, -1)]
    #[case(ZSqrt2::new(0, 0), 0, 0)]
    fn exact_signs(#[case] x: ZSqrt2, #[case] sign: i32, #[case] sign_dot: i32) {
        assert_eq!(x.signum(), sign);
        assert_eq!(x.dot().signum(), sign_dot);
    }

    #[test]
    fn square_roots() {
        for r in [ZSqrt2::new(3, -2), ZSqrt2::new(1, 1), ZSqrt2::new(0, 5), ZSqrt2::new(7, 0)] {
            let sq = &r * &r;
            let s = sq.self_sqrt().unwrap();
            assert_eq!(&s * &s, sq);
        }
        assert!(matches!(ZSqrt2::new(3, 0).self_sqrt(), Err(SynthError::Internal(_))));
        assert!(ZSqrt2::new(-4, 0).self_sqrt().is_err());
    }

    #[test]
    fn gcd_finds_common_factor() {
        let p = ZSqrt2::new(3, 1); // norm 7
        let x = &p * &ZSqrt2::new(5, 2);
        let y = &p * &ZSqrt2::new(1, 3);
        let g = ZSqrt2::gcd(&x, &y);
        assert!(x.exact_div(&g).is_some());
        assert!(y.exact_div(&g).is_some());
        assert_eq!(g.norm().abs() % 7, BigInt::zero());
    }

    #[test]
    fn lambda_powers() {
        assert_eq!(&ZSqrt2::lambda_pow(5) * &ZSqrt2::lambda_pow(-5), ZSqrt2::one());
        assert_eq!(ZSqrt2::lambda_pow(0), ZSqrt2::one());
        assert_eq!(ZSqrt2::lambda_pow(-1), ZSqrt2::lambda_inv());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    fn random_division_identities(#[case] seed: u64) {
        let mut rng = SmallRng::seed_from_u64(seed);
        for _ in 0..200 {
            let x = random_zsqrt2(&mut rng, 1000);
            let y = random_zsqrt2(&mut rng, 30);
            if y.is_zero() {
                continue;
            }
            let r = &x % &y;
            assert_eq!(&(&(&x / &y) * &y) + &r, x, "{x} / {y}");
            assert!(r.norm().abs() < y.norm().abs(), "{x} % {y} = {r}");

            let u = random_zomega(&mut rng, 1000);
            let v = random_zomega(&mut rng, 30);
            if v.is_zero() {
                continue;
            }
            let r = &u % &v;
            assert_eq!(&(&(&u / &v) * &v) + &r, u, "{u} / {v}");
            assert!(r.norm().norm() < v.norm().norm(), "{u} % {v} = {r}");
        }
    }

    #[rstest]
    #[case(4)]
    #[case(5)]
    fn random_conjugation_and_norms(#[case] seed: u64) {
        let mut rng = SmallRng::seed_from_u64(seed);
        for _ in 0..200 {
            let (x, y) = (random_zomega(&mut rng, 500), random_zomega(&mut rng, 500));
            assert_eq!(x.conj().conj(), x);
            assert_eq!(x.dot().dot(), x);
            assert_eq!((&x * &y).conj(), &x.conj() * &y.conj());
            assert_eq!((&x * &y).norm(), &x.norm() * &y.norm());
            assert_eq!((&x * &x.conj()).to_zsqrt2().unwrap(), x.norm());

            let (a, b) = (random_zsqrt2(&mut rng, 500), random_zsqrt2(&mut rng, 500));
            assert_eq!(a.dot().dot(), a);
            assert_eq!((&a * &b).norm(), a.norm() * b.norm());
            assert_eq!(a.to_zomega().to_zsqrt2().unwrap(), a);
            assert_eq!(ZOmega::from(&a), a.to_zomega());
        }
    }
}
