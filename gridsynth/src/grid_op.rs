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

//! Grid operators: 2x2 matrices with entries in Z[1/√2] that map the grid
//! Z[ω] ⊂ ℂ ≅ ℝ² onto itself.
//!
//! An operator is stored as eight integers (a, a', b, b', c, c', d, d')
//! standing for the matrix
//!
//! ```text
//! [ a + a'/√2   b + b'/√2 ]
//! [ c + c'/√2   d + d'/√2 ]
//! ```
//!
//! subject to a + b + c + d being even and a', b', c', d' sharing a parity.

use num::{BigInt, Integer, Signed, Zero};
use std::fmt;
use std::ops::{Deref, Mul};

use crate::config::Context;
use crate::error::SynthError;
use crate::linalg::Mat2;
use crate::real::Real;
use crate::regions::Ellipse;
use crate::rings::ZOmega;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridOperator {
    a: BigInt,
    ap: BigInt,
    b: BigInt,
    bp: BigInt,
    c: BigInt,
    cp: BigInt,
    d: BigInt,
    dp: BigInt,
}

fn int(n: i64) -> BigInt {
    BigInt::from(n)
}

impl GridOperator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a: impl Into<BigInt>,
        ap: impl Into<BigInt>,
        b: impl Into<BigInt>,
        bp: impl Into<BigInt>,
        c: impl Into<BigInt>,
        cp: impl Into<BigInt>,
        d: impl Into<BigInt>,
        dp: impl Into<BigInt>,
    ) -> Result<GridOperator, SynthError> {
        let g = GridOperator {
            a: a.into(),
            ap: ap.into(),
            b: b.into(),
            bp: bp.into(),
            c: c.into(),
            cp: cp.into(),
            d: d.into(),
            dp: dp.into(),
        };
        if (&g.a + &g.b + &g.c + &g.d).is_odd() {
            return Err(SynthError::config(format!("a + b + c + d must be even in {g}")));
        }
        let parity = g.ap.is_odd();
        if [&g.bp, &g.cp, &g.dp].iter().any(|x| x.is_odd() != parity) {
            return Err(SynthError::config(format!(
                "a', b', c', d' must share a parity in {g}"
            )));
        }
        Ok(g)
    }

    #[allow(clippy::too_many_arguments)]
    fn raw(
        a: BigInt,
        ap: BigInt,
        b: BigInt,
        bp: BigInt,
        c: BigInt,
        cp: BigInt,
        d: BigInt,
        dp: BigInt,
    ) -> GridOperator {
        GridOperator { a, ap, b, bp, c, cp, d, dp }
    }

    /// Build from small integer constants known to satisfy the invariants.
    #[allow(clippy::too_many_arguments)]
    fn from_i64(a: i64, ap: i64, b: i64, bp: i64, c: i64, cp: i64, d: i64, dp: i64) -> GridOperator {
        GridOperator::raw(int(a), int(ap), int(b), int(bp), int(c), int(cp), int(d), int(dp))
    }

    /// The eight integers (a, a', b, b', c, c', d, d').
    pub fn entries(&self) -> [&BigInt; 8] {
        [&self.a, &self.ap, &self.b, &self.bp, &self.c, &self.cp, &self.d, &self.dp]
    }

    /// Conjugate every entry under √2 ↦ -√2.
    pub fn dot(&self) -> GridOperator {
        GridOperator::raw(
            self.a.clone(),
            -&self.ap,
            self.b.clone(),
            -&self.bp,
            self.c.clone(),
            -&self.cp,
            self.d.clone(),
            -&self.dp,
        )
    }

    pub fn transpose(&self) -> GridOperator {
        GridOperator::raw(
            self.a.clone(),
            self.ap.clone(),
            self.c.clone(),
            self.cp.clone(),
            self.b.clone(),
            self.bp.clone(),
            self.d.clone(),
            self.dp.clone(),
        )
    }

    /// σ·G·σ with σ = λ^{-1/2}·diag(λ, 1): scales the top-left entry by λ
    /// and the bottom-right by λ⁻¹.
    pub fn conjugate(&self) -> GridOperator {
        GridOperator::raw(
            &self.a + &self.ap,
            &self.a * 2u32 + &self.ap,
            self.b.clone(),
            self.bp.clone(),
            self.c.clone(),
            self.cp.clone(),
            &self.dp - &self.d,
            &self.d * 2u32 - &self.dp,
        )
    }

    /// Inverse of [`GridOperator::conjugate`].
    pub fn inv_conjugate(&self) -> GridOperator {
        GridOperator::raw(
            &self.ap - &self.a,
            &self.a * 2u32 - &self.ap,
            self.b.clone(),
            self.bp.clone(),
            self.c.clone(),
            self.cp.clone(),
            &self.d + &self.dp,
            &self.d * 2u32 + &self.dp,
        )
    }

    /// σᵏ·G·σᵏ for any integer k.
    pub fn shift(&self, k: i64) -> GridOperator {
        let mut g = self.clone();
        for _ in 0..k.unsigned_abs() {
            g = if k > 0 { g.conjugate() } else { g.inv_conjugate() };
        }
        g
    }

    /// The determinant, which lies in Z[1/√2]: returns (p, q, r) with
    /// det = p + q/√2 + r/2.
    pub fn determinant_parts(&self) -> (BigInt, BigInt, BigInt) {
        let (a, ap, b, bp, c, cp, d, dp) =
            (&self.a, &self.ap, &self.b, &self.bp, &self.c, &self.cp, &self.d, &self.dp);
        (a * d - c * b, a * dp + d * ap - c * bp - b * cp, ap * dp - cp * bp)
    }

    pub fn determinant(&self, ctx: &Context) -> Real {
        let (p, q, r) = self.determinant_parts();
        Real::from_int(p, ctx.prec)
            + Real::from_int(q, ctx.prec) * &ctx.inv_sqrt2
            + Real::from_int(r, ctx.prec).ldexp(-1)
    }

    /// The operator as a real 2x2 matrix.
    pub fn mat_rep(&self, ctx: &Context) -> Mat2 {
        let e = |x: &BigInt, xp: &BigInt| {
            Real::from_int(x.clone(), ctx.prec) + Real::from_int(xp.clone(), ctx.prec) * &ctx.inv_sqrt2
        };
        Mat2::new(e(&self.a, &self.ap), e(&self.b, &self.bp), e(&self.c, &self.cp), e(&self.d, &self.dp))
    }

    pub fn is_special(&self) -> bool {
        let (p, q, r) = self.determinant_parts();
        q.is_zero() && (p * 2u32 + r).abs() == int(2)
    }
}

impl Mul<&GridOperator> for &GridOperator {
    type Output = GridOperator;

    fn mul(self, g: &GridOperator) -> GridOperator {
        let f = self;
        GridOperator::raw(
            &f.a * &g.a + &f.b * &g.c + (&f.ap * &g.ap + &f.bp * &g.cp) / 2,
            &f.a * &g.ap + &f.ap * &g.a + &f.b * &g.cp + &f.bp * &g.c,
            &f.a * &g.b + &f.b * &g.d + (&f.ap * &g.bp + &f.bp * &g.dp) / 2,
            &f.a * &g.bp + &f.ap * &g.b + &f.b * &g.dp + &f.bp * &g.d,
            &f.c * &g.a + &f.d * &g.c + (&f.cp * &g.ap + &f.dp * &g.cp) / 2,
            &f.c * &g.ap + &f.cp * &g.a + &f.d * &g.cp + &f.dp * &g.c,
            &f.c * &g.b + &f.d * &g.d + (&f.cp * &g.bp + &f.dp * &g.dp) / 2,
            &f.c * &g.bp + &f.cp * &g.b + &f.d * &g.dp + &f.dp * &g.d,
        )
    }
}

impl Mul<&ZOmega> for &GridOperator {
    type Output = ZOmega;

    /// Apply to the point (Re z, Im z). Exact: grid operators preserve Z[ω].
    fn mul(self, z: &ZOmega) -> ZOmega {
        let x = &z.d;
        let xp = &z.c - &z.a;
        let y = &z.b;
        let yp = &z.c + &z.a;
        let g = self;
        let u = x * &g.a + y * &g.b + (&yp * &g.bp + &xp * &g.ap) / 2;
        let up = x * &g.ap + &xp * &g.a + y * &g.bp + &yp * &g.b;
        let v = x * &g.c + y * &g.d + (&xp * &g.cp + &yp * &g.dp) / 2;
        let vp = x * &g.cp + &xp * &g.c + y * &g.dp + &yp * &g.d;
        ZOmega::new((&vp - &up) / 2, v, (&vp + &up) / 2, u)
    }
}

impl fmt::Display for GridOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[[{} + {}/√2, {} + {}/√2], [{} + {}/√2, {} + {}/√2]]",
            self.a, self.ap, self.b, self.bp, self.c, self.cp, self.d, self.dp
        )
    }
}

/// A grid operator of determinant ±1, hence invertible as a grid operator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpecialGridOperator(GridOperator);

impl TryFrom<GridOperator> for SpecialGridOperator {
    type Error = SynthError;

    fn try_from(g: GridOperator) -> Result<Self, SynthError> {
        if g.is_special() {
            Ok(SpecialGridOperator(g))
        } else {
            Err(SynthError::config(format!("{g} does not have determinant ±1")))
        }
    }
}

impl Deref for SpecialGridOperator {
    type Target = GridOperator;
    fn deref(&self) -> &GridOperator {
        &self.0
    }
}

impl SpecialGridOperator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a: impl Into<BigInt>,
        ap: impl Into<BigInt>,
        b: impl Into<BigInt>,
        bp: impl Into<BigInt>,
        c: impl Into<BigInt>,
        cp: impl Into<BigInt>,
        d: impl Into<BigInt>,
        dp: impl Into<BigInt>,
    ) -> Result<SpecialGridOperator, SynthError> {
        SpecialGridOperator::try_from(GridOperator::new(a, ap, b, bp, c, cp, d, dp)?)
    }

    pub fn id() -> SpecialGridOperator {
        SpecialGridOperator(GridOperator::from_i64(1, 0, 0, 0, 0, 0, 1, 0))
    }

    pub fn r() -> SpecialGridOperator {
        SpecialGridOperator(GridOperator::from_i64(0, 1, 0, -1, 0, 1, 0, 1))
    }

    pub fn k() -> SpecialGridOperator {
        SpecialGridOperator(GridOperator::from_i64(-1, 1, 0, -1, 1, 1, 0, 1))
    }

    pub fn x() -> SpecialGridOperator {
        SpecialGridOperator(GridOperator::from_i64(0, 0, 1, 0, 1, 0, 0, 0))
    }

    pub fn z() -> SpecialGridOperator {
        SpecialGridOperator(GridOperator::from_i64(1, 0, 0, 0, 0, 0, -1, 0))
    }

    /// A(n) = [[1, -2n], [0, 1]]
    pub fn a(n: &BigInt) -> SpecialGridOperator {
        SpecialGridOperator(GridOperator::raw(int(1), int(0), -(n * 2u32), int(0), int(0), int(0), int(1), int(0)))
    }

    /// B(n) = [[1, √2 n], [0, 1]]
    pub fn b(n: &BigInt) -> SpecialGridOperator {
        SpecialGridOperator(GridOperator::raw(int(1), int(0), int(0), n * 2u32, int(0), int(0), int(1), int(0)))
    }

    pub fn into_inner(self) -> GridOperator {
        self.0
    }

    /// The determinant, which is exactly ±1.
    pub fn det_sign(&self) -> BigInt {
        let (p, _, r) = self.0.determinant_parts();
        (p * 2u32 + r) / 2
    }

    pub fn inverse(&self) -> SpecialGridOperator {
        let det = self.det_sign();
        let g = &self.0;
        SpecialGridOperator(GridOperator::raw(
            &g.d * &det,
            &g.dp * &det,
            -(&g.b * &det),
            -(&g.bp * &det),
            -(&g.c * &det),
            -(&g.cp * &det),
            &g.a * &det,
            &g.ap * &det,
        ))
    }

    pub fn dot(&self) -> SpecialGridOperator {
        SpecialGridOperator(self.0.dot())
    }

    pub fn transpose(&self) -> SpecialGridOperator {
        SpecialGridOperator(self.0.transpose())
    }

    pub fn conjugate(&self) -> SpecialGridOperator {
        SpecialGridOperator(self.0.conjugate())
    }

    pub fn inv_conjugate(&self) -> SpecialGridOperator {
        SpecialGridOperator(self.0.inv_conjugate())
    }

    pub fn shift(&self, k: i64) -> SpecialGridOperator {
        SpecialGridOperator(self.0.shift(k))
    }

    /// Image of an ellipse: the set of points p with G·p in `e`.
    pub fn apply_to_ellipse(&self, e: &Ellipse, ctx: &Context) -> Result<Ellipse, SynthError> {
        e.transformed(&self.mat_rep(ctx), ctx)
    }
}

impl Mul<&SpecialGridOperator> for &SpecialGridOperator {
    type Output = SpecialGridOperator;
    fn mul(self, rhs: &SpecialGridOperator) -> SpecialGridOperator {
        SpecialGridOperator(&self.0 * &rhs.0)
    }
}

impl Mul<SpecialGridOperator> for SpecialGridOperator {
    type Output = SpecialGridOperator;
    fn mul(self, rhs: SpecialGridOperator) -> SpecialGridOperator {
        &self * &rhs
    }
}

impl Mul<&ZOmega> for &SpecialGridOperator {
    type Output = ZOmega;
    fn mul(self, z: &ZOmega) -> ZOmega {
        &self.0 * z
    }
}

impl fmt::Display for SpecialGridOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
