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

//! Two dimensional vectors and 2x2 matrices over [`Real`]

use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::error::SynthError;
use crate::real::{forward_owned_binop, Real};

#[derive(Clone, Debug, PartialEq)]
pub struct Vec2 {
    pub x: Real,
    pub y: Real,
}

impl Vec2 {
    pub fn new(x: Real, y: Real) -> Vec2 {
        Vec2 { x, y }
    }

    pub fn zero(prec: u32) -> Vec2 {
        Vec2 { x: Real::zero(prec), y: Real::zero(prec) }
    }

    pub fn dot(&self, other: &Vec2) -> Real {
        &self.x * &other.x + &self.y * &other.y
    }

    pub fn scale(&self, s: &Real) -> Vec2 {
        Vec2 { x: &self.x * s, y: &self.y * s }
    }
}

impl Add<&Vec2> for &Vec2 {
    type Output = Vec2;
    fn add(self, rhs: &Vec2) -> Vec2 {
        Vec2 { x: &self.x + &rhs.x, y: &self.y + &rhs.y }
    }
}

impl Sub<&Vec2> for &Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: &Vec2) -> Vec2 {
        Vec2 { x: &self.x - &rhs.x, y: &self.y - &rhs.y }
    }
}

forward_owned_binop!(Vec2, Add, add);
forward_owned_binop!(Vec2, Sub, sub);

/// A 2x2 real matrix, stored row major.
#[derive(Clone, Debug, PartialEq)]
pub struct Mat2 {
    pub d: [[Real; 2]; 2],
}

impl Mat2 {
    pub fn new(a00: Real, a01: Real, a10: Real, a11: Real) -> Mat2 {
        Mat2 { d: [[a00, a01], [a10, a11]] }
    }

    pub fn diag(a: Real, b: Real) -> Mat2 {
        let prec = a.prec().max(b.prec());
        Mat2::new(a, Real::zero(prec), Real::zero(prec), b)
    }

    pub fn get(&self, i: usize, j: usize) -> &Real {
        &self.d[i][j]
    }

    pub fn determinant(&self) -> Real {
        &self.d[0][0] * &self.d[1][1] - &self.d[0][1] * &self.d[1][0]
    }

    pub fn trace(&self) -> Real {
        &self.d[0][0] + &self.d[1][1]
    }

    pub fn transpose(&self) -> Mat2 {
        Mat2::new(
            self.d[0][0].clone(),
            self.d[1][0].clone(),
            self.d[0][1].clone(),
            self.d[1][1].clone(),
        )
    }

    /// Inverse via the adjugate. Singular matrices are an error.
    pub fn inverse(&self) -> Result<Mat2, SynthError> {
        let det = self.determinant();
        let inv = Real::one(det.prec())
            .checked_div(&det)
            .ok_or_else(|| SynthError::internal(format!("cannot invert singular matrix\n{self}")))?;
        Ok(Mat2::new(
            &self.d[1][1] * &inv,
            -(&self.d[0][1] * &inv),
            -(&self.d[1][0] * &inv),
            &self.d[0][0] * &inv,
        ))
    }

    pub fn scale(&self, s: &Real) -> Mat2 {
        Mat2::new(
            &self.d[0][0] * s,
            &self.d[0][1] * s,
            &self.d[1][0] * s,
            &self.d[1][1] * s,
        )
    }

    pub fn apply(&self, v: &Vec2) -> Vec2 {
        Vec2 {
            x: &self.d[0][0] * &v.x + &self.d[0][1] * &v.y,
            y: &self.d[1][0] * &v.x + &self.d[1][1] * &v.y,
        }
    }

    /// vᵀ M v
    pub fn quadratic_form(&self, v: &Vec2) -> Real {
        v.dot(&self.apply(v))
    }

    /// Mᵀ A M, the pull back of the quadratic form A along M.
    pub fn congruence(&self, a: &Mat2) -> Mat2 {
        &(&self.transpose() * a) * self
    }
}

impl Mul<&Mat2> for &Mat2 {
    type Output = Mat2;
    fn mul(self, rhs: &Mat2) -> Mat2 {
        let (a, b) = (&self.d, &rhs.d);
        Mat2::new(
            &a[0][0] * &b[0][0] + &a[0][1] * &b[1][0],
            &a[0][0] * &b[0][1] + &a[0][1] * &b[1][1],
            &a[1][0] * &b[0][0] + &a[1][1] * &b[1][0],
            &a[1][0] * &b[0][1] + &a[1][1] * &b[1][1],
        )
    }
}

forward_owned_binop!(Mat2, Mul, mul);

impl fmt::Display for Mat2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[[{:.8}, {:.8}], [{:.8}, {:.8}]]",
            self.d[0][0], self.d[0][1], self.d[1][0], self.d[1][1]
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn m(a: f64, b: f64, c: f64, d: f64) -> Mat2 {
        let r = |x| Real::from_f64(x, 128);
        Mat2::new(r(a), r(b), r(c), r(d))
    }

    #[test]
    fn inverse_times_self_is_identity() {
        let a = m(2.0, 1.0, -3.0, 0.5);
        let p = &a * &a.inverse().unwrap();
        assert_abs_diff_eq!(p.get(0, 0).to_f64(), 1.0, epsilon = 1e-30);
        assert_abs_diff_eq!(p.get(0, 1).to_f64(), 0.0, epsilon = 1e-30);
        assert_abs_diff_eq!(p.get(1, 0).to_f64(), 0.0, epsilon = 1e-30);
        assert_abs_diff_eq!(p.get(1, 1).to_f64(), 1.0, epsilon = 1e-30);
    }

    #[test]
    fn congruence_preserves_symmetry() {
        let a = m(3.0, 1.0, 1.0, 2.0);
        let g = m(1.0, 2.0, 0.0, 1.0);
        let c = g.congruence(&a);
        assert_eq!(c.get(0, 1), c.get(1, 0));
        assert_abs_diff_eq!(c.determinant().to_f64(), a.determinant().to_f64(), epsilon = 1e-20);
        let v = Vec2::new(Real::from_f64(0.5, 128), Real::from_f64(-1.5, 128));
        let gv = g.apply(&v);
        assert_abs_diff_eq!(
            c.quadratic_form(&v).to_f64(),
            a.quadratic_form(&gv).to_f64(),
            epsilon = 1e-20
        );
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let a = m(2.0, 1.0, 4.0, 2.0);
        assert!(matches!(a.inverse(), Err(SynthError::Internal(_))));
        assert!(Mat2::new(Real::zero(128), Real::zero(128), Real::zero(128), Real::zero(128))
            .inverse()
            .is_err());
    }
}
