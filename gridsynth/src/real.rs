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

//! Arbitrary precision binary floating point numbers.
//!
//! A [`Real`] is a value `mant * 2^exp` where the mantissa is a big integer
//! holding at most `prec` significant bits. Every value carries its own
//! precision; binary operations work at the larger of the two.

use num::bigint::Sign;
use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub mod functions;
pub use functions::{atan2, cos, pi, sin, sin_cos};

#[derive(Clone, Debug)]
pub struct Real {
    mant: BigInt,
    exp: i64,
    prec: u32,
}

/// 2^n as a big integer
pub(crate) fn pow2(n: u64) -> BigInt {
    BigInt::one() << (n as usize)
}

impl Real {
    /// Round `mant * 2^exp` to `prec` bits, nearest with ties up.
    pub(crate) fn normalized(mut mant: BigInt, mut exp: i64, prec: u32) -> Real {
        if mant.is_zero() {
            return Real { mant, exp: 0, prec };
        }
        let bits = mant.bits();
        if bits > prec as u64 {
            let shift = bits - prec as u64;
            mant = (mant + pow2(shift - 1)).div_floor(&pow2(shift));
            exp += shift as i64;
        }
        Real { mant, exp, prec }
    }

    pub fn zero(prec: u32) -> Real {
        Real { mant: BigInt::zero(), exp: 0, prec }
    }

    pub fn one(prec: u32) -> Real {
        Real { mant: BigInt::one(), exp: 0, prec }
    }

    pub fn from_int(n: impl Into<BigInt>, prec: u32) -> Real {
        Real::normalized(n.into(), 0, prec)
    }

    /// The exact ratio `num / den`, rounded to `prec` bits.
    pub fn from_ratio(num: i64, den: i64, prec: u32) -> Real {
        Real::from_int(num, prec) / Real::from_int(den, prec)
    }

    pub fn from_f64(x: f64, prec: u32) -> Real {
        if x == 0.0 || !x.is_finite() {
            return Real::zero(prec);
        }
        let bits = x.to_bits();
        let negative = bits >> 63 != 0;
        let biased = ((bits >> 52) & 0x7ff) as i64;
        let frac = bits & 0x000f_ffff_ffff_ffff;
        let (m, e) = if biased == 0 {
            (frac, -1074)
        } else {
            (frac | 0x0010_0000_0000_0000, biased - 1075)
        };
        let m = BigInt::from(m);
        Real::normalized(if negative { -m } else { m }, e, prec)
    }

    /// 2^k at the given precision.
    pub fn pow2(k: i64, prec: u32) -> Real {
        Real { mant: BigInt::one(), exp: k, prec }
    }

    /// Parse a decimal literal such as `-0.125`, `3`, or `1.5e-3`.
    pub fn parse_decimal(s: &str, prec: u32) -> Option<Real> {
        let s = s.trim();
        let (negative, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (body, exp10) = match s.find(['e', 'E']) {
            Some(i) => (&s[..i], s[i + 1..].parse::<i64>().ok()?),
            None => (s, 0),
        };
        let (int_part, frac_part) = match body.find('.') {
            Some(i) => (&body[..i], &body[i + 1..]),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }
        let digits = format!("{int_part}{frac_part}");
        let mut n: BigInt = digits.parse().ok()?;
        if negative {
            n = -n;
        }
        let e = exp10 - frac_part.len() as i64;
        let ten = BigInt::from(10);
        let value = if e >= 0 {
            Real::from_int(n * num::pow(ten, e as usize), prec)
        } else {
            Real::from_int(n, prec) / Real::from_int(num::pow(ten, (-e) as usize), prec)
        };
        Some(value)
    }

    pub fn prec(&self) -> u32 {
        self.prec
    }

    /// The same value rounded (or padded) to a new precision.
    pub fn with_prec(&self, prec: u32) -> Real {
        Real::normalized(self.mant.clone(), self.exp, prec)
    }

    pub fn is_zero(&self) -> bool {
        self.mant.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mant.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.mant.is_positive()
    }

    pub fn signum(&self) -> i32 {
        match self.mant.sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    pub fn abs(&self) -> Real {
        Real { mant: self.mant.abs(), exp: self.exp, prec: self.prec }
    }

    /// Multiply by 2^k exactly.
    pub fn ldexp(&self, k: i64) -> Real {
        if self.is_zero() {
            return self.clone();
        }
        Real { mant: self.mant.clone(), exp: self.exp + k, prec: self.prec }
    }

    /// Position just above the leading bit, so `2^(top-1) <= |x| < 2^top`.
    pub(crate) fn top(&self) -> i64 {
        self.exp + self.mant.bits() as i64
    }

    pub fn floor(&self) -> BigInt {
        if self.exp >= 0 {
            &self.mant << (self.exp as usize)
        } else {
            self.mant.div_floor(&pow2((-self.exp) as u64))
        }
    }

    pub fn ceil(&self) -> BigInt {
        -(-self).floor()
    }

    /// Round to the nearest integer, halves going up.
    pub fn round(&self) -> BigInt {
        if self.exp >= 0 {
            &self.mant << (self.exp as usize)
        } else {
            let e = (-self.exp) as u64;
            (&self.mant + pow2(e - 1)).div_floor(&pow2(e))
        }
    }

    /// Round towards zero.
    pub fn trunc(&self) -> BigInt {
        if self.exp >= 0 {
            &self.mant << (self.exp as usize)
        } else {
            &self.mant / pow2((-self.exp) as u64)
        }
    }

    /// Square root. Negative inputs, which only arise from rounding noise
    /// around zero, are clamped to zero.
    pub fn sqrt(&self) -> Real {
        if !self.is_positive() {
            return Real::zero(self.prec);
        }
        let bits = self.mant.bits() as i64;
        let mut shift = (2 * self.prec as i64 + 4 - bits).max(0);
        if (self.exp - shift).rem_euclid(2) != 0 {
            shift += 1;
        }
        let m = (&self.mant << (shift as usize)).sqrt();
        Real::normalized(m, (self.exp - shift) / 2, self.prec)
    }

    pub fn powi(&self, n: i64) -> Real {
        let mut base = self.clone();
        let mut result = Real::one(self.prec);
        let mut k = n.unsigned_abs();
        while k > 0 {
            if k & 1 == 1 {
                result = &result * &base;
            }
            k >>= 1;
            if k > 0 {
                base = &base * &base;
            }
        }
        if n < 0 {
            Real::one(self.prec) / result
        } else {
            result
        }
    }

    /// Natural logarithm at the working precision, or `None` for values
    /// that are not positive.
    pub fn ln(&self) -> Option<Real> {
        functions::ln(self)
    }

    /// Double precision estimate of the natural logarithm, for picking
    /// integer exponents.
    pub fn ln_f64(&self) -> f64 {
        if !self.is_positive() {
            return f64::NEG_INFINITY;
        }
        let bits = self.mant.bits();
        let head = if bits > 53 {
            self.mant.div_floor(&pow2(bits - 53))
        } else {
            self.mant.clone()
        };
        let head_bits = bits.min(53);
        let m = head.to_f64().unwrap_or(1.0) / 2f64.powi(head_bits as i32);
        m.ln() + (self.exp + bits as i64) as f64 * std::f64::consts::LN_2
    }

    /// Quotient, or `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Real) -> Option<Real> {
        let prec = self.prec.max(rhs.prec);
        if rhs.is_zero() {
            return None;
        }
        if self.is_zero() {
            return Some(Real::zero(prec));
        }
        let shift = (prec as i64 + 2 + rhs.mant.bits() as i64 - self.mant.bits() as i64).max(0);
        let q = (&self.mant << (shift as usize)) / &rhs.mant;
        Some(Real::normalized(q, self.exp - rhs.exp - shift, prec))
    }

    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let bits = self.mant.bits();
        let (m, e) = if bits > 64 {
            let s = bits - 64;
            (self.mant.div_floor(&pow2(s)), self.exp + s as i64)
        } else {
            (self.mant.clone(), self.exp)
        };
        let e = e.clamp(-4000, 4000) as i32;
        let mf = m.to_f64().unwrap_or(0.0);
        mf * 2f64.powi(e / 2) * 2f64.powi(e - e / 2)
    }

    /// True when `self >= other`, or within `tol` of it.
    pub fn ge_tol(&self, other: &Real, tol: &Real) -> bool {
        self >= other || (self - other).abs() < *tol
    }

    /// True when `self <= other`, or within `tol` of it.
    pub fn le_tol(&self, other: &Real, tol: &Real) -> bool {
        self <= other || (self - other).abs() < *tol
    }

    /// Scientific notation with `digits` significant digits.
    pub fn to_decimal_string(&self, digits: usize) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let digits = digits.max(1);
        let e10 = (self.abs().ln_f64() / std::f64::consts::LN_10).floor() as i64;
        let scale = digits as i64 - 1 - e10;
        let ten = Real::from_int(10, self.prec + 16);
        let x = self.abs().with_prec(self.prec + 16);
        let scaled = if scale >= 0 { x * ten.powi(scale) } else { x / ten.powi(-scale) };
        let mut s = scaled.round().to_string();
        let mut e = e10;
        if s.len() > digits {
            e += (s.len() - digits) as i64;
            s.truncate(digits);
        } else if s.len() < digits {
            e -= (digits - s.len()) as i64;
        }
        let sign = if self.is_negative() { "-" } else { "" };
        if s.len() == 1 {
            format!("{sign}{s}e{e}")
        } else {
            format!("{sign}{}.{}e{e}", &s[..1], &s[1..])
        }
    }

    fn cmp_value(&self, other: &Real) -> Ordering {
        let (sa, sb) = (self.mant.sign(), other.mant.sign());
        if sa != sb {
            return sa.cmp(&sb);
        }
        if sa == Sign::NoSign {
            return Ordering::Equal;
        }
        let ord = match self.top().cmp(&other.top()) {
            Ordering::Equal => {
                let e = self.exp.min(other.exp);
                let ma = &self.mant << ((self.exp - e) as usize);
                let mb = &other.mant << ((other.exp - e) as usize);
                return ma.cmp(&mb);
            }
            o => o,
        };
        if sa == Sign::Plus {
            ord
        } else {
            ord.reverse()
        }
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Real) -> bool {
        self.cmp_value(other) == Ordering::Equal
    }
}

impl Eq for Real {}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Real) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Real) -> Ordering {
        self.cmp_value(other)
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = f.precision().unwrap_or(17);
        write!(f, "{}", self.to_decimal_string(digits))
    }
}

impl Neg for &Real {
    type Output = Real;
    fn neg(self) -> Real {
        Real { mant: -&self.mant, exp: self.exp, prec: self.prec }
    }
}

impl Neg for Real {
    type Output = Real;
    fn neg(self) -> Real {
        Real { mant: -self.mant, exp: self.exp, prec: self.prec }
    }
}

impl Add<&Real> for &Real {
    type Output = Real;

    fn add(self, rhs: &Real) -> Real {
        let prec = self.prec.max(rhs.prec);
        if rhs.is_zero() {
            return self.with_prec(prec);
        }
        if self.is_zero() {
            return rhs.with_prec(prec);
        }
        // a summand entirely below the rounding bit of the other is dropped
        let slack = prec as i64 + 2;
        if self.top() > rhs.top() + slack {
            return self.with_prec(prec);
        }
        if rhs.top() > self.top() + slack {
            return rhs.with_prec(prec);
        }
        let e = self.exp.min(rhs.exp);
        let ma = &self.mant << ((self.exp - e) as usize);
        let mb = &rhs.mant << ((rhs.exp - e) as usize);
        Real::normalized(ma + mb, e, prec)
    }
}

impl Sub<&Real> for &Real {
    type Output = Real;
    fn sub(self, rhs: &Real) -> Real {
        self + &(-rhs)
    }
}

impl Mul<&Real> for &Real {
    type Output = Real;
    fn mul(self, rhs: &Real) -> Real {
        Real::normalized(&self.mant * &rhs.mant, self.exp + rhs.exp, self.prec.max(rhs.prec))
    }
}

impl Div<&Real> for &Real {
    type Output = Real;

    /// Panics on division by zero, like the integer types. Use
    /// [`Real::checked_div`] where the divisor may vanish.
    fn div(self, rhs: &Real) -> Real {
        match self.checked_div(rhs) {
            Some(q) => q,
            None => panic!("attempt to divide a Real by zero"),
        }
    }
}

/// The reference impls above carry the arithmetic; these forward the
/// variations that take ownership of one or both arguments.
macro_rules! forward_owned_binop {
    ($t:ty, $tr:ident, $f:ident) => {
        impl $tr<$t> for $t {
            type Output = $t;
            fn $f(self, rhs: $t) -> $t {
                (&self).$f(&rhs)
            }
        }
        impl $tr<$t> for &$t {
            type Output = $t;
            fn $f(self, rhs: $t) -> $t {
                self.$f(&rhs)
            }
        }
        impl $tr<&$t> for $t {
            type Output = $t;
            fn $f(self, rhs: &$t) -> $t {
                (&self).$f(rhs)
            }
        }
    };
}

pub(crate) use forward_owned_binop;

forward_owned_binop!(Real, Add, add);
forward_owned_binop!(Real, Sub, sub);
forward_owned_binop!(Real, Mul, mul);
forward_owned_binop!(Real, Div, div);
