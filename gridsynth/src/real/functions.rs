//! Transcendental functions on [`Real`].

use super::{pow2, Real};
use num::{BigInt, Zero};

/// atan(1/x) in fixed point with `bits` fractional bits.
fn arctan_inv(x: u64, bits: u64) -> BigInt {
    let x = BigInt::from(x);
    let x2 = &x * &x;
    let mut power = pow2(bits) / &x;
    let mut sum = power.clone();
    let mut n = BigInt::from(1);
    let mut subtract = true;
    loop {
        power /= &x2;
        n += 2u32;
        let term = &power / &n;
        if term.is_zero() {
            break;
        }
        if subtract {
            sum -= term;
        } else {
            sum += term;
        }
        subtract = !subtract;
    }
    sum
}

/// π to `prec` bits, by Machin's formula.
pub fn pi(prec: u32) -> Real {
    let bits = prec as u64 + 32;
    let v = arctan_inv(5, bits) * 16u32 - arctan_inv(239, bits) * 4u32;
    Real::normalized(v, -(bits as i64), prec)
}

/// Sine and cosine of `x` together, sharing the argument reduction.
pub fn sin_cos(x: &Real) -> (Real, Real) {
    let prec = x.prec();
    let wp = prec + 32 + (x.top().max(0) as u32);
    let two_pi = pi(wp).ldexp(1);
    let xw = x.with_prec(wp);
    let k = (&xw / &two_pi).round();
    let r = &xw - &(&two_pi * &Real::from_int(k, wp));
    let r2 = &r * &r;
    let cutoff = -(wp as i64) - 4;

    let mut sin = r.clone();
    let mut term = r;
    let mut n: i64 = 1;
    while !term.is_zero() && term.top() > cutoff {
        term = -(&(&term * &r2) / &Real::from_int((n + 1) * (n + 2), wp));
        sin = &sin + &term;
        n += 2;
    }

    let mut cos = Real::one(wp);
    let mut term = Real::one(wp);
    let mut n: i64 = 0;
    while !term.is_zero() && term.top() > cutoff {
        term = -(&(&term * &r2) / &Real::from_int((n + 1) * (n + 2), wp));
        cos = &cos + &term;
        n += 2;
    }

    (sin.with_prec(prec), cos.with_prec(prec))
}

/// Sum of t^n / n over odd n, which is atanh(t) for |t| < 1.
fn atanh_series(t: &Real) -> Real {
    let wp = t.prec();
    let cutoff = -(wp as i64) - 4;
    let t2 = t * t;
    let mut power = t.clone();
    let mut sum = t.clone();
    let mut n: i64 = 1;
    while !power.is_zero() && power.top() > cutoff {
        power = &power * &t2;
        n += 2;
        sum = &sum + &(&power / &Real::from_int(n, wp));
    }
    sum
}

/// Natural logarithm, or `None` when `x` is not positive.
pub fn ln(x: &Real) -> Option<Real> {
    if !x.is_positive() {
        return None;
    }
    let prec = x.prec();
    let wp = prec + 32;
    let one = Real::one(wp);
    // x = m·2^e with m in [1, 2)
    let e = x.top() - 1;
    let m = x.with_prec(wp).ldexp(-e);
    let ln_m = atanh_series(&((&m - &one) / (&m + &one))).ldexp(1);
    let ln2 = atanh_series(&Real::from_ratio(1, 3, wp)).ldexp(1);
    Some((ln_m + ln2 * Real::from_int(e, wp)).with_prec(prec))
}

/// Arctangent, in [-π/2, π/2].
pub fn atan(x: &Real) -> Real {
    let prec = x.prec();
    let wp = prec + 32;
    let one = Real::one(wp);
    let mut t = x.with_prec(wp);
    // atan(t) = 2·atan(t / (1 + √(1 + t²))), until |t| < 1/16
    let mut doublings = 0;
    while !t.is_zero() && t.top() > -4 {
        t = &t / &(&one + &(&one + &(&t * &t)).sqrt());
        doublings += 1;
    }

    let cutoff = -(wp as i64) - 4;
    let t2 = &t * &t;
    let mut power = t.clone();
    let mut sum = t;
    let mut n: i64 = 1;
    let mut subtract = true;
    while !power.is_zero() && power.top() > cutoff {
        power = &power * &t2;
        n += 2;
        let term = &power / &Real::from_int(n, wp);
        sum = if subtract { &sum - &term } else { &sum + &term };
        subtract = !subtract;
    }
    sum.ldexp(doublings).with_prec(prec)
}

/// Angle of the point (x, y), in (-π, π]. Zero at the origin.
pub fn atan2(y: &Real, x: &Real) -> Real {
    let prec = y.prec().max(x.prec());
    if x.is_zero() && y.is_zero() {
        return Real::zero(prec);
    }
    if y.abs() <= x.abs() {
        let a = atan(&(y / x));
        if !x.is_negative() {
            a
        } else if y.is_negative() {
            a - pi(prec)
        } else {
            a + pi(prec)
        }
    } else {
        let a = atan(&(x / y));
        let half_pi = pi(prec).ldexp(-1);
        if y.is_positive() {
            half_pi - a
        } else {
            -half_pi - a
        }
    }
}

pub fn sin(x: &Real) -> Real {
    sin_cos(x).0
}

pub fn cos(x: &Real) -> Real {
    sin_cos(x).1
}
