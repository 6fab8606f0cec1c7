//! Solving the norm equation t·t̄ = ξ over Z[ω] for ξ ∈ Z[√2].
//!
//! The equation is solvable iff ξ is doubly positive and every prime of
//! Z[√2] that stays inert in Z[ω] divides ξ to an even power. We find the
//! factorisation of ξ through the integer N(ξ) = ξ·ξ•, build t one prime at
//! a time and fix up the leftover unit at the end.
//!
//! Factoring is randomised and bounded: any step that runs out of budget
//! makes the whole solve return `Ok(None)`, which callers treat as "try the
//! next candidate".

use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};
use rand::rngs::SmallRng;
use rand::RngCore;

use crate::config::{Context, POLLARD_RHO_INITIAL_ADDEND, POLLARD_RHO_START};
use crate::error::SynthError;
use crate::rings::{ZOmega, ZSqrt2};

/// Primes below this bound are removed by trial division.
const TRIAL_DIVISION_BOUND: u32 = 1 << 10;

fn int(n: i64) -> BigInt {
    BigInt::from(n)
}

fn add_factor(factors: &mut Vec<(BigInt, u32)>, p: BigInt) {
    match factors.iter_mut().find(|(q, _)| *q == p) {
        Some((_, e)) => *e += 1,
        None => factors.push((p, 1)),
    }
}

/// A uniformly distributed integer in [0, n), for n > 0.
fn random_below(n: &BigInt, rng: &mut SmallRng) -> BigInt {
    let bytes = (n.bits() as usize).div_ceil(8) + 8;
    let mut buf = vec![0u8; bytes];
    rng.fill_bytes(&mut buf);
    BigInt::from_bytes_le(num::bigint::Sign::Plus, &buf).mod_floor(n)
}

/// Fermat probable-prime test with `iterations` random witnesses.
pub fn is_probable_prime(n: &BigInt, iterations: usize, rng: &mut SmallRng) -> bool {
    if *n < int(2) {
        return false;
    }
    if *n < int(4) {
        return true;
    }
    if n.is_even() {
        return false;
    }
    let n_minus_one = n - 1;
    let span = n - 3;
    (0..iterations).all(|_| {
        let a: BigInt = random_below(&span, rng) + int(2);
        a.modpow(&n_minus_one, n).is_one()
    })
}

/// Pollard's ρ with Floyd cycle detection, giving up after `effort`
/// iterations. Returns a proper factor of the composite `n`.
pub fn pollard_rho(n: &BigInt, effort: u64, rng: &mut SmallRng) -> Option<BigInt> {
    if n.is_even() {
        return Some(int(2));
    }
    let mut addend = BigInt::from(POLLARD_RHO_INITIAL_ADDEND);
    let mut x = BigInt::from(POLLARD_RHO_START);
    let mut y = x.clone();
    let f = |v: &BigInt, c: &BigInt| (v * v + c).mod_floor(n);
    for _ in 0..effort {
        x = f(&x, &addend);
        y = f(&f(&y, &addend), &addend);
        let d = (&x - &y).abs().gcd(n);
        if d == *n {
            // cycle closed without a factor; restart the walk elsewhere
            addend += 1;
            x = random_below(n, rng);
            y = x.clone();
        } else if !d.is_one() {
            return Some(d);
        }
    }
    None
}

/// Prime factorisation of n >= 1 as (prime, exponent) pairs in increasing
/// order, or `None` if the factoring budget ran out.
pub fn prime_factorize_int(n: &BigInt, ctx: &Context, rng: &mut SmallRng) -> Option<Vec<(BigInt, u32)>> {
    let mut factors = vec![];
    let mut m = n.abs();
    if m.is_zero() {
        return None;
    }
    let mut q = 2u32;
    while q < TRIAL_DIVISION_BOUND && m > BigInt::one() {
        let qb = BigInt::from(q);
        while (&m % &qb).is_zero() {
            m /= &qb;
            add_factor(&mut factors, qb.clone());
        }
        q += if q == 2 { 1 } else { 2 };
    }

    let mut pending = vec![m];
    while let Some(m) = pending.pop() {
        if m.is_one() {
            continue;
        }
        if is_probable_prime(&m, ctx.fermat_iterations, rng) {
            add_factor(&mut factors, m);
            continue;
        }
        let d = pollard_rho(&m, ctx.factor_effort, rng)?;
        pending.push(&m / &d);
        pending.push(d);
    }
    factors.sort();
    Some(factors)
}

/// Square root of `a` modulo the odd prime `p` by Tonelli-Shanks. The
/// quadratic non-residue it needs is drawn at random, at most `attempts`
/// times. `None` if `a` is a non-residue or no non-residue was found.
pub fn sqrt_mod_prime(a: &BigInt, p: &BigInt, attempts: usize, rng: &mut SmallRng) -> Option<BigInt> {
    let a = a.mod_floor(p);
    if a.is_zero() || *p == int(2) {
        return Some(a);
    }
    let p_minus_one: BigInt = p - 1;
    let half = &p_minus_one >> 1;
    if !a.modpow(&half, p).is_one() {
        return None;
    }
    if (p % 4u32) == int(3) {
        return Some(a.modpow(&((p + 1) >> 2), p));
    }

    let mut s = 0u32;
    let mut q = p_minus_one.clone();
    while q.is_even() {
        q >>= 1;
        s += 1;
    }

    let span = p - 2;
    let z = (0..attempts)
        .map(|_| -> BigInt { random_below(&span, rng) + int(2) })
        .find(|z: &BigInt| z.modpow(&half, p) == p_minus_one)?;

    let mut m = s;
    let mut c = z.modpow(&q, p);
    let mut t = a.modpow(&q, p);
    let mut r = a.modpow(&((&q + 1) >> 1), p);
    while !t.is_one() {
        let mut i = 0;
        let mut t2 = t.clone();
        while !t2.is_one() {
            t2 = (&t2 * &t2).mod_floor(p);
            i += 1;
            if i == m {
                return None;
            }
        }
        let b = c.modpow(&(BigInt::one() << (m - i - 1)), p);
        m = i;
        c = (&b * &b).mod_floor(p);
        t = (&t * &c).mod_floor(p);
        r = (&r * &b).mod_floor(p);
    }
    Some(r)
}

/// Cornacchia's algorithm: (x, y) with x² + d·y² = p for the prime p.
pub fn cornacchia(d: u32, p: &BigInt, attempts: usize, rng: &mut SmallRng) -> Option<(BigInt, BigInt)> {
    let d = BigInt::from(d);
    let mut r = sqrt_mod_prime(&(-&d), p, attempts, rng)?;
    let half: BigInt = p >> 1;
    if r <= half {
        r = p - r;
    }
    let (mut a, mut b) = (p.clone(), r);
    while &b * &b >= *p {
        let next = a.mod_floor(&b);
        a = b;
        b = next;
    }
    let rest = p - &b * &b;
    if !(&rest % &d).is_zero() {
        return None;
    }
    let y2 = rest / &d;
    let y = y2.sqrt();
    if &y * &y != y2 {
        return None;
    }
    Some((b, y))
}

/// Number of times `eta` divides `xi`.
fn valuation(xi: &ZSqrt2, eta: &ZSqrt2) -> u64 {
    let mut v = 0;
    let mut rest = xi.clone();
    while let Some(q) = rest.exact_div(eta) {
        rest = q;
        v += 1;
    }
    v
}

/// The exponent m with λᵐ = u, if u is a power of λ.
fn lambda_log(u: &ZSqrt2, ctx: &Context) -> Option<i64> {
    let x = u.decimal(ctx);
    if !x.is_positive() {
        return None;
    }
    let m = (x.ln_f64() / ctx.log_lambda.to_f64()).round().to_i64()?;
    (ZSqrt2::lambda_pow(m) == *u).then_some(m)
}

/// Find t ∈ Z[ω] with t·t̄ = ξ.
///
/// `Ok(None)` means no solution exists or factoring ran out of budget.
/// Errors are reserved for broken internal invariants.
pub fn diophantine_solver(xi: &ZSqrt2, ctx: &Context, rng: &mut SmallRng) -> Result<Option<ZOmega>, SynthError> {
    if xi.is_zero() {
        return Ok(Some(ZOmega::zero()));
    }
    if !xi.is_doubly_positive() {
        return Ok(None);
    }

    let Some(factors) = prime_factorize_int(&xi.norm(), ctx, rng) else {
        log::trace!("could not factor the norm of {xi}");
        return Ok(None);
    };

    let attempts = ctx.sqrt_attempts;
    let mut t = ZOmega::one();
    for (p, e) in &factors {
        let e = *e as u64;
        match (p % 8u32).to_u32() {
            Some(2) => {
                t = &t * &ZOmega::new(0, 0, 1, 1).pow(e);
            }
            Some(3) => {
                // p = a² + 2b² = |a + b·i√2|²
                if e % 2 != 0 {
                    return Ok(None);
                }
                let Some((a, b)) = cornacchia(2, p, attempts, rng) else {
                    return Ok(None);
                };
                t = &t * &ZOmega::new(b.clone(), 0, b, a).pow(e / 2);
            }
            Some(5) => {
                // p = a² + b² = |a + b·i|²
                if e % 2 != 0 {
                    return Ok(None);
                }
                let Some((a, b)) = cornacchia(1, p, attempts, rng) else {
                    return Ok(None);
                };
                t = &t * &ZOmega::new(0, b, 0, a).pow(e / 2);
            }
            Some(r @ (1 | 7)) => {
                // p = ±η·η• splits in Z[√2]
                let Some(x) = sqrt_mod_prime(&int(2), p, attempts, rng) else {
                    return Ok(None);
                };
                let eta = ZSqrt2::gcd(&ZSqrt2::from_int(p.clone()), &ZSqrt2::new(x, 1));
                let eta_dot = eta.dot();
                let v1 = valuation(xi, &eta);
                let v2 = valuation(xi, &eta_dot);
                if r == 1 {
                    // η splits further in Z[ω]
                    let Some(x) = sqrt_mod_prime(&int(-1), p, attempts, rng) else {
                        return Ok(None);
                    };
                    let t_eta = ZOmega::gcd(&eta.to_zomega(), &ZOmega::new(0, 1, 0, x));
                    t = &t * &t_eta.pow(v1);
                    t = &t * &t_eta.dot().pow(v2);
                } else {
                    if v1 % 2 != 0 || v2 % 2 != 0 {
                        return Ok(None);
                    }
                    t = &t * &eta.to_zomega().pow(v1 / 2);
                    t = &t * &eta_dot.to_zomega().pow(v2 / 2);
                }
            }
            _ => return Err(SynthError::internal(format!("even prime factor {p} other than 2"))),
        }
    }

    // what is left is a doubly positive unit, so an even power of λ
    let tt = (&t * &t.conj()).to_zsqrt2()?;
    let Some(unit) = xi.exact_div(&tt) else {
        log::warn!("norm equation for {xi}: {tt} does not divide it");
        return Ok(None);
    };
    let Some(m) = lambda_log(&unit, ctx) else {
        log::warn!("norm equation for {xi}: leftover {unit} is not a unit");
        return Ok(None);
    };
    if m % 2 != 0 {
        return Ok(None);
    }
    t = &t * &ZSqrt2::lambda_pow(m / 2).to_zomega();

    if (&t * &t.conj()) != xi.to_zomega() {
        log::warn!("norm equation for {xi}: check failed for {t}");
        return Ok(None);
    }
    Ok(Some(t))
}
