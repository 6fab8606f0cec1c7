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

//! Exact single-qubit Clifford+T unitaries.
//!
//! Every such unitary can be written as
//!
//! ```text
//!   1    [ u   -t̄ ωˡ ]
//! ---- · [           ]
//! √2ᵏ    [ t    ū ωˡ ]
//! ```
//!
//! with u, t ∈ Z[ω]. [`DOmegaMatrix`] stores the tuple (u, t, k, l) with k
//! as small as possible, so structurally equal matrices are equal as
//! unitaries and can key a hash map.

use num::complex::Complex;
use num::{BigInt, One};
use std::fmt;
use std::ops::Mul;

use crate::error::SynthError;
use crate::rings::{ZOmega, ZSqrt2};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DOmegaMatrix {
    u: ZOmega,
    t: ZOmega,
    k: i64,
    l: u8,
}

impl DOmegaMatrix {
    /// Checked constructor: `l` must lie in [0, 8) and |u|² + |t|² = 2ᵏ.
    pub fn new(u: ZOmega, t: ZOmega, k: i64, l: u8) -> Result<DOmegaMatrix, SynthError> {
        if l >= 8 {
            return Err(SynthError::config(format!("phase exponent {l} is not in [0, 8)")));
        }
        let m = DOmegaMatrix::from_parts(u, t, k, l);
        if !m.is_unitary() {
            return Err(SynthError::config(format!(
                "|u|² + |t|² ≠ 2^k for u = {}, t = {}, k = {}",
                m.u, m.t, m.k
            )));
        }
        Ok(m)
    }

    /// Construct and reduce, trusting that the invariants hold.
    pub(crate) fn from_parts(u: ZOmega, t: ZOmega, k: i64, l: u8) -> DOmegaMatrix {
        let mut m = DOmegaMatrix { u, t, k, l: l % 8 };
        m.reduce();
        m
    }

    pub fn identity() -> DOmegaMatrix {
        DOmegaMatrix::from_parts(ZOmega::one(), ZOmega::zero(), 0, 0)
    }

    pub fn hadamard() -> DOmegaMatrix {
        DOmegaMatrix::from_parts(ZOmega::one(), ZOmega::one(), 1, 4)
    }

    pub fn t_gate() -> DOmegaMatrix {
        DOmegaMatrix::from_parts(ZOmega::one(), ZOmega::zero(), 0, 1)
    }

    pub fn s_gate() -> DOmegaMatrix {
        DOmegaMatrix::from_parts(ZOmega::one(), ZOmega::zero(), 0, 2)
    }

    pub fn u(&self) -> &ZOmega {
        &self.u
    }

    pub fn t(&self) -> &ZOmega {
        &self.t
    }

    pub fn k(&self) -> i64 {
        self.k
    }

    pub fn l(&self) -> u8 {
        self.l
    }

    pub fn is_unitary(&self) -> bool {
        let lhs = &self.u.norm() + &self.t.norm();
        if self.k >= 0 {
            lhs == ZSqrt2::from_int(BigInt::one() << (self.k as usize))
        } else {
            // 2^k with k < 0 is never an integer
            false
        }
    }

    /// Divide u and t by √2 for as long as both allow it.
    pub fn reduce(&mut self) {
        if self.u.is_zero() && self.t.is_zero() {
            return;
        }
        while self.u.is_reducible() && self.t.is_reducible() {
            self.u = self.u.reduce();
            self.t = self.t.reduce();
            self.k -= 1;
        }
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> DOmegaMatrix {
        DOmegaMatrix::from_parts(
            self.u.conj(),
            -(&self.t * &ZOmega::w_pow(-(self.l as i64))),
            self.k,
            (8 - self.l) % 8,
        )
    }

    /// Multiply by the global phase ωⁿ.
    pub fn mul_by_w(&self, n: u8) -> DOmegaMatrix {
        let n = n % 8;
        let w = DOmegaMatrix::from_parts(ZOmega::w_pow(n as i64), ZOmega::zero(), 0, (2 * n) % 8);
        self * &w
    }

    /// Smallest denominator exponent of |u|², which drops by one with each
    /// H or T·H peeled off during exact synthesis.
    pub fn sde_u_sq(&self) -> i64 {
        if self.u.is_zero() {
            return 0;
        }
        let mut s = 2 * self.k;
        let mut u_sq = &self.u * &self.u.conj();
        while u_sq.is_reducible() {
            u_sq = u_sq.reduce();
            s -= 1;
        }
        s
    }

    /// Parse a word over `H`, `T`, `S`, `W` (global phase ω) and `I`, read
    /// left to right as a matrix product.
    pub fn from_gate_str(s: &str) -> Result<DOmegaMatrix, SynthError> {
        let mut prod = DOmegaMatrix::identity();
        for c in s.chars() {
            prod = match c {
                'H' => &prod * &DOmegaMatrix::hadamard(),
                'T' => &prod * &DOmegaMatrix::t_gate(),
                'S' => &prod * &DOmegaMatrix::s_gate(),
                'W' => prod.mul_by_w(1),
                'I' => prod,
                _ => {
                    return Err(SynthError::config(format!(
                        "unrecognized character '{c}' in gate string \"{s}\""
                    )))
                }
            };
        }
        Ok(prod)
    }

    /// Numerical value of the unitary.
    pub fn to_complex(&self) -> [[Complex<f64>; 2]; 2] {
        let scale = 2f64.powf(-(self.k as f64) / 2.0);
        let c = |z: &ZOmega| {
            let (re, im) = z.to_f64();
            Complex::new(re * scale, im * scale)
        };
        let wl = c(&ZOmega::w_pow(self.l as i64)) / scale;
        let (u, t) = (c(&self.u), c(&self.t));
        [[u, -t.conj() * wl], [t, u.conj() * wl]]
    }
}

impl Mul<&DOmegaMatrix> for &DOmegaMatrix {
    type Output = DOmegaMatrix;

    fn mul(self, rhs: &DOmegaMatrix) -> DOmegaMatrix {
        let wl = ZOmega::w_pow(self.l as i64);
        let tb = &rhs.t * &wl;
        DOmegaMatrix::from_parts(
            &(&self.u * &rhs.u) - &(&self.t.conj() * &tb),
            &(&self.t * &rhs.u) + &(&self.u.conj() * &tb),
            self.k + rhs.k,
            (self.l + rhs.l) % 8,
        )
    }
}

impl Mul<DOmegaMatrix> for DOmegaMatrix {
    type Output = DOmegaMatrix;
    fn mul(self, rhs: DOmegaMatrix) -> DOmegaMatrix {
        &self * &rhs
    }
}

impl fmt::Display for DOmegaMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "u = {}", self.u)?;
        writeln!(f, "t = {}", self.t)?;
        writeln!(f, "k = {}", self.k)?;
        writeln!(f, "l = {}", self.l)
    }
}

/// One left to right rewriting pass: drop `I`, cancel `HH`, fold `TT` into
/// `S`. Characters outside this alphabet are copied through. The empty word
/// is written `I`.
pub fn simplify_str(s: &str) -> String {
    let chars: Vec<char> = s.chars().filter(|&c| c != 'I').collect();
    if chars.is_empty() {
        return "I".to_string();
    }
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        match (chars[i], chars.get(i + 1).copied()) {
            ('H', Some('H')) => i += 2,
            ('T', Some('T')) => {
                out.push('S');
                i += 2;
            }
            (c, _) => {
                out.push(c);
                i += 1;
            }
        }
    }
    if out.is_empty() {
        "I".to_string()
    } else {
        out
    }
}

/// Apply [`simplify_str`] until the word stops shrinking.
pub fn full_simplify_str(s: &str) -> String {
    let mut cur = simplify_str(s);
    loop {
        let next = simplify_str(&cur);
        if next.len() >= cur.len() {
            return cur;
        }
        cur = next;
    }
}
