//! Runtime options and the precision dependent constants derived from them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SynthError;
use crate::real::{pi, Real};

/// Default location of the persisted gate table.
pub const DEFAULT_TABLE_FILE: &str = "./s3_table_file.csv";
/// Smallest denominator exponent tried by the approximation search.
pub const KMIN: u32 = 0;
/// Largest denominator exponent tried by the approximation search.
pub const KMAX: u32 = 100;
/// Default iteration budget for Pollard's rho.
pub const DEFAULT_FACTOR_EFFORT: u64 = 200;
pub const MAX_ITERATIONS_FERMAT_TEST: usize = 5;
pub const MAX_ATTEMPTS_SQRT_NEG_ONE: usize = 10;
pub const POLLARD_RHO_INITIAL_ADDEND: u32 = 1;
pub const POLLARD_RHO_START: u32 = 2;
/// Decimal digits of the tolerance used for approximate float comparisons.
pub const TOL_DIGITS: u32 = 15;

/// User facing options for a synthesis session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSynthOptions {
    /// Requested accuracy in decimal digits, so that eps = 10^-precision.
    pub precision: u32,
    /// Iteration budget for integer factoring.
    pub factor_effort: u64,
    /// Gate table file. Read if present, otherwise generated and written.
    pub table_path: Option<PathBuf>,
    /// Verify every synthesised string by multiplying it back out.
    pub check: bool,
    /// Log per-angle diagnostics.
    pub details: bool,
    /// Log progress.
    pub verbose: bool,
    /// Seed for the randomised number theory. Drawn from the OS if unset.
    pub seed: Option<u64>,
    pub kmin: u32,
    pub kmax: u32,
}

impl Default for GridSynthOptions {
    fn default() -> Self {
        GridSynthOptions {
            precision: 10,
            factor_effort: DEFAULT_FACTOR_EFFORT,
            table_path: None,
            check: false,
            details: false,
            verbose: false,
            seed: None,
            kmin: KMIN,
            kmax: KMAX,
        }
    }
}

impl GridSynthOptions {
    pub fn with_precision(precision: u32) -> Self {
        GridSynthOptions { precision, ..Default::default() }
    }

    pub fn from_json(json: &str) -> Result<Self, SynthError> {
        serde_json::from_str(json).map_err(|e| SynthError::config(format!("bad options JSON: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, SynthError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), SynthError> {
        if self.precision == 0 {
            return Err(SynthError::config("precision must be at least one digit"));
        }
        if self.kmin > self.kmax {
            return Err(SynthError::config(format!(
                "kmin ({}) must not exceed kmax ({})",
                self.kmin, self.kmax
            )));
        }
        if self.factor_effort == 0 {
            return Err(SynthError::config("factor effort must be positive"));
        }
        Ok(())
    }
}

/// Immutable numerical context shared by every stage of the pipeline.
///
/// Holds the working precision in bits and the constants computed at that
/// precision, so nothing is recomputed per call.
#[derive(Debug, Clone)]
pub struct Context {
    pub prec: u32,
    pub digits: u32,
    pub eps: Real,
    pub tol: Real,
    pub sqrt2: Real,
    pub inv_sqrt2: Real,
    pub half_inv_sqrt2: Real,
    pub pi: Real,
    pub lambda: Real,
    pub lambda_inv: Real,
    pub log_lambda: Real,
    pub sqrt_lambda_inv: Real,
    pub kmin: u32,
    pub kmax: u32,
    pub factor_effort: u64,
    pub fermat_iterations: usize,
    pub sqrt_attempts: usize,
}

impl Context {
    pub fn new(options: &GridSynthOptions) -> Result<Context, SynthError> {
        options.validate()?;
        let digits = options.precision;
        // grid points reach 2^(k/2) with k around 3*log2(1/eps), so the
        // working precision grows well beyond the requested digits
        let prec = 20 * digits + 128;
        let ten = Real::from_int(10, prec);
        let eps = ten.powi(-(digits as i64));
        let tol = ten.powi(-(TOL_DIGITS.max(digits) as i64));
        let sqrt2 = Real::from_int(2, prec).sqrt();
        let one = Real::one(prec);
        let inv_sqrt2 = &one / &sqrt2;
        let half_inv_sqrt2 = inv_sqrt2.ldexp(-1);
        let lambda = &one + &sqrt2;
        let lambda_inv = &sqrt2 - &one;
        let log_lambda = lambda.ln().ok_or_else(|| SynthError::internal("λ must be positive"))?;
        let sqrt_lambda_inv = lambda_inv.sqrt();
        Ok(Context {
            prec,
            digits,
            eps,
            tol,
            sqrt2,
            inv_sqrt2,
            half_inv_sqrt2,
            pi: pi(prec),
            lambda,
            lambda_inv,
            log_lambda,
            sqrt_lambda_inv,
            kmin: options.kmin,
            kmax: options.kmax,
            factor_effort: options.factor_effort,
            fermat_iterations: MAX_ITERATIONS_FERMAT_TEST,
            sqrt_attempts: MAX_ATTEMPTS_SQRT_NEG_ONE,
        })
    }

    /// Context for `digits` of accuracy with every other option at its default.
    pub fn with_digits(digits: u32) -> Result<Context, SynthError> {
        Context::new(&GridSynthOptions::with_precision(digits))
    }

    pub fn real(&self, n: i64) -> Real {
        Real::from_int(n, self.prec)
    }

    pub fn ratio(&self, num: i64, den: i64) -> Real {
        Real::from_ratio(num, den, self.prec)
    }

    pub fn zero(&self) -> Real {
        Real::zero(self.prec)
    }

    pub fn one(&self) -> Real {
        Real::one(self.prec)
    }

    pub fn parse(&self, s: &str) -> Result<Real, SynthError> {
        Real::parse_decimal(s, self.prec)
            .ok_or_else(|| SynthError::config(format!("cannot parse '{s}' as a number")))
    }
}
