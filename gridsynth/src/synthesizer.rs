//! The [GridSynthesizer] session: turns angles into Clifford+T gate words.
//!
//! Angles that are multiples of π/4 are answered in closed form. Everything
//! else goes through the approximation search and exact synthesis, and the
//! result is cached under a decimal rendering of the angle.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use crate::config::{Context, GridSynthOptions};
use crate::error::SynthError;
use crate::exact_synthesis::{check_common_cases, synthesize};
use crate::matrix::{full_simplify_str, DOmegaMatrix};
use crate::real::Real;
use crate::rz_approx::{find_fast_rz_approximation, RzApproximation};
use crate::s3_table::S3Table;

/// A searched angle before it is recorded in the session.
struct Found {
    word: String,
    approx: RzApproximation,
}

pub struct GridSynthesizer {
    ctx: Context,
    table: S3Table,
    seed: u64,
    check: bool,
    details: bool,
    timer: bool,
    duration: Duration,
    cache: FxHashMap<String, String>,
    w_count: i64,
    valid: bool,
}

impl GridSynthesizer {
    pub fn new(options: &GridSynthOptions) -> Result<GridSynthesizer, SynthError> {
        let ctx = Context::new(options)?;
        let table = S3Table::load_or_generate(options.table_path.as_deref())?;
        GridSynthesizer::with_table(options, ctx, table)
    }

    /// Build a session around a table that is already in memory.
    pub fn with_table(
        options: &GridSynthOptions,
        ctx: Context,
        table: S3Table,
    ) -> Result<GridSynthesizer, SynthError> {
        if table.is_empty() {
            return Err(SynthError::config("gate table is empty"));
        }
        let seed = options.seed.unwrap_or_else(rand::random);
        if options.verbose {
            log::info!("tolerance for float equality: {:.3}", ctx.tol);
            log::info!("scale exponents: {}..={}", ctx.kmin, ctx.kmax);
            log::info!("factoring effort: {}", ctx.factor_effort);
            log::info!("primality test iterations: {}", ctx.fermat_iterations);
            log::info!("working precision: {} bits", ctx.prec);
            log::info!("seed: {seed}");
        }
        Ok(GridSynthesizer {
            ctx,
            table,
            seed,
            check: options.check,
            details: options.details,
            timer: false,
            duration: Duration::ZERO,
            cache: FxHashMap::default(),
            w_count: 0,
            valid: true,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn table(&self) -> &S3Table {
        &self.table
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// In timer mode every angle is searched afresh, skipping the cache,
    /// and the time spent searching accumulates in [Self::duration].
    pub fn set_timer(&mut self, on: bool) {
        self.timer = on;
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// False once any synthesised word failed its check or missed ε.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Total phase of the W and w gates returned so far, in units of π/8.
    pub fn get_w_count(&self) -> u8 {
        self.w_count.rem_euclid(16) as u8
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Gate word approximating rz(`angle`), with `angle` in radians.
    pub fn get_op_str(&mut self, angle: &Real) -> Result<String, SynthError> {
        if let Some(word) = self.common_case(angle) {
            return Ok(self.emit(word));
        }
        if self.timer {
            let start = Instant::now();
            let found = self.search(angle, &self.cache_key(angle))?;
            self.duration += start.elapsed();
            let word = self.record(angle, None, found);
            return Ok(self.emit(word));
        }

        let key = self.cache_key(angle);
        if let Some(word) = self.cache.get(&key) {
            log::debug!("angle {key} found in cache");
            let word = word.clone();
            return Ok(self.emit(word));
        }
        let found = self.search(angle, &key)?;
        let word = self.record(angle, Some(key), found);
        Ok(self.emit(word))
    }

    /// Gate words for several angles. Searches run in parallel, and the
    /// results are recorded in input order, so the session ends up as if
    /// [Self::get_op_str] had been called on each angle in turn.
    pub fn get_op_strs(&mut self, angles: &[Real]) -> Result<Vec<String>, SynthError> {
        let keys: Vec<String> = angles.iter().map(|a| self.cache_key(a)).collect();
        let mut pending: Vec<(&Real, &str)> = vec![];
        for (angle, key) in angles.iter().zip(&keys) {
            let todo = self.timer || !self.cache.contains_key(key.as_str());
            let unseen = !pending.iter().any(|(_, k)| *k == key.as_str());
            if todo && unseen && self.common_case(angle).is_none() {
                pending.push((angle, key.as_str()));
            }
        }
        log::debug!("searching {} of {} angles", pending.len(), angles.len());

        let start = Instant::now();
        let this = &*self;
        let results: Vec<Found> = pending
            .par_iter()
            .map(|(angle, key)| this.search(angle, key))
            .collect::<Result<_, _>>()?;
        if self.timer {
            self.duration += start.elapsed();
        }
        let mut found: FxHashMap<String, Found> =
            pending.iter().map(|(_, k)| k.to_string()).zip(results).collect();

        let mut words = Vec::with_capacity(angles.len());
        for (angle, key) in angles.iter().zip(keys) {
            let word = if let Some(w) = self.common_case(angle) {
                w
            } else if let Some(f) = found.remove(&key) {
                let cache_key = (!self.timer).then(|| key.clone());
                self.record(angle, cache_key, f)
            } else if let Some(w) = self.cache.get(&key) {
                w.clone()
            } else {
                // a repeat of an angle searched in timer mode
                let f = self.search(angle, &key)?;
                self.record(angle, None, f)
            };
            words.push(self.emit(word));
        }
        Ok(words)
    }

    fn common_case(&self, angle: &Real) -> Option<String> {
        let word = check_common_cases(&(angle / &self.ctx.pi), &self.ctx.eps)?;
        if self.details {
            log::info!("angle {angle} is a multiple of π/4, answer is known exactly");
        }
        Some(word)
    }

    fn cache_key(&self, angle: &Real) -> String {
        angle.to_decimal_string(self.ctx.prec as usize * 3 / 10)
    }

    /// Each angle gets its own generator, derived from the session seed
    /// and the angle, so results do not depend on the order of calls.
    fn rng_for(&self, key: &str) -> SmallRng {
        let mut h = FxHasher::default();
        self.seed.hash(&mut h);
        key.hash(&mut h);
        SmallRng::seed_from_u64(h.finish())
    }

    fn search(&self, angle: &Real, key: &str) -> Result<Found, SynthError> {
        let ctx = &self.ctx;
        let mut rng = self.rng_for(key);
        // rz(θ) has top-left entry e^{-iθ/2}
        let theta = angle / &ctx.real(-2);
        log::debug!("searching for an approximation of rz({key})");
        let approx = find_fast_rz_approximation(&theta, ctx, &mut rng)?.ok_or_else(|| {
            SynthError::SearchExhausted {
                angle: angle.to_string(),
                kmax: ctx.kmax,
            }
        })?;
        let word = synthesize(approx.matrix(), &self.table)?;
        Ok(Found { word, approx })
    }

    fn record(&mut self, angle: &Real, key: Option<String>, found: Found) -> String {
        let Found { word, approx } = found;
        let simplified = full_simplify_str(&word).replace('I', "");

        if self.check {
            let good = DOmegaMatrix::from_gate_str(&simplified).is_ok_and(|m| &m == approx.matrix());
            log::info!("check flag = {}", good as u8);
            self.valid &= good;
        }
        self.valid &= approx.error() < self.ctx.eps;

        if self.details {
            let (ur, ui) = approx.u_val();
            let (tr, ti) = approx.t_val();
            log::info!("angle = {angle:.10}");
            log::info!("matrix =\n{}", approx.matrix());
            log::info!("u decimal value = ({ur:.10}, {ui:.10})");
            log::info!("t decimal value = ({tr:.10}, {ti:.10})");
            log::info!("error = {:.5}", approx.error());
            log::info!("T count = {}", simplified.chars().filter(|&c| c == 'T').count());
        }

        if let Some(key) = key {
            self.cache.insert(key, simplified.clone());
        }
        simplified
    }

    fn emit(&mut self, word: String) -> String {
        for c in word.chars() {
            match c {
                'W' => self.w_count += 2,
                'w' => self.w_count -= 1,
                _ => {}
            }
        }
        word
    }
}
