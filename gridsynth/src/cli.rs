//! The gridsynth command line interface.

use clap::{crate_version, Parser};
use itertools::Itertools;
use std::path::PathBuf;

use crate::config::{Context, GridSynthOptions};
use crate::real::Real;
use crate::synthesizer::GridSynthesizer;
use crate::SynthError;

pub mod table;

/// CLI arguments.
#[derive(Parser, Debug)]
#[clap(version = crate_version!(), long_about = None)]
#[clap(about = "Approximate Z rotations by Clifford+T circuits")]
pub struct Cli {
    /// Z-rotation angle(s) in units of π.
    #[arg(short, long, required = true, num_args = 1.., allow_negative_numbers = true)]
    theta: Vec<String>,

    /// Precision in decimal digits, so that eps = 10^-p. Defaults to 10.
    #[arg(short, long)]
    precision: Option<u32>,

    /// Effort spent factoring candidate solutions.
    #[arg(long = "pollard-rho")]
    factor_effort: Option<u64>,

    /// Where the gate table comes from.
    #[command(flatten)]
    table: table::TableArgs,

    /// Verify every gate string by multiplying it back out.
    #[arg(short, long)]
    check: bool,

    /// Log each approximation: its entries, its error and its T-count.
    #[arg(short, long)]
    details: bool,

    /// Log runtime parameters and progress.
    #[arg(short, long)]
    verbose: bool,

    /// Seed for the randomised factoring. Drawn at random if not given.
    #[arg(long)]
    seed: Option<u64>,

    /// Report the time spent synthesising.
    #[arg(long)]
    time: bool,

    /// JSON file with options. Flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Error type for the CLI.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum CliError {
    #[display("{_0}")]
    #[from]
    Synth(SynthError),
    /// An angle on the command line is not a decimal number.
    #[display("Invalid angle provided: {_0}")]
    InvalidAngle(String),
    /// `--check` found a gate string that does not match its approximation.
    #[display("Check failed: a synthesised gate string does not reproduce its approximation")]
    CheckFailed,
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Synth(SynthError::Io(e))
    }
}

impl Cli {
    /// Options from `--config`, overridden by the flags.
    pub fn options(&self) -> Result<GridSynthOptions, CliError> {
        let mut opts = match &self.config {
            Some(path) => GridSynthOptions::from_file(path)?,
            None => GridSynthOptions::default(),
        };
        if let Some(p) = self.precision {
            opts.precision = p;
        }
        if let Some(e) = self.factor_effort {
            opts.factor_effort = e;
        }
        if let Some(s) = self.seed {
            opts.seed = Some(s);
        }
        opts.check |= self.check;
        opts.details |= self.details;
        opts.verbose |= self.verbose;
        Ok(opts)
    }

    /// Log level implied by `--verbose` and `--details`, unless `RUST_LOG`
    /// says otherwise.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.details || self.check {
            "info"
        } else {
            "warn"
        }
    }

    pub fn run(self) -> Result<(), CliError> {
        let opts = self.options()?;
        log::debug!("{} angle(s) read", self.theta.len());

        let ctx = Context::new(&opts)?;
        let angles = self
            .theta
            .iter()
            .map(|s| {
                Real::parse_decimal(s.trim(), ctx.prec)
                    .map(|x| x * &ctx.pi)
                    .ok_or_else(|| CliError::InvalidAngle(s.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let table = self.table.load(opts.table_path.as_deref())?;

        let mut synthesizer = GridSynthesizer::with_table(&opts, ctx, table)?;
        synthesizer.set_timer(self.time);
        for angle in &angles {
            let word = synthesizer.get_op_str(angle)?;
            println!("{}", word.chars().join(" "));
        }

        if self.time {
            eprintln!("Duration = {:.6} seconds", synthesizer.duration().as_secs_f64());
        }
        if opts.check && !synthesizer.is_valid() {
            return Err(CliError::CheckFailed);
        }
        Ok(())
    }
}
