//! Gate table flags.

use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_TABLE_FILE;
use crate::s3_table::S3Table;
use crate::SynthError;

/// Where the gate table comes from. Without either flag the table path from
/// `--config` is loaded (or generated and saved), and failing that the
/// table is generated in memory.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct TableArgs {
    /// Read the gate table from a file.
    #[arg(short, long, value_name = "FILE", num_args = 0..=1, default_missing_value = DEFAULT_TABLE_FILE)]
    read_table: Option<PathBuf>,

    /// Generate the gate table and write it to a file.
    #[arg(short, long, value_name = "FILE", num_args = 0..=1, default_missing_value = DEFAULT_TABLE_FILE)]
    write_table: Option<PathBuf>,
}

impl TableArgs {
    pub fn load(&self, fallback: Option<&Path>) -> Result<S3Table, SynthError> {
        if let Some(path) = &self.read_table {
            log::info!("reading gate table from {}", path.display());
            return S3Table::read_file(path);
        }
        if let Some(path) = &self.write_table {
            log::info!("writing gate table to {}", path.display());
            let table = S3Table::generate();
            table.write_file(path)?;
            return Ok(table);
        }
        S3Table::load_or_generate(fallback)
    }
}
