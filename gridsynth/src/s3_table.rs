//! Lookup table of every Clifford+T unitary with small denominator exponent.
//!
//! The table maps each unitary reachable by at most three Hadamards (times
//! any power of the global phase ω) to a canonical gate word. Exact
//! synthesis peels gates off a unitary until it lands in this table.
//!
//! On disk the table is a CSV file with one entry per line:
//!
//! ```text
//! u.a,u.b,u.c,u.d,t.a,t.b,t.c,t.d,k,l,word
//! ```

use itertools::Itertools;
use num::BigInt;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::SynthError;
use crate::matrix::{full_simplify_str, DOmegaMatrix};
use crate::rings::ZOmega;

/// Hadamard layers covered by the table.
const MAX_H_LAYERS: usize = 3;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct S3Table {
    entries: FxHashMap<DOmegaMatrix, String>,
}

/// Words T^i, T^i H T^j, ... with up to `layers` Hadamards, fewest first.
fn words(layers: usize) -> Vec<String> {
    let powers: Vec<String> = (0..8).map(|i| "T".repeat(i)).collect();
    let mut out: Vec<String> = powers.clone();
    let mut frontier = powers.clone();
    for _ in 0..layers {
        frontier = frontier
            .iter()
            .cartesian_product(powers.iter())
            .map(|(w, p)| format!("{w}H{p}"))
            .collect();
        out.extend(frontier.iter().cloned());
    }
    out
}

impl S3Table {
    /// Build the table from scratch. The first word reaching a unitary wins,
    /// so entries use as few Hadamards as possible.
    pub fn generate() -> S3Table {
        let mut entries = FxHashMap::default();
        for word in words(MAX_H_LAYERS) {
            // words are built from H and T only
            let Ok(m) = DOmegaMatrix::from_gate_str(&word) else {
                continue;
            };
            let simplified = full_simplify_str(&word).replace('I', "");
            for n in 0..8u8 {
                entries
                    .entry(m.mul_by_w(n))
                    .or_insert_with(|| format!("{simplified}{}", "W".repeat(n as usize)));
            }
        }
        log::debug!("generated gate table with {} entries", entries.len());
        S3Table { entries }
    }

    pub fn get(&self, m: &DOmegaMatrix) -> Option<&str> {
        self.entries.get(m).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DOmegaMatrix, &str)> {
        self.entries.iter().map(|(m, s)| (m, s.as_str()))
    }

    pub fn write<W: Write>(&self, w: W) -> Result<(), SynthError> {
        let mut w = BufWriter::new(w);
        for (m, word) in &self.entries {
            let (u, t) = (m.u(), m.t());
            let fields = [&u.a, &u.b, &u.c, &u.d, &t.a, &t.b, &t.c, &t.d];
            writeln!(w, "{},{},{},{}", fields.iter().join(","), m.k(), m.l(), word)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn read<R: BufRead>(r: R) -> Result<S3Table, SynthError> {
        let mut entries = FxHashMap::default();
        for (i, line) in r.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (m, word) = parse_line(&line).map_err(|reason| SynthError::TableFormat { line: i + 1, reason })?;
            entries.insert(m, word);
        }
        Ok(S3Table { entries })
    }

    pub fn write_file(&self, path: &Path) -> Result<(), SynthError> {
        self.write(File::create(path)?)
    }

    pub fn read_file(path: &Path) -> Result<S3Table, SynthError> {
        S3Table::read(BufReader::new(File::open(path)?))
    }

    /// Read the table from `path` if that file exists, otherwise generate it
    /// and save it there. With no path the table only lives in memory.
    pub fn load_or_generate(path: Option<&Path>) -> Result<S3Table, SynthError> {
        match path {
            Some(p) if p.exists() => {
                log::info!("reading gate table from {}", p.display());
                S3Table::read_file(p)
            }
            Some(p) => {
                log::info!("generating gate table and writing it to {}", p.display());
                let table = S3Table::generate();
                table.write_file(p)?;
                Ok(table)
            }
            None => Ok(S3Table::generate()),
        }
    }
}

fn parse_line(line: &str) -> Result<(DOmegaMatrix, String), String> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 11 {
        return Err(format!("expected 11 fields, found {}", fields.len()));
    }
    let int = |s: &str| s.trim().parse::<BigInt>().map_err(|e| format!("bad integer '{s}': {e}"));
    let mut c = Vec::with_capacity(8);
    for f in &fields[..8] {
        c.push(int(f)?);
    }
    let k: i64 = fields[8].trim().parse().map_err(|e| format!("bad k '{}': {e}", fields[8]))?;
    let l: u8 = fields[9].trim().parse().map_err(|e| format!("bad l '{}': {e}", fields[9]))?;
    let mut c = c.into_iter();
    let mut next = || c.next().unwrap_or_default();
    let u = ZOmega::new(next(), next(), next(), next());
    let t = ZOmega::new(next(), next(), next(), next());
    let m = DOmegaMatrix::new(u, t, k, l).map_err(|e| e.to_string())?;
    let word = fields[10].trim().replace('I', "");
    Ok((m, word))
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::{fixture, rstest};
    use std::sync::OnceLock;

    #[fixture]
    fn table() -> &'static S3Table {
        static TABLE: OnceLock<S3Table> = OnceLock::new();
        TABLE.get_or_init(S3Table::generate)
    }

    #[rstest]
    fn table_size(table: &S3Table) {
        assert_eq!(table.len(), 3712);
    }

    #[rstest]
    #[case("H", "H")]
    #[case("TT", "S")]
    #[case("SSSSH", "H")]
    #[case("SHTTT", "SHST")]
    #[case("T", "T")]
    #[case("", "")]
    #[case("HW", "HW")]
    fn canonical_words(table: &S3Table, #[case] word: &str, #[case] expected: &str) {
        let m = DOmegaMatrix::from_gate_str(word).unwrap();
        assert_eq!(table.get(&m), Some(expected));
    }

    #[rstest]
    fn every_entry_multiplies_back(table: &S3Table) {
        for (m, word) in table.iter() {
            assert_eq!(&DOmegaMatrix::from_gate_str(word).unwrap(), m, "{word}");
            assert!(m.sde_u_sq() <= 4);
        }
    }

    #[rstest]
    fn file_round_trip(table: &S3Table) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        table.write_file(&path).unwrap();
        let read = S3Table::read_file(&path).unwrap();
        assert_eq!(&read, table);

        // a second load reads the file instead of regenerating
        let loaded = S3Table::load_or_generate(Some(&path)).unwrap();
        assert_eq!(loaded.len(), table.len());
    }

    #[test]
    fn load_or_generate_writes_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.csv");
        assert!(!path.exists());
        let t = S3Table::load_or_generate(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(t.len(), 3712);
    }

    #[rstest]
    #[case("1,0,0,0,0,0,0,0,0,0", 1)]
    #[case("0,0,0,1,0,0,0,0,0,9,I", 1)]
    #[case("0,0,0,1,0,0,0,x,0,0,I", 1)]
    #[case("0,0,0,2,0,0,0,0,0,0,I", 1)]
    fn malformed_lines(#[case] line: &str, #[case] lineno: usize) {
        let err = S3Table::read(line.as_bytes()).unwrap_err();
        assert!(matches!(err, SynthError::TableFormat { line, .. } if line == lineno), "{err}");
    }

    #[test]
    fn reading_strips_identity() {
        let t = S3Table::read("0,0,0,1,0,0,0,0,0,0,I\n0,0,0,1,0,0,0,0,0,1,IT\n".as_bytes()).unwrap();
        assert_eq!(t.get(&DOmegaMatrix::identity()), Some(""));
        assert_eq!(t.get(&DOmegaMatrix::t_gate()), Some("T"));
    }
}
