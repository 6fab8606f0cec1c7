//! Exact decomposition of Clifford+T unitaries into gate words.

use crate::error::SynthError;
use crate::matrix::DOmegaMatrix;
use crate::real::{pi, Real};
use crate::s3_table::S3Table;

/// Closed forms for rotations by multiples of π/4, with `theta` in units of
/// π. Here `w` is the phase e^{-iπ/8}, which has no exact Clifford+T form.
/// An angle matches when it lies within `eps` of a multiple of π/4 measured
/// in radians, which keeps the operator error of the closed form below
/// `eps`. Returns `None` for every other angle.
pub fn check_common_cases(angle: &Real, eps: &Real) -> Option<String> {
    let prec = angle.prec();
    let two = Real::from_int(2, prec);
    // angle mod 2 in [0, 2), except that positive multiples of 2 map to 2
    let mut theta = angle - &(Real::from_int((angle / &two).floor(), prec) * &two);
    if theta.is_zero() && angle.is_positive() {
        theta = two;
    }
    let pi = pi(prec);

    const CASES: [(i64, &str); 9] = [
        (0, ""),
        (1, "Tw"),
        (2, "SWWWWWWW"),
        (3, "STWWWWWWWw"),
        (4, "SSWWWWWW"),
        (5, "SSTWWWWWWw"),
        (6, "SSSWWWWW"),
        (7, "SSSTWWWWWw"),
        (8, "WWWW"),
    ];
    CASES.iter().find_map(|(quarters, word)| {
        let target = Real::from_ratio(*quarters, 4, theta.prec());
        ((&theta - &target).abs() * &pi < *eps).then(|| word.to_string())
    })
}

/// Write `d` as a word over H, T, S and W by peeling off H·T^-j, j in 0..4,
/// whenever that lowers the smallest denominator exponent, then finishing
/// with a table lookup.
pub fn synthesize(d: &DOmegaMatrix, table: &S3Table) -> Result<String, SynthError> {
    let h = DOmegaMatrix::hadamard();
    let t_dagger = DOmegaMatrix::t_gate().dagger();

    let mut s = d.sde_u_sq();
    let mut running = d.clone();
    let mut word = String::new();
    while s > 3 {
        let mut op = h.clone();
        let mut prefix = String::from("H");
        let mut reduced = false;
        for j in 0..4 {
            if j > 0 {
                op = &op * &t_dagger;
                prefix.insert(0, 'T');
            }
            let next = &op * &running;
            let next_s = next.sde_u_sq();
            if next_s == s - 1 {
                word.push_str(&prefix);
                running = next;
                s = next_s;
                reduced = true;
                break;
            }
        }
        if !reduced {
            return Err(SynthError::internal(format!(
                "no H·T^-j lowers the denominator exponent {s} of\n{running}"
            )));
        }
    }

    match table.get(&running) {
        Some(rest) => {
            word.push_str(rest);
            Ok(word)
        }
        None => Err(SynthError::internal(format!("no table entry for residual\n{running}"))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::matrix::full_simplify_str;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rstest::{fixture, rstest};
    use std::sync::OnceLock;

    #[fixture]
    fn table() -> &'static S3Table {
        static TABLE: OnceLock<S3Table> = OnceLock::new();
        TABLE.get_or_init(S3Table::generate)
    }

    fn r(x: &str) -> Real {
        Real::parse_decimal(x, 128).unwrap()
    }

    #[rstest]
    #[case("0.25", Some("Tw"))]
    #[case("0.5", Some("SWWWWWWW"))]
    #[case("0.75", Some("STWWWWWWWw"))]
    #[case("1", Some("SSWWWWWW"))]
    #[case("1.25", Some("SSTWWWWWWw"))]
    #[case("1.5", Some("SSSWWWWW"))]
    #[case("1.75", Some("SSSTWWWWWw"))]
    #[case("2", Some("WWWW"))]
    #[case("0", Some(""))]
    #[case("-0.25", Some("SSSTWWWWWw"))]
    #[case("4.5", Some("SWWWWWWW"))]
    #[case("0.3", None)]
    #[case("0.2500001", None)]
    #[case("4", Some("WWWW"))]
    #[case("-2", Some(""))]
    #[case("1000000000000.25", Some("Tw"))]
    #[case("-999999999999.5", Some("SWWWWWWW"))]
    fn common_cases(#[case] theta: &str, #[case] expected: Option<&str>) {
        let eps = r("1e-10");
        assert_eq!(check_common_cases(&r(theta), &eps).as_deref(), expected);
    }

    #[rstest]
    #[case("0.2502", Some("Tw"))]
    #[case("0.2505", None)]
    #[case("1.9995", None)]
    fn match_is_measured_in_radians(#[case] theta: &str, #[case] expected: Option<&str>) {
        // 5e-4 units of π is about 1.6e-3 radians
        let eps = r("1e-3");
        assert_eq!(check_common_cases(&r(theta), &eps).as_deref(), expected);
    }

    #[rstest]
    #[case("H")]
    #[case("T")]
    #[case("HTHTHTHTHTHTH")]
    #[case("SHTHTSHTHWWHTHTHTHSHT")]
    fn synthesis_reproduces_matrix(table: &S3Table, #[case] word: &str) {
        let d = DOmegaMatrix::from_gate_str(word).unwrap();
        let out = synthesize(&d, table).unwrap();
        assert_eq!(DOmegaMatrix::from_gate_str(&full_simplify_str(&out)).unwrap(), d);
    }

    #[rstest]
    fn synthesis_of_random_words(table: &S3Table) {
        let mut rng = SmallRng::seed_from_u64(17);
        let gates = ['H', 'T', 'S', 'W'];
        for _ in 0..100 {
            let len = rng.random_range(0..80);
            let word: String = (0..len).map(|_| gates[rng.random_range(0..4)]).collect();
            let d = DOmegaMatrix::from_gate_str(&word).unwrap();
            let out = synthesize(&d, table).unwrap();
            assert_eq!(DOmegaMatrix::from_gate_str(&out).unwrap(), d, "{word} -> {out}");
        }
    }

    #[rstest]
    fn alternating_word_is_recovered_verbatim(table: &S3Table) {
        let word = "HT".repeat(10);
        let d = DOmegaMatrix::from_gate_str(&word).unwrap();
        assert_eq!(synthesize(&d, table).unwrap(), word);
    }
}
