//! Errors raised while synthesising rotations.

/// Error type for the synthesis pipeline.
///
/// `SearchExhausted` is the only recoverable kind: retrying with a larger
/// precision or factoring effort may succeed. `Internal` marks a broken
/// algorithmic invariant and should never be observed.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum SynthError {
    /// Invalid options, or a value that violates a type invariant on construction.
    #[display("Invalid configuration: {_0}")]
    Config(String),
    /// No approximation was found for the angle within the scale budget.
    #[display(
        "No approximation found for angle {angle} up to scale exponent {kmax}. \
         Try increasing the precision or the factoring effort."
    )]
    SearchExhausted { angle: String, kmax: u32 },
    /// An algorithmic invariant failed.
    #[display("Internal invariant violated: {_0}")]
    Internal(String),
    /// Error reading or writing the gate table.
    #[display("IO error: {_0}")]
    #[from]
    Io(std::io::Error),
    /// A gate table line could not be parsed.
    #[display("Malformed gate table entry on line {line}: {reason}")]
    TableFormat { line: usize, reason: String },
}

impl std::error::Error for SynthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl SynthError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SynthError::SearchExhausted { .. })
    }

    pub(crate) fn internal(msg: impl Into<String>) -> SynthError {
        SynthError::Internal(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> SynthError {
        SynthError::Config(msg.into())
    }
}
