use thiserror::Error;

/// Configuration errors.
///
/// Every variant is raised while an indicator, moving average or input is
/// being set up. Per-bar computation never fails: degenerate data resolves
/// to documented fallback values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A window length of zero was requested.
    #[error("invalid window length {length}: must be at least 1")]
    InvalidLength {
        /// The rejected length.
        length: usize,
    },

    /// A moving average name did not match any supported kind.
    #[error("unknown moving average kind: {0:?}")]
    UnknownMaKind(String),

    /// A price source name did not match any supported source.
    #[error("unknown price source: {0:?}")]
    UnknownPriceSource(String),

    /// Band levels are not finite or not strictly ordered.
    #[error("invalid bands: upper {upper} must be finite and above lower {lower}")]
    InvalidBands {
        /// Requested upper level.
        upper: f64,
        /// Requested lower level.
        lower: f64,
    },

    /// A multiplier (band width, percentage) is not a positive finite number.
    #[error("invalid {name} multiplier {value}: must be positive and finite")]
    InvalidMultiplier {
        /// Name of the parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Input columns of different lengths were supplied.
    #[error("misaligned {column} column: expected {expected} values, got {actual}")]
    MisalignedColumns {
        /// Name of the offending column.
        column: &'static str,
        /// Length of the close column.
        expected: usize,
        /// Length of the offending column.
        actual: usize,
    },
}

/// Convenience alias for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
