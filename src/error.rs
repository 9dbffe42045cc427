//! Error types
use thiserror::Error;

/// Errors raised by the cryptosystem, the gate library, and the aggregator.
///
/// Every error is fatal for the operation in progress; there is no retry
/// logic inside the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The totient of a freshly generated modulus was not invertible,
    /// which means the key material is unusable.
    #[error("key generation produced a non-invertible totient")]
    NonInvertibleTotient,

    /// The requested modulus does not fit the backing integer width.
    #[error("modulus square does not fit the backing integer width")]
    ModulusTooLarge,

    /// Plaintexts must lie in `[0, n)`.
    #[error("plaintext out of range for the public modulus")]
    PlaintextOutOfRange,

    /// A homomorphic negation was attempted on a value that is not
    /// invertible modulo `n^2`.
    #[error("ciphertext is not invertible modulo n^2")]
    NonInvertibleCiphertext,

    /// A conditional gate was handed a selector that is neither 0 nor 1.
    /// The caller violated the gate's precondition.
    #[error("conditional gate selector decrypted to a non-boolean value")]
    NonBooleanSelector,

    /// Bitwise gates require both operands to have the same length; the
    /// caller skipped the padding step.
    #[error("bit vector lengths differ: {left} vs {right}")]
    BitLengthMismatch { left: usize, right: usize },

    /// `n` does not divide `c^phi - 1`: the ciphertext is corrupted or was
    /// produced under a different key.
    #[error("decryption integrity check failed")]
    DecryptionIntegrity,

    /// A ballot matrix does not match the shape of the tally.
    #[error("ballot shape {got_rows}x{got_cols} does not match tally shape {rows}x{cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        got_rows: usize,
        got_cols: usize,
    },

    /// A wire payload failed to parse.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

pub type Result<T> = std::result::Result<T, Error>;
