//! An encrypted implementation of the Majority Judgment voting rule.
//!
//! Ballots are matrices of integers encrypted under the Paillier
//! cryptosystem. The tally server accumulates them into an encrypted tally
//! matrix and resolves the winner through a library of gates built on
//! Paillier's additive homomorphism, so the aggregation logic never handles
//! an individual ballot in the clear.
//!
//! The gate library is a trusted simulation rather than a blind circuit:
//! gates that need an intermediate plaintext take the full key pair and
//! decrypt internally. See the module docs in [`gates`].
use crypto_bigint::Uint;

/// Use the same big integer type everywhere
pub const LIMBS: usize = 512 / 64; // 8 words each 64 bits, a total of 512 bits
pub type BigInt = Uint<LIMBS>;

/// Default bit length of each prime factor of the modulus.
pub const PRIME_BITS: usize = 64;

pub mod aggregator;
pub mod cipher;
pub mod error;
pub mod gates;
pub mod keys;
pub mod wire;

pub use aggregator::Aggregator;
pub use cipher::Ciphertext;
pub use error::{Error, Result};
pub use keys::{KeyPair, PrivateKey, PublicKey};
