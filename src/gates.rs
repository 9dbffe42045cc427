//! Arithmetic and comparison gates built on the Paillier homomorphism.
//!
//! Bit vectors are ordered least significant bit first. Gates that must
//! resolve an intermediate plaintext (a selector, a blinded difference, a
//! final carry) take the full [`KeyPair`] as an `oracle` argument and
//! decrypt internally: the library simulates an encrypted circuit with a
//! trusted decryption oracle rather than computing blindly. Callers should
//! not assume confidentiality beyond "ciphertexts are only opened by the
//! holder of the private key".
use crate::cipher::Ciphertext;
use crate::error::{Error, Result};
use crate::keys::{KeyPair, PublicKey};
use crate::BigInt;
use crypto_bigint::NonZero;

/// Encrypted equivalent of `x * y` for a boolean `y`: returns `Ex^y`, i.e.
/// an encryption of `x` when the selector holds 1 and an encryption of 0
/// when it holds 0.
///
/// The selector must decrypt to exactly 0 or 1; anything else is a caller
/// bug and fails the gate.
pub fn conditional_gate(x: &Ciphertext, selector: &Ciphertext, oracle: &KeyPair) -> Result<Ciphertext> {
    let y = oracle.decrypt(selector)?;
    if y != BigInt::ZERO && y != BigInt::ONE {
        return Err(Error::NonBooleanSelector);
    }
    return Ok(x.hom_scale(&y, oracle.get_pk()));
}

/// Ripple-carry addition of an encrypted bit vector and a plaintext bit
/// vector of the same length. The result grows by one position when the
/// final carry is nonzero, so its length is `x.len()` or `x.len() + 1`.
pub fn addition_gate(x: &[Ciphertext], y: &[u8], oracle: &KeyPair) -> Result<Vec<Ciphertext>> {
    if x.len() != y.len() {
        return Err(Error::BitLengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let pk = oracle.get_pk();
    let two = BigInt::from_u8(2);

    let mut carry = Ciphertext::encrypt(&BigInt::ZERO, pk)?;
    let mut result = Vec::with_capacity(x.len() + 1);

    for (xi, &yi) in x.iter().zip(y.iter()) {
        // x XOR y = x + y - 2xy, with y known in the clear
        let enc_yi = Ciphertext::encrypt(&BigInt::from_u8(yi), pk)?;
        let sum = xi.hom_add(&enc_yi, pk);
        let xor_bit = sum.hom_sub(&xi.hom_scale(&BigInt::from_u8(2 * yi), pk), pk)?;

        // fold in the carry: bit = xor_bit XOR carry, where the AND term
        // needs a conditional gate because both operands are encrypted
        let and_carry = conditional_gate(&xor_bit, &carry, oracle)?;
        let bit = xor_bit
            .hom_add(&carry, pk)
            .hom_sub(&and_carry.hom_scale(&two, pk), pk)?;

        // carry out = (x + y + carry - bit) / 2; the difference is even, so
        // exponentiation by the inverse of two halves it
        let total = xi.hom_add(&enc_yi, pk).hom_add(&carry, pk);
        carry = total.hom_sub(&bit, pk)?.hom_scale(&pk.half_exponent(), pk);

        result.push(bit);
    }

    if oracle.decrypt(&carry)? != BigInt::ZERO {
        result.push(carry);
    }
    return Ok(result);
}

/// Decompose an encrypted integer into its encrypted binary representation
/// without decrypting the integer itself.
///
/// The value is blinded with a random invertible `y`: the oracle only ever
/// opens `z = x - y (mod n)`. Adding the encrypted bits of `y` to the
/// plaintext bits of `z` recovers the unreduced sum `y + z = x + kn`, which
/// [`cut`] reduces modulo `n`.
pub fn bit_extraction_gate(x: &Ciphertext, oracle: &KeyPair) -> Result<Vec<Ciphertext>> {
    let pk = oracle.get_pk();

    let y = pk.sample_invertible();
    let mut y_bits = Vec::new();
    for bit in convert_to_bit_array(&y) {
        y_bits.push(Ciphertext::encrypt(&BigInt::from_u8(bit), pk)?);
    }

    let enc_y = Ciphertext::encrypt(&y, pk)?;
    let z = oracle.decrypt(&x.hom_sub(&enc_y, pk)?)?;
    let mut z_bits = convert_to_bit_array(&z);

    prepare_different_arrays(&mut y_bits, &mut z_bits, pk)?;
    let sum = addition_gate(&y_bits, &z_bits, oracle)?;
    return cut(&sum, pk.get_n(), oracle);
}

/// Compare two encrypted bit vectors of the same length. Returns a
/// ciphertext holding 1 iff the value of `x` is strictly greater than the
/// value of `y`.
///
/// Scans from the least to the most significant position, keeping an
/// encrypted "currently greater" flag updated with
/// `flag' = flag * (1 - (x - y)^2) + x * (1 - y)`.
pub fn greater_than_gate(x: &[Ciphertext], y: &[Ciphertext], oracle: &KeyPair) -> Result<Ciphertext> {
    if x.len() != y.len() {
        return Err(Error::BitLengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let pk = oracle.get_pk();
    let one = Ciphertext::encrypt(&BigInt::ONE, pk)?;
    let two = BigInt::from_u8(2);

    let mut flag = Ciphertext::encrypt(&BigInt::ZERO, pk)?;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let and_bit = conditional_gate(xi, yi, oracle)?;

        // equal = 1 - (x - y)^2 = 1 + 2xy - x - y
        let equal = one
            .hom_add(&and_bit.hom_scale(&two, pk), pk)
            .hom_sub(&xi.hom_add(yi, pk), pk)?;

        // the prior flag only survives on equal bits; a differing bit is
        // decided by which side holds the 1
        let kept = conditional_gate(&equal, &flag, oracle)?;
        flag = kept.hom_add(xi, pk).hom_sub(&and_bit, pk)?;
    }
    return Ok(flag);
}

/// Little-endian binary decomposition of a plaintext integer. Zero maps to
/// a single zero bit.
pub fn convert_to_bit_array(x: &BigInt) -> Vec<u8> {
    let mut bits = Vec::new();
    let mut v = *x;
    loop {
        bits.push(if (v & BigInt::ONE) == BigInt::ONE { 1 } else { 0 });
        v = v >> 1;
        if v == BigInt::ZERO {
            break;
        }
    }
    return bits;
}

/// Pad an encrypted bit vector and a plaintext bit vector to equal length,
/// extending the shorter side with encryptions of zero or plain zeros.
pub fn prepare_different_arrays(
    x: &mut Vec<Ciphertext>,
    y: &mut Vec<u8>,
    pk: &PublicKey,
) -> Result<()> {
    while x.len() < y.len() {
        x.push(Ciphertext::encrypt(&BigInt::ZERO, pk)?);
    }
    while y.len() < x.len() {
        y.push(0);
    }
    return Ok(());
}

/// Pad two encrypted bit vectors to equal length with encryptions of zero.
pub fn prepare_similar_arrays(
    x: &mut Vec<Ciphertext>,
    y: &mut Vec<Ciphertext>,
    pk: &PublicKey,
) -> Result<()> {
    while x.len() < y.len() {
        x.push(Ciphertext::encrypt(&BigInt::ZERO, pk)?);
    }
    while y.len() < x.len() {
        y.push(Ciphertext::encrypt(&BigInt::ZERO, pk)?);
    }
    return Ok(());
}

/// Pad two plaintext bit vectors to equal length with zeros.
pub fn prepare_plain_arrays(x: &mut Vec<u8>, y: &mut Vec<u8>) {
    while x.len() < y.len() {
        x.push(0);
    }
    while y.len() < x.len() {
        y.push(0);
    }
}

fn reconstruct(bits: &[Ciphertext], modulus: &BigInt, oracle: &KeyPair) -> Result<BigInt> {
    let m = NonZero::new(*modulus).unwrap();
    let mut acc = BigInt::ZERO;
    for (i, bit) in bits.iter().enumerate() {
        let b = oracle.decrypt(bit)?;
        let term = (b << i) % m;
        acc = acc.add_mod(&term, modulus);
    }
    return Ok(acc);
}

/// Reduce a bit vector whose value may exceed `modulus` back to a single
/// fresh ciphertext. A genuine decrypt/re-encrypt round trip, not a
/// homomorphic operation.
pub fn to_number(bits: &[Ciphertext], modulus: &BigInt, oracle: &KeyPair) -> Result<Ciphertext> {
    let value = reconstruct(bits, modulus, oracle)?;
    return Ciphertext::encrypt(&value, oracle.get_pk());
}

/// Same reduction as [`to_number`], but returns the encrypted bit
/// decomposition of the reduced value.
pub fn cut(bits: &[Ciphertext], modulus: &BigInt, oracle: &KeyPair) -> Result<Vec<Ciphertext>> {
    let value = reconstruct(bits, modulus, oracle)?;
    let mut result = Vec::new();
    for bit in convert_to_bit_array(&value) {
        result.push(Ciphertext::encrypt(&BigInt::from_u8(bit), oracle.get_pk())?);
    }
    return Ok(result);
}
