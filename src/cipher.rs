//! Encryption, decryption, and the homomorphic ciphertext algebra
use crate::error::{Error, Result};
use crate::keys::{KeyPair, PublicKey};
use crate::{BigInt, LIMBS};
use crypto_bigint::{
    modular::runtime_mod::{DynResidue, DynResidueParams},
    CheckedMul, CheckedSub, NonZero,
};

/// An encrypted integer, an element of `[0, n^2)` holding a plaintext in
/// `[0, n)`.
///
/// Multiplying two ciphertexts modulo `n^2` yields the ciphertext of the sum
/// of their plaintexts, and raising a ciphertext to a plaintext exponent
/// multiplies the underlying plaintext. Every gate in this crate is built
/// from those two facts.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Ciphertext {
    val: BigInt,
}

impl Ciphertext {
    /// Wrap a raw ciphertext value, e.g. one received over the wire.
    pub fn new(val: BigInt) -> Self {
        Self { val }
    }

    pub fn get_val(&self) -> &BigInt {
        &self.val
    }

    /// Encrypt a plaintext in `[0, n)` under a fresh random blinding factor:
    /// `c = g^m * r^n (mod n^2)` with `r` drawn from the multiplicative
    /// group Z/n.
    pub fn encrypt(m: &BigInt, pk: &PublicKey) -> Result<Self> {
        if m >= pk.get_n() {
            return Err(Error::PlaintextOutOfRange);
        }
        let params = pk.residue_params();
        let g_to_m = DynResidue::new(pk.get_g(), params).pow(m);
        let r = pk.sample_invertible();
        let r_to_n = DynResidue::new(&r, params).pow(pk.get_n());
        return Ok(Self::new(g_to_m.mul(&r_to_n).retrieve()));
    }

    fn residue(&self, params: DynResidueParams<LIMBS>) -> DynResidue<LIMBS> {
        DynResidue::new(&self.val, params)
    }

    /// Homomorphic addition: the product of two ciphertexts modulo `n^2`
    /// encrypts the sum of their plaintexts modulo `n`.
    pub fn hom_add(&self, other: &Self, pk: &PublicKey) -> Self {
        let params = pk.residue_params();
        let product = self.residue(params).mul(&other.residue(params));
        return Self::new(product.retrieve());
    }

    /// Homomorphic scalar multiplication: `c^k` encrypts `m * k (mod n)`.
    pub fn hom_scale(&self, k: &BigInt, pk: &PublicKey) -> Self {
        let scaled = self.residue(pk.residue_params()).pow(k);
        return Self::new(scaled.retrieve());
    }

    /// The inverse ciphertext, which encrypts the negated plaintext.
    pub fn hom_neg(&self, pk: &PublicKey) -> Result<Self> {
        let (inv, invertible) = self.val.inv_mod(pk.get_nn());
        if !bool::from(invertible) {
            return Err(Error::NonInvertibleCiphertext);
        }
        return Ok(Self::new(inv));
    }

    /// Homomorphic subtraction: `self * other^-1 (mod n^2)`.
    pub fn hom_sub(&self, other: &Self, pk: &PublicKey) -> Result<Self> {
        let neg = other.hom_neg(pk)?;
        return Ok(self.hom_add(&neg, pk));
    }
}

impl KeyPair {
    /// Decrypt a ciphertext: `u = c^phi (mod n^2)` must satisfy
    /// `n | (u - 1)`, and the plaintext is `(u - 1) / n * s (mod n)`.
    ///
    /// A failed divisibility check means the ciphertext is corrupted or was
    /// produced under a different key.
    pub fn decrypt(&self, c: &Ciphertext) -> Result<BigInt> {
        let pk = self.get_pk();
        let u = c.residue(pk.residue_params()).pow(self.get_sk().get_phi()).retrieve();
        if u == BigInt::ZERO {
            return Err(Error::DecryptionIntegrity);
        }
        let u_minus_one = u.checked_sub(&BigInt::ONE).unwrap();

        let n = NonZero::new(*pk.get_n()).unwrap();
        if u_minus_one % n != BigInt::ZERO {
            return Err(Error::DecryptionIntegrity);
        }

        let l = u_minus_one.checked_div(pk.get_n()).unwrap();
        return Ok(l.checked_mul(self.get_sk().get_s()).unwrap() % n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const PRIME_BITS: usize = 16;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        for m in [0u64, 1, 2, 41, 1000] {
            let m = BigInt::from_u64(m);
            let c = Ciphertext::encrypt(&m, pk).unwrap();
            assert_eq!(keypair.decrypt(&c).unwrap(), m);
        }
    }

    #[test]
    fn test_encryption_is_randomized() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        let m = BigInt::from_u8(7);
        let c1 = Ciphertext::encrypt(&m, pk).unwrap();
        let c2 = Ciphertext::encrypt(&m, pk).unwrap();
        assert_ne!(c1, c2);
        assert_eq!(keypair.decrypt(&c1).unwrap(), keypair.decrypt(&c2).unwrap());
    }

    #[test]
    fn test_homomorphic_addition() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        let a = Ciphertext::encrypt(&BigInt::from_u8(19), pk).unwrap();
        let b = Ciphertext::encrypt(&BigInt::from_u8(23), pk).unwrap();
        let sum = a.hom_add(&b, pk);
        assert_eq!(keypair.decrypt(&sum).unwrap(), BigInt::from_u8(42));
    }

    #[test]
    fn test_homomorphic_scalar_multiplication() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        let a = Ciphertext::encrypt(&BigInt::from_u8(5), pk).unwrap();

        // multiplication by a boolean selector is the common case
        let kept = a.hom_scale(&BigInt::ONE, pk);
        assert_eq!(keypair.decrypt(&kept).unwrap(), BigInt::from_u8(5));
        let dropped = a.hom_scale(&BigInt::ZERO, pk);
        assert_eq!(keypair.decrypt(&dropped).unwrap(), BigInt::ZERO);

        let tripled = a.hom_scale(&BigInt::from_u8(3), pk);
        assert_eq!(keypair.decrypt(&tripled).unwrap(), BigInt::from_u8(15));
    }

    #[test]
    fn test_homomorphic_subtraction() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        let a = Ciphertext::encrypt(&BigInt::from_u8(42), pk).unwrap();
        let b = Ciphertext::encrypt(&BigInt::from_u8(12), pk).unwrap();
        let diff = a.hom_sub(&b, pk).unwrap();
        assert_eq!(keypair.decrypt(&diff).unwrap(), BigInt::from_u8(30));
    }

    #[test]
    fn test_decrypt_rejects_zero_ciphertext() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        assert!(matches!(
            keypair.decrypt(&Ciphertext::new(BigInt::ZERO)),
            Err(Error::DecryptionIntegrity)
        ));
    }

    #[test]
    fn test_plaintext_out_of_range() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        assert!(matches!(
            Ciphertext::encrypt(pk.get_n(), pk),
            Err(Error::PlaintextOutOfRange)
        ));
    }
}
