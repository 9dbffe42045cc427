//! The key pairs
use crate::error::{Error, Result};
use crate::{BigInt, LIMBS};
use crypto_bigint::{
    modular::runtime_mod::DynResidueParams, rand_core::OsRng, CheckedAdd, CheckedMul, CheckedSub,
    NonZero, RandomMod, Uint,
};
use log::debug;

/// The public half of the key material: the modulus `n` and the generator
/// `g = n + 1`. The ciphertext modulus `n^2` is precomputed at construction.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct PublicKey {
    n: BigInt,
    g: BigInt,
    nn: BigInt,
}

impl PublicKey {
    /// Instantiate from the two public integers. Fails if `n^2` overflows
    /// the backing integer width.
    pub fn new(n: BigInt, g: BigInt) -> Result<Self> {
        let nn: Option<BigInt> = n.checked_mul(&n).into();
        let nn = nn.ok_or(Error::ModulusTooLarge)?;
        return Ok(Self { n, g, nn });
    }

    pub fn get_n(&self) -> &BigInt {
        &self.n
    }

    pub fn get_g(&self) -> &BigInt {
        &self.g
    }

    /// The ciphertext modulus `n^2`
    pub fn get_nn(&self) -> &BigInt {
        &self.nn
    }

    /// Montgomery parameters for arithmetic modulo `n^2`
    pub fn residue_params(&self) -> DynResidueParams<LIMBS> {
        return DynResidueParams::new(&self.nn);
    }

    /// The multiplicative inverse of two modulo `n`, used as an exponent to
    /// halve an (even) encrypted value.
    pub fn half_exponent(&self) -> BigInt {
        return self.n.checked_add(&BigInt::ONE).unwrap() >> 1;
    }

    /// Sample a random element from the multiplicative group Z/n, i.e. a
    /// nonzero value coprime to `n`, by rejection sampling.
    pub fn sample_invertible(&self) -> BigInt {
        loop {
            let r = BigInt::random_mod(&mut OsRng, &NonZero::new(self.n).unwrap());
            if r == BigInt::ZERO {
                continue;
            }
            let (_, invertible) = r.inv_mod(&self.n);
            if invertible.into() {
                return r;
            }
        }
    }
}

/// The private half of the key material: the totient `phi = (p-1)(q-1)` and
/// its inverse `s` modulo `n`.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct PrivateKey {
    phi: BigInt,
    s: BigInt,
}

impl PrivateKey {
    pub fn new(phi: BigInt, s: BigInt) -> Self {
        Self { phi, s }
    }

    pub fn get_phi(&self) -> &BigInt {
        &self.phi
    }

    pub fn get_s(&self) -> &BigInt {
        &self.s
    }
}

/// The full key material of one election instance, generated once and
/// immutable thereafter. It can be shared by reference across all gate
/// calls without synchronization.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct KeyPair {
    pk: PublicKey,
    sk: PrivateKey,
}

impl KeyPair {
    pub fn new(pk: PublicKey, sk: PrivateKey) -> Self {
        Self { pk, sk }
    }

    pub fn get_pk(&self) -> &PublicKey {
        &self.pk
    }

    pub fn get_sk(&self) -> &PrivateKey {
        &self.sk
    }

    /// Draw a random prime of exactly `bits` bits: sample an odd candidate
    /// with the top bit forced set and retest until prime.
    fn generate_prime(bits: usize) -> BigInt {
        let bound = NonZero::new(BigInt::ONE << bits).unwrap();
        loop {
            let candidate = BigInt::random_mod(&mut OsRng, &bound)
                | (BigInt::ONE << (bits - 1))
                | BigInt::ONE;
            if crypto_primes::is_prime(&candidate) {
                return candidate;
            }
        }
    }

    /// Generate fresh key material with two distinct primes of `prime_bits`
    /// bits each.
    ///
    /// The prime search retries until success and has no built-in bound.
    pub fn keygen(prime_bits: usize) -> Result<Self> {
        if prime_bits < 2 || prime_bits * 4 > Uint::<LIMBS>::BITS {
            return Err(Error::ModulusTooLarge);
        }

        let p = Self::generate_prime(prime_bits);
        let mut q = Self::generate_prime(prime_bits);
        while q == p {
            q = Self::generate_prime(prime_bits);
        }

        let n = p.checked_mul(&q).unwrap();
        let g = n.checked_add(&BigInt::ONE).unwrap();
        let phi = p
            .checked_sub(&BigInt::ONE)
            .unwrap()
            .checked_mul(&q.checked_sub(&BigInt::ONE).unwrap())
            .unwrap();

        // phi must be invertible modulo n; this should always hold for two
        // distinct odd primes but the key material is unusable otherwise.
        let (s, invertible) = phi.inv_mod(&n);
        if !bool::from(invertible) {
            return Err(Error::NonInvertibleTotient);
        }

        debug!("generated key pair with {}-bit primes", prime_bits);
        return Ok(Self::new(PublicKey::new(n, g)?, PrivateKey::new(phi, s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const PRIME_BITS: usize = 16;

    #[test]
    fn test_keygen_invariants() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        let sk = keypair.get_sk();

        // g = n + 1
        assert_eq!(*pk.get_g(), pk.get_n().checked_add(&BigInt::ONE).unwrap());

        // s is the inverse of phi modulo n
        let n = NonZero::new(*pk.get_n()).unwrap();
        let product = sk.get_phi().checked_mul(sk.get_s()).unwrap() % n;
        assert_eq!(product, BigInt::ONE);
    }

    #[test]
    fn test_sample_invertible_is_a_unit() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        for _ in 0..10 {
            let r = pk.sample_invertible();
            assert_ne!(r, BigInt::ZERO);
            let (_, invertible) = r.inv_mod(pk.get_n());
            assert!(bool::from(invertible));
        }
    }

    #[test]
    fn test_keygen_rejects_oversized_primes() {
        assert!(KeyPair::keygen(Uint::<LIMBS>::BITS).is_err());
    }

    #[test]
    fn test_half_exponent_halves() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        let n = NonZero::new(*pk.get_n()).unwrap();
        let twice_half = pk
            .half_exponent()
            .checked_mul(&BigInt::from_u8(2))
            .unwrap()
            % n;
        assert_eq!(twice_half, BigInt::ONE);
    }
}
