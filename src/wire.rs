//! Text codecs for the line-delimited voting protocol.
//!
//! Requests carry an ASCII tag (`NAMES`, `KEY`, `DATA`) and are answered
//! with `SUCCESS` or `ERROR`. Payload integers travel as decimal text; a
//! ballot matrix is serialized as rows separated by newlines with cells
//! separated by commas. The transport itself (sockets, framing, retries)
//! lives outside this crate; only the payload formats are defined here.
use crate::cipher::Ciphertext;
use crate::error::{Error, Result};
use crate::keys::PublicKey;
use crate::BigInt;
use crypto_bigint::{CheckedAdd, CheckedMul, NonZero};

pub const KEY_REQUEST: &str = "KEY";
pub const DATA_REQUEST: &str = "DATA";
pub const NAMES_REQUEST: &str = "NAMES";
pub const SUCCESS: &str = "SUCCESS";
pub const ERROR: &str = "ERROR";

/// Format a big integer as decimal text.
pub fn to_decimal(x: &BigInt) -> String {
    let ten = BigInt::from_u8(10);
    let nz_ten = NonZero::new(ten).unwrap();
    let mut digits = String::new();
    let mut v = *x;
    loop {
        let digit = (v % nz_ten).as_words()[0] as u8;
        digits.push(char::from(b'0' + digit));
        v = v.checked_div(&ten).unwrap();
        if v == BigInt::ZERO {
            break;
        }
    }
    return digits.chars().rev().collect();
}

/// Parse decimal text into a big integer. Rejects empty input, non-digit
/// characters, and values that overflow the backing width.
pub fn parse_decimal(text: &str) -> Result<BigInt> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedPayload(format!(
            "not a decimal integer: {:?}",
            text
        )));
    }
    let ten = BigInt::from_u8(10);
    let mut acc = BigInt::ZERO;
    for b in text.bytes() {
        let shifted: Option<BigInt> = acc.checked_mul(&ten).into();
        let digit = BigInt::from_u8(b - b'0');
        let next: Option<BigInt> = shifted
            .and_then(|s| Option::<BigInt>::from(s.checked_add(&digit)));
        acc = next.ok_or_else(|| {
            Error::MalformedPayload("integer overflows the backing width".into())
        })?;
    }
    return Ok(acc);
}

/// The `KEY` response payload: `n` and `g`, newline-separated.
pub fn encode_public_key(pk: &PublicKey) -> String {
    return format!("{}\n{}", to_decimal(pk.get_n()), to_decimal(pk.get_g()));
}

/// Parse a `KEY` response payload back into a public key.
pub fn parse_public_key(payload: &str) -> Result<PublicKey> {
    let lines: Vec<&str> = payload.lines().collect();
    if lines.len() != 2 {
        return Err(Error::MalformedPayload(format!(
            "expected 2 public key integers, got {}",
            lines.len()
        )));
    }
    let n = parse_decimal(lines[0])?;
    let g = parse_decimal(lines[1])?;
    return PublicKey::new(n, g);
}

/// The `NAMES` response payload: candidate names, newline-separated.
pub fn encode_names(names: &[String]) -> String {
    return names.join("\n");
}

/// Serialize a ciphertext matrix for a `DATA` request: rows separated by
/// newlines, cells within a row separated by commas.
pub fn encode_matrix(matrix: &[Vec<Ciphertext>]) -> String {
    return matrix
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| to_decimal(cell.get_val()))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");
}

/// Parse a `DATA` request payload, enforcing the expected matrix shape.
pub fn parse_matrix(payload: &str, rows: usize, cols: usize) -> Result<Vec<Vec<Ciphertext>>> {
    let mut matrix = Vec::with_capacity(rows);
    for line in payload.lines() {
        let mut row = Vec::with_capacity(cols);
        for cell in line.split(',') {
            row.push(Ciphertext::new(parse_decimal(cell.trim())?));
        }
        if row.len() != cols {
            return Err(Error::MalformedPayload(format!(
                "expected {} cells per row, got {}",
                cols,
                row.len()
            )));
        }
        matrix.push(row);
    }
    if matrix.len() != rows {
        return Err(Error::MalformedPayload(format!(
            "expected {} rows, got {}",
            rows,
            matrix.len()
        )));
    }
    return Ok(matrix);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    const PRIME_BITS: usize = 16;

    #[test]
    fn test_decimal_round_trip() {
        for v in [0u64, 1, 9, 10, 255, 1_000_000, u64::MAX] {
            let x = BigInt::from_u64(v);
            assert_eq!(parse_decimal(&to_decimal(&x)).unwrap(), x);
        }
        assert_eq!(to_decimal(&BigInt::from_u64(1024)), "1024");
        assert_eq!(to_decimal(&BigInt::ZERO), "0");
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("12a").is_err());
        assert!(parse_decimal("-4").is_err());
        // one digit past the 512-bit capacity
        let too_big = "9".repeat(160);
        assert!(parse_decimal(&too_big).is_err());
    }

    #[test]
    fn test_public_key_round_trip() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let payload = encode_public_key(keypair.get_pk());
        let parsed = parse_public_key(&payload).unwrap();
        assert_eq!(parsed, *keypair.get_pk());
    }

    #[test]
    fn test_matrix_round_trip() {
        let keypair = KeyPair::keygen(PRIME_BITS).unwrap();
        let pk = keypair.get_pk();
        let matrix: Vec<Vec<Ciphertext>> = (0..2)
            .map(|i| {
                (0..3)
                    .map(|j| {
                        Ciphertext::encrypt(&BigInt::from_u64(i * 3 + j), pk).unwrap()
                    })
                    .collect()
            })
            .collect();

        let payload = encode_matrix(&matrix);
        let parsed = parse_matrix(&payload, 2, 3).unwrap();
        assert_eq!(parsed, matrix);

        assert!(parse_matrix(&payload, 3, 3).is_err());
        assert!(parse_matrix(&payload, 2, 4).is_err());
    }

    #[test]
    fn test_names_payload() {
        let names = vec!["alice".to_string(), "bob".to_string()];
        assert_eq!(encode_names(&names), "alice\nbob");
    }
}
