//! Ring tokens and partition keys decorated with their token.

use std::fmt;

/// A position on the token ring, as produced by a
/// [`Partitioner`](crate::partitioner::Partitioner).
///
/// Tokens from one partitioner always share a variant; comparing tokens of
/// different variants is meaningless.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    /// A signed 64-bit hash token.
    Long(i64),
    /// An opaque byte string ordered lexicographically.
    Bytes(Vec<u8>),
}

impl Token {
    /// Returns the value of a `Long` token.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Token::Long(v) => Some(*v),
            Token::Bytes(_) => None,
        }
    }

    /// Encodes the token so that unsigned lexicographic order of the encoded
    /// bytes equals token order.
    ///
    /// `Long` tokens are written big-endian with the sign bit flipped, `Bytes`
    /// tokens are already in lexicographic order and are copied as is.
    pub fn to_sortable_bytes(&self) -> Vec<u8> {
        match self {
            Token::Long(v) => ((*v as u64) ^ (1 << 63)).to_be_bytes().to_vec(),
            Token::Bytes(bytes) => bytes.clone(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Long(v) => write!(f, "{v}"),
            Token::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// A partition key together with its token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecoratedKey {
    pub token: Token,
    pub key: Vec<u8>,
}

impl DecoratedKey {
    pub fn new(token: Token, key: impl Into<Vec<u8>>) -> DecoratedKey {
        DecoratedKey {
            token,
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sortable_bytes_preserve_long_order() {
        let values = [i64::MIN, -1_000_000, -1, 0, 1, 42, i64::MAX];
        for pair in values.windows(2) {
            let lo = Token::Long(pair[0]).to_sortable_bytes();
            let hi = Token::Long(pair[1]).to_sortable_bytes();
            assert!(lo < hi, "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_sortable_bytes_random_longs() {
        let mut rng = fastrand::Rng::with_seed(17);
        for _ in 0..1000 {
            let a = rng.i64(..);
            let b = rng.i64(..);
            assert_eq!(
                a.cmp(&b),
                Token::Long(a)
                    .to_sortable_bytes()
                    .cmp(&Token::Long(b).to_sortable_bytes())
            );
        }
    }

    #[test]
    fn test_bytes_token_encoding_is_identity() {
        let token = Token::Bytes(b"user:17".to_vec());
        assert_eq!(token.to_sortable_bytes(), b"user:17".to_vec());
        assert_eq!(token.as_long(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Token::Long(-5).to_string(), "-5");
        assert_eq!(Token::Bytes(vec![0x0a, 0xff]).to_string(), "0aff");
    }
}
