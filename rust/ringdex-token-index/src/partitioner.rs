//! The partitioner contract consumed by the token mapper, and the two
//! partitioners a ring-partitioned store commonly runs with.

use std::cmp::Ordering;

use crate::token::{DecoratedKey, Token};

/// Describes the tokens a partitioner produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `Long` tokens spread uniformly over the signed 64-bit range.
    UniformLong,
    /// Tokens that are only known to be totally ordered.
    Ordered,
}

/// Places partition keys on the token ring.
///
/// Implementations must be deterministic: the same key always maps to the
/// same token, and [`compare`](Self::compare) is a total order consistent
/// with the ring order used by the store.
pub trait Partitioner: Send + Sync + 'static {
    /// Returns the name of the partitioner, used in diagnostics.
    fn name(&self) -> &str;

    /// Returns the smallest token of the ring. No key maps to it; it is used
    /// as the ring wrap-around sentinel in range bounds.
    fn minimum_token(&self) -> Token;

    /// Computes the token of a raw partition key.
    fn token_of(&self, key: &[u8]) -> Token;

    /// Returns the kind of tokens produced by [`token_of`](Self::token_of).
    fn token_kind(&self) -> TokenKind;

    /// Three-way comparison of two tokens in ring order.
    ///
    /// Index fields and sort criteria are built from
    /// [`Token::to_sortable_bytes`], so an implementation must order tokens
    /// exactly like their sortable encodings. Ring orders that differ from
    /// the natural token order are not supported.
    fn compare(&self, a: &Token, b: &Token) -> Ordering {
        a.cmp(b)
    }

    /// Pairs a partition key with its token.
    fn decorate(&self, key: &[u8]) -> DecoratedKey {
        DecoratedKey::new(self.token_of(key), key)
    }
}

/// Hashes keys onto the signed 64-bit ring.
///
/// The token is the XXH3 64-bit hash of the key reinterpreted as `i64`.
/// `i64::MIN` is reserved as the minimum token, so a key hashing to it is
/// moved to `i64::MAX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashPartitioner;

impl HashPartitioner {
    pub const MINIMUM: i64 = i64::MIN;

    pub fn hash_to_token(hash: u64) -> i64 {
        let value = hash as i64;
        if value == Self::MINIMUM {
            i64::MAX
        } else {
            value
        }
    }
}

impl Partitioner for HashPartitioner {
    fn name(&self) -> &str {
        "HashPartitioner"
    }

    fn minimum_token(&self) -> Token {
        Token::Long(Self::MINIMUM)
    }

    fn token_of(&self, key: &[u8]) -> Token {
        Token::Long(Self::hash_to_token(xxhash_rust::xxh3::xxh3_64(key)))
    }

    fn token_kind(&self) -> TokenKind {
        TokenKind::UniformLong
    }
}

/// Orders keys by their raw bytes: the token of a key is the key itself.
///
/// The empty byte string is the minimum token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteOrderedPartitioner;

impl Partitioner for ByteOrderedPartitioner {
    fn name(&self) -> &str {
        "ByteOrderedPartitioner"
    }

    fn minimum_token(&self) -> Token {
        Token::Bytes(Vec::new())
    }

    fn token_of(&self, key: &[u8]) -> Token {
        Token::Bytes(key.to_vec())
    }

    fn token_kind(&self) -> TokenKind {
        TokenKind::Ordered
    }
}
