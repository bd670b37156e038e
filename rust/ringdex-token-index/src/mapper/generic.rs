//! Token mapping for any partitioner.
//!
//! The token is indexed through its order-preserving byte encoding
//! ([`Token::to_sortable_bytes`]); ranges become lexicographic term ranges and
//! sorting is a byte-wise sort. This works for every token type at the cost of
//! term-range queries instead of numeric ones.

use std::ops::Bound;

use ringdex_common::Result;

use crate::{
    document::{Document, FieldValue},
    mapper::{StrategyKind, TokenStrategy},
    query::{SortField, SortKind, TokenQuery},
    token::Token,
};

/// Name of the sortable bytes token field.
pub const TOKEN_BYTES_FIELD: &str = "_token_bytes";

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

fn bound(token: Option<&Token>, inclusive: bool) -> Bound<Vec<u8>> {
    match token {
        None => Bound::Unbounded,
        Some(token) if inclusive => Bound::Included(token.to_sortable_bytes()),
        Some(token) => Bound::Excluded(token.to_sortable_bytes()),
    }
}

impl TokenStrategy for GenericStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Generic
    }

    fn add_fields(&self, document: &mut Document, token: &Token) -> Result<()> {
        document.add(TOKEN_BYTES_FIELD, FieldValue::Bytes(token.to_sortable_bytes()));
        Ok(())
    }

    fn range_query(
        &self,
        lower: Option<&Token>,
        upper: Option<&Token>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<TokenQuery> {
        Ok(TokenQuery::BytesRange {
            field: TOKEN_BYTES_FIELD,
            lower: bound(lower, include_lower),
            upper: bound(upper, include_upper),
        })
    }

    fn term_query(&self, token: &Token) -> Result<TokenQuery> {
        Ok(TokenQuery::BytesTerm {
            field: TOKEN_BYTES_FIELD,
            value: token.to_sortable_bytes(),
        })
    }

    fn sort_fields(&self) -> Vec<SortField> {
        vec![SortField::ascending(TOKEN_BYTES_FIELD, SortKind::Bytes)]
    }
}
