//! Token mapping for partitioners with uniformly distributed `i64` tokens.
//!
//! The token is indexed as a numeric field, so ranges and point lookups become
//! native numeric queries and sorting is a plain numeric sort.

use std::ops::Bound;

use ringdex_common::{Result, error::Error};

use crate::{
    document::{Document, FieldValue},
    mapper::{StrategyKind, TokenStrategy},
    query::{SortField, SortKind, TokenQuery},
    token::Token,
};

/// Name of the numeric token field.
pub const TOKEN_LONG_FIELD: &str = "_token_long";

#[derive(Debug, Clone, Copy, Default)]
pub struct NumericStrategy;

impl NumericStrategy {
    fn long_value(token: &Token) -> Result<i64> {
        token.as_long().ok_or_else(|| {
            Error::invalid_arg(
                "token",
                format!("numeric token mapping requires a long token, got {token}"),
            )
        })
    }

    fn bound(token: Option<&Token>, inclusive: bool) -> Result<Bound<i64>> {
        Ok(match token {
            None => Bound::Unbounded,
            Some(token) if inclusive => Bound::Included(Self::long_value(token)?),
            Some(token) => Bound::Excluded(Self::long_value(token)?),
        })
    }
}

impl TokenStrategy for NumericStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Numeric
    }

    fn add_fields(&self, document: &mut Document, token: &Token) -> Result<()> {
        document.add(TOKEN_LONG_FIELD, FieldValue::Long(Self::long_value(token)?));
        Ok(())
    }

    fn range_query(
        &self,
        lower: Option<&Token>,
        upper: Option<&Token>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<TokenQuery> {
        Ok(TokenQuery::LongRange {
            field: TOKEN_LONG_FIELD,
            lower: Self::bound(lower, include_lower)?,
            upper: Self::bound(upper, include_upper)?,
        })
    }

    fn term_query(&self, token: &Token) -> Result<TokenQuery> {
        Ok(TokenQuery::LongTerm {
            field: TOKEN_LONG_FIELD,
            value: Self::long_value(token)?,
        })
    }

    fn sort_fields(&self) -> Vec<SortField> {
        vec![SortField::ascending(TOKEN_LONG_FIELD, SortKind::Long)]
    }
}
