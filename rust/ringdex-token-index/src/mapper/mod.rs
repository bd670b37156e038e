//! Mapping between ring tokens and the search index.
//!
//! A [`TokenMapper`] is built once per index for the partitioner in effect and
//! never changes strategy afterwards. It writes token fields into index
//! entries ([`add_fields`](TokenMapper::add_fields)) and builds the queries and
//! sort criteria that read them back:
//!
//! - [`query`](TokenMapper::query) restricts results to a token interval, or
//!   returns `None` when the interval is the whole ring.
//! - [`term_query`](TokenMapper::term_query) selects a single token.
//! - [`sort_fields`](TokenMapper::sort_fields) orders results in ring order.
//!
//! # Strategies
//!
//! - [`NumericStrategy`]: for partitioners producing uniformly distributed
//!   `i64` tokens; indexes the token as a number.
//! - [`GenericStrategy`]: for any partitioner; indexes the token's
//!   order-preserving byte encoding.

use std::{cmp::Ordering, fmt, sync::Arc};

use ringdex_common::{Result, error::Error};

use crate::{
    document::Document,
    options::{StrategyChoice, TokenMapperOptions},
    partitioner::{Partitioner, TokenKind},
    query::{SortField, TokenQuery},
    row_position::RowPosition,
    token::Token,
};

pub mod generic;
pub mod numeric;

pub use generic::GenericStrategy;
pub use numeric::NumericStrategy;

/// Identifies a token mapping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Numeric,
    Generic,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Numeric => f.write_str("numeric"),
            StrategyKind::Generic => f.write_str("generic"),
        }
    }
}

/// The field encoding used by a [`TokenMapper`].
///
/// Implementations translate tokens into index fields and into queries over
/// those fields. They never see the "whole ring" case, which the mapper
/// handles before delegating.
pub trait TokenStrategy: Send + Sync + 'static {
    fn kind(&self) -> StrategyKind;

    /// Writes the fields for `token` into `document`.
    fn add_fields(&self, document: &mut Document, token: &Token) -> Result<()>;

    /// Builds a query for tokens between `lower` and `upper`. An absent bound
    /// leaves that side unlimited.
    fn range_query(
        &self,
        lower: Option<&Token>,
        upper: Option<&Token>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<TokenQuery>;

    /// Builds a query for exactly `token`.
    fn term_query(&self, token: &Token) -> Result<TokenQuery>;

    /// Returns the criteria sorting entries by ascending token.
    fn sort_fields(&self) -> Vec<SortField>;
}

/// Maps ring tokens to index fields, range queries and sort criteria for one
/// partitioner.
///
/// The mapper holds no mutable state and can be shared freely across threads.
#[derive(Clone)]
pub struct TokenMapper {
    partitioner: Arc<dyn Partitioner>,
    strategy: Arc<dyn TokenStrategy>,
}

impl TokenMapper {
    /// Creates a mapper for `partitioner`, choosing the strategy from its
    /// token kind.
    pub fn for_partitioner(partitioner: Arc<dyn Partitioner>) -> TokenMapper {
        let strategy: Arc<dyn TokenStrategy> = match partitioner.token_kind() {
            TokenKind::UniformLong => Arc::new(NumericStrategy),
            TokenKind::Ordered => Arc::new(GenericStrategy),
        };
        Self::with_strategy(partitioner, strategy)
    }

    /// Creates a mapper for `partitioner` following `options`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the numeric strategy is forced on
    /// a partitioner whose tokens are not uniformly distributed `i64` values.
    pub fn new(
        partitioner: Arc<dyn Partitioner>,
        options: &TokenMapperOptions,
    ) -> Result<TokenMapper> {
        match options.strategy {
            StrategyChoice::Auto => Ok(Self::for_partitioner(partitioner)),
            StrategyChoice::Generic => {
                Ok(Self::with_strategy(partitioner, Arc::new(GenericStrategy)))
            }
            StrategyChoice::Numeric => {
                if partitioner.token_kind() != TokenKind::UniformLong {
                    return Err(Error::invalid_arg(
                        "strategy",
                        format!(
                            "numeric token mapping is not supported by {}",
                            partitioner.name()
                        ),
                    ));
                }
                Ok(Self::with_strategy(partitioner, Arc::new(NumericStrategy)))
            }
        }
    }

    fn with_strategy(
        partitioner: Arc<dyn Partitioner>,
        strategy: Arc<dyn TokenStrategy>,
    ) -> TokenMapper {
        log::debug!(
            "using {} token mapping for {}",
            strategy.kind(),
            partitioner.name()
        );
        TokenMapper {
            partitioner,
            strategy,
        }
    }

    pub fn partitioner(&self) -> &Arc<dyn Partitioner> {
        &self.partitioner
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Returns `true` if `token` is the partitioner's minimum token.
    pub fn is_minimum(&self, token: &Token) -> bool {
        self.partitioner
            .compare(token, &self.partitioner.minimum_token())
            == Ordering::Equal
    }

    /// Adds the token fields of `partition_key` to `document`.
    ///
    /// Must be called once for every indexed row before the entry is committed.
    pub fn add_fields(&self, document: &mut Document, partition_key: &[u8]) -> Result<()> {
        let token = self.partitioner.token_of(partition_key);
        self.strategy.add_fields(document, &token)
    }

    /// Builds a query selecting entries whose token lies in the given interval.
    ///
    /// Absent bounds leave that side unlimited. Returns `Ok(None)` when both
    /// bounds are the minimum token and at least one side is inclusive: on a
    /// ring that interval is the full circle, so no restriction applies.
    pub fn query(
        &self,
        lower: Option<&Token>,
        upper: Option<&Token>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Option<TokenQuery>> {
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if self.is_minimum(lower)
                && self.is_minimum(upper)
                && (include_lower || include_upper)
            {
                return Ok(None);
            }
        }
        self.strategy
            .range_query(lower, upper, include_lower, include_upper)
            .map(Some)
    }

    /// Builds a query selecting entries with exactly `token`.
    pub fn term_query(&self, token: &Token) -> Result<TokenQuery> {
        self.strategy.term_query(token)
    }

    /// Builds the token restriction for a scan from `start` to `stop`, with
    /// inclusiveness derived from the boundary kinds.
    pub fn query_positions(
        &self,
        start: &RowPosition,
        stop: &RowPosition,
    ) -> Result<Option<TokenQuery>> {
        let include_lower = self.include_start(start)?;
        let include_upper = self.include_stop(stop)?;
        self.query(
            Some(&start.token),
            Some(&stop.token),
            include_lower,
            include_upper,
        )
    }

    /// Returns the sort criteria ordering entries by ascending ring position.
    pub fn sort_fields(&self) -> Vec<SortField> {
        self.strategy.sort_fields()
    }

    /// Returns whether a scan starting at `position` includes its token.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error for an unrecognized boundary kind.
    pub fn include_start(&self, position: &RowPosition) -> Result<bool> {
        position.kind.include_as_start()
    }

    /// Returns whether a scan stopping at `position` includes its token.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error for an unrecognized boundary kind.
    pub fn include_stop(&self, position: &RowPosition) -> Result<bool> {
        position.kind.include_as_stop()
    }
}

impl fmt::Debug for TokenMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMapper")
            .field("partitioner", &self.partitioner.name())
            .field("strategy", &self.strategy.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Bound;

    use super::*;
    use crate::partitioner::{ByteOrderedPartitioner, HashPartitioner};
    use ringdex_common::error::ErrorKind;

    fn hash_mapper() -> TokenMapper {
        TokenMapper::for_partitioner(Arc::new(HashPartitioner))
    }

    fn ordered_mapper() -> TokenMapper {
        TokenMapper::for_partitioner(Arc::new(ByteOrderedPartitioner))
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(hash_mapper().strategy(), StrategyKind::Numeric);
        assert_eq!(ordered_mapper().strategy(), StrategyKind::Generic);

        let forced = TokenMapper::new(
            Arc::new(HashPartitioner),
            &TokenMapperOptions {
                strategy: StrategyChoice::Generic,
            },
        )
        .unwrap();
        assert_eq!(forced.strategy(), StrategyKind::Generic);

        let err = TokenMapper::new(
            Arc::new(ByteOrderedPartitioner),
            &TokenMapperOptions {
                strategy: StrategyChoice::Numeric,
            },
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_full_ring_matches_everything() {
        for mapper in [hash_mapper(), ordered_mapper()] {
            let min = mapper.partitioner().minimum_token();
            assert_eq!(mapper.query(Some(&min), Some(&min), true, false).unwrap(), None);
            assert_eq!(mapper.query(Some(&min), Some(&min), false, true).unwrap(), None);
            assert_eq!(mapper.query(Some(&min), Some(&min), true, true).unwrap(), None);
            assert!(mapper.query(Some(&min), Some(&min), false, false).unwrap().is_some());
        }
    }

    #[test]
    fn test_minimum_on_one_side_only() {
        let mapper = hash_mapper();
        let min = mapper.partitioner().minimum_token();
        let query = mapper
            .query(Some(&min), Some(&Token::Long(0)), true, true)
            .unwrap()
            .unwrap();
        assert_eq!(
            query,
            TokenQuery::LongRange {
                field: numeric::TOKEN_LONG_FIELD,
                lower: Bound::Included(i64::MIN),
                upper: Bound::Included(0),
            }
        );
    }

    #[test]
    fn test_unbounded_query() {
        let mapper = hash_mapper();
        let query = mapper.query(None, None, false, false).unwrap().unwrap();
        assert_eq!(
            query,
            TokenQuery::LongRange {
                field: numeric::TOKEN_LONG_FIELD,
                lower: Bound::Unbounded,
                upper: Bound::Unbounded,
            }
        );
    }

    #[test]
    fn test_is_minimum() {
        let mapper = ordered_mapper();
        assert!(mapper.is_minimum(&Token::Bytes(vec![])));
        assert!(!mapper.is_minimum(&Token::Bytes(vec![0])));
    }

    #[test]
    fn test_include_start_stop() {
        use crate::row_position::BoundaryKind;

        let mapper = hash_mapper();
        let at = |kind| RowPosition::new(Token::Long(1), kind);

        assert!(mapper.include_start(&at(BoundaryKind::RowKey)).unwrap());
        assert!(mapper.include_start(&at(BoundaryKind::MinBound)).unwrap());
        assert!(!mapper.include_start(&at(BoundaryKind::MaxBound)).unwrap());
        assert!(mapper.include_start(&at(BoundaryKind::Unknown(3))).is_err());

        assert!(mapper.include_stop(&at(BoundaryKind::RowKey)).unwrap());
        assert!(!mapper.include_stop(&at(BoundaryKind::MinBound)).unwrap());
        assert!(mapper.include_stop(&at(BoundaryKind::MaxBound)).unwrap());
        assert!(mapper.include_stop(&at(BoundaryKind::Unknown(3))).is_err());
    }

    #[test]
    fn test_mapper_is_send_sync() {
        fn is_send_sync<T: Send + Sync>() {}
        is_send_sync::<TokenMapper>();
    }
}
