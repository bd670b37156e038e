//! Token-range support for a search index layered over a ring-partitioned store.
//!
//! Rows of the store live at positions (tokens) on a ring assigned by a
//! [`Partitioner`]. This crate records each row's token in its index entry and
//! translates token intervals, as used by range scans, repair and paged full
//! scans, into queries over those entries.
//!
//! - [`partitioner`]: the partitioner contract and the hash and byte-ordered
//!   partitioners.
//! - [`mapper::TokenMapper`]: token fields, range and point queries, ring-order
//!   sorting, and scan boundary classification.
//! - [`query`], [`document`]: the query, sort and index entry values exchanged
//!   with the search engine.

pub mod document;
pub mod mapper;
pub mod options;
pub mod partitioner;
pub mod query;
pub mod row_position;
pub mod token;

pub use document::{Document, FieldValue};
pub use mapper::{StrategyKind, TokenMapper};
pub use options::{StrategyChoice, TokenMapperOptions};
pub use partitioner::{ByteOrderedPartitioner, HashPartitioner, Partitioner, TokenKind};
pub use query::{SortField, SortKind, TokenQuery};
pub use row_position::{BoundaryKind, RowPosition};
pub use token::{DecoratedKey, Token};
