//! Scan boundaries expressed as positions on the token ring.

use ringdex_common::{Result, error::Error};

use crate::token::Token;

/// Classifies a scan boundary.
///
/// The store encodes the kind as a single byte. Codes this crate does not
/// know decode to [`BoundaryKind::Unknown`] so that they are rejected where
/// the kind is interpreted rather than silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    /// Exactly at a row's ring position.
    RowKey,
    /// Just below the smallest position of a token.
    MinBound,
    /// Just above the largest position of a token.
    MaxBound,
    /// A kind code that is not recognized.
    Unknown(u8),
}

impl BoundaryKind {
    pub const ROW_KEY_CODE: u8 = 0;
    pub const MIN_BOUND_CODE: u8 = 1;
    pub const MAX_BOUND_CODE: u8 = 2;

    pub fn from_code(code: u8) -> BoundaryKind {
        match code {
            Self::ROW_KEY_CODE => BoundaryKind::RowKey,
            Self::MIN_BOUND_CODE => BoundaryKind::MinBound,
            Self::MAX_BOUND_CODE => BoundaryKind::MaxBound,
            other => BoundaryKind::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            BoundaryKind::RowKey => Self::ROW_KEY_CODE,
            BoundaryKind::MinBound => Self::MIN_BOUND_CODE,
            BoundaryKind::MaxBound => Self::MAX_BOUND_CODE,
            BoundaryKind::Unknown(code) => code,
        }
    }

    /// Whether a lower boundary of this kind includes its token.
    pub fn include_as_start(self) -> Result<bool> {
        match self {
            BoundaryKind::RowKey => Ok(true),
            BoundaryKind::MinBound => Ok(true),
            BoundaryKind::MaxBound => Ok(false),
            BoundaryKind::Unknown(code) => Err(Error::invalid_arg(
                "row position kind",
                format!("unrecognized boundary kind {code}"),
            )),
        }
    }

    /// Whether an upper boundary of this kind includes its token.
    pub fn include_as_stop(self) -> Result<bool> {
        match self {
            BoundaryKind::RowKey => Ok(true),
            BoundaryKind::MinBound => Ok(false),
            BoundaryKind::MaxBound => Ok(true),
            BoundaryKind::Unknown(code) => Err(Error::invalid_arg(
                "row position kind",
                format!("unrecognized boundary kind {code}"),
            )),
        }
    }
}

/// A scan endpoint: a token plus the kind of boundary it represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowPosition {
    pub token: Token,
    pub kind: BoundaryKind,
}

impl RowPosition {
    pub fn new(token: Token, kind: BoundaryKind) -> RowPosition {
        RowPosition { token, kind }
    }

    pub fn row_key(token: Token) -> RowPosition {
        RowPosition::new(token, BoundaryKind::RowKey)
    }

    pub fn min_bound(token: Token) -> RowPosition {
        RowPosition::new(token, BoundaryKind::MinBound)
    }

    pub fn max_bound(token: Token) -> RowPosition {
        RowPosition::new(token, BoundaryKind::MaxBound)
    }
}
