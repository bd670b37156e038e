//! Native token queries and sort criteria.
//!
//! These are the values the mapper hands to the search engine. Besides being
//! translated by the engine, they can be evaluated directly against a
//! [`Document`] with [`TokenQuery::matches`] and [`compare_documents`].

use std::{
    cmp::Ordering,
    ops::{Bound, RangeBounds},
};

use crate::document::{Document, FieldValue};

/// A query over one of the token fields written by the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenQuery {
    /// Numeric range over a `Long` field.
    LongRange {
        field: &'static str,
        lower: Bound<i64>,
        upper: Bound<i64>,
    },
    /// Exact match on a `Long` field.
    LongTerm { field: &'static str, value: i64 },
    /// Lexicographic range over a `Bytes` field.
    BytesRange {
        field: &'static str,
        lower: Bound<Vec<u8>>,
        upper: Bound<Vec<u8>>,
    },
    /// Exact match on a `Bytes` field.
    BytesTerm {
        field: &'static str,
        value: Vec<u8>,
    },
}

impl TokenQuery {
    /// Returns the name of the field the query runs over.
    pub fn field(&self) -> &'static str {
        match self {
            TokenQuery::LongRange { field, .. }
            | TokenQuery::LongTerm { field, .. }
            | TokenQuery::BytesRange { field, .. }
            | TokenQuery::BytesTerm { field, .. } => *field,
        }
    }

    /// Returns `true` if `document` is selected by the query.
    ///
    /// A document without the queried field, or with a value of the other
    /// type, never matches.
    pub fn matches(&self, document: &Document) -> bool {
        match (self, document.get(self.field())) {
            (TokenQuery::LongRange { lower, upper, .. }, Some(FieldValue::Long(v))) => {
                (*lower, *upper).contains(v)
            }
            (TokenQuery::LongTerm { value, .. }, Some(FieldValue::Long(v))) => value == v,
            (TokenQuery::BytesRange { lower, upper, .. }, Some(FieldValue::Bytes(v))) => {
                (lower.as_ref(), upper.as_ref()).contains(v)
            }
            (TokenQuery::BytesTerm { value, .. }, Some(FieldValue::Bytes(v))) => value == v,
            _ => false,
        }
    }
}

/// The value type of a sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKind {
    Long,
    Bytes,
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortField {
    pub field: &'static str,
    pub kind: SortKind,
    pub reverse: bool,
}

impl SortField {
    pub fn ascending(field: &'static str, kind: SortKind) -> SortField {
        SortField {
            field,
            kind,
            reverse: false,
        }
    }

    /// Compares two documents on this field. Documents missing the field sort
    /// first.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = match self.kind {
            SortKind::Long => long_value(a, self.field).cmp(&long_value(b, self.field)),
            SortKind::Bytes => bytes_value(a, self.field).cmp(&bytes_value(b, self.field)),
        };
        if self.reverse { ord.reverse() } else { ord }
    }
}

/// Compares two documents by a list of sort criteria, first criterion first.
pub fn compare_documents(sort: &[SortField], a: &Document, b: &Document) -> Ordering {
    sort.iter()
        .map(|field| field.compare(a, b))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn long_value(document: &Document, field: &str) -> Option<i64> {
    match document.get(field) {
        Some(FieldValue::Long(v)) => Some(*v),
        _ => None,
    }
}

fn bytes_value<'a>(document: &'a Document, field: &str) -> Option<&'a [u8]> {
    match document.get(field) {
        Some(FieldValue::Bytes(v)) => Some(v.as_slice()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_doc(value: i64) -> Document {
        let mut doc = Document::new();
        doc.add("t", FieldValue::Long(value));
        doc
    }

    fn bytes_doc(value: &[u8]) -> Document {
        let mut doc = Document::new();
        doc.add("b", FieldValue::Bytes(value.to_vec()));
        doc
    }

    #[test]
    fn test_long_range_bounds() {
        let query = TokenQuery::LongRange {
            field: "t",
            lower: Bound::Included(5),
            upper: Bound::Excluded(10),
        };
        assert!(!query.matches(&long_doc(4)));
        assert!(query.matches(&long_doc(5)));
        assert!(query.matches(&long_doc(9)));
        assert!(!query.matches(&long_doc(10)));

        let unbounded = TokenQuery::LongRange {
            field: "t",
            lower: Bound::Unbounded,
            upper: Bound::Included(0),
        };
        assert!(unbounded.matches(&long_doc(i64::MIN)));
        assert!(unbounded.matches(&long_doc(0)));
        assert!(!unbounded.matches(&long_doc(1)));
    }

    #[test]
    fn test_bytes_range_bounds() {
        let query = TokenQuery::BytesRange {
            field: "b",
            lower: Bound::Excluded(b"b".to_vec()),
            upper: Bound::Unbounded,
        };
        assert!(!query.matches(&bytes_doc(b"a")));
        assert!(!query.matches(&bytes_doc(b"b")));
        assert!(query.matches(&bytes_doc(b"b\0")));
        assert!(query.matches(&bytes_doc(b"zzz")));
    }

    #[test]
    fn test_type_mismatch_never_matches() {
        let query = TokenQuery::LongTerm {
            field: "b",
            value: 1,
        };
        assert!(!query.matches(&bytes_doc(b"\x01")));
        assert!(!query.matches(&Document::new()));
    }

    #[test]
    fn test_sort_fields() {
        let sort = [SortField::ascending("t", SortKind::Long)];
        let mut docs = vec![long_doc(3), long_doc(-7), Document::new(), long_doc(0)];
        docs.sort_by(|a, b| compare_documents(&sort, a, b));
        let values: Vec<_> = docs.iter().map(|d| long_value(d, "t")).collect();
        assert_eq!(values, [None, Some(-7), Some(0), Some(3)]);

        let reversed = [SortField {
            reverse: true,
            ..SortField::ascending("t", SortKind::Long)
        }];
        docs.sort_by(|a, b| compare_documents(&reversed, a, b));
        assert_eq!(long_value(&docs[0], "t"), Some(3));
    }
}
