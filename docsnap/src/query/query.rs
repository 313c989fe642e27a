use crate::backend::RawDocument;
use crate::common::{SortOrder, Value};
use crate::query::FilterOp;
use std::fmt::{Display, Formatter};

/// What a query reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTarget {
    /// Documents directly inside the collection at this path.
    Collection(String),
    /// Documents inside every collection with this id, at any depth.
    CollectionGroup(String),
}

/// A position in a query's ordering.
///
/// A `Document` cursor positions at a previously read document, using its
/// values for the ordered fields and then its path. A `Values` cursor lists
/// values for the ordered fields in order; it may be shorter than the
/// ordering, in which case only the prefix is compared.
#[derive(Debug, Clone, PartialEq)]
pub enum Cursor {
    Document(RawDocument),
    Values(Vec<Value>),
}

impl From<RawDocument> for Cursor {
    fn from(document: RawDocument) -> Self {
        Cursor::Document(document)
    }
}

impl From<Vec<Value>> for Cursor {
    fn from(values: Vec<Value>) -> Self {
        Cursor::Values(values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// One clause of a [Query], kept in the order it was added.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    Filter(FieldFilter),
    OrderBy { field: String, order: SortOrder },
    Limit(usize),
    StartAt(Cursor),
    StartAfter(Cursor),
    EndAt(Cursor),
    EndBefore(Cursor),
}

/// The backend-facing query: a target plus clauses keyed by wire field names.
///
/// Queries are immutable values; every appending method returns a new query
/// and leaves the receiver untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    target: QueryTarget,
    clauses: Vec<QueryClause>,
}

impl Query {
    pub fn collection(path: &str) -> Self {
        Query {
            target: QueryTarget::Collection(path.to_string()),
            clauses: Vec::new(),
        }
    }

    pub fn collection_group(collection_id: &str) -> Self {
        Query {
            target: QueryTarget::CollectionGroup(collection_id.to_string()),
            clauses: Vec::new(),
        }
    }

    pub fn target(&self) -> &QueryTarget {
        &self.target
    }

    pub fn clauses(&self) -> &[QueryClause] {
        &self.clauses
    }

    fn with(&self, clause: QueryClause) -> Query {
        let mut clauses = self.clauses.clone();
        clauses.push(clause);
        Query {
            target: self.target.clone(),
            clauses,
        }
    }

    pub fn filter(&self, field: &str, op: FilterOp, value: Value) -> Query {
        self.with(QueryClause::Filter(FieldFilter {
            field: field.to_string(),
            op,
            value,
        }))
    }

    pub fn order_by(&self, field: &str, order: SortOrder) -> Query {
        self.with(QueryClause::OrderBy {
            field: field.to_string(),
            order,
        })
    }

    pub fn limit(&self, limit: usize) -> Query {
        self.with(QueryClause::Limit(limit))
    }

    pub fn start_at(&self, cursor: Cursor) -> Query {
        self.with(QueryClause::StartAt(cursor))
    }

    pub fn start_after(&self, cursor: Cursor) -> Query {
        self.with(QueryClause::StartAfter(cursor))
    }

    pub fn end_at(&self, cursor: Cursor) -> Query {
        self.with(QueryClause::EndAt(cursor))
    }

    pub fn end_before(&self, cursor: Cursor) -> Query {
        self.with(QueryClause::EndBefore(cursor))
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            QueryTarget::Collection(path) => write!(f, "collection({})", path)?,
            QueryTarget::CollectionGroup(id) => write!(f, "group({})", id)?,
        }
        for clause in &self.clauses {
            match clause {
                QueryClause::Filter(filter) => {
                    write!(f, " where {} {} {}", filter.field, filter.op, filter.value)?
                }
                QueryClause::OrderBy { field, order } => write!(
                    f,
                    " order by {} {}",
                    field,
                    if order.is_descending() { "desc" } else { "asc" }
                )?,
                QueryClause::Limit(n) => write!(f, " limit {}", n)?,
                QueryClause::StartAt(_) => write!(f, " start at <cursor>")?,
                QueryClause::StartAfter(_) => write!(f, " start after <cursor>")?,
                QueryClause::EndAt(_) => write!(f, " end at <cursor>")?,
                QueryClause::EndBefore(_) => write!(f, " end before <cursor>")?,
            }
        }
        Ok(())
    }
}
