use crate::common::{SortOrder, TimestampKey};
use crate::query::{Cursor, Predicate, Query};
use crate::schema::{FieldNameReferable, HasTimestamps};
use std::marker::PhantomData;

/// Accumulates clauses for a query over `D` documents, resolving typed field
/// references to wire names.
///
/// Every call counts as an attempt. A clause whose field has no wire name is
/// dropped: the query is left as it was, a warning is logged, and only
/// `attempted_calls` moves. Comparing the two counters is the only way to
/// notice such a drop.
///
/// ```rust,ignore
/// let mut builder = QueryBuilder::<Mock>::new(Query::collection("mocks"));
/// builder
///     .filter(field(MockField::Name).eq("x"))
///     .filter(field(MockField::Count).eq(0))
///     .filter(field(MockField::Note).eq("y"));   // unqueryable: dropped
/// assert_eq!(builder.attempted_calls(), 3);
/// assert_eq!(builder.resolved_clauses(), 2);
/// ```
pub struct QueryBuilder<D> {
    query: Query,
    attempted_calls: usize,
    resolved_clauses: usize,
    _marker: PhantomData<fn() -> D>,
}

impl<D: FieldNameReferable> QueryBuilder<D> {
    pub fn new(query: Query) -> Self {
        QueryBuilder {
            query,
            attempted_calls: 0,
            resolved_clauses: 0,
            _marker: PhantomData,
        }
    }

    pub fn attempted_calls(&self) -> usize {
        self.attempted_calls
    }

    pub fn resolved_clauses(&self) -> usize {
        self.resolved_clauses
    }

    /// Returns the accumulated query. Can be called any number of times.
    pub fn build(&self) -> Query {
        self.query.clone()
    }

    pub fn filter(&mut self, predicate: Predicate<D::Field>) -> &mut Self {
        self.attempted_calls += 1;
        let (key, op, value) = predicate.into_parts();
        match D::field_name(key) {
            Some(name) => {
                self.query = self.query.filter(name, op, value);
                self.resolved_clauses += 1;
            }
            None => {
                log::warn!(
                    "Dropping '{} {}' filter: field {:?} has no field name",
                    op,
                    value,
                    key
                );
            }
        }
        self
    }

    pub fn order_by(&mut self, field: D::Field, descending: bool) -> &mut Self {
        self.attempted_calls += 1;
        match D::field_name(field) {
            Some(name) => {
                self.query = self
                    .query
                    .order_by(name, SortOrder::from_descending(descending));
                self.resolved_clauses += 1;
            }
            None => {
                log::warn!("Dropping order by: field {:?} has no field name", field);
            }
        }
        self
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.push_unresolved(|query| query.limit(limit))
    }

    pub fn start_at(&mut self, cursor: impl Into<Cursor>) -> &mut Self {
        let cursor = cursor.into();
        self.push_unresolved(|query| query.start_at(cursor))
    }

    pub fn start_after(&mut self, cursor: impl Into<Cursor>) -> &mut Self {
        let cursor = cursor.into();
        self.push_unresolved(|query| query.start_after(cursor))
    }

    pub fn end_at(&mut self, cursor: impl Into<Cursor>) -> &mut Self {
        let cursor = cursor.into();
        self.push_unresolved(|query| query.end_at(cursor))
    }

    pub fn end_before(&mut self, cursor: impl Into<Cursor>) -> &mut Self {
        let cursor = cursor.into();
        self.push_unresolved(|query| query.end_before(cursor))
    }

    // clauses without a field lookup always resolve
    fn push_unresolved(&mut self, append: impl FnOnce(&Query) -> Query) -> &mut Self {
        self.attempted_calls += 1;
        self.query = append(&self.query);
        self.resolved_clauses += 1;
        self
    }
}

impl<D: FieldNameReferable + HasTimestamps> QueryBuilder<D> {
    /// Filters on `createTime` / `updateTime`. These keys have fixed wire
    /// names and always resolve.
    pub fn filter_timestamp(&mut self, predicate: Predicate<TimestampKey>) -> &mut Self {
        let (key, op, value) = predicate.into_parts();
        self.push_unresolved(|query| query.filter(key.as_str(), op, value))
    }

    pub fn order_by_timestamp(&mut self, key: TimestampKey, descending: bool) -> &mut Self {
        self.push_unresolved(|query| {
            query.order_by(key.as_str(), SortOrder::from_descending(descending))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Convertible, Timestamp, Value};
    use crate::document::Document;
    use crate::errors::SnapshotResult;
    use crate::query::{field, FilterOp, QueryClause};
    use crate::schema::SnapshotData;

    struct Mock;

    #[derive(Debug, Clone, Copy)]
    enum MockField {
        Name,
        Count,
        Unregistered,
    }

    impl Convertible for Mock {
        fn to_value(&self) -> SnapshotResult<Value> {
            Ok(Value::Document(Document::new()))
        }

        fn from_value(_value: &Value) -> SnapshotResult<Self> {
            Ok(Mock)
        }
    }

    impl SnapshotData for Mock {
        const HAS_TIMESTAMPS: bool = true;
    }

    impl HasTimestamps for Mock {}

    impl FieldNameReferable for Mock {
        type Field = MockField;

        fn field_name(field: MockField) -> Option<&'static str> {
            match field {
                MockField::Name => Some("name"),
                MockField::Count => Some("count"),
                MockField::Unregistered => None,
            }
        }
    }

    fn builder() -> QueryBuilder<Mock> {
        QueryBuilder::new(Query::collection("mocks"))
    }

    #[test]
    fn test_miss_is_counted_but_dropped() {
        let mut builder = builder();
        builder
            .filter(field(MockField::Name).eq("x"))
            .filter(field(MockField::Count).eq(0))
            .filter(field(MockField::Unregistered).eq("y"));
        assert_eq!(builder.attempted_calls(), 3);
        assert_eq!(builder.resolved_clauses(), 2);
        assert_eq!(builder.build().clauses().len(), 2);
    }

    #[test]
    fn test_miss_leaves_query_unchanged() {
        let mut builder = builder();
        builder.filter(field(MockField::Name).eq("x"));
        let before = builder.build();
        builder.filter(field(MockField::Unregistered).gt(1));
        builder.order_by(MockField::Unregistered, true);
        assert_eq!(builder.build(), before);
        assert_eq!(builder.attempted_calls(), 3);
        assert_eq!(builder.resolved_clauses(), 1);
    }

    #[test]
    fn test_resolved_filter_uses_wire_name() {
        let mut builder = builder();
        builder.filter(field(MockField::Count).gte(10));
        assert_eq!(
            builder.build(),
            Query::collection("mocks").filter("count", FilterOp::GreaterOrEqual, Value::from(10))
        );
    }

    #[test]
    fn test_pagination_always_resolves() {
        let mut builder = builder();
        builder
            .limit(5)
            .start_at(vec![Value::from(1)])
            .start_after(vec![Value::from(1)])
            .end_at(vec![Value::from(9)])
            .end_before(vec![Value::from(9)]);
        assert_eq!(builder.attempted_calls(), 5);
        assert_eq!(builder.resolved_clauses(), 5);
    }

    #[test]
    fn test_call_order_is_kept() {
        let mut builder = builder();
        builder
            .limit(2)
            .order_by(MockField::Count, true)
            .filter(field(MockField::Name).eq("x"));
        let clauses = builder.build();
        let clauses = clauses.clauses();
        assert!(matches!(clauses[0], QueryClause::Limit(2)));
        assert!(matches!(&clauses[1], QueryClause::OrderBy { field, order } if field == "count" && order.is_descending()));
        assert!(matches!(&clauses[2], QueryClause::Filter(f) if f.field == "name"));
    }

    #[test]
    fn test_timestamp_clauses_bypass_lookup() {
        let mut builder = builder();
        builder
            .filter_timestamp(field(TimestampKey::CreateTime).gt(Timestamp::from_seconds(1)))
            .order_by_timestamp(TimestampKey::UpdateTime, false);
        assert_eq!(builder.resolved_clauses(), 2);
        let query = builder.build();
        assert!(matches!(&query.clauses()[0], QueryClause::Filter(f) if f.field == "createTime"));
        assert!(matches!(&query.clauses()[1], QueryClause::OrderBy { field, .. } if field == "updateTime"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut builder = builder();
        builder.filter(field(MockField::Name).eq("x"));
        assert_eq!(builder.build(), builder.build());
    }
}
