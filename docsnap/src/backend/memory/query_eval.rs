use crate::backend::memory::transforms::DocumentMap;
use crate::backend::RawDocument;
use crate::common::{SortOrder, Value, PATH_SEPARATOR};
use crate::document::{CollectionGroup, CollectionPath, Document};
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use crate::query::{Cursor, FieldFilter, FilterOp, Query, QueryClause, QueryTarget};
use std::cmp::Ordering;

struct OrderKey<'a> {
    field: &'a str,
    order: SortOrder,
}

#[derive(Clone, Copy)]
enum Bound {
    Inclusive,
    Exclusive,
}

/// A start or end position resolved to comparable values.
struct CursorBound {
    values: Vec<Value>,
    path: Option<String>,
    bound: Bound,
}

/// Runs `query` over a snapshot of the stored documents.
pub(crate) fn execute(docs: &DocumentMap, query: &Query) -> SnapshotResult<Vec<RawDocument>> {
    validate_target(query.target())?;

    let mut filters: Vec<&FieldFilter> = Vec::new();
    let mut orders: Vec<OrderKey> = Vec::new();
    let mut limit: Option<usize> = None;
    let mut start: Option<(&Cursor, Bound)> = None;
    let mut end: Option<(&Cursor, Bound)> = None;

    for clause in query.clauses() {
        match clause {
            QueryClause::Filter(filter) => filters.push(filter),
            QueryClause::OrderBy { field, order } => orders.push(OrderKey {
                field,
                order: *order,
            }),
            QueryClause::Limit(n) => limit = Some(*n),
            QueryClause::StartAt(cursor) => start = Some((cursor, Bound::Inclusive)),
            QueryClause::StartAfter(cursor) => start = Some((cursor, Bound::Exclusive)),
            QueryClause::EndAt(cursor) => end = Some((cursor, Bound::Inclusive)),
            QueryClause::EndBefore(cursor) => end = Some((cursor, Bound::Exclusive)),
        }
    }

    let mut matched: Vec<(&String, &Document)> = docs
        .iter()
        .filter(|(path, _)| in_target(path, query.target()))
        .filter(|(_, fields)| filters.iter().all(|f| matches_filter(fields, f)))
        // a document missing an ordered field is left out of the result
        .filter(|(_, fields)| orders.iter().all(|o| fields.get(o.field).is_some()))
        .collect();

    matched.sort_by(|(pa, a), (pb, b)| compare_documents(pa, a, pb, b, &orders));

    let start = start
        .map(|(cursor, bound)| resolve_cursor(cursor, bound, &orders))
        .transpose()?;
    let end = end
        .map(|(cursor, bound)| resolve_cursor(cursor, bound, &orders))
        .transpose()?;

    let results = matched
        .into_iter()
        .filter(|(path, fields)| match &start {
            Some(bound) => after_start(path, fields, bound, &orders),
            None => true,
        })
        .filter(|(path, fields)| match &end {
            Some(bound) => before_end(path, fields, bound, &orders),
            None => true,
        })
        .take(limit.unwrap_or(usize::MAX))
        .map(|(path, fields)| RawDocument::new(path, Some(fields.clone())))
        .collect();
    Ok(results)
}

fn validate_target(target: &QueryTarget) -> SnapshotResult<()> {
    match target {
        QueryTarget::Collection(path) => CollectionPath::<Document>::new(path.as_str()).validate(),
        QueryTarget::CollectionGroup(id) => CollectionGroup::<Document>::new(id.as_str()).validate(),
    }
}

/// Whether the document at `path` is read by a query on `target`.
pub(crate) fn in_target(path: &str, target: &QueryTarget) -> bool {
    let parent = match path.rfind(PATH_SEPARATOR) {
        Some(idx) => &path[..idx],
        None => return false,
    };
    match target {
        QueryTarget::Collection(collection) => parent == collection,
        QueryTarget::CollectionGroup(id) => {
            parent.rsplit(PATH_SEPARATOR).next() == Some(id.as_str())
        }
    }
}

fn comparable(a: &Value, b: &Value) -> bool {
    (a.is_number() && b.is_number()) || std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn matches_filter(fields: &Document, filter: &FieldFilter) -> bool {
    let value = match fields.get(&filter.field) {
        Some(v) => v,
        None => return false,
    };
    let target = &filter.value;

    match filter.op {
        FilterOp::Equal => value == target,
        FilterOp::LessThan => comparable(value, target) && value < target,
        FilterOp::LessOrEqual => comparable(value, target) && value <= target,
        FilterOp::GreaterThan => comparable(value, target) && value > target,
        FilterOp::GreaterOrEqual => comparable(value, target) && value >= target,
        FilterOp::ArrayContains => value
            .as_array()
            .map(|items| items.contains(target))
            .unwrap_or(false),
        FilterOp::ArrayContainsAny => match (value.as_array(), target.as_array()) {
            (Some(items), Some(candidates)) => candidates.iter().any(|c| items.contains(c)),
            _ => false,
        },
        FilterOp::In => target
            .as_array()
            .map(|candidates| candidates.contains(value))
            .unwrap_or(false),
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    if order.is_descending() {
        ordering.reverse()
    } else {
        ordering
    }
}

fn compare_documents(pa: &str, a: &Document, pb: &str, b: &Document, orders: &[OrderKey]) -> Ordering {
    for key in orders {
        let ordering = directed(a.get(key.field).cmp(&b.get(key.field)), key.order);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    pa.cmp(pb)
}

fn resolve_cursor(cursor: &Cursor, bound: Bound, orders: &[OrderKey]) -> SnapshotResult<CursorBound> {
    match cursor {
        Cursor::Values(values) => {
            if values.len() > orders.len() {
                log::error!("Cursor has {} values for {} orderings", values.len(), orders.len());
                return Err(SnapshotError::new(
                    "Cursor has more values than the query has orderings",
                    ErrorKind::InvalidOperation,
                ));
            }
            Ok(CursorBound {
                values: values.clone(),
                path: None,
                bound,
            })
        }
        Cursor::Document(raw) => {
            let fields = match &raw.fields {
                Some(fields) => fields,
                None => {
                    log::error!("Cursor document {} does not exist", raw.path);
                    return Err(SnapshotError::new(
                        &format!("Cursor document {} does not exist", raw.path),
                        ErrorKind::NotExists,
                    ));
                }
            };
            let values = orders
                .iter()
                .map(|o| fields.get(o.field).cloned().unwrap_or(Value::Null))
                .collect();
            Ok(CursorBound {
                values,
                path: Some(raw.path.clone()),
                bound,
            })
        }
    }
}

/// Compares a document's position with a cursor over the cursor's prefix.
fn compare_to_cursor(path: &str, fields: &Document, cursor: &CursorBound, orders: &[OrderKey]) -> Ordering {
    for (key, cursor_value) in orders.iter().zip(cursor.values.iter()) {
        let value = fields.get(key.field).unwrap_or(&Value::Null);
        let ordering = directed(value.cmp(cursor_value), key.order);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    match &cursor.path {
        Some(cursor_path) => path.cmp(cursor_path.as_str()),
        None => Ordering::Equal,
    }
}

fn after_start(path: &str, fields: &Document, cursor: &CursorBound, orders: &[OrderKey]) -> bool {
    let ordering = compare_to_cursor(path, fields, cursor, orders);
    match cursor.bound {
        Bound::Inclusive => ordering != Ordering::Less,
        Bound::Exclusive => ordering == Ordering::Greater,
    }
}

fn before_end(path: &str, fields: &Document, cursor: &CursorBound, orders: &[OrderKey]) -> bool {
    let ordering = compare_to_cursor(path, fields, cursor, orders);
    match cursor.bound {
        Bound::Inclusive => ordering != Ordering::Greater,
        Bound::Exclusive => ordering == Ordering::Less,
    }
}
