use crate::common::Value;
use std::fmt::{Display, Formatter};

/// Comparison performed by a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Equal,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    ArrayContains,
    ArrayContainsAny,
    In,
}

impl Display for FilterOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            FilterOp::Equal => "==",
            FilterOp::LessThan => "<",
            FilterOp::LessOrEqual => "<=",
            FilterOp::GreaterThan => ">",
            FilterOp::GreaterOrEqual => ">=",
            FilterOp::ArrayContains => "array-contains",
            FilterOp::ArrayContainsAny => "array-contains-any",
            FilterOp::In => "in",
        };
        write!(f, "{}", symbol)
    }
}

/// A typed filter condition, keyed by a schema field identifier (or a
/// [crate::common::TimestampKey]) that is resolved to a wire name only when
/// the predicate is handed to a [crate::query::QueryBuilder].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<K> {
    Equal(K, Value),
    LessThan(K, Value),
    LessOrEqual(K, Value),
    GreaterThan(K, Value),
    GreaterOrEqual(K, Value),
    ArrayContains(K, Value),
    ArrayContainsAny(K, Vec<Value>),
    In(K, Vec<Value>),
}

impl<K> Predicate<K> {
    pub fn key(&self) -> &K {
        match self {
            Predicate::Equal(k, _)
            | Predicate::LessThan(k, _)
            | Predicate::LessOrEqual(k, _)
            | Predicate::GreaterThan(k, _)
            | Predicate::GreaterOrEqual(k, _)
            | Predicate::ArrayContains(k, _)
            | Predicate::ArrayContainsAny(k, _)
            | Predicate::In(k, _) => k,
        }
    }

    pub fn op(&self) -> FilterOp {
        match self {
            Predicate::Equal(..) => FilterOp::Equal,
            Predicate::LessThan(..) => FilterOp::LessThan,
            Predicate::LessOrEqual(..) => FilterOp::LessOrEqual,
            Predicate::GreaterThan(..) => FilterOp::GreaterThan,
            Predicate::GreaterOrEqual(..) => FilterOp::GreaterOrEqual,
            Predicate::ArrayContains(..) => FilterOp::ArrayContains,
            Predicate::ArrayContainsAny(..) => FilterOp::ArrayContainsAny,
            Predicate::In(..) => FilterOp::In,
        }
    }

    /// Splits the predicate into key, operator and comparison value. List
    /// operands become a `Value::Array`.
    pub fn into_parts(self) -> (K, FilterOp, Value) {
        let op = self.op();
        match self {
            Predicate::Equal(k, v)
            | Predicate::LessThan(k, v)
            | Predicate::LessOrEqual(k, v)
            | Predicate::GreaterThan(k, v)
            | Predicate::GreaterOrEqual(k, v)
            | Predicate::ArrayContains(k, v) => (k, op, v),
            Predicate::ArrayContainsAny(k, values) | Predicate::In(k, values) => {
                (k, op, Value::Array(values))
            }
        }
    }
}

/// Starts a predicate on `key`.
///
/// ```rust,ignore
/// builder
///     .filter(field(MockField::Name).eq("mock"))
///     .filter(field(MockField::Count).gte(10))
///     .filter(field(MockField::Languages).array_contains("ja"));
/// ```
pub fn field<K>(key: K) -> FluentField<K> {
    FluentField { key }
}

pub struct FluentField<K> {
    key: K,
}

impl<K> FluentField<K> {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Predicate<K> {
        Predicate::Equal(self.key, value.into())
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Predicate<K> {
        Predicate::LessThan(self.key, value.into())
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Predicate<K> {
        Predicate::LessOrEqual(self.key, value.into())
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Predicate<K> {
        Predicate::GreaterThan(self.key, value.into())
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Predicate<K> {
        Predicate::GreaterOrEqual(self.key, value.into())
    }

    #[inline]
    pub fn array_contains<T: Into<Value>>(self, value: T) -> Predicate<K> {
        Predicate::ArrayContains(self.key, value.into())
    }

    pub fn array_contains_any<T: Into<Value>>(self, values: Vec<T>) -> Predicate<K> {
        Predicate::ArrayContainsAny(self.key, values.into_iter().map(Into::into).collect())
    }

    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Predicate<K> {
        Predicate::In(self.key, values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TimestampKey;

    #[test]
    fn test_fluent_constructors() {
        assert_eq!(field("name").eq("x"), Predicate::Equal("name", Value::from("x")));
        assert_eq!(field("count").lt(1), Predicate::LessThan("count", Value::from(1)));
        assert_eq!(field("count").lte(1).op(), FilterOp::LessOrEqual);
        assert_eq!(field("count").gt(1).op(), FilterOp::GreaterThan);
        assert_eq!(field("count").gte(1).op(), FilterOp::GreaterOrEqual);
        assert_eq!(field("tags").array_contains("a").op(), FilterOp::ArrayContains);
    }

    #[test]
    fn test_list_operands_become_arrays() {
        let (key, op, value) = field("tags").array_contains_any(vec!["a", "b"]).into_parts();
        assert_eq!(key, "tags");
        assert_eq!(op, FilterOp::ArrayContainsAny);
        assert_eq!(value, Value::from(vec!["a", "b"]));

        let (_, op, value) = field("count").in_array(vec![1, 2]).into_parts();
        assert_eq!(op, FilterOp::In);
        assert_eq!(value, Value::from(vec![1, 2]));
    }

    #[test]
    fn test_timestamp_keyed_predicate() {
        let predicate = field(TimestampKey::UpdateTime).gt(crate::common::Timestamp::from_seconds(5));
        assert_eq!(predicate.key(), &TimestampKey::UpdateTime);
    }

    #[test]
    fn test_op_display() {
        assert_eq!(FilterOp::ArrayContainsAny.to_string(), "array-contains-any");
        assert_eq!(FilterOp::LessOrEqual.to_string(), "<=");
    }
}
