use crate::common::Timestamp;
use crate::document::Document;
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Compare two floats with NaN sorted before every other number.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compare an integer with a float without losing precision for large integers.
#[inline]
fn num_cmp_mixed(a: i64, b: f64) -> Ordering {
    if b.is_nan() {
        return Ordering::Greater;
    }
    if b >= i64::MAX as f64 {
        return Ordering::Less;
    }
    if b < i64::MIN as f64 {
        return Ordering::Greater;
    }
    let truncated = b.trunc() as i64;
    match a.cmp(&truncated) {
        Ordering::Equal => num_cmp_float(0.0, b.fract()),
        other => other,
    }
}

/// A numeric operand of an increment, or a number read from a [Value].
///
/// Integers stay integers when added to integers; any double operand turns
/// the result into a double.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Number {
    Integer(i64),
    Double(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Double(d) => *d,
        }
    }

    /// Adds two numbers the way the backend applies an increment.
    /// Integer overflow saturates at the `i64` bounds.
    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a.saturating_add(b)),
            (a, b) => Number::Double(a.as_f64() + b.as_f64()),
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            Number::Integer(i) => Value::Integer(i),
            Number::Double(d) => Value::Double(d),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a.cmp(b),
            (Number::Double(a), Number::Double(b)) => num_cmp_float(*a, *b),
            (Number::Integer(a), Number::Double(b)) => num_cmp_mixed(*a, *b),
            (Number::Double(a), Number::Integer(b)) => num_cmp_mixed(*b, *a).reverse(),
        }
    }
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // integral doubles must hash like the equal integer
        match self {
            Number::Integer(i) => i.hash(state),
            Number::Double(d) => {
                if d.fract() == 0.0 && *d >= i64::MIN as f64 && *d < i64::MAX as f64 {
                    (*d as i64).hash(state)
                } else if d.is_nan() {
                    f64::NAN.to_bits().hash(state)
                } else {
                    d.to_bits().hash(state)
                }
            }
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Double(d) => write!(f, "{}", d),
        }
    }
}

/// A write-time marker the backend interprets instead of storing literally.
///
/// Sentinels only ever travel from client to backend; reads always return
/// materialized plain values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sentinel {
    /// Set the field to the backend's commit time.
    ServerTimestamp,
    /// Add the operand to the stored number (missing or non-numeric fields count as 0).
    Increment(Number),
    /// Append each element not already present in the stored array.
    ArrayUnion(Vec<Value>),
    /// Remove every occurrence of each element from the stored array.
    ArrayRemove(Vec<Value>),
    /// Remove the field from the stored document.
    Delete,
}

impl Sentinel {
    fn rank(&self) -> u8 {
        match self {
            Sentinel::ServerTimestamp => 0,
            Sentinel::Increment(_) => 1,
            Sentinel::ArrayUnion(_) => 2,
            Sentinel::ArrayRemove(_) => 3,
            Sentinel::Delete => 4,
        }
    }
}

impl Display for Sentinel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentinel::ServerTimestamp => write!(f, "serverTimestamp()"),
            Sentinel::Increment(n) => write!(f, "increment({})", n),
            Sentinel::ArrayUnion(items) => write!(f, "arrayUnion({})", items.iter().join(", ")),
            Sentinel::ArrayRemove(items) => write!(f, "arrayRemove({})", items.iter().join(", ")),
            Sentinel::Delete => write!(f, "delete()"),
        }
    }
}

/// A value stored in (or sent to) a document field.
///
/// # Variants
/// - `Null`: absence of a value
/// - `Bool`, `Integer` (64-bit), `Double` (64-bit float)
/// - `Timestamp`: nanosecond precision point in time
/// - `String`, `Bytes`
/// - `Reference`: path of another document
/// - `Array`, `Document`: nested values
/// - `Sentinel`: write-only marker interpreted by the backend
///
/// # Ordering
/// Values of different types order by type:
/// null < bool < number < timestamp < string < bytes < reference < array < map < sentinel.
/// Integers and doubles compare numerically with each other, so `Value::from(1) == Value::from(1.0)`.
///
/// # Usage
/// ```text
/// let v1: Value = 42.into();
/// let v2 = Value::from("hello");
/// let doc = doc! { "age": 42, "name": "Alice" };
/// if let Some(name) = doc.get("name")?.as_string() { ... }
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Bytes(Vec<u8>),
    Reference(String),
    Array(Vec<Value>),
    Document(Document),
    Sentinel(Sentinel),
}

impl Value {
    /// Creates a new [Value] from anything that converts into one.
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    /// Creates a [Value::Bytes] from raw bytes.
    pub fn bytes(value: Vec<u8>) -> Value {
        Value::Bytes(value)
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) | Value::Double(_) => 2,
            Value::Timestamp(_) => 3,
            Value::String(_) => 4,
            Value::Bytes(_) => 5,
            Value::Reference(_) => 6,
            Value::Array(_) => 7,
            Value::Document(_) => 8,
            Value::Sentinel(_) => 9,
        }
    }

    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Timestamp(_) => "timestamp",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Reference(_) => "reference",
            Value::Array(_) => "array",
            Value::Document(_) => "map",
            Value::Sentinel(_) => "sentinel",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Double(_))
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Value::Sentinel(_))
    }

    pub fn as_bool(&self) -> Option<&bool> {
        match self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&i64> {
        match self {
            Value::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<&f64> {
        match self {
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Integer(v) => Some(Number::Integer(*v)),
            Value::Double(v) => Some(Number::Double(*v)),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Vec<u8>> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&String> {
        match self {
            Value::Reference(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sentinel(&self) -> Option<&Sentinel> {
        match self {
            Value::Sentinel(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true if this value, or anything nested in it, is a sentinel.
    pub fn contains_sentinel(&self) -> bool {
        match self {
            Value::Sentinel(_) => true,
            Value::Array(items) => items.iter().any(|v| v.contains_sentinel()),
            Value::Document(doc) => doc.iter().any(|(_, v)| v.contains_sentinel()),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.cmp(&b);
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Reference(a), Value::Reference(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            (Value::Sentinel(a), Value::Sentinel(b)) => match a.rank().cmp(&b.rank()) {
                Ordering::Equal => a.to_string().cmp(&b.to_string()),
                other => other,
            },
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Integer(v) => Number::Integer(*v).hash(state),
            Value::Double(v) => Number::Double(*v).hash(state),
            Value::Timestamp(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
            Value::Reference(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
            Value::Document(v) => v.hash(state),
            Value::Sentinel(v) => v.hash(state),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Integer(v) => write!(f, "Integer({})", v),
            Value::Double(v) => write!(f, "Double({})", v),
            Value::Timestamp(v) => write!(f, "Timestamp({})", v),
            Value::String(v) => write!(f, "String({:?})", v),
            Value::Bytes(v) => write!(f, "Bytes({:?})", v),
            Value::Reference(v) => write!(f, "Reference({})", v),
            Value::Array(v) => f.debug_list().entries(v.iter()).finish(),
            Value::Document(v) => write!(f, "{:?}", v),
            Value::Sentinel(v) => write!(f, "Sentinel({})", v),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "\"{}\"", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Reference(v) => write!(f, "ref({})", v),
            Value::Array(v) => write!(f, "[{}]", v.iter().join(", ")),
            Value::Document(v) => write!(f, "{}", v),
            Value::Sentinel(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Integer(value as i64)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Double(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<Sentinel> for Value {
    fn from(value: Sentinel) -> Self {
        Value::Sentinel(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        value.to_value()
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(|v| v.into()).collect())
    }
}

impl<T> From<BTreeMap<String, T>> for Value
where
    T: Into<Value>,
{
    fn from(value: BTreeMap<String, T>) -> Self {
        let mut doc = Document::new();
        for (k, v) in value {
            doc.insert_raw(k, v.into());
        }
        Value::Document(doc)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_numbers_compare_across_types() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert!(Value::from(1) < Value::from(1.5));
        assert!(Value::from(2.5) > Value::from(2));
        assert!(Value::from(f64::NAN) < Value::from(i64::MIN));
    }

    #[test]
    fn test_equal_numbers_hash_equal() {
        assert_eq!(hash_of(&Value::from(7)), hash_of(&Value::from(7.0)));
    }

    #[test]
    fn test_cross_type_ordering() {
        let ordered = vec![
            Value::Null,
            Value::from(false),
            Value::from(-3),
            Value::from(Timestamp::from_seconds(1)),
            Value::from("a"),
            Value::bytes(vec![1]),
            Value::Reference("mocks/a".to_string()),
            Value::from(vec![1]),
            Value::from(doc! { a: 1 }),
            Value::from(Sentinel::Delete),
        ];
        let mut shuffled = ordered.clone();
        shuffled.reverse();
        shuffled.sort();
        assert_eq!(shuffled, ordered);
    }

    #[test]
    fn test_number_add() {
        assert_eq!(Number::Integer(2).add(Number::Integer(3)), Number::Integer(5));
        assert_eq!(Number::Integer(2).add(Number::Double(0.5)), Number::Double(2.5));
        assert_eq!(
            Number::Integer(i64::MAX).add(Number::Integer(1)),
            Number::Integer(i64::MAX)
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("x").as_string(), Some(&"x".to_string()));
        assert_eq!(Value::from(3).as_integer(), Some(&3));
        assert_eq!(Value::from(3).as_double(), None);
        assert_eq!(Value::from(3.5).as_number(), Some(Number::Double(3.5)));
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(vec!["a", "b"]).as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }

    #[test]
    fn test_contains_sentinel() {
        assert!(Value::from(Sentinel::ServerTimestamp).contains_sentinel());
        let nested = Value::from(doc! { inner: (Value::from(Sentinel::Delete)) });
        assert!(nested.contains_sentinel());
        assert!(!Value::from(vec![1, 2]).contains_sentinel());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::from("x").to_string(), "\"x\"");
        assert_eq!(
            Value::from(Sentinel::Increment(Number::Integer(10))).to_string(),
            "increment(10)"
        );
    }
}
