use crate::common::{Value, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use im::OrdMap;
use itertools::Itertools;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

type FieldVec = SmallVec<[String; 8]>;

/// An ordered map of field names to [Value]s: the unit of storage and of
/// every write sent to a backend.
///
/// Keys containing `.` address nested maps, so `put("address.city", "Tokyo")`
/// creates (or updates) `{"address": {"city": "Tokyo"}}`.
///
/// Backed by `im::OrdMap`, so cloning is O(1) and each clone is independent.
#[derive(Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top-level fields.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, creating intermediate maps for dotted keys.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidOperation` if the key, or any dotted segment of it, is empty.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> SnapshotResult<()> {
        let splits = split_key(key)?;
        self.deep_put(&splits, value.into());
        Ok(())
    }

    /// Returns the value at `key` (dotted keys descend into nested maps), or
    /// `None` if any segment is missing.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut splits = key.split(FIELD_SEPARATOR);
        let first = splits.next()?;
        let mut current = self.data.get(first)?;
        for segment in splits {
            current = current.as_document()?.data.get(segment)?;
        }
        Some(current)
    }

    /// Removes the value at `key` and returns it. Missing keys are not an error.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        self.deep_remove(&splits)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Top-level field names, in key order.
    pub fn fields(&self) -> FieldVec {
        self.data.keys().cloned().collect()
    }

    /// Dotted paths of every leaf value. Nested maps are traversed, arrays are leaves.
    pub fn leaf_paths(&self) -> FieldVec {
        self.leaf_paths_internal("")
    }

    /// Deep-merges `other` into this document: nested maps are merged key by
    /// key, every other value in `other` replaces the existing one.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            match (self.data.get(key), value) {
                (Some(Value::Document(existing)), Value::Document(incoming)) => {
                    let mut merged = existing.clone();
                    merged.merge(incoming);
                    self.data.insert(key.clone(), Value::Document(merged));
                }
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn iter(&self) -> im::ordmap::Iter<'_, String, Value> {
        self.data.iter()
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Top-level lookup that never splits on the field separator.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Top-level insert that never splits on the field separator.
    pub fn insert_raw(&mut self, key: String, value: Value) {
        self.data.insert(key, value);
    }

    pub(crate) fn remove_raw(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) {
        match splits {
            [] => {}
            [last] => {
                self.data.insert(last.to_string(), value);
            }
            [first, rest @ ..] => {
                let mut nested = match self.data.get(*first) {
                    Some(Value::Document(obj)) => obj.clone(),
                    _ => Document::new(),
                };
                nested.deep_put(rest, value);
                self.data.insert(first.to_string(), Value::Document(nested));
            }
        }
    }

    fn deep_remove(&mut self, splits: &[&str]) -> Option<Value> {
        match splits {
            [] => None,
            [last] => self.data.remove(*last),
            [first, rest @ ..] => match self.data.get(*first) {
                Some(Value::Document(obj)) => {
                    let mut nested = obj.clone();
                    let removed = nested.deep_remove(rest);
                    self.data.insert(first.to_string(), Value::Document(nested));
                    removed
                }
                _ => None,
            },
        }
    }

    fn leaf_paths_internal(&self, prefix: &str) -> FieldVec {
        let mut fields = FieldVec::new();
        for (key, value) in self.data.iter() {
            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };

            match value {
                Value::Document(doc) if !doc.is_empty() => {
                    fields.extend(doc.leaf_paths_internal(&field))
                }
                _ => fields.push(field),
            }
        }
        fields
    }
}

fn split_key(key: &str) -> SnapshotResult<Vec<&str>> {
    let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
    if splits.iter().any(|s| s.is_empty()) {
        log::error!("Document does not support empty key in '{}'", key);
        return Err(SnapshotError::new(
            &format!("Document does not support empty key in '{}'", key),
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(splits)
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.data
                .iter()
                .map(|(k, v)| format!("\"{}\": {}", k, v))
                .join(", ")
        )
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// ```rust
/// use docsnap::doc;
///
/// let base = 100;
/// let mock = doc! {
///     name: "Alice",
///     score: (base * 2),
///     address: { city: "Tokyo" },
///     languages: ["ja", "en"]
/// };
/// assert_eq!(mock.size(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::document::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::document::Document::new();
            $(
                doc.insert_raw($crate::document::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Helper macro converting the values of a [doc!] literal.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn set_up() -> Document {
        doc! {
            name: "mock",
            count: 5,
            address: {
                city: "Tokyo",
                geo: { lat: 35.6 },
            },
            languages: ["ja", "en"],
        }
    }

    #[test]
    fn test_doc_macro_nesting() {
        let doc = set_up();
        assert_eq!(doc.size(), 4);
        assert_eq!(doc.get("address.city"), Some(&Value::from("Tokyo")));
        assert_eq!(doc.get("address.geo.lat"), Some(&Value::from(35.6)));
        assert_eq!(
            doc.get("languages"),
            Some(&Value::from(vec!["ja", "en"]))
        );
    }

    #[test]
    fn test_quoted_keys() {
        let doc = doc! { "display name": "x" };
        assert_eq!(doc.get_raw("display name"), Some(&Value::from("x")));
    }

    #[test]
    fn test_put_creates_intermediate_maps() {
        let mut doc = Document::new();
        doc.put("a.b.c", 1).unwrap();
        assert_eq!(doc.get("a.b.c"), Some(&Value::from(1)));
        assert!(doc.get("a.b").and_then(|v| v.as_document()).is_some());
    }

    #[test]
    fn test_put_replaces_non_map_parent() {
        let mut doc = doc! { a: 1 };
        doc.put("a.b", 2).unwrap();
        assert_eq!(doc.get("a.b"), Some(&Value::from(2)));
    }

    #[test]
    fn test_put_rejects_empty_segments() {
        let mut doc = Document::new();
        assert_eq!(
            doc.put("", 1).unwrap_err().kind(),
            &ErrorKind::InvalidOperation
        );
        assert!(doc.put("a..b", 1).is_err());
        assert!(doc.put("a.", 1).is_err());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_get_missing() {
        let doc = set_up();
        assert_eq!(doc.get("missing"), None);
        assert_eq!(doc.get("name.inner"), None);
        assert_eq!(doc.get("address.zip"), None);
    }

    #[test]
    fn test_remove_nested() {
        let mut doc = set_up();
        assert_eq!(doc.remove("address.city"), Some(Value::from("Tokyo")));
        assert!(!doc.contains_key("address.city"));
        assert!(doc.contains_key("address.geo.lat"));
        assert_eq!(doc.remove("address.nothing"), None);
        assert_eq!(doc.remove("name"), Some(Value::from("mock")));
    }

    #[test]
    fn test_leaf_paths() {
        let doc = set_up();
        let paths = doc.leaf_paths();
        assert_eq!(
            paths.to_vec(),
            vec!["address.city", "address.geo.lat", "count", "languages", "name"]
        );
    }

    #[test]
    fn test_merge_is_deep() {
        let mut doc = set_up();
        doc.merge(&doc! { address: { zip: "100" }, count: 6 });
        assert_eq!(doc.get("address.city"), Some(&Value::from("Tokyo")));
        assert_eq!(doc.get("address.zip"), Some(&Value::from("100")));
        assert_eq!(doc.get("count"), Some(&Value::from(6)));
    }

    #[test]
    fn test_clone_is_independent() {
        let doc = set_up();
        let mut copy = doc.clone();
        copy.put("name", "changed").unwrap();
        assert_eq!(doc.get("name"), Some(&Value::from("mock")));
    }

    #[test]
    fn test_display() {
        let doc = doc! { a: 1, b: "x" };
        assert_eq!(doc.to_string(), "{\"a\": 1, \"b\": \"x\"}");
    }
}
