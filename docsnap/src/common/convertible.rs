use crate::common::{Timestamp, Value};
use crate::document::Document;
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use std::collections::{BTreeMap, HashMap};

/// Conversion between a typed payload and the wire [Value].
///
/// Every schema type, and every type that appears as one of its fields,
/// implements `Convertible`. Usually through `#[derive(Convertible)]`:
///
/// ```rust,ignore
/// #[derive(Convertible)]
/// struct Mock {
///     name: String,
///     #[field(name = "cnt")]
///     count: Incrementable<i64>,
/// }
/// ```
pub trait Convertible: Sized {
    fn to_value(&self) -> SnapshotResult<Value>;
    fn from_value(value: &Value) -> SnapshotResult<Self>;
}

fn type_mismatch(value: &Value, expected: &str) -> SnapshotError {
    log::error!("Value {} is not {}", value, expected);
    SnapshotError::new(
        &format!("Expected {} but found {}", expected, value.type_name()),
        ErrorKind::DecodingError,
    )
}

macro_rules! impl_convertible_integer {
    ($($t:ty),*) => {
        $(
            impl Convertible for $t {
                fn to_value(&self) -> SnapshotResult<Value> {
                    Ok(Value::Integer(*self as i64))
                }

                fn from_value(value: &Value) -> SnapshotResult<Self> {
                    match value {
                        Value::Integer(i) => <$t>::try_from(*i).map_err(|_| {
                            log::error!("Value {} does not fit in {}", i, stringify!($t));
                            SnapshotError::new(
                                &format!("Value {} does not fit in {}", i, stringify!($t)),
                                ErrorKind::DecodingError,
                            )
                        }),
                        _ => Err(type_mismatch(value, stringify!($t))),
                    }
                }
            }
        )*
    };
}

impl_convertible_integer!(i8, i16, i32, i64, u8, u16, u32);

impl Convertible for u64 {
    fn to_value(&self) -> SnapshotResult<Value> {
        match i64::try_from(*self) {
            Ok(i) => Ok(Value::Integer(i)),
            Err(_) => {
                log::error!("Value {} does not fit in a 64-bit signed integer", self);
                Err(SnapshotError::new(
                    &format!("Value {} exceeds the integer range of the backend", self),
                    ErrorKind::EncodingError,
                ))
            }
        }
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Integer(i) => Ok(u64::try_from(*i)?),
            _ => Err(type_mismatch(value, "u64")),
        }
    }
}

impl Convertible for f64 {
    fn to_value(&self) -> SnapshotResult<Value> {
        Ok(Value::Double(*self))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        // the backend stores integral doubles as integers
        match value {
            Value::Double(d) => Ok(*d),
            Value::Integer(i) => Ok(*i as f64),
            _ => Err(type_mismatch(value, "f64")),
        }
    }
}

impl Convertible for f32 {
    fn to_value(&self) -> SnapshotResult<Value> {
        Ok(Value::Double(*self as f64))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        f64::from_value(value).map(|d| d as f32)
    }
}

impl Convertible for bool {
    fn to_value(&self) -> SnapshotResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(type_mismatch(value, "bool")),
        }
    }
}

impl Convertible for String {
    fn to_value(&self) -> SnapshotResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(type_mismatch(value, "string")),
        }
    }
}

impl Convertible for Timestamp {
    fn to_value(&self) -> SnapshotResult<Value> {
        Ok(Value::Timestamp(*self))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            _ => Err(type_mismatch(value, "timestamp")),
        }
    }
}

impl Convertible for Document {
    fn to_value(&self) -> SnapshotResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Document(doc) => Ok(doc.clone()),
            _ => Err(type_mismatch(value, "map")),
        }
    }
}

impl Convertible for Value {
    fn to_value(&self) -> SnapshotResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        Ok(value.clone())
    }
}

impl Convertible for () {
    fn to_value(&self) -> SnapshotResult<Value> {
        Ok(Value::Null)
    }

    fn from_value(_value: &Value) -> SnapshotResult<Self> {
        Ok(())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    fn to_value(&self) -> SnapshotResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T> Convertible for Box<T>
where
    T: Convertible,
{
    fn to_value(&self) -> SnapshotResult<Value> {
        self.as_ref().to_value()
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        Ok(Box::new(T::from_value(value)?))
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible,
{
    fn to_value(&self) -> SnapshotResult<Value> {
        let mut arr = Vec::with_capacity(self.len());
        for item in self {
            arr.push(item.to_value()?);
        }
        Ok(Value::Array(arr))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            _ => Err(type_mismatch(value, "array")),
        }
    }
}

impl<T> Convertible for BTreeMap<String, T>
where
    T: Convertible,
{
    fn to_value(&self) -> SnapshotResult<Value> {
        let mut doc = Document::new();
        for (key, item) in self {
            doc.insert_raw(key.clone(), item.to_value()?);
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Document(doc) => {
                let mut map = BTreeMap::new();
                for (key, item) in doc.iter() {
                    map.insert(key.clone(), T::from_value(item)?);
                }
                Ok(map)
            }
            _ => Err(type_mismatch(value, "map")),
        }
    }
}

impl<T> Convertible for HashMap<String, T>
where
    T: Convertible,
{
    fn to_value(&self) -> SnapshotResult<Value> {
        let mut doc = Document::new();
        for (key, item) in self {
            doc.insert_raw(key.clone(), item.to_value()?);
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Document(doc) => {
                let mut map = HashMap::with_capacity(doc.size());
                for (key, item) in doc.iter() {
                    map.insert(key.clone(), T::from_value(item)?);
                }
                Ok(map)
            }
            _ => Err(type_mismatch(value, "map")),
        }
    }
}

/// Encodes a payload into the field map sent to the backend.
///
/// Fails with `EncodingError` when the payload does not encode to a map.
pub fn to_document<T: Convertible>(data: &T) -> SnapshotResult<Document> {
    match data.to_value()? {
        Value::Document(doc) => Ok(doc),
        other => {
            log::error!("Payload encoded to {} instead of a map", other.type_name());
            Err(SnapshotError::new(
                &format!("Payload must encode to a map, found {}", other.type_name()),
                ErrorKind::EncodingError,
            ))
        }
    }
}

/// Decodes a stored field map back into a payload.
pub fn from_document<T: Convertible>(doc: &Document) -> SnapshotResult<T> {
    T::from_value(&Value::Document(doc.clone()))
}

/// Looks up a named field inside an encoded struct, treating an absent key as
/// `Null`. Used by the generated decoders.
pub fn field_value<'a>(doc: &'a Document, key: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    doc.get_raw(key).unwrap_or(&NULL)
}

/// Wraps a field's decoding error with the field name it came from.
pub fn decode_field<T: Convertible>(doc: &Document, key: &str) -> SnapshotResult<T> {
    T::from_value(field_value(doc, key)).map_err(|e| {
        SnapshotError::new_with_cause(
            &format!("Failed to decode field '{}'", key),
            ErrorKind::DecodingError,
            e,
        )
    })
}
