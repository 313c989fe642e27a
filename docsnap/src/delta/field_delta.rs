use crate::common::{Convertible, Sentinel, Value};
use crate::delta::Numeric;
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use std::ops::Deref;

/// The write a [FieldDelta] asks the backend to perform instead of storing
/// its current value.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaOp<T> {
    Increment(T),
    UnionWith(T),
    RemoveWhere(T),
    MarkDeleted,
}

/// A payload field that stages an atomic server-side write.
///
/// The wrapper remembers the value it was created or decoded with
/// (`initial`), the value the caller sees (`current`), and at most one
/// pending [DeltaOp]. Deltas never compose: each mutator first resets to
/// `initial`, then applies itself, so
///
/// ```rust
/// use docsnap::delta::Incrementable;
///
/// let mut count = Incrementable::new(5);
/// count.increment(1);
/// count.increment(10);
/// assert_eq!(*count, 15);
/// ```
///
/// When encoded, a pending delta becomes the matching [Sentinel]; without one
/// the current value is encoded as is.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDelta<T> {
    initial: T,
    current: T,
    pending: Option<DeltaOp<T>>,
}

/// A number that can be atomically incremented.
pub type Incrementable<N> = FieldDelta<N>;
/// An array that can be atomically unioned with or removed from.
pub type AtomicArray<E> = FieldDelta<Vec<E>>;
/// An optional value whose field can be deleted on the server.
pub type Deletable<T> = FieldDelta<Option<T>>;

impl<T: Clone> FieldDelta<T> {
    pub fn new(value: T) -> Self {
        FieldDelta {
            initial: value.clone(),
            current: value,
            pending: None,
        }
    }

    pub fn initial(&self) -> &T {
        &self.initial
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn pending(&self) -> Option<&DeltaOp<T>> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the pending delta and restores the initial value.
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
        self.pending = None;
    }

    pub fn into_inner(self) -> T {
        self.current
    }
}

impl<N: Numeric> FieldDelta<N> {
    /// Stages an increment by `delta`, replacing any earlier delta.
    pub fn increment(&mut self, delta: N) {
        self.reset();
        self.current = self.initial.combine(delta);
        self.pending = Some(DeltaOp::Increment(delta));
    }
}

impl<E: PartialEq + Clone> FieldDelta<Vec<E>> {
    /// Stages an array union. Locally the elements are appended as given;
    /// de-duplication happens on the server.
    pub fn union(&mut self, elements: Vec<E>) {
        self.reset();
        self.current.extend(elements.iter().cloned());
        self.pending = Some(DeltaOp::UnionWith(elements));
    }

    /// Stages removal of every element equal to one of `elements`.
    pub fn remove(&mut self, elements: Vec<E>) {
        self.reset();
        self.current.retain(|item| !elements.contains(item));
        self.pending = Some(DeltaOp::RemoveWhere(elements));
    }

    pub fn union_one(&mut self, element: E) {
        self.union(vec![element]);
    }

    pub fn remove_one(&mut self, element: E) {
        self.remove(vec![element]);
    }
}

impl<T: Clone> FieldDelta<Option<T>> {
    /// Stages deletion of the field on the server.
    pub fn mark_deleted(&mut self) {
        self.current = None;
        self.pending = Some(DeltaOp::MarkDeleted);
    }

    /// Assigns the held value directly. Assigning `Some` cancels a pending
    /// delete; assigning `None` leaves it in place.
    pub fn set(&mut self, value: Option<T>) {
        if value.is_some() {
            self.pending = None;
        }
        self.current = value;
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.pending, Some(DeltaOp::MarkDeleted))
    }
}

impl<T> Deref for FieldDelta<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.current
    }
}

impl<T: Clone + Default> Default for FieldDelta<T> {
    fn default() -> Self {
        FieldDelta::new(T::default())
    }
}

impl<T: Clone> From<T> for FieldDelta<T> {
    fn from(value: T) -> Self {
        FieldDelta::new(value)
    }
}

fn encoding_error(message: &str) -> SnapshotError {
    log::error!("{}", message);
    SnapshotError::new(message, ErrorKind::EncodingError)
}

fn operand_elements(operand: Value) -> SnapshotResult<Vec<Value>> {
    match operand {
        Value::Array(items) => Ok(items),
        other => Err(encoding_error(&format!(
            "Array delta operand must encode to an array, found {}",
            other.type_name()
        ))),
    }
}

impl<T: Convertible + Clone> Convertible for FieldDelta<T> {
    fn to_value(&self) -> SnapshotResult<Value> {
        let sentinel = match &self.pending {
            None => return self.current.to_value(),
            Some(DeltaOp::Increment(delta)) => match delta.to_value()?.as_number() {
                Some(number) => Sentinel::Increment(number),
                None => return Err(encoding_error("Increment operand must encode to a number")),
            },
            Some(DeltaOp::UnionWith(elements)) => {
                Sentinel::ArrayUnion(operand_elements(elements.to_value()?)?)
            }
            Some(DeltaOp::RemoveWhere(elements)) => {
                Sentinel::ArrayRemove(operand_elements(elements.to_value()?)?)
            }
            Some(DeltaOp::MarkDeleted) => Sentinel::Delete,
        };
        Ok(Value::Sentinel(sentinel))
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        Ok(FieldDelta::new(T::from_value(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Number;

    #[test]
    fn test_increment_does_not_compose() {
        let mut count = Incrementable::new(5i64);
        count.increment(3);
        count.increment(10);
        assert_eq!(*count, 15);
        assert_eq!(
            count.to_value().unwrap(),
            Value::Sentinel(Sentinel::Increment(Number::Integer(10)))
        );
    }

    #[test]
    fn test_increment_then_reset() {
        let mut count = Incrementable::new(5i32);
        count.increment(10);
        assert_eq!(*count.current(), 15);
        assert!(count.has_pending());

        count.reset();
        assert_eq!(*count, 5);
        assert_eq!(count.pending(), None);
        assert_eq!(count.to_value().unwrap(), Value::Integer(5));
    }

    #[test]
    fn test_double_increment() {
        let mut rating = Incrementable::new(1.5f64);
        rating.increment(0.25);
        assert_eq!(*rating, 1.75);
        assert_eq!(
            rating.to_value().unwrap(),
            Value::Sentinel(Sentinel::Increment(Number::Double(0.25)))
        );
    }

    #[test]
    fn test_union_then_remove() {
        let mut langs = AtomicArray::new(vec!["ja".to_string()]);
        langs.union(vec!["en".to_string()]);
        assert_eq!(*langs, vec!["ja", "en"]);
        assert_eq!(
            langs.to_value().unwrap(),
            Value::Sentinel(Sentinel::ArrayUnion(vec![Value::from("en")]))
        );

        langs.reset();
        langs.remove(vec!["ja".to_string()]);
        assert!(langs.is_empty());
        assert_eq!(
            langs.to_value().unwrap(),
            Value::Sentinel(Sentinel::ArrayRemove(vec![Value::from("ja")]))
        );
    }

    #[test]
    fn test_union_keeps_duplicates_locally() {
        let mut langs = AtomicArray::new(vec!["a".to_string()]);
        langs.union_one("x".to_string());
        assert_eq!(*langs, vec!["a", "x"]);

        langs.union_one("a".to_string());
        assert_eq!(*langs, vec!["a", "a"]);
        assert_eq!(
            langs.pending(),
            Some(&DeltaOp::UnionWith(vec!["a".to_string()]))
        );
    }

    #[test]
    fn test_remove_is_exact_match() {
        let mut tags = AtomicArray::new(vec![1, 2, 2, 3]);
        tags.remove_one(2);
        assert_eq!(*tags, vec![1, 3]);
        tags.remove(vec![4]);
        assert_eq!(*tags, vec![1, 2, 2, 3]);
    }

    #[test]
    fn test_delete_then_assign_cancels_delete() {
        let mut nickname = Deletable::new(Some("mock".to_string()));
        nickname.mark_deleted();
        assert!(nickname.is_deleted());
        assert_eq!(*nickname, None);
        assert_eq!(
            nickname.to_value().unwrap(),
            Value::Sentinel(Sentinel::Delete)
        );

        nickname.set(Some("renamed".to_string()));
        assert!(!nickname.is_deleted());
        assert_eq!(nickname.to_value().unwrap(), Value::from("renamed"));
    }

    #[test]
    fn test_assign_none_keeps_delete() {
        let mut nickname = Deletable::new(Some("mock".to_string()));
        nickname.mark_deleted();
        nickname.set(None);
        assert!(nickname.is_deleted());
    }

    #[test]
    fn test_reset_after_any_mutation_restores_initial() {
        let mut nickname = Deletable::new(Some("mock".to_string()));
        nickname.mark_deleted();
        nickname.reset();
        assert_eq!(*nickname, Some("mock".to_string()));
        assert_eq!(nickname.to_value().unwrap(), Value::from("mock"));

        let mut langs = AtomicArray::new(vec![1]);
        langs.union(vec![2]);
        langs.remove(vec![1]);
        langs.reset();
        assert_eq!(*langs, vec![1]);
        assert_eq!(langs.to_value().unwrap(), Value::from(vec![1]));
    }

    #[test]
    fn test_decode_has_no_pending() {
        let decoded = Incrementable::<i64>::from_value(&Value::Integer(42)).unwrap();
        assert_eq!(*decoded.initial(), 42);
        assert_eq!(*decoded, 42);
        assert!(!decoded.has_pending());
    }

    #[test]
    fn test_decode_error_propagates() {
        let err = Incrementable::<i64>::from_value(&Value::from("x")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DecodingError);
    }
}
