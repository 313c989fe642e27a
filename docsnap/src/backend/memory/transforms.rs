use crate::backend::WriteOp;
use crate::common::{Number, Sentinel, Timestamp, Value};
use crate::document::{Document, DocumentPath};
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use im::OrdMap;

pub(crate) type DocumentMap = OrdMap<String, Document>;

fn invalid_operation(message: &str) -> SnapshotError {
    log::error!("{}", message);
    SnapshotError::new(message, ErrorKind::InvalidOperation)
}

pub(crate) fn validate_document_path(path: &str) -> SnapshotResult<()> {
    DocumentPath::<Document>::new(path).validate()
}

/// Applies one write to `docs`, resolving sentinels against the stored
/// values with `now` as the server time.
pub(crate) fn apply_write(docs: &mut DocumentMap, write: &WriteOp, now: Timestamp) -> SnapshotResult<()> {
    validate_document_path(write.path())?;
    match write {
        WriteOp::Set {
            path,
            fields,
            merge,
        } => {
            let mut base = if *merge {
                docs.get(path).cloned().unwrap_or_default()
            } else {
                Document::new()
            };
            merge_into(&mut base, fields, now, *merge)?;
            log::debug!("Set {} ({} fields, merge: {})", path, fields.size(), merge);
            docs.insert(path.clone(), base);
        }
        WriteOp::Update { path, fields } => {
            let mut base = match docs.get(path) {
                Some(existing) => existing.clone(),
                None => {
                    log::error!("No document to update at {}", path);
                    return Err(SnapshotError::new(
                        &format!("No document to update: {}", path),
                        ErrorKind::NotFound,
                    ));
                }
            };
            update_into(&mut base, fields, now)?;
            log::debug!("Updated {} ({} fields)", path, fields.size());
            docs.insert(path.clone(), base);
        }
        WriteOp::Delete { path } => {
            log::debug!("Deleted {}", path);
            docs.remove(path);
        }
    }
    Ok(())
}

/// Deep-merges `fields` into `base`. Nested maps merge key by key; sentinels
/// resolve against the value currently in `base`.
fn merge_into(base: &mut Document, fields: &Document, now: Timestamp, allow_delete: bool) -> SnapshotResult<()> {
    for (key, value) in fields.iter() {
        match value {
            Value::Sentinel(sentinel) => {
                match resolve_sentinel(sentinel, base.get_raw(key), now)? {
                    Some(resolved) => base.insert_raw(key.clone(), resolved),
                    None if allow_delete => {
                        base.remove_raw(key);
                    }
                    None => {
                        return Err(invalid_operation(&format!(
                            "Field delete on '{}' is only allowed in updates and merge writes",
                            key
                        )))
                    }
                }
            }
            Value::Document(nested) => {
                let mut child = match base.get_raw(key) {
                    Some(Value::Document(existing)) => existing.clone(),
                    _ => Document::new(),
                };
                merge_into(&mut child, nested, now, allow_delete)?;
                base.insert_raw(key.clone(), Value::Document(child));
            }
            other => {
                check_no_nested_sentinel(key, other)?;
                base.insert_raw(key.clone(), other.clone());
            }
        }
    }
    Ok(())
}

/// Applies an update: each key is a dotted field path that replaces the value
/// stored there, sentinels resolving against the stored value.
fn update_into(base: &mut Document, fields: &Document, now: Timestamp) -> SnapshotResult<()> {
    for (key, value) in fields.iter() {
        match value {
            Value::Sentinel(sentinel) => match resolve_sentinel(sentinel, base.get(key), now)? {
                Some(resolved) => base.put(key, resolved)?,
                None => {
                    base.remove(key);
                }
            },
            Value::Document(nested) => {
                let mut child = Document::new();
                merge_into(&mut child, nested, now, false)?;
                base.put(key, Value::Document(child))?;
            }
            other => {
                check_no_nested_sentinel(key, other)?;
                base.put(key, other.clone())?;
            }
        }
    }
    Ok(())
}

fn check_no_nested_sentinel(key: &str, value: &Value) -> SnapshotResult<()> {
    if value.contains_sentinel() {
        return Err(invalid_operation(&format!(
            "Field '{}' holds a write sentinel inside an array",
            key
        )));
    }
    Ok(())
}

/// Resolves a sentinel to the value to store, or `None` to remove the field.
pub(crate) fn resolve_sentinel(
    sentinel: &Sentinel,
    existing: Option<&Value>,
    now: Timestamp,
) -> SnapshotResult<Option<Value>> {
    match sentinel {
        Sentinel::ServerTimestamp => Ok(Some(Value::Timestamp(now))),
        Sentinel::Increment(operand) => {
            // a missing or non-numeric field counts as zero
            let base = existing
                .and_then(|v| v.as_number())
                .unwrap_or(Number::Integer(0));
            Ok(Some(base.add(*operand).to_value()))
        }
        Sentinel::ArrayUnion(elements) => {
            check_elements(elements)?;
            let mut items = existing_array(existing);
            for element in elements {
                if !items.contains(element) {
                    items.push(element.clone());
                }
            }
            Ok(Some(Value::Array(items)))
        }
        Sentinel::ArrayRemove(elements) => {
            check_elements(elements)?;
            let mut items = existing_array(existing);
            items.retain(|item| !elements.contains(item));
            Ok(Some(Value::Array(items)))
        }
        Sentinel::Delete => Ok(None),
    }
}

fn existing_array(existing: Option<&Value>) -> Vec<Value> {
    existing
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

fn check_elements(elements: &[Value]) -> SnapshotResult<()> {
    if elements.iter().any(|e| e.contains_sentinel()) {
        return Err(invalid_operation(
            "Array union and remove elements cannot contain write sentinels",
        ));
    }
    Ok(())
}
