use crate::common::{AUTO_ID_ALPHABET, DEFAULT_AUTO_ID_LENGTH, PATH_SEPARATOR};
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use rand::Rng;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Generates a random document id of `length` characters from `[A-Za-z0-9]`.
pub fn auto_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| AUTO_ID_ALPHABET[rng.gen_range(0..AUTO_ID_ALPHABET.len())] as char)
        .collect()
}

/// Checks a slash separated path against the canonical rule: every segment
/// is non-empty, and the segment count is even for documents and odd for
/// collections.
fn check_path(path: &str, document: bool) -> SnapshotResult<()> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let kind = if document { "document" } else { "collection" };

    if segments.iter().any(|s| s.is_empty()) {
        log::error!("Invalid {} path '{}': empty segment", kind, path);
        return Err(SnapshotError::new(
            &format!("Invalid {} path '{}': segments must not be empty", kind, path),
            ErrorKind::InvalidPath,
        ));
    }

    let expects_even = document;
    if (segments.len() % 2 == 0) != expects_even {
        log::error!(
            "Invalid {} path '{}': {} segments",
            kind,
            path,
            segments.len()
        );
        return Err(SnapshotError::new(
            &format!(
                "Invalid {} path '{}': a {} path needs an {} number of segments",
                kind,
                path,
                kind,
                if document { "even" } else { "odd" }
            ),
            ErrorKind::InvalidPath,
        ));
    }
    Ok(())
}

fn last_segment(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}

fn parent_of(path: &str) -> Option<&str> {
    path.rfind(PATH_SEPARATOR).map(|idx| &path[..idx])
}

/// Location of a single document holding a `D` payload.
///
/// Construction never fails. A malformed path is reported with
/// `ErrorKind::InvalidPath` by the first operation that uses it.
pub struct DocumentPath<D> {
    path: String,
    _marker: PhantomData<fn() -> D>,
}

impl<D> DocumentPath<D> {
    pub fn new(path: impl Into<String>) -> Self {
        DocumentPath {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The document id: the last path segment.
    pub fn id(&self) -> &str {
        last_segment(&self.path)
    }

    /// The collection containing this document.
    pub fn parent(&self) -> CollectionPath<D> {
        CollectionPath::new(parent_of(&self.path).unwrap_or(""))
    }

    /// A sub-collection under this document.
    pub fn collection<E>(&self, id: &str) -> CollectionPath<E> {
        CollectionPath::new(format!("{}{}{}", self.path, PATH_SEPARATOR, id))
    }

    /// Reinterprets the path as holding another payload type.
    pub fn cast<E>(&self) -> DocumentPath<E> {
        DocumentPath::new(self.path.clone())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> SnapshotResult<()> {
        check_path(&self.path, true)
    }
}

/// Location of a collection whose documents hold `D` payloads.
pub struct CollectionPath<D> {
    path: String,
    _marker: PhantomData<fn() -> D>,
}

impl<D> CollectionPath<D> {
    pub fn new(path: impl Into<String>) -> Self {
        CollectionPath {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The collection id: the last path segment.
    pub fn id(&self) -> &str {
        last_segment(&self.path)
    }

    /// The document this collection is nested under, or `None` for a root collection.
    pub fn parent<E>(&self) -> Option<DocumentPath<E>> {
        parent_of(&self.path).map(DocumentPath::new)
    }

    pub fn document(&self, id: &str) -> DocumentPath<D> {
        DocumentPath::new(format!("{}{}{}", self.path, PATH_SEPARATOR, id))
    }

    /// A document path with a freshly generated id of the default length.
    pub fn new_document(&self) -> DocumentPath<D> {
        self.new_document_with_length(DEFAULT_AUTO_ID_LENGTH)
    }

    pub fn new_document_with_length(&self, length: usize) -> DocumentPath<D> {
        self.document(&auto_id(length))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> SnapshotResult<()> {
        check_path(&self.path, false)
    }
}

/// Every collection, at any depth, whose id is `collection_id`.
pub struct CollectionGroup<D> {
    collection_id: String,
    _marker: PhantomData<fn() -> D>,
}

impl<D> CollectionGroup<D> {
    pub fn new(collection_id: impl Into<String>) -> Self {
        CollectionGroup {
            collection_id: collection_id.into(),
            _marker: PhantomData,
        }
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub fn validate(&self) -> SnapshotResult<()> {
        if self.collection_id.is_empty() || self.collection_id.contains(PATH_SEPARATOR) {
            log::error!("Invalid collection group id '{}'", self.collection_id);
            return Err(SnapshotError::new(
                &format!(
                    "Invalid collection group id '{}': must be a single non-empty segment",
                    self.collection_id
                ),
                ErrorKind::InvalidPath,
            ));
        }
        Ok(())
    }
}

macro_rules! impl_path_traits {
    ($t:ident, $field:ident) => {
        impl<D> Clone for $t<D> {
            fn clone(&self) -> Self {
                $t::new(self.$field.clone())
            }
        }

        impl<D> PartialEq for $t<D> {
            fn eq(&self, other: &Self) -> bool {
                self.$field == other.$field
            }
        }

        impl<D> Eq for $t<D> {}

        impl<D> Hash for $t<D> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.$field.hash(state)
            }
        }

        impl<D> Debug for $t<D> {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($t), self.$field)
            }
        }

        impl<D> Display for $t<D> {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.$field)
            }
        }
    };
}

impl_path_traits!(DocumentPath, path);
impl_path_traits!(CollectionPath, path);
impl_path_traits!(CollectionGroup, collection_id);
