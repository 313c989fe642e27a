use crate::errors::SnapshotResult;
use crate::schema::SnapshotData;
use crate::snapshot::Snapshot;

impl<D: SnapshotData> Snapshot<D> {
    /// Writes the snapshot. With `merge`, fields stored but absent from the
    /// payload are kept; otherwise the stored document is replaced.
    ///
    /// Sets both timestamps to the server time for payloads declaring them.
    pub fn create(&self, merge: bool) -> SnapshotResult<()> {
        self.path().validate()?;
        let fields = self.extract_fields_for_create()?;
        log::debug!("Writing {} (merge: {})", self.path(), merge);
        self.store()
            .backend()
            .set_fields(self.path().as_str(), fields, merge)
    }

    /// Shorthand for `create(true)`.
    pub fn merge(&self) -> SnapshotResult<()> {
        self.create(true)
    }

    /// Updates the fields of the stored document. Fails with `NotFound` when
    /// nothing is stored at the path.
    pub fn update(&self) -> SnapshotResult<()> {
        self.path().validate()?;
        let fields = self.extract_fields_for_update()?;
        log::debug!("Updating {}", self.path());
        self.store()
            .backend()
            .update_fields(self.path().as_str(), fields)
    }

    /// Deletes the stored document. The local payload is left untouched.
    pub fn delete(&self) -> SnapshotResult<()> {
        self.path().validate()?;
        log::debug!("Deleting {}", self.path());
        self.store().backend().delete_document(self.path().as_str())
    }
}
