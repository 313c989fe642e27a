#![allow(
    dead_code,
    clippy::module_inception,
    clippy::new_without_default,
)]
//! # docsnap - typed snapshots over a document store
//!
//! docsnap maps strongly typed payloads to the documents of a hosted
//! document database, builds queries from typed field references instead of
//! string keys, and stages field-level writes (increments, array unions and
//! removals, field deletes, server timestamps) as the database's own sentinel
//! values.
//!
//! ## Key Features
//!
//! - **Snapshots**: a payload bound to its document path, with create, merge,
//!   update, delete, read and listen operations
//! - **Field deltas**: `Incrementable`, `AtomicArray` and `Deletable` fields
//!   that write as sentinels instead of plain values
//! - **Typed queries**: predicates over a schema's field enum, resolved to wire
//!   names by the schema's own table
//! - **Pluggable store**: every operation goes through the [backend::DocumentStore]
//!   trait; [backend::MemoryBackend] is an in-process implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use docsnap::doc;
//! use docsnap::document::{CollectionPath, Document};
//! use docsnap::query::field;
//! use docsnap::snapshot::Snapshot;
//! use docsnap::store::Store;
//!
//! # fn main() -> docsnap::errors::SnapshotResult<()> {
//! let store = Store::in_memory();
//! let users: CollectionPath<Document> = CollectionPath::new("users");
//!
//! Snapshot::new_in(&store, &users, Some("alice"), doc! { age: 30 }).create(false)?;
//! Snapshot::new_in(&store, &users, Some("bob"), doc! { age: 17 }).create(false)?;
//!
//! let adults = Snapshot::get_all(&store, &users, |q| {
//!     q.filter(field("age").gte(18));
//! })?;
//! assert_eq!(adults.len(), 1);
//! assert_eq!(adults[0].id(), "alice");
//! # Ok(())
//! # }
//! ```
//!
//! Typed payloads derive `Convertible`, `SnapshotData` and `FieldNames` with
//! the `docsnap-derive` crate.
//!
//! ## Module Organization
//!
//! - [`backend`] - The document store trait and the in-memory store
//! - [`common`] - Values, conversions, timestamps and shared utilities
//! - [`delta`] - Field-delta wrappers for sentinel writes
//! - [`document`] - Field maps, paths and references
//! - [`errors`] - Error types and result definitions
//! - [`query`] - Predicates, the query model and the typed query builder
//! - [`schema`] - Traits a payload implements to be stored and queried
//! - [`snapshot`] - Snapshots, batches and transactions
//! - [`store`] - The store handle and its builder

pub mod backend;
pub mod common;
pub mod delta;
pub mod document;
pub mod errors;
pub mod query;
pub mod schema;
pub mod snapshot;
pub mod store;
