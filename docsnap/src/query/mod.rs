//! Typed queries.
//!
//! [Predicate]s are built with [field] against a schema's field identifiers,
//! then handed to a [QueryBuilder], which resolves each identifier to its
//! wire name and appends the clause to a backend [Query].
//!
//! ```rust,ignore
//! let mocks = Snapshot::<Mock>::get_all(&store, &mocks_path, |q| {
//!     q.filter(field(MockField::Count).gt(0))
//!         .order_by(MockField::Count, true)
//!         .limit(10);
//! })?;
//! ```
//!
//! A field identifier without a wire name does not fail the query: its
//! clause is dropped with a warning. Check
//! [QueryBuilder::attempted_calls] against [QueryBuilder::resolved_clauses]
//! when that matters.

mod builder;
mod predicate;
#[allow(clippy::module_inception)]
mod query;

pub use builder::*;
pub use predicate::*;
pub use query::*;
