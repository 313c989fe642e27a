//! Field-delta wrappers: payload fields that stage atomic server-side
//! writes (increment, array union, array remove, field delete).

mod field_delta;
mod numeric;

pub use field_delta::*;
pub use numeric::*;
