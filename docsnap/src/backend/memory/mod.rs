mod listeners;
mod query_eval;
mod store;
mod transforms;

pub use listeners::{ChangeEvent, ChangeListener};
pub use store::*;
