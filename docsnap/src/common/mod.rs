//! Shared building blocks: the wire value model, conversions, timestamps,
//! constants and the concurrency helpers used by the backends.

mod constants;
mod convertible;
mod event_bus;
mod sort_order;
mod timestamp;
mod type_utils;
mod value;

pub use constants::*;
pub use convertible::*;
pub use event_bus::*;
pub use sort_order::*;
pub use timestamp::*;
pub use type_utils::*;
pub use value::*;
