//! Shared helpers for the docsnap integration tests.

pub mod test_util;
