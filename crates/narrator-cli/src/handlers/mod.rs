//! Command handlers.
//!
//! Each handler writes its report to the given writer so output can be
//! checked in tests; `main` passes stdout.

pub mod backends;
pub mod speak;
pub mod voices;
