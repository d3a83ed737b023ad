//! Shared plumbing for the funnel builder crates.
//!
//! The only thing every crate agrees on is the persistence boundary: a flat
//! string-keyed store holding JSON values (the browser-local storage of the
//! builder, or a directory of files on the command line).

pub mod error;
pub mod result;
pub mod storage;

pub use error::*;
pub use result::*;
pub use storage::*;
