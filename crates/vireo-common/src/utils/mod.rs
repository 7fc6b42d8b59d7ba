//! Common utilities used throughout vireo.
//!
//! - [`error`] - The [`Error`] enum, its [`ErrorKind`] classification and [`Result`]

pub mod error;

pub use error::{Error, ErrorKind, Result};
