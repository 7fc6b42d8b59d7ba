//! # vireo-common
//!
//! Value-level building blocks shared by every vireo crate.
//!
//! Nothing in here knows about chunks or expression trees. It only describes
//! what a single value can be and what can go wrong while computing one.
//!
//! ## Modules
//!
//! - [`types`] - Logical types, fixed-scale decimals, JSON paths and the dynamic [`Value`](types::Value)
//! - [`utils`] - The crate-wide [`Error`](utils::Error) and [`Result`](utils::Result)
//! - [`collections`] - FxHash-backed map and set aliases

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod collections;
pub mod types;
pub mod utils;

pub use types::{Decimal, EvalType, JsonPath, LogicalType, Value};
pub use utils::{Error, ErrorKind, Result};
