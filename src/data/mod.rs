/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Result container of the solvers
//!
//! A [`DataArray`] holds named columns of equal length, a mapping of plot roles
//! to columns and free-form attributes such as the parameters a solver derived.

pub mod array;
pub mod errors;

pub use array::{AttrValue, ColumnRole, DataArray};
pub use errors::{DataError, Result};
