pub mod clean;
pub mod convert;
pub mod join;
pub mod json_out;
pub mod sort;
pub mod source;
pub mod sql;
pub mod writer;

pub use tabcast_lib_core::{Result, TabError};
