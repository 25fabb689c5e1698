//! Command-line entry points.

pub mod list;
pub mod parse;
pub mod schema;
pub mod serve;
pub mod upload;
