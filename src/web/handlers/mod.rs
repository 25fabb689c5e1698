//! Request handlers.

pub mod compare;
pub mod translate;
