//! Data models

pub mod stop;
pub mod query;

pub use stop::*;
pub use query::*;
