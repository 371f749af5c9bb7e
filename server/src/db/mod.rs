//! Database module for PostgreSQL persistence.

mod buyers;
mod pool;

pub use buyers::*;
pub use pool::*;
