//! Request handlers for buyer reads and sync runs.

mod buyers;
mod snapshot;
mod sync;

pub use buyers::*;
pub use snapshot::*;
pub use sync::*;
