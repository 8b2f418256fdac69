//! Environment snapshot and backend configuration resolution.

mod endpoints;
mod resolver;
mod snapshot;

pub use endpoints::*;
pub use resolver::*;
pub use snapshot::*;
