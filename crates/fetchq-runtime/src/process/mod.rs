//! OS-level process helpers.

mod shutdown;

pub use shutdown::shutdown_child;
