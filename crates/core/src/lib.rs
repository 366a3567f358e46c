pub mod bucket;
pub mod filter;
pub mod group;
pub mod history;
pub mod period;
pub mod store;
pub mod window;

pub use history::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
