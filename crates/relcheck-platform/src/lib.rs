//! Platform helpers shared by the relcheck crates.

mod paths;

pub use paths::{AppPaths, AppPathsError};
