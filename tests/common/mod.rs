//! Common test utilities for lyrics-harvest integration tests

#[allow(dead_code)]
pub mod catalog;
#[allow(dead_code)]
pub mod config;
#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use catalog::*;
pub use config::*;
#[allow(unused_imports)]
pub use fixtures::*;
