//! Runner kinds (`runners.gitlab.crossplane.io`)

pub mod runner;

pub use runner::*;
