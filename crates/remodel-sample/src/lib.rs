//! # Remodel Sample App Library
//!
//! Resources and typed stores of the demo application, exposed for
//! integration testing.

pub mod model;
pub mod stores;
