//! Shared setup for the splicefs benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
