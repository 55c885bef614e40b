//! Shared plumbing for the `colconv` and `pq2csv` binaries: logging setup,
//! runtime construction and the exit-code contract.

pub mod error;
pub mod run;
