//! # credreg-cli — Status List Operator Tool
//!
//! Provides the `credreg` command-line interface for working with encoded
//! status lists outside the service.
//!
//! ## Subcommands
//!
//! - `credreg blank` — Print an all-valid encoded list.
//! - `credreg inspect` — Decode a list and print one index or a summary.
//! - `credreg set` — Apply a status code at indices, offline.
//! - `credreg keygen` — Generate a symmetric key, hex encoded.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the operations, which return their
//!   output so they can be tested without a terminal.
//! - Encoding rules come from `credreg-codec`; nothing is re-implemented here.

pub mod keygen;
pub mod list;
