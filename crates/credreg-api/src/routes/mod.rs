//! # API Route Modules
//!
//! - `registries` — Registry creation (plain and encrypted), index
//!   allocation, lookup, listing, search, sealing and deprecation.
//! - `status` — Bulk status updates and single-index status checks.

pub mod registries;
pub mod status;
