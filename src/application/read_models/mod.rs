//! Read models for CQRS-lite pattern
//!
//! This module contains view-optimized structs that provide
//! a denormalized representation of domain data for queries.

pub mod enriched_software;

pub use enriched_software::{EnrichedSoftware, EnrichedSoftwareBuilder};
