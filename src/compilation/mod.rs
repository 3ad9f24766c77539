/// Compilation domain - Catalog, compiled records and the pure services over them
///
/// Nothing in this layer performs I/O; external data reaches it through the
/// outbound ports and comes back as plain values.
pub mod domain;
pub mod policies;
pub mod services;
