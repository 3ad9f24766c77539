/// Adapters layer - Infrastructure implementations
///
/// This layer contains concrete implementations of the outbound ports,
/// providing the actual integration with remote sources, files and the console.
pub mod outbound;
