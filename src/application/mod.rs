/// Application layer - Use cases, coordination and DTOs
///
/// This layer contains the application logic that orchestrates
/// domain services and coordinates with infrastructure through ports.
pub mod coordinator;
pub mod dto;
pub mod read_models;
pub mod scheduler;
pub mod use_cases;
