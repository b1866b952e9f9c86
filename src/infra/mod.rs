// ============================================================================
// Infrastructure - in-process collaborators and dev seed data
// ============================================================================

pub mod memory;
pub mod seed;

pub use memory::{InMemoryCustomerRepository, InMemoryMediaStore, InMemoryUserDirectory};
