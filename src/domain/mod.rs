// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with its value objects, errors,
// commands, collaborator ports and the services orchestrating them.
//
// ============================================================================

pub mod customer;
