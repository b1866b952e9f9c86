// ============================================================================
// Customer Domain
// ============================================================================
//
// - Value objects (Email, Address, Revenue, literal enums, UserAccount)
// - Aggregate (Customer with validation, ByEmail comparator)
// - Errors (CustomerError)
// - Commands (patch operations) and the patch engine
// - Version check, access scoper, search criteria
// - Ports for storage, user directory and media
// - Services: CustomerService, CustomerValuesService, MultimediaService
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod version;
pub mod patch;
pub mod access;
pub mod criteria;
pub mod ports;
pub mod command_handler;
pub mod values;
pub mod multimedia;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use version::check_version;
pub use patch::{apply_patch, PatchField};
pub use access::AccessScoper;
pub use criteria::Criterion;
pub use ports::*;
pub use command_handler::CustomerService;
pub use values::CustomerValuesService;
pub use multimedia::MultimediaService;
