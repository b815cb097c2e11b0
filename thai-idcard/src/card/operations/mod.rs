pub mod exchange;
pub mod read;

// Re-export the operations at the module root so the card type can call
// `operations::read_field(...)` directly.
pub use exchange::exchange;
pub use read::{parse_field_names, read_field, read_fields, read_photo};
