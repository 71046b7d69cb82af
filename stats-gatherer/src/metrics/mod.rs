pub mod sample;
pub mod server_record;

// Re-export the main types for easy access
pub use sample::*;
pub use server_record::*;
