pub mod descriptor;
pub mod sample;
pub mod shared;

// Re-export the main types for easy access
pub use descriptor::*;
pub use sample::*;
pub use shared::*;
