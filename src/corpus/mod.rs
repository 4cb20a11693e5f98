// file: src/corpus/mod.rs
// description: evidence corpus discovery and content identity
// reference: internal module structure

pub mod identity;
pub mod scanner;

pub use identity::ContentHasher;
pub use scanner::{FileScanner, ScannedFile};
